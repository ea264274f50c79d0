mod bootstrap;
mod export;

use anyhow::{Context, Result};
use vault_core::settings::Settings;
use vault_nightscout::{NightscoutImporter, ProfileReader};

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("vault-import v{} starting", env!("CARGO_PKG_VERSION"));

    let options = settings.import_options()?;
    tracing::info!(
        timezone = %options.timezone,
        gap_threshold_minutes = options.gap_threshold_minutes,
        "import options resolved"
    );

    let store = ProfileReader::new(&options)
        .read_file(&settings.profile)
        .with_context(|| format!("reading profiles from {}", settings.profile.display()))?;
    if store.is_empty() {
        tracing::warn!(
            "no usable basal profiles in {}; basal synthesis will be skipped",
            settings.profile.display()
        );
    }

    let importer = NightscoutImporter::new(&store, options);
    let outcome = importer
        .import_file(&settings.entries)
        .with_context(|| format!("importing {}", settings.entries.display()))?;

    let entries = if settings.dedup {
        importer.post_process(outcome.entries)
    } else {
        outcome.entries
    };

    // Each warning was already logged when it was raised.
    tracing::info!(
        entries = entries.len(),
        warnings = outcome.warnings.len(),
        profile_documents = store.len(),
        "import complete"
    );

    export::write(&entries, settings.output.as_deref())?;

    Ok(())
}
