use chrono_tz::Tz;
use clap::Parser;
use std::path::PathBuf;

use crate::error::Result;
use crate::time_utils::resolve_timezone;

/// Minimum distance between two consecutive entries that counts as a gap in
/// device coverage.
pub const DEFAULT_GAP_THRESHOLD_MINUTES: i64 = 240;

/// Label written into the `source` field of every imported entry.
pub const NIGHTSCOUT_SOURCE: &str = "Nightscout";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Import a Nightscout export into a canonical measurement stream
#[derive(Parser, Debug, Clone)]
#[command(
    name = "vault-import",
    about = "Import a Nightscout export into a canonical measurement stream",
    version
)]
pub struct Settings {
    /// Nightscout profile export (JSON array of profile documents)
    #[arg(long)]
    pub profile: PathBuf,

    /// Nightscout entries/treatments export (JSON array of records)
    #[arg(long)]
    pub entries: PathBuf,

    /// Write the resulting entries here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Timezone used for hour-of-day lookups and offset-less timestamps
    #[arg(long, default_value = "auto", env = "VAULT_TIMEZONE")]
    pub timezone: String,

    /// Minutes between two entries at which device coverage counts as lost
    #[arg(long, default_value = "240", value_parser = clap::value_parser!(i64).range(1..))]
    pub gap_threshold_minutes: i64,

    /// Remove duplicate entries before writing
    #[arg(long)]
    pub dedup: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse CLI arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Build the importer configuration, resolving `"auto"` timezone.
    pub fn import_options(&self) -> Result<ImportOptions> {
        Ok(ImportOptions {
            timezone: resolve_timezone(&self.timezone)?,
            gap_threshold_minutes: self.gap_threshold_minutes,
            source: NIGHTSCOUT_SOURCE.to_string(),
        })
    }
}

// ── ImportOptions ──────────────────────────────────────────────────────────────

/// Configuration shared by the import pipeline stages.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    /// Zone for hour-of-day lookups and for timestamps without an offset.
    pub timezone: Tz,
    /// Adjacent entries at least this many minutes apart form a gap.
    pub gap_threshold_minutes: i64,
    /// Value of the `source` field on produced entries.
    pub source: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            gap_threshold_minutes: DEFAULT_GAP_THRESHOLD_MINUTES,
            source: NIGHTSCOUT_SOURCE.to_string(),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VaultError;

    const BASE: [&str; 5] = [
        "vault-import",
        "--profile",
        "profile.json",
        "--entries",
        "entries.json",
    ];

    fn args(extra: &[&str]) -> Vec<String> {
        BASE.iter().chain(extra.iter()).map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::load_from_args(args(&[]));

        assert_eq!(settings.profile, PathBuf::from("profile.json"));
        assert_eq!(settings.entries, PathBuf::from("entries.json"));
        assert!(settings.output.is_none());
        assert_eq!(settings.gap_threshold_minutes, 240);
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.dedup);
        assert!(!settings.debug);
    }

    #[test]
    fn test_settings_debug_overrides_log_level() {
        let settings = Settings::load_from_args(args(&["--debug"]));
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_settings_gap_threshold_rejects_zero() {
        let result = Settings::try_parse_from(args(&["--gap-threshold-minutes", "0"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_output_path() {
        let settings = Settings::load_from_args(args(&["--output", "/tmp/out.json"]));
        assert_eq!(settings.output, Some(PathBuf::from("/tmp/out.json")));
    }

    #[test]
    fn test_import_options_from_settings() {
        let settings = Settings::load_from_args(args(&[
            "--timezone",
            "Europe/Berlin",
            "--gap-threshold-minutes",
            "180",
        ]));
        let options = settings.import_options().unwrap();
        assert_eq!(options.timezone, Tz::Europe__Berlin);
        assert_eq!(options.gap_threshold_minutes, 180);
        assert_eq!(options.source, "Nightscout");
    }

    #[test]
    fn test_import_options_unknown_timezone() {
        let settings = Settings::load_from_args(args(&["--timezone", "Nowhere/Special"]));
        let err = settings.import_options().unwrap_err();
        assert!(matches!(err, VaultError::Config(_)));
    }

    #[test]
    fn test_import_options_default() {
        let options = ImportOptions::default();
        assert_eq!(options.timezone, Tz::UTC);
        assert_eq!(options.gap_threshold_minutes, DEFAULT_GAP_THRESHOLD_MINUTES);
    }
}
