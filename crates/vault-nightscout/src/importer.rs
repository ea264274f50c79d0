//! One-pass import of a Nightscout entry export.
//!
//! Pipeline: parse → classify → sort → detect gaps → synthesize basal per
//! gap-free span → merge → final sort. Each call runs to completion or fails
//! without partial output.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::debug;
use vault_core::error::{Result, VaultError};
use vault_core::models::{remove_duplicates, sort_by_timestamp, MeasurementEntry};
use vault_core::settings::ImportOptions;

use crate::classifier::EventClassifier;
use crate::gaps::GapDetector;
use crate::store::{MostRefinedSelection, ProfileStore, SelectionStrategy};
use crate::synthesizer::BasalSynthesizer;
use crate::warning::ImportWarning;

// ── Public types ──────────────────────────────────────────────────────────────

/// Result of a successful import: entries ascending by timestamp, plus every
/// recoverable problem met on the way.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportOutcome {
    pub entries: Vec<MeasurementEntry>,
    pub warnings: Vec<ImportWarning>,
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    ParseInput,
    Classify,
    SortByTime,
    DetectGaps,
    SynthesizeBasal,
    MergeAndFinalSort,
    Done,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportStage::ParseInput => "parse-input",
            ImportStage::Classify => "classify",
            ImportStage::SortByTime => "sort-by-time",
            ImportStage::DetectGaps => "detect-gaps",
            ImportStage::SynthesizeBasal => "synthesize-basal",
            ImportStage::MergeAndFinalSort => "merge-and-final-sort",
            ImportStage::Done => "done",
        };
        f.write_str(name)
    }
}

// ── NightscoutImporter ────────────────────────────────────────────────────────

/// Imports entry exports against a finished [`ProfileStore`].
///
/// The store is only borrowed, so one store can back any number of imports.
pub struct NightscoutImporter<'a, S: SelectionStrategy = MostRefinedSelection> {
    store: &'a ProfileStore,
    options: ImportOptions,
    strategy: S,
}

impl<'a> NightscoutImporter<'a> {
    /// Importer using the default [`MostRefinedSelection`] heuristic.
    pub fn new(store: &'a ProfileStore, options: ImportOptions) -> Self {
        Self::with_strategy(store, options, MostRefinedSelection)
    }
}

impl<'a, S: SelectionStrategy> NightscoutImporter<'a, S> {
    pub fn with_strategy(store: &'a ProfileStore, options: ImportOptions, strategy: S) -> Self {
        Self {
            store,
            options,
            strategy,
        }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Import the raw bytes of an entry export.
    ///
    /// Fails with [`VaultError::JsonParse`] or [`VaultError::MalformedSource`]
    /// when the input cannot be understood, and with [`VaultError::NoEntries`]
    /// when nothing in it could be classified.
    pub fn import(&self, bytes: &[u8]) -> Result<ImportOutcome> {
        enter(ImportStage::ParseInput);
        let classifier = EventClassifier::new(&self.options);

        enter(ImportStage::Classify);
        let classified = classifier.classify(bytes)?;
        let mut warnings = classified.warnings;
        let mut entries = classified.entries;
        if entries.is_empty() {
            return Err(VaultError::NoEntries);
        }

        enter(ImportStage::SortByTime);
        sort_by_timestamp(&mut entries);

        enter(ImportStage::DetectGaps);
        let gaps = GapDetector::new(self.options.gap_threshold_minutes).detect(&entries);

        enter(ImportStage::SynthesizeBasal);
        let (first, last) = match (entries.first(), entries.last()) {
            (Some(first), Some(last)) => (first.timestamp(), last.timestamp()),
            _ => return Err(VaultError::NoEntries),
        };
        let synthesizer = BasalSynthesizer::new(
            self.store,
            &self.strategy,
            self.options.timezone,
            &self.options.source,
        );
        let mut synthetic = Vec::new();
        for (start, end) in GapDetector::covered_spans(first, last, &gaps) {
            synthetic.extend(synthesizer.synthesize(start, end, &mut warnings));
        }

        enter(ImportStage::MergeAndFinalSort);
        let classified_count = entries.len();
        let synthetic_count = synthetic.len();
        entries.extend(synthetic);
        sort_by_timestamp(&mut entries);

        enter(ImportStage::Done);
        debug!(
            classified = classified_count,
            synthetic = synthetic_count,
            gaps = gaps.len(),
            warnings = warnings.len(),
            "import finished"
        );
        Ok(ImportOutcome { entries, warnings })
    }

    /// Read `path` and import its contents.
    pub fn import_file(&self, path: &Path) -> Result<ImportOutcome> {
        let bytes = std::fs::read(path).map_err(|source| VaultError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = bytes.len(), "read entry export");
        self.import(&bytes)
    }

    /// Drop repeated entries, keeping the first of each.
    pub fn post_process(&self, entries: Vec<MeasurementEntry>) -> Vec<MeasurementEntry> {
        let before = entries.len();
        let kept = remove_duplicates(entries);
        debug!(removed = before - kept.len(), "removed duplicate entries");
        kept
    }
}

fn enter(stage: ImportStage) {
    debug!(%stage, "import stage");
}

// ── Tests ──────────────────────────────────────────────────────────────────────
