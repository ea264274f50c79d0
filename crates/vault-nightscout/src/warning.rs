use chrono::{DateTime, Utc};
use serde::Serialize;

/// A recoverable problem met during an import.
///
/// Warnings never abort an import; they are logged when raised and handed
/// back with the result so callers can inspect what was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportWarning {
    /// A record matched none of the known shapes and was dropped.
    UnclassifiedRecord {
        /// Position of the record in the source array.
        index: usize,
        record: serde_json::Value,
    },
    /// No basal profile was available for a span, so no basal entries were
    /// synthesized for it.
    NoProfileAvailable {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl std::fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportWarning::UnclassifiedRecord { index, record } => {
                write!(f, "could not classify record #{}: {}", index, record)
            }
            ImportWarning::NoProfileAvailable { start, end } => write!(
                f,
                "no basal profile available for {} .. {}; skipped basal synthesis",
                start.to_rfc3339(),
                end.to_rfc3339()
            ),
        }
    }
}
