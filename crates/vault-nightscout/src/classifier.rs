//! Classification of Nightscout entry/treatment records into measurement
//! entries.
//!
//! One record may produce several entries (a bolus with carbs yields a
//! bolus and a meal). Recognised shapes:
//!
//! | shape         | marker                      | kind           | value   |
//! |---------------|-----------------------------|----------------|---------|
//! | glucose       | `"type": "sgv"`             | `GLUCOSE_CGM`  | `sgv`   |
//! | bolus         | numeric `insulin`           | `BOLUS_NORMAL` | insulin |
//! | meal          | numeric `carbs`             | `MEAL_MANUAL`  | carbs   |
//! | temp basal    | `"eventType": "Temp Basal"` | `BASAL_TEMP`   | `rate`  |

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};
use vault_core::data_processors::{FieldExtractor, JsonObject, TimestampProcessor};
use vault_core::error::{Result, VaultError};
use vault_core::models::{EntryKind, MeasurementEntry, ValueExtension};
use vault_core::settings::ImportOptions;
use vault_core::time_utils::TimezoneHandler;

use crate::warning::ImportWarning;

const UNKNOWN_ORIGIN: &str = "unknown";
const GLUCOSE_TYPE: &str = "sgv";
const TEMP_BASAL_EVENT: &str = "Temp Basal";

/// Timestamp fields of glucose entries, in order of preference.
const GLUCOSE_TIME_KEYS: [&str; 2] = ["dateString", "date"];
/// Timestamp fields of treatments, in order of preference.
const TREATMENT_TIME_KEYS: [&str; 2] = ["timestamp", "created_at"];

/// Entries and warnings produced from one source.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub entries: Vec<MeasurementEntry>,
    pub warnings: Vec<ImportWarning>,
}

/// Turns raw export bytes into typed measurement entries.
pub struct EventClassifier {
    timestamps: TimezoneHandler,
    source: String,
}

impl EventClassifier {
    pub fn new(options: &ImportOptions) -> Self {
        Self {
            timestamps: TimezoneHandler::new(options.timezone),
            source: options.source.clone(),
        }
    }

    /// Classify every record of a JSON array.
    ///
    /// Records matching no shape are dropped with an
    /// [`ImportWarning::UnclassifiedRecord`]. Structural problems abort:
    /// invalid JSON is [`VaultError::JsonParse`], anything else that cannot
    /// be understood is [`VaultError::MalformedSource`].
    pub fn classify(&self, bytes: &[u8]) -> Result<Classification> {
        let root: Value = serde_json::from_slice(bytes)?;
        let records = FieldExtractor::as_array(&root, "entry source")?;

        let mut out = Classification::default();
        for (index, record) in records.iter().enumerate() {
            let object = FieldExtractor::as_object(record, "entry record")
                .map_err(|e| in_record(index, e))?;
            let entries = self
                .classify_record(object)
                .map_err(|e| in_record(index, e))?;

            if entries.is_empty() {
                let warning = ImportWarning::UnclassifiedRecord {
                    index,
                    record: record.clone(),
                };
                warn!(index, "{}", warning);
                out.warnings.push(warning);
            } else {
                out.entries.extend(entries);
            }
        }

        debug!(
            records = records.len(),
            entries = out.entries.len(),
            unclassified = out.warnings.len(),
            "classified records"
        );
        Ok(out)
    }

    /// All entries one record yields; empty when it matches no shape.
    fn classify_record(&self, record: &JsonObject) -> Result<Vec<MeasurementEntry>> {
        let mut entries = Vec::new();

        if FieldExtractor::optional_str(record, "type")? == Some(GLUCOSE_TYPE) {
            // Only uploader-stamped glucose readings name their device.
            let origin = match FieldExtractor::optional_str(record, "device")? {
                Some(device) if !device.is_empty() => device,
                _ => UNKNOWN_ORIGIN,
            };
            let ts = self.timestamp(record, &GLUCOSE_TIME_KEYS, "glucose")?;
            let sgv = FieldExtractor::require_f64(record, "sgv", "glucose")?;
            entries.push(self.entry(origin, EntryKind::GlucoseCgm, ts, sgv));
        }

        // Treatment shapes share one timestamp, resolved on first use.
        let mut treatment_ts: Option<DateTime<Utc>> = None;
        let mut treatment_time = |what: &str| -> Result<DateTime<Utc>> {
            match treatment_ts {
                Some(ts) => Ok(ts),
                None => {
                    let ts = self.timestamp(record, &TREATMENT_TIME_KEYS, what)?;
                    treatment_ts = Some(ts);
                    Ok(ts)
                }
            }
        };

        if let Some(insulin) = FieldExtractor::optional_f64(record, "insulin")? {
            let ts = treatment_time("bolus")?;
            entries.push(self.entry(UNKNOWN_ORIGIN, EntryKind::BolusNormal, ts, insulin));
        }

        if let Some(carbs) = FieldExtractor::optional_f64(record, "carbs")? {
            let ts = treatment_time("meal")?;
            entries.push(self.entry(UNKNOWN_ORIGIN, EntryKind::MealManual, ts, carbs));
        }

        if FieldExtractor::optional_str(record, "eventType")? == Some(TEMP_BASAL_EVENT) {
            let ts = treatment_time(TEMP_BASAL_EVENT)?;
            let rate = FieldExtractor::require_f64(record, "rate", TEMP_BASAL_EVENT)?;
            let duration = FieldExtractor::require_f64(record, "duration", TEMP_BASAL_EVENT)?;
            entries.push(
                self.entry(UNKNOWN_ORIGIN, EntryKind::BasalTemp, ts, rate)
                    .with_extension(ValueExtension::Duration(duration)),
            );
        }

        Ok(entries)
    }

    fn entry(&self, origin: &str, kind: EntryKind, ts: DateTime<Utc>, value: f64) -> MeasurementEntry {
        MeasurementEntry::new(origin, self.source.as_str(), kind, ts, value)
    }

    /// First present timestamp among `keys`; a matched shape without one is
    /// malformed, as is a timestamp that does not parse.
    fn timestamp(&self, record: &JsonObject, keys: &[&str], what: &str) -> Result<DateTime<Utc>> {
        match TimestampProcessor::first_of(record, keys, &self.timestamps) {
            Ok(Some(ts)) => Ok(ts),
            Ok(None) => Err(VaultError::MalformedSource(format!(
                "{} record has none of the timestamp fields {:?}",
                what, keys
            ))),
            Err(VaultError::TimestampParse(raw)) => Err(VaultError::MalformedSource(format!(
                "{} record has unparseable timestamp \"{}\"",
                what, raw
            ))),
            Err(e) => Err(e),
        }
    }
}

/// Prefix structural errors with the offending record's position.
fn in_record(index: usize, err: VaultError) -> VaultError {
    match err {
        VaultError::MalformedSource(msg) => {
            VaultError::MalformedSource(format!("record #{}: {}", index, msg))
        }
        other => other,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
