//! Parsing of Nightscout profile exports into a [`ProfileStore`].
//!
//! A profile export is a JSON array of documents shaped roughly like
//!
//! ```json
//! [{
//!   "startDate": "2019-01-01T00:00:00.000Z",
//!   "store": {
//!     "Default": { "basal": [ { "time": "00:00", "timeAsSeconds": 0, "value": 0.6 } ] }
//!   }
//! }]
//! ```
//!
//! Every named profile with a usable basal schedule becomes a candidate of
//! its document.

use std::path::Path;

use chrono::{NaiveTime, Timelike};
use serde_json::Value;
use tracing::{debug, warn};
use vault_core::data_processors::{FieldExtractor, JsonObject, TimestampProcessor};
use vault_core::error::{Result, VaultError};
use vault_core::settings::ImportOptions;
use vault_core::time_utils::TimezoneHandler;

use crate::profile::{BasalProfile, RateSample};
use crate::store::ProfileStore;

/// Reads profile exports; offset-less dates are read in the configured zone.
pub struct ProfileReader {
    timestamps: TimezoneHandler,
}

impl ProfileReader {
    pub fn new(options: &ImportOptions) -> Self {
        Self {
            timestamps: TimezoneHandler::new(options.timezone),
        }
    }

    /// Read a profile export file.
    pub fn read_file(&self, path: &Path) -> Result<ProfileStore> {
        let bytes = std::fs::read(path).map_err(|source| VaultError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        self.read(&bytes)
    }

    /// Parse raw profile-export bytes.
    ///
    /// Documents without a start date or without any usable profile are
    /// skipped. A top level that is not an array, or documents whose parts
    /// have the wrong JSON types, fail with [`VaultError::MalformedSource`].
    pub fn read(&self, bytes: &[u8]) -> Result<ProfileStore> {
        let root: Value = serde_json::from_slice(bytes)?;
        let records = FieldExtractor::as_array(&root, "profile source")?;

        let mut store = ProfileStore::new();
        for (index, record) in records.iter().enumerate() {
            let record = FieldExtractor::as_object(record, "profile document")?;

            let Some(effective_start) =
                TimestampProcessor::first_of(record, &["startDate", "mills"], &self.timestamps)?
            else {
                debug!(index, "skipping profile document without start date");
                continue;
            };

            let profiles = match record.get("store") {
                None | Some(Value::Null) => Vec::new(),
                Some(store) => self.read_named_profiles(FieldExtractor::as_object(store, "profile store")?)?,
            };
            if profiles.is_empty() {
                debug!(index, "skipping profile document without basal profiles");
                continue;
            }

            debug!(
                index,
                %effective_start,
                candidates = profiles.len(),
                "read profile document"
            );
            store.add_document(effective_start, profiles);
        }

        debug!(documents = store.len(), "profile store ready");
        Ok(store)
    }

    fn read_named_profiles(&self, named: &JsonObject) -> Result<Vec<BasalProfile>> {
        let mut profiles = Vec::new();
        for (name, profile) in named {
            let profile = FieldExtractor::as_object(profile, "stored profile")?;
            let Some(basal) = profile.get("basal").filter(|v| !v.is_null()) else {
                continue;
            };
            let steps = read_basal_steps(FieldExtractor::as_array(basal, "basal schedule")?)?;

            match BasalProfile::from_samples(&steps) {
                Ok(completed) => profiles.push(completed.with_name(name.clone())),
                Err(VaultError::EmptyInput) => {
                    warn!(profile = %name, "basal schedule has no usable steps; ignoring profile");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(profiles)
    }
}

/// Turn schedule steps into rate samples. Steps lacking a time or a value are
/// skipped.
fn read_basal_steps(steps: &[Value]) -> Result<Vec<RateSample>> {
    let mut samples = Vec::with_capacity(steps.len());
    for step in steps {
        let step = FieldExtractor::as_object(step, "basal step")?;
        let second_of_day = match FieldExtractor::lenient_f64(step, "timeAsSeconds")? {
            Some(secs) => Some(seconds_from_number(secs)?),
            None => FieldExtractor::optional_str(step, "time")?
                .map(seconds_from_clock)
                .transpose()?,
        };
        let rate = FieldExtractor::lenient_f64(step, "value")?;

        match (second_of_day, rate) {
            (Some(second_of_day), Some(rate)) => samples.push(RateSample::new(second_of_day, rate)),
            _ => debug!("skipping incomplete basal step"),
        }
    }
    Ok(samples)
}

/// Whole seconds of a numeric step time. Values past midnight pass through;
/// profile completion ignores them.
fn seconds_from_number(secs: f64) -> Result<u32> {
    if !(0.0..=u32::MAX as f64).contains(&secs) {
        return Err(VaultError::MalformedSource(format!(
            "basal step time {} is not a time of day in seconds",
            secs
        )));
    }
    Ok(secs as u32)
}

/// Parse `"HH:MM"` into seconds since midnight.
fn seconds_from_clock(clock: &str) -> Result<u32> {
    NaiveTime::parse_from_str(clock.trim(), "%H:%M")
        .map(|t| t.num_seconds_from_midnight())
        .map_err(|_| VaultError::MalformedSource(format!("basal step time \"{}\" is not HH:MM", clock)))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
