//! Hourly basal entries implied by the active basal profile.

use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};
use vault_core::models::{EntryKind, MeasurementEntry};
use vault_core::time_utils::next_full_hour;

use crate::store::{ProfileStore, SelectionStrategy};
use crate::warning::ImportWarning;

/// Origin label of every synthesized entry.
pub const SYNTHETIC_BASAL_ORIGIN: &str = "Nightscout Basal Profile";

/// Fills gap-free spans with one `BASAL_PROFILE` entry per local hour.
pub struct BasalSynthesizer<'a, S: SelectionStrategy + ?Sized> {
    store: &'a ProfileStore,
    strategy: &'a S,
    timezone: Tz,
    source: &'a str,
}

impl<'a, S: SelectionStrategy + ?Sized> BasalSynthesizer<'a, S> {
    pub fn new(store: &'a ProfileStore, strategy: &'a S, timezone: Tz, source: &'a str) -> Self {
        Self {
            store,
            strategy,
            timezone,
            source,
        }
    }

    /// Synthesize entries for `[start, end)`.
    ///
    /// The first entry sits on the first local hour boundary at or after
    /// `start`; later ones follow every 60 minutes while before `end`. Each
    /// hour uses the profile selected for that hour, read at its local hour
    /// of day. Without any profile the span yields nothing and a
    /// [`ImportWarning::NoProfileAvailable`] is pushed onto `warnings`.
    pub fn synthesize(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        warnings: &mut Vec<ImportWarning>,
    ) -> Vec<MeasurementEntry> {
        if self.store.is_empty() {
            self.skip(start, end, warnings);
            return Vec::new();
        }

        let mut entries = Vec::new();
        let mut hour = next_full_hour(start, self.timezone);
        while hour < end {
            let profile = match self.store.select_best_profile(hour, self.strategy) {
                Ok(profile) => profile,
                Err(_) => {
                    self.skip(start, end, warnings);
                    return Vec::new();
                }
            };
            entries.push(MeasurementEntry::new(
                SYNTHETIC_BASAL_ORIGIN,
                self.source,
                EntryKind::BasalProfile,
                hour,
                profile.rate_at(hour, self.timezone),
            ));
            hour += TimeDelta::hours(1);
        }

        debug!(%start, %end, entries = entries.len(), "synthesized basal span");
        entries
    }

    fn skip(&self, start: DateTime<Utc>, end: DateTime<Utc>, warnings: &mut Vec<ImportWarning>) {
        let warning = ImportWarning::NoProfileAvailable { start, end };
        warn!("{}", warning);
        warnings.push(warning);
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
