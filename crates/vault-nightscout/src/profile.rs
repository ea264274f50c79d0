//! Hourly basal profiles and their reconstruction from sparse rate steps.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, warn};
use vault_core::error::{Result, VaultError};
use vault_core::time_utils::seconds_of_day;

pub const SLOTS_PER_DAY: usize = 24;
const SECONDS_PER_SLOT: u32 = 3600;

/// One step of a pump's basal schedule: from `second_of_day` on, deliver
/// `rate` units per hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateSample {
    pub second_of_day: u32,
    pub rate: f64,
}

impl RateSample {
    pub fn new(second_of_day: u32, rate: f64) -> Self {
        Self {
            second_of_day,
            rate,
        }
    }
}

// ── BasalProfile ──────────────────────────────────────────────────────────────

/// A full day of hourly basal rates (units/hour), indexed by local hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasalProfile {
    /// Name the device stored the profile under, when known.
    name: Option<String>,
    rates: [f64; SLOTS_PER_DAY],
}

impl BasalProfile {
    pub fn new(rates: [f64; SLOTS_PER_DAY]) -> Self {
        Self { name: None, rates }
    }

    pub fn named(name: impl Into<String>, rates: [f64; SLOTS_PER_DAY]) -> Self {
        Self {
            name: Some(name.into()),
            rates,
        }
    }

    /// Reconstruct a full profile from schedule steps.
    ///
    /// Samples are sorted by time of day and bucketed into 24 hourly slots:
    /// * one sample in a slot → its rate
    /// * several samples → their mean
    /// * none → the previous slot's rate; for slot 0 the earliest sample's rate
    ///
    /// Fails with [`VaultError::EmptyInput`] when `samples` is empty.
    pub fn from_samples(samples: &[RateSample]) -> Result<Self> {
        if samples.is_empty() {
            return Err(VaultError::EmptyInput);
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by_key(|s| s.second_of_day);

        let out_of_range = sorted
            .iter()
            .filter(|s| s.second_of_day >= SECONDS_PER_SLOT * SLOTS_PER_DAY as u32)
            .count();
        if out_of_range > 0 {
            debug!(out_of_range, "ignoring rate samples beyond the end of the day");
        }

        let mut rates = [0.0; SLOTS_PER_DAY];
        // Slot 0 without its own sample borrows the earliest rate of the day.
        let mut previous = sorted[0].rate;
        let mut cursor = 0;
        for (slot, rate) in rates.iter_mut().enumerate() {
            let slot_end = (slot as u32 + 1) * SECONDS_PER_SLOT;
            let mut sum = 0.0;
            let mut count = 0usize;
            while cursor < sorted.len() && sorted[cursor].second_of_day < slot_end {
                sum += sorted[cursor].rate;
                count += 1;
                cursor += 1;
            }

            *rate = match count {
                0 => previous,
                1 => sum,
                n => sum / n as f64,
            };
            previous = *rate;
        }

        Ok(Self::new(rates))
    }

    /// Attach a name, consuming `self`.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn rates(&self) -> &[f64; SLOTS_PER_DAY] {
        &self.rates
    }

    /// Rate for a second of the day; values past the last slot clamp to 23.
    pub fn rate_at_second(&self, second_of_day: u32) -> f64 {
        let mut slot = (second_of_day / SECONDS_PER_SLOT) as usize;
        if slot >= SLOTS_PER_DAY {
            warn!(slot, "requested impossible basal slot");
            slot = SLOTS_PER_DAY - 1;
        }
        self.rates[slot]
    }

    /// Rate in effect at `ts`, read in local time of `tz`.
    pub fn rate_at(&self, ts: DateTime<Utc>, tz: Tz) -> f64 {
        self.rate_at_second(seconds_of_day(ts, tz))
    }

    /// Total units delivered over a day.
    pub fn daily_amount(&self) -> f64 {
        self.rates.iter().sum()
    }

    /// Number of rate changes across the day, counting from an implicit 0
    /// before midnight.
    pub fn change_count(&self) -> usize {
        let mut last = 0.0;
        let mut changes = 0;
        for &rate in &self.rates {
            if rate != last {
                changes += 1;
                last = rate;
            }
        }
        changes
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hourly(rates: &[f64]) -> Vec<RateSample> {
        rates
            .iter()
            .enumerate()
            .map(|(h, &r)| RateSample::new(h as u32 * 3600, r))
            .collect()
    }

    // ── from_samples ─────────────────────────────────────────────────────────

    #[test]
    fn test_from_samples_empty_is_error() {
        let err = BasalProfile::from_samples(&[]).unwrap_err();
        assert!(matches!(err, VaultError::EmptyInput));
    }

    #[test]
    fn test_from_samples_always_24_slots() {
        let profile = BasalProfile::from_samples(&[RateSample::new(5000, 0.7)]).unwrap();
        assert_eq!(profile.rates().len(), 24);
        for hour in 0..24u32 {
            assert!(profile.rate_at_second(hour * 3600).is_finite());
        }
    }

    #[test]
    fn test_from_samples_complete_input_is_unchanged() {
        let rates: Vec<f64> = (0..24).map(|h| 0.5 + h as f64 * 0.05).collect();
        let profile = BasalProfile::from_samples(&hourly(&rates)).unwrap();
        assert_eq!(profile.rates().to_vec(), rates);
    }

    #[test]
    fn test_from_samples_carries_forward() {
        let profile = BasalProfile::from_samples(&[
            RateSample::new(7200, 2.0),
            RateSample::new(0, 1.0),
        ])
        .unwrap();
        assert_eq!(profile.rates()[0], 1.0);
        assert_eq!(profile.rates()[1], 1.0);
        for hour in 2..24 {
            assert_eq!(profile.rates()[hour], 2.0, "hour {}", hour);
        }
    }

    #[test]
    fn test_from_samples_first_slot_falls_back_to_earliest_sample() {
        // Nothing before 03:00, so slots 0..=2 borrow the 03:00 rate.
        let profile = BasalProfile::from_samples(&[
            RateSample::new(3 * 3600, 0.9),
            RateSample::new(20 * 3600, 0.4),
        ])
        .unwrap();
        assert_eq!(&profile.rates()[0..4], &[0.9, 0.9, 0.9, 0.9]);
        assert_eq!(profile.rates()[19], 0.9);
        assert_eq!(profile.rates()[20], 0.4);
        assert_eq!(profile.rates()[23], 0.4);
    }

    #[test]
    fn test_from_samples_averages_within_slot() {
        let profile = BasalProfile::from_samples(&[
            RateSample::new(0, 1.0),
            RateSample::new(1800, 2.0),
            RateSample::new(3599, 3.0),
        ])
        .unwrap();
        assert!((profile.rates()[0] - 2.0).abs() < 1e-9);
        assert!((profile.rates()[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_samples_duplicates_average_to_themselves() {
        let profile = BasalProfile::from_samples(&[
            RateSample::new(0, 0.8),
            RateSample::new(0, 0.8),
        ])
        .unwrap();
        assert!((profile.rates()[0] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_from_samples_ignores_samples_past_midnight() {
        let profile = BasalProfile::from_samples(&[
            RateSample::new(0, 1.0),
            RateSample::new(86_400, 9.0),
        ])
        .unwrap();
        assert_eq!(profile.rates()[23], 1.0);
    }

    // ── lookups and scores ───────────────────────────────────────────────────

    #[test]
    fn test_rate_at_second_clamps() {
        let mut rates = [1.0; 24];
        rates[23] = 4.0;
        let profile = BasalProfile::new(rates);
        assert_eq!(profile.rate_at_second(86_399), 4.0);
        assert_eq!(profile.rate_at_second(100_000), 4.0);
    }

    #[test]
    fn test_rate_at_uses_local_hour() {
        let mut rates = [0.0; 24];
        rates[0] = 1.5;
        rates[23] = 0.5;
        let profile = BasalProfile::new(rates);
        let ts = Utc.with_ymd_and_hms(2019, 3, 1, 23, 30, 0).unwrap();
        assert_eq!(profile.rate_at(ts, Tz::UTC), 0.5);
        assert_eq!(profile.rate_at(ts, Tz::Europe__Berlin), 1.5);
    }

    #[test]
    fn test_daily_amount() {
        let profile = BasalProfile::new([0.5; 24]);
        assert!((profile.daily_amount() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_change_count_counts_from_zero() {
        assert_eq!(BasalProfile::new([0.0; 24]).change_count(), 0);
        assert_eq!(BasalProfile::new([0.5; 24]).change_count(), 1);

        let mut rates = [0.5; 24];
        rates[6] = 0.8;
        rates[7] = 0.8;
        rates[8] = 0.5;
        assert_eq!(BasalProfile::new(rates).change_count(), 3);
    }

    #[test]
    fn test_named_profile() {
        let profile = BasalProfile::new([1.0; 24]).with_name("Weekend");
        assert_eq!(profile.name(), Some("Weekend"));
        assert_eq!(BasalProfile::named("Default", [1.0; 24]).name(), Some("Default"));
    }
}
