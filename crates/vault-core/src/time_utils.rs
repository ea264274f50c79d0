use chrono::{DateTime, DurationRound, TimeDelta, Timelike, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{Result, VaultError};

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Uses the `iana-time-zone` crate directly – no subprocess calls.
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Resolve a timezone setting into a [`Tz`].
///
/// `"auto"` means the system timezone. Unknown names are a configuration
/// error rather than a silent fallback, since every hour-of-day lookup in an
/// import depends on it.
pub fn resolve_timezone(name: &str) -> Result<Tz> {
    let name = if name.eq_ignore_ascii_case("auto") {
        get_system_timezone()
    } else {
        name.to_string()
    };
    name.parse::<Tz>()
        .map_err(|_| VaultError::Config(format!("unknown timezone {}", name)))
}

// ── Minute / hour arithmetic ──────────────────────────────────────────────────

/// Drop seconds and sub-second precision.
pub fn truncate_to_minute(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.duration_trunc(TimeDelta::minutes(1)).unwrap_or(ts)
}

/// The first full local hour at or after `ts`.
///
/// A timestamp already sitting on an hour boundary is returned unchanged.
pub fn next_full_hour(ts: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local = ts.with_timezone(&tz);
    let floor = local.duration_trunc(TimeDelta::hours(1)).unwrap_or(local);
    if floor == local {
        ts
    } else {
        (floor + TimeDelta::hours(1)).with_timezone(&Utc)
    }
}

/// Seconds elapsed since local midnight, in `[0, 86399]`.
pub fn seconds_of_day(ts: DateTime<Utc>, tz: Tz) -> u32 {
    ts.with_timezone(&tz).num_seconds_from_midnight()
}

/// Absolute distance between two timestamps in whole minutes.
pub fn whole_minutes_between(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
    (b - a).num_minutes().abs()
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Parses export timestamps, interpreting offset-less values in a fixed zone.
#[derive(Debug, Clone, Copy)]
pub struct TimezoneHandler {
    default_tz: Tz,
}

impl TimezoneHandler {
    pub fn new(default_tz: Tz) -> Self {
        Self { default_tz }
    }

    /// Parse an ISO 8601 timestamp string into a UTC [`DateTime`].
    ///
    /// Accepts RFC 3339 (`Z` suffix or `+hh:mm`), compact offsets
    /// (`+hhmm`), and naive date-times which are read as local time in the
    /// handler's zone. Returns `None` for empty or unrecognised strings.
    pub fn parse_timestamp(&self, s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }

        const OFFSET_FMTS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f%z",
            "%Y-%m-%dT%H:%M:%S%z",
            "%Y-%m-%dT%H:%M%z",
        ];
        for fmt in OFFSET_FMTS {
            if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
                return Some(dt.with_timezone(&Utc));
            }
        }

        const NAIVE_FMTS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
        ];
        for fmt in NAIVE_FMTS {
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
                use chrono::TimeZone as _;
                // Ambiguous local times (DST fold) resolve to the earlier instant.
                if let Some(dt) = self.default_tz.from_local_datetime(&naive).earliest() {
                    return Some(dt.with_timezone(&Utc));
                }
            }
        }

        warn!("TimezoneHandler: could not parse timestamp \"{}\"", s);
        None
    }

    /// Convert epoch milliseconds into a UTC [`DateTime`].
    pub fn from_epoch_millis(&self, millis: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(millis)
    }
}

impl Default for TimezoneHandler {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
