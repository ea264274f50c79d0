//! Detection of recording gaps in a sorted entry stream.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use vault_core::models::MeasurementEntry;
use vault_core::settings::DEFAULT_GAP_THRESHOLD_MINUTES;
use vault_core::time_utils::whole_minutes_between;

/// Span between two consecutive entries that are too far apart to assume the
/// device kept running in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeGap {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Finds [`TimeGap`]s between adjacent entries.
#[derive(Debug, Clone, Copy)]
pub struct GapDetector {
    threshold_minutes: i64,
}

impl GapDetector {
    pub fn new(threshold_minutes: i64) -> Self {
        Self { threshold_minutes }
    }

    /// Every adjacent pair of `entries` at least the threshold apart, in
    /// order. `entries` must be sorted ascending by timestamp.
    ///
    /// Strictly pairwise: consecutive gaps are not merged.
    pub fn detect(&self, entries: &[MeasurementEntry]) -> Vec<TimeGap> {
        let gaps: Vec<TimeGap> = entries
            .windows(2)
            .filter_map(|pair| {
                let (start, end) = (pair[0].timestamp(), pair[1].timestamp());
                (whole_minutes_between(start, end) >= self.threshold_minutes)
                    .then_some(TimeGap { start, end })
            })
            .collect();

        debug!(
            entries = entries.len(),
            gaps = gaps.len(),
            threshold_minutes = self.threshold_minutes,
            "detected gaps"
        );
        gaps
    }

    /// The spans between `first` and `last` not covered by `gaps`: the head
    /// before the first gap, every span between gaps, and the tail after the
    /// last one.
    pub fn covered_spans(
        first: DateTime<Utc>,
        last: DateTime<Utc>,
        gaps: &[TimeGap],
    ) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        let mut spans = Vec::with_capacity(gaps.len() + 1);
        let mut start = first;
        for gap in gaps {
            spans.push((start, gap.start));
            start = gap.end;
        }
        spans.push((start, last));
        spans
    }
}

impl Default for GapDetector {
    fn default() -> Self {
        Self::new(DEFAULT_GAP_THRESHOLD_MINUTES)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
