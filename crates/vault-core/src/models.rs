use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils::truncate_to_minute;

// ── EntryKind ─────────────────────────────────────────────────────────────────

/// Closed set of measurement kinds known to the vault.
///
/// Consumers match on this enum without wildcard arms so that adding a kind
/// is a compile error everywhere it matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    // Bolus
    BolusNormal,
    BolusSquare,
    // Basal
    BasalProfile,
    BasalTemp,
    // Exercise
    ExerciseManual,
    ExerciseOther,
    ExerciseLow,
    ExerciseMid,
    ExerciseHigh,
    // Glucose
    GlucoseCgm,
    GlucoseCgmRaw,
    GlucoseCgmAlert,
    GlucoseCgmCalibration,
    GlucoseBg,
    GlucoseBgManual,
    GlucoseBolusCalculation,
    // Meal
    MealBolusCalculator,
    MealManual,
    // CGM system
    CgmSensorStart,
    CgmSensorFinished,
    CgmConnectionError,
    CgmCalibrationError,
    CgmTimeSync,
    // Pump events
    PumpRewind,
    PumpPrime,
    PumpFill,
    PumpNoDelivery,
    PumpSuspend,
    PumpAutonomousSuspend,
    PumpUnsuspend,
    PumpUntrackedError,
    PumpReservoirEmpty,
    PumpTimeSync,
    PumpCgmPrediction,
    // Sleep
    SleepLight,
    SleepRem,
    SleepDeep,
    // Body
    HeartRate,
    HeartRateVariability,
    Stress,
    Weight,
    KetonesBlood,
    KetonesUrine,
    // Location
    LocTransition,
    LocHome,
    LocWork,
    LocFood,
    LocSports,
    LocOther,
    // Misc
    BloodPressure,
    Tag,
    RefinedVaultEntry,
}

/// The type a kind's value extension must have, if it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionShape {
    /// Duration in minutes.
    Duration,
    /// A second numeric reading (e.g. diastolic pressure).
    Number,
    /// A secondary point in time.
    Timestamp,
    /// Free text.
    Text,
}

impl EntryKind {
    /// Every kind, in declaration order.
    pub const ALL: [EntryKind; 52] = [
        EntryKind::BolusNormal,
        EntryKind::BolusSquare,
        EntryKind::BasalProfile,
        EntryKind::BasalTemp,
        EntryKind::ExerciseManual,
        EntryKind::ExerciseOther,
        EntryKind::ExerciseLow,
        EntryKind::ExerciseMid,
        EntryKind::ExerciseHigh,
        EntryKind::GlucoseCgm,
        EntryKind::GlucoseCgmRaw,
        EntryKind::GlucoseCgmAlert,
        EntryKind::GlucoseCgmCalibration,
        EntryKind::GlucoseBg,
        EntryKind::GlucoseBgManual,
        EntryKind::GlucoseBolusCalculation,
        EntryKind::MealBolusCalculator,
        EntryKind::MealManual,
        EntryKind::CgmSensorStart,
        EntryKind::CgmSensorFinished,
        EntryKind::CgmConnectionError,
        EntryKind::CgmCalibrationError,
        EntryKind::CgmTimeSync,
        EntryKind::PumpRewind,
        EntryKind::PumpPrime,
        EntryKind::PumpFill,
        EntryKind::PumpNoDelivery,
        EntryKind::PumpSuspend,
        EntryKind::PumpAutonomousSuspend,
        EntryKind::PumpUnsuspend,
        EntryKind::PumpUntrackedError,
        EntryKind::PumpReservoirEmpty,
        EntryKind::PumpTimeSync,
        EntryKind::PumpCgmPrediction,
        EntryKind::SleepLight,
        EntryKind::SleepRem,
        EntryKind::SleepDeep,
        EntryKind::HeartRate,
        EntryKind::HeartRateVariability,
        EntryKind::Stress,
        EntryKind::Weight,
        EntryKind::KetonesBlood,
        EntryKind::KetonesUrine,
        EntryKind::LocTransition,
        EntryKind::LocHome,
        EntryKind::LocWork,
        EntryKind::LocFood,
        EntryKind::LocSports,
        EntryKind::LocOther,
        EntryKind::BloodPressure,
        EntryKind::Tag,
        EntryKind::RefinedVaultEntry,
    ];

    /// Canonical upper-case name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::BolusNormal => "BOLUS_NORMAL",
            EntryKind::BolusSquare => "BOLUS_SQUARE",
            EntryKind::BasalProfile => "BASAL_PROFILE",
            EntryKind::BasalTemp => "BASAL_TEMP",
            EntryKind::ExerciseManual => "EXERCISE_MANUAL",
            EntryKind::ExerciseOther => "EXERCISE_OTHER",
            EntryKind::ExerciseLow => "EXERCISE_LOW",
            EntryKind::ExerciseMid => "EXERCISE_MID",
            EntryKind::ExerciseHigh => "EXERCISE_HIGH",
            EntryKind::GlucoseCgm => "GLUCOSE_CGM",
            EntryKind::GlucoseCgmRaw => "GLUCOSE_CGM_RAW",
            EntryKind::GlucoseCgmAlert => "GLUCOSE_CGM_ALERT",
            EntryKind::GlucoseCgmCalibration => "GLUCOSE_CGM_CALIBRATION",
            EntryKind::GlucoseBg => "GLUCOSE_BG",
            EntryKind::GlucoseBgManual => "GLUCOSE_BG_MANUAL",
            EntryKind::GlucoseBolusCalculation => "GLUCOSE_BOLUS_CALCULATION",
            EntryKind::MealBolusCalculator => "MEAL_BOLUS_CALCULATOR",
            EntryKind::MealManual => "MEAL_MANUAL",
            EntryKind::CgmSensorStart => "CGM_SENSOR_START",
            EntryKind::CgmSensorFinished => "CGM_SENSOR_FINISHED",
            EntryKind::CgmConnectionError => "CGM_CONNECTION_ERROR",
            EntryKind::CgmCalibrationError => "CGM_CALIBRATION_ERROR",
            EntryKind::CgmTimeSync => "CGM_TIME_SYNC",
            EntryKind::PumpRewind => "PUMP_REWIND",
            EntryKind::PumpPrime => "PUMP_PRIME",
            EntryKind::PumpFill => "PUMP_FILL",
            EntryKind::PumpNoDelivery => "PUMP_NO_DELIVERY",
            EntryKind::PumpSuspend => "PUMP_SUSPEND",
            EntryKind::PumpAutonomousSuspend => "PUMP_AUTONOMOUS_SUSPEND",
            EntryKind::PumpUnsuspend => "PUMP_UNSUSPEND",
            EntryKind::PumpUntrackedError => "PUMP_UNTRACKED_ERROR",
            EntryKind::PumpReservoirEmpty => "PUMP_RESERVOIR_EMPTY",
            EntryKind::PumpTimeSync => "PUMP_TIME_SYNC",
            EntryKind::PumpCgmPrediction => "PUMP_CGM_PREDICTION",
            EntryKind::SleepLight => "SLEEP_LIGHT",
            EntryKind::SleepRem => "SLEEP_REM",
            EntryKind::SleepDeep => "SLEEP_DEEP",
            EntryKind::HeartRate => "HEART_RATE",
            EntryKind::HeartRateVariability => "HEART_RATE_VARIABILITY",
            EntryKind::Stress => "STRESS",
            EntryKind::Weight => "WEIGHT",
            EntryKind::KetonesBlood => "KETONES_BLOOD",
            EntryKind::KetonesUrine => "KETONES_URINE",
            EntryKind::LocTransition => "LOC_TRANSITION",
            EntryKind::LocHome => "LOC_HOME",
            EntryKind::LocWork => "LOC_WORK",
            EntryKind::LocFood => "LOC_FOOD",
            EntryKind::LocSports => "LOC_SPORTS",
            EntryKind::LocOther => "LOC_OTHER",
            EntryKind::BloodPressure => "BLOOD_PRESSURE",
            EntryKind::Tag => "TAG",
            EntryKind::RefinedVaultEntry => "REFINED_VAULT_ENTRY",
        }
    }

    /// Whether the numeric value is meaningful for this kind.
    ///
    /// Pure event markers (sensor start, pump rewind, ...) carry no value and
    /// are exported without one.
    pub fn carries_value(self) -> bool {
        use EntryKind::*;
        match self {
            CgmSensorStart | CgmSensorFinished | CgmConnectionError | CgmCalibrationError
            | CgmTimeSync | PumpRewind | PumpFill | PumpNoDelivery | PumpUnsuspend
            | PumpReservoirEmpty | PumpTimeSync | Tag => false,
            BolusNormal | BolusSquare | BasalProfile | BasalTemp | ExerciseManual
            | ExerciseOther | ExerciseLow | ExerciseMid | ExerciseHigh | GlucoseCgm
            | GlucoseCgmRaw | GlucoseCgmAlert | GlucoseCgmCalibration | GlucoseBg
            | GlucoseBgManual | GlucoseBolusCalculation | MealBolusCalculator | MealManual
            | PumpPrime | PumpSuspend | PumpAutonomousSuspend | PumpUntrackedError
            | PumpCgmPrediction | SleepLight | SleepRem | SleepDeep | HeartRate
            | HeartRateVariability | Stress | Weight | KetonesBlood | KetonesUrine
            | LocTransition | LocHome | LocWork | LocFood | LocSports | LocOther
            | BloodPressure | RefinedVaultEntry => true,
        }
    }

    /// The value-extension type this kind uses, if any.
    pub fn extension_shape(self) -> Option<ExtensionShape> {
        use EntryKind::*;
        match self {
            BolusSquare | BasalTemp => Some(ExtensionShape::Duration),
            BloodPressure => Some(ExtensionShape::Number),
            CgmTimeSync | PumpTimeSync => Some(ExtensionShape::Timestamp),
            Tag => Some(ExtensionShape::Text),
            BolusNormal | BasalProfile | ExerciseManual | ExerciseOther | ExerciseLow
            | ExerciseMid | ExerciseHigh | GlucoseCgm | GlucoseCgmRaw | GlucoseCgmAlert
            | GlucoseCgmCalibration | GlucoseBg | GlucoseBgManual | GlucoseBolusCalculation
            | MealBolusCalculator | MealManual | CgmSensorStart | CgmSensorFinished
            | CgmConnectionError | CgmCalibrationError | PumpRewind | PumpPrime | PumpFill
            | PumpNoDelivery | PumpSuspend | PumpAutonomousSuspend | PumpUnsuspend
            | PumpUntrackedError | PumpReservoirEmpty | PumpCgmPrediction | SleepLight
            | SleepRem | SleepDeep | HeartRate | HeartRateVariability | Stress | Weight
            | KetonesBlood | KetonesUrine | LocTransition | LocHome | LocWork | LocFood
            | LocSports | LocOther | RefinedVaultEntry => None,
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ValueExtension ────────────────────────────────────────────────────────────

/// Secondary payload attached to some entry kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "shape", content = "value")]
pub enum ValueExtension {
    /// Duration in minutes (temporary basal, square bolus).
    Duration(f64),
    /// Secondary numeric reading.
    Number(f64),
    /// Secondary timestamp, minute resolution.
    Timestamp(DateTime<Utc>),
    /// Free text.
    Text(String),
}

impl ValueExtension {
    pub fn shape(&self) -> ExtensionShape {
        match self {
            ValueExtension::Duration(_) => ExtensionShape::Duration,
            ValueExtension::Number(_) => ExtensionShape::Number,
            ValueExtension::Timestamp(_) => ExtensionShape::Timestamp,
            ValueExtension::Text(_) => ExtensionShape::Text,
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            ValueExtension::Duration(v) | ValueExtension::Number(v) => serde_json::json!(v),
            ValueExtension::Timestamp(ts) => serde_json::json!(ts.timestamp_millis()),
            ValueExtension::Text(s) => serde_json::json!(s),
        }
    }
}

// ── MeasurementEntry ──────────────────────────────────────────────────────────

/// One typed, timestamped data point.
///
/// Fields are private; an entry cannot change after construction. Timestamps
/// are truncated to the minute on the way in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementEntry {
    /// Device or generator that produced the value (e.g. a CGM uploader id).
    origin: String,
    /// Export service the value was imported from.
    source: String,
    kind: EntryKind,
    timestamp: DateTime<Utc>,
    value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_extension: Option<ValueExtension>,
}

impl MeasurementEntry {
    pub fn new(
        origin: impl Into<String>,
        source: impl Into<String>,
        kind: EntryKind,
        timestamp: DateTime<Utc>,
        value: f64,
    ) -> Self {
        Self {
            origin: origin.into(),
            source: source.into(),
            kind,
            timestamp: truncate_to_minute(timestamp),
            value,
            value_extension: None,
        }
    }

    /// Builder-style attachment of a value extension.
    ///
    /// Timestamp extensions are truncated to the minute like the primary
    /// timestamp.
    pub fn with_extension(mut self, extension: ValueExtension) -> Self {
        let extension = match extension {
            ValueExtension::Timestamp(ts) => ValueExtension::Timestamp(truncate_to_minute(ts)),
            other => other,
        };
        self.value_extension = Some(extension);
        self
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn value_extension(&self) -> Option<&ValueExtension> {
        self.value_extension.as_ref()
    }
}

/// Stable ascending sort by timestamp; equal timestamps keep their order.
pub fn sort_by_timestamp(entries: &mut [MeasurementEntry]) {
    entries.sort_by_key(|e| e.timestamp);
}

/// Remove duplicate entries, keeping the first occurrence of each.
///
/// Two entries are duplicates when origin, source, kind, timestamp, value
/// and extension all match. Floats compare by bit pattern, with `-0.0`
/// folded into `0.0`.
pub fn remove_duplicates(entries: Vec<MeasurementEntry>) -> Vec<MeasurementEntry> {
    let keep: Vec<bool> = {
        let mut seen: HashSet<DedupKey<'_>> = HashSet::with_capacity(entries.len());
        entries.iter().map(|e| seen.insert(DedupKey::of(e))).collect()
    };
    entries
        .into_iter()
        .zip(keep)
        .filter_map(|(entry, keep)| keep.then_some(entry))
        .collect()
}

#[derive(PartialEq, Eq, Hash)]
struct DedupKey<'a> {
    origin: &'a str,
    source: &'a str,
    kind: EntryKind,
    timestamp: DateTime<Utc>,
    value: u64,
    extension: Option<ExtensionKey<'a>>,
}

#[derive(PartialEq, Eq, Hash)]
enum ExtensionKey<'a> {
    Duration(u64),
    Number(u64),
    Timestamp(DateTime<Utc>),
    Text(&'a str),
}

impl<'a> DedupKey<'a> {
    fn of(entry: &'a MeasurementEntry) -> Self {
        let extension = entry.value_extension.as_ref().map(|ext| match ext {
            ValueExtension::Duration(v) => ExtensionKey::Duration(float_bits(*v)),
            ValueExtension::Number(v) => ExtensionKey::Number(float_bits(*v)),
            ValueExtension::Timestamp(ts) => ExtensionKey::Timestamp(*ts),
            ValueExtension::Text(text) => ExtensionKey::Text(text),
        });
        Self {
            origin: &entry.origin,
            source: &entry.source,
            kind: entry.kind,
            timestamp: entry.timestamp,
            value: float_bits(entry.value),
            extension,
        }
    }
}

fn float_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

// ── ExportRecord ──────────────────────────────────────────────────────────────

/// Flat JSON representation of an entry handed to downstream exporters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub origin: String,
    pub source: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Milliseconds since the Unix epoch.
    pub epoch: i64,
    /// RFC 3339 rendering of `epoch` in UTC.
    pub iso_time: String,
    /// Present only for kinds where [`EntryKind::carries_value`] holds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_extension: Option<serde_json::Value>,
}

impl From<&MeasurementEntry> for ExportRecord {
    fn from(entry: &MeasurementEntry) -> Self {
        let kind = entry.kind();
        // Only export an extension whose type matches what the kind declares.
        let value_extension = match (kind.extension_shape(), entry.value_extension()) {
            (Some(shape), Some(ext)) if ext.shape() == shape => Some(ext.to_json()),
            _ => None,
        };
        ExportRecord {
            origin: entry.origin().to_string(),
            source: entry.source().to_string(),
            kind,
            epoch: entry.timestamp().timestamp_millis(),
            iso_time: entry.timestamp().to_rfc3339_opts(SecondsFormat::Secs, true),
            value: kind.carries_value().then_some(entry.value()),
            value_extension,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 3, 1, h, m, s).unwrap()
    }

    // ── EntryKind ────────────────────────────────────────────────────────────

    #[test]
    fn test_all_kinds_are_distinct() {
        let mut names: Vec<&str> = EntryKind::ALL.iter().map(|k| k.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), EntryKind::ALL.len());
    }

    #[test]
    fn test_as_str_matches_serde_name() {
        for kind in EntryKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::json!(kind.as_str()), "kind {:?}", kind);
        }
    }

    #[test]
    fn test_event_markers_carry_no_value() {
        assert!(!EntryKind::PumpRewind.carries_value());
        assert!(!EntryKind::Tag.carries_value());
        assert!(EntryKind::BolusNormal.carries_value());
        assert!(EntryKind::BasalProfile.carries_value());
    }

    #[test]
    fn test_extension_shapes() {
        assert_eq!(
            EntryKind::BasalTemp.extension_shape(),
            Some(ExtensionShape::Duration)
        );
        assert_eq!(
            EntryKind::PumpTimeSync.extension_shape(),
            Some(ExtensionShape::Timestamp)
        );
        assert_eq!(EntryKind::Tag.extension_shape(), Some(ExtensionShape::Text));
        assert_eq!(EntryKind::GlucoseCgm.extension_shape(), None);
    }

    // ── MeasurementEntry ─────────────────────────────────────────────────────

    #[test]
    fn test_new_truncates_seconds() {
        let entry = MeasurementEntry::new("dev", "Nightscout", EntryKind::GlucoseCgm, ts(10, 5, 42), 120.0);
        assert_eq!(entry.timestamp(), ts(10, 5, 0));
    }

    #[test]
    fn test_with_extension_truncates_timestamp_extension() {
        let entry = MeasurementEntry::new("pump", "Nightscout", EntryKind::PumpTimeSync, ts(9, 0, 0), 0.0)
            .with_extension(ValueExtension::Timestamp(ts(9, 1, 30)));
        assert_eq!(
            entry.value_extension(),
            Some(&ValueExtension::Timestamp(ts(9, 1, 0)))
        );
    }

    #[test]
    fn test_equality_is_field_wise() {
        let a = MeasurementEntry::new("dev", "Nightscout", EntryKind::GlucoseCgm, ts(10, 0, 0), 120.0);
        let b = MeasurementEntry::new("dev", "Nightscout", EntryKind::GlucoseCgm, ts(10, 0, 30), 120.0);
        let c = MeasurementEntry::new("dev", "Nightscout", EntryKind::GlucoseCgm, ts(10, 0, 0), 121.0);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_sort_by_timestamp_is_stable() {
        let mut entries = vec![
            MeasurementEntry::new("b", "s", EntryKind::MealManual, ts(11, 0, 0), 1.0),
            MeasurementEntry::new("a", "s", EntryKind::BolusNormal, ts(10, 0, 0), 1.0),
            MeasurementEntry::new("c", "s", EntryKind::BasalProfile, ts(11, 0, 0), 1.0),
        ];
        sort_by_timestamp(&mut entries);
        let origins: Vec<&str> = entries.iter().map(|e| e.origin()).collect();
        assert_eq!(origins, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_remove_duplicates_keeps_first_occurrence() {
        let a = MeasurementEntry::new("dev", "s", EntryKind::GlucoseCgm, ts(10, 0, 0), 100.0);
        let b = MeasurementEntry::new("dev", "s", EntryKind::GlucoseCgm, ts(10, 5, 0), 105.0);
        let deduped = remove_duplicates(vec![a.clone(), b.clone(), a.clone()]);
        assert_eq!(deduped, vec![a, b]);
    }

    #[test]
    fn test_remove_duplicates_compares_extensions() {
        let base = MeasurementEntry::new("pump", "s", EntryKind::BasalTemp, ts(10, 0, 0), 0.8);
        let short = base.clone().with_extension(ValueExtension::Duration(30.0));
        let long = base.clone().with_extension(ValueExtension::Duration(60.0));
        let deduped = remove_duplicates(vec![short.clone(), long.clone(), short.clone(), base.clone()]);
        assert_eq!(deduped, vec![short, long, base]);
    }

    #[test]
    fn test_remove_duplicates_folds_negative_zero() {
        let a = MeasurementEntry::new("dev", "s", EntryKind::BolusNormal, ts(10, 0, 0), 0.0);
        let b = MeasurementEntry::new("dev", "s", EntryKind::BolusNormal, ts(10, 0, 0), -0.0);
        assert_eq!(remove_duplicates(vec![a, b]).len(), 1);
    }

    #[test]
    fn test_remove_duplicates_large_input_keeps_order() {
        // A year of five-minute CGM readings, every one present twice.
        let readings: Vec<MeasurementEntry> = (0..105_120i64)
            .map(|i| {
                MeasurementEntry::new(
                    "dev",
                    "s",
                    EntryKind::GlucoseCgm,
                    ts(0, 0, 0) + chrono::TimeDelta::minutes(5 * i),
                    (i % 300) as f64,
                )
            })
            .collect();
        let mut doubled = readings.clone();
        doubled.extend(readings.iter().cloned());

        let deduped = remove_duplicates(doubled);
        assert_eq!(deduped.len(), readings.len());
        assert_eq!(deduped.first(), readings.first());
        assert_eq!(deduped.last(), readings.last());
    }

    #[test]
    fn test_remove_duplicates_distinguishes_values() {
        let a = MeasurementEntry::new("dev", "s", EntryKind::BolusNormal, ts(10, 0, 0), 1.0);
        let b = MeasurementEntry::new("dev", "s", EntryKind::BolusNormal, ts(10, 0, 0), 2.0);
        assert_eq!(remove_duplicates(vec![a, b]).len(), 2);
    }

    // ── ExportRecord ─────────────────────────────────────────────────────────

    #[test]
    fn test_export_record_temp_basal() {
        let entry = MeasurementEntry::new("unknown", "Nightscout", EntryKind::BasalTemp, ts(8, 30, 0), 0.8)
            .with_extension(ValueExtension::Duration(30.0));
        let json = serde_json::to_value(ExportRecord::from(&entry)).unwrap();
        assert_eq!(json["type"], "BASAL_TEMP");
        assert_eq!(json["isoTime"], "2019-03-01T08:30:00Z");
        assert_eq!(json["epoch"], ts(8, 30, 0).timestamp_millis());
        assert_eq!(json["value"], 0.8);
        assert_eq!(json["valueExtension"], 30.0);
    }

    #[test]
    fn test_export_record_omits_value_for_markers() {
        let entry = MeasurementEntry::new("pump", "Nightscout", EntryKind::PumpRewind, ts(8, 0, 0), 0.0);
        let json = serde_json::to_value(ExportRecord::from(&entry)).unwrap();
        assert!(json.get("value").is_none());
        assert!(json.get("valueExtension").is_none());
    }

    #[test]
    fn test_export_record_drops_mismatched_extension() {
        let entry = MeasurementEntry::new("dev", "Nightscout", EntryKind::GlucoseCgm, ts(8, 0, 0), 99.0)
            .with_extension(ValueExtension::Text("note".to_string()));
        let record = ExportRecord::from(&entry);
        assert!(record.value_extension.is_none());
    }
}
