use std::path::Path;

use anyhow::Context;
use vault_core::models::{ExportRecord, MeasurementEntry};

/// Render entries as a pretty-printed JSON array of [`ExportRecord`]s.
pub fn render(entries: &[MeasurementEntry]) -> anyhow::Result<String> {
    let records: Vec<ExportRecord> = entries.iter().map(ExportRecord::from).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Write rendered entries to `output`, or to stdout when it is `None`.
pub fn write(entries: &[MeasurementEntry], output: Option<&Path>) -> anyhow::Result<()> {
    let rendered = render(entries)?;
    match output {
        Some(path) => std::fs::write(path, rendered + "\n")
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", rendered),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use vault_core::models::{EntryKind, ValueExtension};

    fn sample() -> Vec<MeasurementEntry> {
        let ts = Utc.with_ymd_and_hms(2019, 3, 1, 10, 0, 0).unwrap();
        vec![
            MeasurementEntry::new("xDrip", "Nightscout", EntryKind::GlucoseCgm, ts, 120.0),
            MeasurementEntry::new("pump", "Nightscout", EntryKind::BasalTemp, ts, 0.8)
                .with_extension(ValueExtension::Duration(30.0)),
        ]
    }

    #[test]
    fn test_render_is_json_array_of_records() {
        let json: serde_json::Value = serde_json::from_str(&render(&sample()).unwrap()).unwrap();
        let records = json.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["type"], "GLUCOSE_CGM");
        assert_eq!(records[0]["isoTime"], "2019-03-01T10:00:00Z");
        assert_eq!(records[1]["valueExtension"], 30.0);
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("entries.json");
        write(&sample(), Some(&path)).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing").join("entries.json");
        let err = write(&sample(), Some(&path)).unwrap_err();
        assert!(err.to_string().contains("entries.json"));
    }
}
