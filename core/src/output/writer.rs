use crate::output::open_append;
use crate::prelude::OutputError;
use crate::processing::summary::Summary;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Destination for finalized summaries.
pub trait SummarySink {
    fn write_summary(&mut self, summary: &Summary) -> Result<(), OutputError>;
}

/// Appends one JSON object per line. The file is reopened for every record
/// so earlier lines are never touched and a transient failure only costs
/// the record being written.
pub struct JsonlSummaryWriter {
    path: PathBuf,
}

impl JsonlSummaryWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SummarySink for JsonlSummaryWriter {
    fn write_summary(&mut self, summary: &Summary) -> Result<(), OutputError> {
        let mut line = serde_json::to_string(summary)?;
        line.push('\n');
        let mut file = open_append(&self.path)?;
        file.write_all(line.as_bytes())
            .map_err(|source| OutputError::Io {
                path: self.path.display().to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::{Calibration, DistanceThresholds};
    use crate::sensor::{CalibratedSample, TargetId, Timestamp};
    use std::fs;

    fn summary(speed: f64) -> Summary {
        let sample = CalibratedSample {
            target_id: TargetId(2),
            timestamp: Timestamp::from_secs(0),
            calibrated_speed: speed,
            distance: 30.0,
        };
        Summary::compute(
            TargetId(2),
            &[sample],
            Calibration::new(1.0, 0.5),
            DistanceThresholds::new(10.0, 100.0),
        )
        .unwrap()
    }

    #[test]
    fn appends_one_record_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let mut writer = JsonlSummaryWriter::new(&path);

        writer.write_summary(&summary(20.0)).unwrap();
        writer.write_summary(&summary(30.0)).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(first["max"], 20.0);
        assert_eq!(second["95% max"], 30.0);
        assert_eq!(second["calibration"]["offset"], 0.5);
        assert_eq!(second["thresholds"]["high"], 100.0);
    }

    #[test]
    fn keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{\"previous\":true}\n").unwrap();

        JsonlSummaryWriter::new(&path)
            .write_summary(&summary(20.0))
            .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("{\"previous\":true}\n"));
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn unwritable_target_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as an append target.
        let mut writer = JsonlSummaryWriter::new(dir.path());
        assert!(matches!(
            writer.write_summary(&summary(20.0)),
            Err(OutputError::Io { .. })
        ));
    }
}
