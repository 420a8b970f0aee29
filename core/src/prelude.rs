use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const SLOPE_RANGE: (f64, f64) = (-5.0, 5.0);
pub const OFFSET_RANGE: (f64, f64) = (-255.0, 255.0);
pub const DISTANCE_RANGE: (f64, f64) = (0.0, 255.0);

/// Linear correction applied to raw speed readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub slope: f64,
    pub offset: f64,
}

impl Calibration {
    pub fn new(slope: f64, offset: f64) -> Self {
        Self { slope, offset }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("calib_slope", self.slope, SLOPE_RANGE)?;
        check_range("calib_offset", self.offset, OFFSET_RANGE)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new(1.0, 0.0)
    }
}

/// Inclusive distance band a detection must fall into to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceThresholds {
    pub low: f64,
    pub high: f64,
}

impl DistanceThresholds {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("dist_low", self.low, DISTANCE_RANGE)?;
        check_range("dist_high", self.high, DISTANCE_RANGE)?;
        if self.high < self.low {
            return Err(ConfigError::InvertedThresholds {
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    (min, max): (f64, f64),
) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// Scalars handed to the core by the configuration layer. Calibration and
/// threshold values may still be absent at this point.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub calib_slope: Option<f64>,
    pub calib_offset: Option<f64>,
    pub dist_low: Option<f64>,
    pub dist_high: Option<f64>,
    pub print_stream: bool,
    pub write_stream: bool,
    pub summary_path: PathBuf,
    pub trace_path: PathBuf,
    pub poll_interval: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            calib_slope: None,
            calib_offset: None,
            dist_low: None,
            dist_high: None,
            print_stream: false,
            write_stream: false,
            summary_path: PathBuf::from("data.json"),
            trace_path: PathBuf::from("data_stream.txt"),
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl PipelineSettings {
    pub fn resolve(&self) -> Result<ResolvedSettings, ConfigError> {
        let calibration = Calibration::new(
            self.calib_slope.ok_or(ConfigError::Missing("calib_slope"))?,
            self.calib_offset.ok_or(ConfigError::Missing("calib_offset"))?,
        );
        let thresholds = DistanceThresholds::new(
            self.dist_low.ok_or(ConfigError::Missing("dist_low"))?,
            self.dist_high.ok_or(ConfigError::Missing("dist_high"))?,
        );
        calibration.validate()?;
        thresholds.validate()?;

        Ok(ResolvedSettings {
            calibration,
            thresholds,
            print_stream: self.print_stream,
            write_stream: self.write_stream,
            summary_path: self.summary_path.clone(),
            trace_path: self.trace_path.clone(),
            poll_interval: self.poll_interval,
        })
    }
}

/// Fully validated settings the consumer runs with.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub calibration: Calibration,
    pub thresholds: DistanceThresholds,
    pub print_stream: bool,
    pub write_stream: bool,
    pub summary_path: PathBuf,
    pub trace_path: PathBuf,
    pub poll_interval: Duration,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("`{field}` = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("dist_high ({high}) is below dist_low ({low})")]
    InvertedThresholds { low: f64, high: f64 },
}

#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    #[error("i/o failure on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization failure: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
