use anyhow::Context;
use radarcore::prelude::PipelineSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted recorder configuration. Every field is optional on disk; the
/// core refuses to run if calibration or thresholds end up missing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calib_slope: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calib_offset: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dist_low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dist_high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_path: Option<PathBuf>,
}

impl RecorderConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading recorder config {}", path_ref.display()))?;
        let config: RecorderConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing recorder config {}", path_ref.display()))?;
        Ok(config)
    }

    /// A missing file is an empty configuration, not an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path_ref = path.as_ref();
        let contents = serde_yaml::to_string(self).context("serializing recorder config")?;
        fs::write(path_ref, contents)
            .with_context(|| format!("writing recorder config {}", path_ref.display()))
    }

    /// Values set in `overrides` win over the ones loaded from disk.
    pub fn merge(&mut self, overrides: RecorderConfig) {
        self.calib_slope = overrides.calib_slope.or(self.calib_slope);
        self.calib_offset = overrides.calib_offset.or(self.calib_offset);
        self.dist_low = overrides.dist_low.or(self.dist_low);
        self.dist_high = overrides.dist_high.or(self.dist_high);
        self.summary_path = overrides.summary_path.or(self.summary_path.take());
        self.trace_path = overrides.trace_path.or(self.trace_path.take());
    }

    pub fn to_pipeline_settings(&self, print_stream: bool, write_stream: bool) -> PipelineSettings {
        let defaults = PipelineSettings::default();
        PipelineSettings {
            calib_slope: self.calib_slope,
            calib_offset: self.calib_offset,
            dist_low: self.dist_low,
            dist_high: self.dist_high,
            print_stream,
            write_stream,
            summary_path: self.summary_path.clone().unwrap_or(defaults.summary_path),
            trace_path: self.trace_path.clone().unwrap_or(defaults.trace_path),
            poll_interval: defaults.poll_interval,
        }
    }
}
