use crate::math::stats::StatsHelper;
use crate::prelude::{Calibration, DistanceThresholds};
use crate::sensor::{CalibratedSample, TargetId, Timestamp};
use serde::Serialize;

/// Share of the fastest samples discarded before taking the "95% max".
pub const TRIM_FRACTION: f64 = 0.05;

/// Finalized record for one target session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub timestamp: Timestamp,
    pub max: f64,
    #[serde(rename = "95% max")]
    pub p95: f64,
    pub average: f64,
    pub data: Vec<(f64, f64)>,
    pub target_id: TargetId,
    pub calibration: Calibration,
    pub thresholds: DistanceThresholds,
}

impl Summary {
    /// Builds the summary for a closed window. Returns `None` for an empty
    /// sample list; the aggregator never produces one.
    pub fn compute(
        target_id: TargetId,
        samples: &[CalibratedSample],
        calibration: Calibration,
        thresholds: DistanceThresholds,
    ) -> Option<Self> {
        let speeds: Vec<f64> = samples.iter().map(|s| s.calibrated_speed).collect();
        let max = StatsHelper::max(&speeds)?;
        let p95 = StatsHelper::trimmed_max(&speeds, TRIM_FRACTION)?;
        let average = StatsHelper::round_tenth(StatsHelper::mean(&speeds)?);
        let timestamp = samples.iter().map(|s| s.timestamp).min()?;

        Some(Self {
            timestamp,
            max,
            p95,
            average,
            data: samples
                .iter()
                .map(|s| (s.calibrated_speed, s.distance))
                .collect(),
            target_id,
            calibration,
            thresholds,
        })
    }

    pub fn sample_count(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(secs: i64, speed: f64, distance: f64) -> CalibratedSample {
        CalibratedSample {
            target_id: TargetId(1),
            timestamp: Timestamp::from_secs(secs),
            calibrated_speed: speed,
            distance,
        }
    }

    fn summarize(samples: &[CalibratedSample]) -> Summary {
        Summary::compute(
            TargetId(1),
            samples,
            Calibration::default(),
            DistanceThresholds::new(10.0, 100.0),
        )
        .unwrap()
    }

    #[test]
    fn single_sample_collapses_statistics() {
        let summary = summarize(&[sample(0, 31.4, 40.0)]);
        assert_eq!(summary.max, 31.4);
        assert_eq!(summary.p95, 31.4);
        assert_eq!(summary.average, 31.4);
        assert_eq!(summary.sample_count(), 1);
    }

    #[test]
    fn two_samples_average_and_keep_order() {
        let summary = summarize(&[sample(0, 20.0, 50.0), sample(1, 25.0, 60.0)]);
        assert_eq!(summary.max, 25.0);
        assert_eq!(summary.p95, 25.0);
        assert_eq!(summary.average, 22.5);
        assert_eq!(summary.data, vec![(20.0, 50.0), (25.0, 60.0)]);
        assert_eq!(summary.timestamp, Timestamp::from_secs(0));
    }

    #[test]
    fn p95_discards_the_fastest_five_percent() {
        let mut samples: Vec<_> = (0..19).map(|i| sample(i, 30.0, 50.0)).collect();
        samples.push(sample(19, 80.0, 20.0));
        let summary = summarize(&samples);
        assert_eq!(summary.max, 80.0);
        assert_eq!(summary.p95, 30.0);
        assert!(summary.max >= summary.p95);
        assert_eq!(summary.average, 32.5);
    }

    #[test]
    fn timestamp_is_earliest_not_first() {
        let summary = summarize(&[sample(7, 20.0, 50.0), sample(4, 21.0, 50.0)]);
        assert_eq!(summary.timestamp, Timestamp::from_secs(4));
    }

    #[test]
    fn empty_window_yields_nothing() {
        assert!(Summary::compute(
            TargetId(1),
            &[],
            Calibration::default(),
            DistanceThresholds::new(0.0, 255.0)
        )
        .is_none());
    }

    #[test]
    fn serializes_documented_keys() {
        let summary = summarize(&[sample(0, 20.0, 50.0)]);
        let value = serde_json::to_value(&summary).unwrap();
        for key in [
            "timestamp",
            "max",
            "95% max",
            "average",
            "data",
            "target_id",
            "calibration",
            "thresholds",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["data"][0][1], 50.0);
        assert_eq!(value["target_id"], 1);
    }
}
