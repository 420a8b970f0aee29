use crate::math::stats::StatsHelper;
use crate::prelude::{Calibration, DistanceThresholds};
use crate::sensor::{CalibratedSample, Detection, Timestamp};

/// Reason a detection was kept out of aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    BelowRange,
    AboveRange,
    NonFinite,
    /// Calibration or thresholds slipped past validation.
    InvalidParameters,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOutcome {
    Accepted(CalibratedSample),
    Rejected(Rejection),
}

impl FilterOutcome {
    pub fn accepted(self) -> Option<CalibratedSample> {
        match self {
            FilterOutcome::Accepted(sample) => Some(sample),
            FilterOutcome::Rejected(_) => None,
        }
    }
}

/// Gates a detection on distance and applies the linear speed correction.
/// Both distance bounds are inclusive.
pub fn filter(
    detection: &Detection,
    calibration: &Calibration,
    thresholds: &DistanceThresholds,
    now: Timestamp,
) -> FilterOutcome {
    if !calibration.is_valid() || !thresholds.is_valid() {
        return FilterOutcome::Rejected(Rejection::InvalidParameters);
    }
    if !detection.speed.is_finite() || !detection.distance.is_finite() {
        return FilterOutcome::Rejected(Rejection::NonFinite);
    }
    if detection.distance < thresholds.low {
        return FilterOutcome::Rejected(Rejection::BelowRange);
    }
    if detection.distance > thresholds.high {
        return FilterOutcome::Rejected(Rejection::AboveRange);
    }

    let calibrated_speed =
        StatsHelper::round_tenth(detection.speed * calibration.slope + calibration.offset);

    FilterOutcome::Accepted(CalibratedSample {
        target_id: detection.target_id,
        timestamp: now,
        calibrated_speed,
        distance: detection.distance,
    })
}
