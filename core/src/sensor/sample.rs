use crate::sensor::{TargetId, Timestamp};

/// Detection that passed the distance gate, with its speed calibrated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibratedSample {
    pub target_id: TargetId,
    pub timestamp: Timestamp,
    pub calibrated_speed: f64,
    pub distance: f64,
}
