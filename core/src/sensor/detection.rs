use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier the sensor assigns to a tracked object. Ids are recycled once a
/// target leaves the field of view, so they are only unique per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(pub u32);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TargetId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Decoded radar detection as delivered by the notification feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub target_id: TargetId,
    pub speed: f64,
    pub distance: f64,
}

impl Detection {
    pub fn new(target_id: u32, speed: f64, distance: f64) -> Self {
        Self {
            target_id: TargetId(target_id),
            speed,
            distance,
        }
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Detection(target_id={}, speed={}, distance={})",
            self.target_id, self.speed, self.distance
        )
    }
}
