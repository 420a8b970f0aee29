pub mod detection;
pub mod sample;
pub mod timestamp;

pub use detection::{Detection, TargetId};
pub use sample::CalibratedSample;
pub use timestamp::Timestamp;
