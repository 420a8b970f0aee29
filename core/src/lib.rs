//! Detection-consumption core for the rear-view radar recorder.
//!
//! Decoded detections enter through an [`IngressHandle`], are stamped,
//! distance-gated and calibrated, then grouped per target until the target
//! has been quiet for more than ten seconds. Each closed session is written
//! as one JSON line.

pub mod math;
pub mod output;
pub mod pipeline;
pub mod prelude;
pub mod processing;
pub mod sensor;
pub mod telemetry;

pub use pipeline::{IngressHandle, Pipeline, PipelineDriver};
pub use prelude::{Calibration, DistanceThresholds, PipelineSettings};
pub use sensor::{Detection, TargetId};
