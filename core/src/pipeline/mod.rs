pub mod clock;
pub mod driver;
pub mod queue;

pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::{DriverReport, DriverState, Pipeline, PipelineDriver};
pub use queue::{ingress_channel, IngressHandle, IngressMessage, IngressQueue, Received};
