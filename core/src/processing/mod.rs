pub mod calibration;
pub mod summary;
pub mod window;

pub use calibration::{filter, FilterOutcome, Rejection};
pub use summary::Summary;
pub use window::{Window, WindowAggregator, STALE_AFTER_SECS};
