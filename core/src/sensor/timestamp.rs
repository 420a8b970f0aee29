use chrono::{Local, TimeZone};
use serde::{Serialize, Serializer};
use std::fmt;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Wall-clock arrival time with one-second resolution, stored as epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }

    /// Whole seconds elapsed since `earlier`; negative if `earlier` lies ahead.
    pub fn seconds_since(&self, earlier: Timestamp) -> i64 {
        self.0 - earlier.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Local.timestamp_opt(self.0, 0).single() {
            Some(local) => write!(f, "{}", local.format(DISPLAY_FORMAT)),
            None => write!(f, "{}", self.0),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
