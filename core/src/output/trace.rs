use crate::output::open_append;
use crate::prelude::OutputError;
use crate::sensor::{Detection, Timestamp};
use std::io::Write;
use std::path::PathBuf;

/// Live stream of raw detections, echoed to the console and/or appended to
/// a trace file. Both outputs are optional and independent.
pub struct TraceSink {
    console: bool,
    file: Option<PathBuf>,
}

impl TraceSink {
    pub fn new(console: bool, file: Option<PathBuf>) -> Self {
        Self { console, file }
    }

    pub fn disabled() -> Self {
        Self::new(false, None)
    }

    pub fn is_enabled(&self) -> bool {
        self.console || self.file.is_some()
    }

    pub fn format_line(timestamp: Timestamp, detection: &Detection) -> String {
        format!("{} {}", timestamp, detection)
    }

    pub fn write_trace(
        &mut self,
        timestamp: Timestamp,
        detection: &Detection,
    ) -> Result<(), OutputError> {
        if !self.is_enabled() {
            return Ok(());
        }
        let line = Self::format_line(timestamp, detection);
        if self.console {
            println!("{}", line);
        }
        if let Some(path) = &self.file {
            let mut file = open_append(path)?;
            writeln!(file, "{}", line).map_err(|source| OutputError::Io {
                path: path.display().to_string(),
                source,
            })?;
        }
        Ok(())
    }
}
