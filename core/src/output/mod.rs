pub mod trace;
pub mod writer;

pub use trace::TraceSink;
pub use writer::{JsonlSummaryWriter, SummarySink};

use crate::prelude::OutputError;
use std::fs::{self, File, OpenOptions};
use std::path::Path;

/// Opens `path` for appending, creating it and its parent directory as needed.
pub(crate) fn open_append(path: &Path) -> Result<File, OutputError> {
    let io_error = |source| OutputError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_error)
}
