use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error conditions reported by the editing engine.
///
/// Every variant is recoverable: the operation that produced it leaves the
/// session, canvas and undo history exactly as they were.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("invalid color {0:?}: expected exactly 4 hex digits")]
    InvalidColor(String),
    #[error("invalid dimensions {0}: width and height must be positive")]
    InvalidDimensions(String),
    #[error("invalid offset {text:?}: {reason}")]
    InvalidOffset { text: String, reason: String },
    #[error("offset {offset:#010x} exceeds file size {file_size}")]
    OffsetExceedsFile { offset: u64, file_size: u64 },
    #[error("no image data loaded")]
    NoData,
    #[error("data length mismatch: loaded {expected} bytes but buffer holds {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("nothing to undo")]
    Empty,
    #[error("error loading {}: {source}", path.display())]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("error saving {}: {source}", path.display())]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("error injecting into {}: {source}", path.display())]
    InjectFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T, E = EditError> = std::result::Result<T, E>;
