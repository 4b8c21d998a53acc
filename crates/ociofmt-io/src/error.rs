//! Error types for decoder operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Decoder error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No registered decoder recognizes the file.
    #[error("no decoder for {}", path.display())]
    NoDecoder {
        /// File that was probed.
        path: PathBuf,
    },

    /// The file is of a known kind but uses a variant we cannot read.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Corrupt or truncated data.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// Unsupported bit depth.
    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(String),

    /// A decode buffer could not be allocated.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// The handle was already decoded or closed.
    #[error("invalid handle: {0}")]
    InvalidHandle(String),
}

impl From<ociofmt_core::Error> for IoError {
    fn from(e: ociofmt_core::Error) -> Self {
        IoError::DecodeError(e.to_string())
    }
}

/// Result type for decoder operations.
pub type IoResult<T> = Result<T, IoError>;
