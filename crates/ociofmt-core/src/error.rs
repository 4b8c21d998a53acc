//! Error types for metadata and sample conversion.
//!
//! # Usage
//!
//! ```rust
//! use ociofmt_core::{convert_samples, DataFormat, Error};
//!
//! let err = convert_samples(&[0.5], DataFormat::F16, None, None).unwrap_err();
//! assert!(matches!(err, Error::UnsupportedFormat { .. }));
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the metadata model and the sample converter.
#[derive(Debug, Error)]
pub enum Error {
    /// Conversion was requested to a sample width the host cannot take.
    ///
    /// Hosts accept 8-bit, 16-bit and 32-bit float samples only.
    #[error("unsupported sample format: {format}")]
    UnsupportedFormat {
        /// Format name or description
        format: String,
    },

    /// A buffer does not hold the number of elements its metadata implies.
    #[error("buffer size mismatch: expected {expected}, got {actual}")]
    BufferSize {
        /// Expected element count
        expected: usize,
        /// Actual element count
        actual: usize,
    },

    /// Width, height or channel count is zero or overflows buffer arithmetic.
    #[error("invalid dimensions: {width}x{height}x{channels}")]
    InvalidDimensions {
        /// Image width
        width: u32,
        /// Image height
        height: u32,
        /// Channel count
        channels: usize,
    },
}

impl Error {
    /// Shorthand for [`Error::UnsupportedFormat`].
    pub fn unsupported(format: impl std::fmt::Display) -> Self {
        Self::UnsupportedFormat {
            format: format.to_string(),
        }
    }
}
