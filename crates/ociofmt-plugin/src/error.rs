//! Import error taxonomy.
//!
//! Every failure of a protocol step lands in one of these categories and
//! maps to a host [`ResultCode`]. Only [`ImportError::ShaderBuildFailure`]
//! is recoverable; it never reaches the host.

use ociofmt_color::ColorError;
use ociofmt_io::IoError;
use ociofmt_preview::PreviewError;
use thiserror::Error;

use crate::host::ResultCode;

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Error raised by a step of the import.
#[derive(Debug, Error)]
pub enum ImportError {
    /// No decoder, open or decode failure, or role selection cancelled.
    #[error("cannot read: {0}")]
    CannotRead(String),

    /// A host or internal buffer could not be allocated.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// A step was invoked without the session state it needs.
    #[error("bad parameters: {0}")]
    BadParameters(String),

    /// The host lacks a required callback or capability.
    #[error("host insufficient: {0}")]
    HostInsufficientCapability(String),

    /// A role or display is not defined by the configuration.
    #[error("transform unavailable: {0}")]
    TransformUnavailable(String),

    /// Conversion to a sample width the host does not take.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Preview shader compile or link failed.
    #[error("shader build failed: {0}")]
    ShaderBuildFailure(String),
}

impl ImportError {
    /// Host result code for this error.
    pub fn result_code(&self) -> ResultCode {
        match self {
            Self::CannotRead(_) | Self::TransformUnavailable(_) => ResultCode::CannotRead,
            Self::OutOfMemory(_) => ResultCode::MemFull,
            Self::BadParameters(_) | Self::UnsupportedFormat(_) => ResultCode::BadParameters,
            Self::HostInsufficientCapability(_) => ResultCode::HostInsufficient,
            // recovered inside the preview, reported as a read failure if it escapes
            Self::ShaderBuildFailure(_) => ResultCode::CannotRead,
        }
    }
}

impl From<IoError> for ImportError {
    fn from(e: IoError) -> Self {
        match e {
            IoError::OutOfMemory(msg) => Self::OutOfMemory(msg),
            other => Self::CannotRead(other.to_string()),
        }
    }
}

impl From<ColorError> for ImportError {
    fn from(e: ColorError) -> Self {
        Self::TransformUnavailable(e.to_string())
    }
}

impl From<ociofmt_core::Error> for ImportError {
    fn from(e: ociofmt_core::Error) -> Self {
        match e {
            ociofmt_core::Error::UnsupportedFormat { format } => Self::UnsupportedFormat(format),
            other => Self::BadParameters(other.to_string()),
        }
    }
}

impl From<PreviewError> for ImportError {
    fn from(e: PreviewError) -> Self {
        match e {
            PreviewError::ShaderBuildFailure { stage, log } => {
                Self::ShaderBuildFailure(format!("{stage}: {log}"))
            }
            PreviewError::Lut(e) => e.into(),
            PreviewError::Buffer(e) => e.into(),
            PreviewError::UnsupportedImage { channels } => {
                Self::UnsupportedFormat(format!("{channels}-channel preview"))
            }
            PreviewError::Device(msg) => Self::HostInsufficientCapability(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn codes() {
        let e: ImportError = IoError::NoDecoder {
            path: PathBuf::from("x.bin"),
        }
        .into();
        assert_eq!(e.result_code(), ResultCode::CannotRead);
        assert_eq!(
            ImportError::OutOfMemory("host buffer".into()).result_code(),
            ResultCode::MemFull
        );
        assert_eq!(
            ImportError::HostInsufficientCapability("advanceState".into()).result_code(),
            ResultCode::HostInsufficient
        );
    }

    #[test]
    fn decoder_allocation_failure_is_out_of_memory() {
        let e: ImportError = IoError::OutOfMemory("480000000000 bytes".into()).into();
        assert_eq!(e.result_code(), ResultCode::MemFull);
    }

    #[test]
    fn conversion_errors_keep_category() {
        let e: ImportError = ociofmt_core::Error::unsupported("f16").into();
        assert!(matches!(e, ImportError::UnsupportedFormat(ref f) if f == "f16"));

        let e: ImportError = ColorError::RoleNotDefined {
            role: "matte_paint".into(),
        }
        .into();
        assert!(matches!(e, ImportError::TransformUnavailable(_)));
    }
}
