//! Preview error types.

use std::fmt;

use ociofmt_color::ColorError;
use thiserror::Error;

/// Shader build stage that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Fragment shader compilation.
    Compile,
    /// Program linking.
    Link,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Compile => "compile",
            ShaderStage::Link => "link",
        })
    }
}

/// Preview error.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// Shader compile or link failed; the previous bundle is still in place.
    #[error("shader {stage} failed: {log}")]
    ShaderBuildFailure {
        /// Failed stage.
        stage: ShaderStage,
        /// Compiler or linker info log.
        log: String,
    },

    /// The GPU device refused an object operation.
    #[error("GPU device error: {0}")]
    Device(String),

    /// Baking the LUT failed.
    #[error("LUT bake failed: {0}")]
    Lut(#[from] ColorError),

    /// The image cannot be shown as an RGB or RGBA texture.
    #[error("cannot preview an image with {channels} channels")]
    UnsupportedImage {
        /// Channel count of the image.
        channels: usize,
    },

    /// The pixel buffer does not match its metadata.
    #[error(transparent)]
    Buffer(#[from] ociofmt_core::Error),
}

/// Result type for preview operations.
pub type PreviewResult<T> = Result<T, PreviewError>;
