//! Error types for configuration parsing and processor construction.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for color operations.
pub type ColorResult<T> = Result<T, ColorError>;

/// Errors that can occur while loading a configuration or building processors.
#[derive(Debug, Error)]
pub enum ColorError {
    /// I/O error reading config or writing LUT files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config YAML could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// Config file not found.
    #[error("config file not found: {path}")]
    ConfigNotFound {
        /// Path that was searched.
        path: PathBuf,
    },

    /// Invalid config version.
    #[error("unsupported config version: {version} (supported: 1.x, 2.x)")]
    UnsupportedVersion {
        /// Version string from config.
        version: String,
    },

    /// Color space not found in config.
    #[error("color space not found: {name}")]
    ColorSpaceNotFound {
        /// Name of the missing color space.
        name: String,
    },

    /// Role not defined in config.
    #[error("role not defined: {role}")]
    RoleNotDefined {
        /// Name of the undefined role.
        role: String,
    },

    /// Display not found in config.
    #[error("display not found: {name}")]
    DisplayNotFound {
        /// Name of the missing display.
        name: String,
    },

    /// View not found for display.
    #[error("view '{view}' not found for display '{display}'")]
    ViewNotFound {
        /// Display name.
        display: String,
        /// View name.
        view: String,
    },

    /// Invalid transform definition.
    #[error("invalid transform: {reason}")]
    InvalidTransform {
        /// Description of what's wrong.
        reason: String,
    },

    /// General validation error.
    #[error("validation error: {0}")]
    Validation(String),
}

impl ColorError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidTransform {
            reason: reason.into(),
        }
    }
}
