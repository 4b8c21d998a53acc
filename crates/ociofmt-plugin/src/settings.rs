//! Plugin settings.
//!
//! Read from a YAML file; every field is optional.
//!
//! ```yaml
//! output_role_priority: [texture_paint, matte_paint]
//! lut_edge: 48
//! host_depth: 8
//! shader_mode: analytic
//! config: /studio/ocio/config.ocio
//! ```

use std::path::{Path, PathBuf};

use ociofmt_color::ShaderMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resolve::DEFAULT_OUTPUT_PRIORITY;
use crate::role::Role;

/// Error loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The file could not be read.
    #[error("cannot read settings: {0}")]
    Io(#[from] std::io::Error),
    /// The YAML is malformed.
    #[error("cannot parse settings: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// A value is out of range.
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Tunables of the importer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PluginSettings {
    /// Output roles tried in order when inferring the default output.
    pub output_role_priority: Vec<Role>,
    /// Preview LUT edge length.
    pub lut_edge: usize,
    /// Bits per plane declared to the host at start.
    pub host_depth: u32,
    /// Preview shader flavour.
    pub shader_mode: ShaderMode,
    /// Color config path, overriding `$OCIO`.
    pub config: Option<PathBuf>,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            output_role_priority: DEFAULT_OUTPUT_PRIORITY.to_vec(),
            lut_edge: ociofmt_preview::DEFAULT_LUT_EDGE,
            host_depth: 16,
            shader_mode: ShaderMode::default(),
            config: None,
        }
    }
}

impl PluginSettings {
    /// Parses and validates settings YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !matches!(self.host_depth, 8 | 16 | 32) {
            return Err(SettingsError::Invalid(format!(
                "host_depth must be 8, 16 or 32, got {}",
                self.host_depth
            )));
        }
        if !(2..=129).contains(&self.lut_edge) {
            return Err(SettingsError::Invalid(format!(
                "lut_edge must be within 2..=129, got {}",
                self.lut_edge
            )));
        }
        if self.output_role_priority.contains(&Role::Unknown) {
            return Err(SettingsError::Invalid(
                "output_role_priority cannot list 'unknown'".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let s = PluginSettings::default();
        assert_eq!(
            s.output_role_priority,
            vec![Role::MattePaint, Role::TexturePaint, Role::CompositingLog]
        );
        assert_eq!(s.lut_edge, 32);
        assert_eq!(s.host_depth, 16);
        assert_eq!(s.shader_mode, ShaderMode::Lut3d);
        s.validate().unwrap();
    }

    #[test]
    fn partial_yaml() {
        let s = PluginSettings::from_yaml_str(
            "output_role_priority: [texture_paint, display]\nshader_mode: analytic\n",
        )
        .unwrap();
        assert_eq!(s.output_role_priority, vec![Role::TexturePaint, Role::Display]);
        assert_eq!(s.shader_mode, ShaderMode::Analytic);
        assert_eq!(s.host_depth, 16);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            PluginSettings::from_yaml_str("host_depth: 10"),
            Err(SettingsError::Invalid(_))
        ));
        assert!(matches!(
            PluginSettings::from_yaml_str("lut_edge: 1"),
            Err(SettingsError::Invalid(_))
        ));
        assert!(matches!(
            PluginSettings::from_yaml_str("lut_size: 16"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "host_depth: 8\nconfig: /tmp/config.ocio").unwrap();
        let s = PluginSettings::from_file(f.path()).unwrap();
        assert_eq!(s.host_depth, 8);
        assert_eq!(s.config, Some(PathBuf::from("/tmp/config.ocio")));
    }
}
