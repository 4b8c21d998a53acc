//! CLI command implementations

pub mod import;
pub mod preview;
pub mod roles;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use ociofmt_color::{ColorConfig, Config, ShaderMode};
use ociofmt_plugin::PluginSettings;

/// Loads the color configuration: explicit path, then `$OCIO`, then built-in.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::from_env_or_builtin(path).with_context(|| match path {
        Some(p) => format!("Failed to load config: {}", p.display()),
        None => "Failed to load config from $OCIO".to_string(),
    })
}

/// Same as [`load_config`], shared for the resolver.
pub fn load_config_arc(path: Option<&Path>) -> Result<Arc<dyn ColorConfig>> {
    Ok(Arc::new(load_config(path)?))
}

/// Loads plugin settings, or the defaults.
pub fn load_settings(path: Option<&Path>) -> Result<PluginSettings> {
    match path {
        Some(p) => PluginSettings::from_file(p)
            .with_context(|| format!("Failed to load settings: {}", p.display())),
        None => Ok(PluginSettings::default()),
    }
}

/// Parses a shader mode name.
pub fn parse_mode(name: &str) -> Result<ShaderMode> {
    match name.to_ascii_lowercase().as_str() {
        "lut3d" | "lut" => Ok(ShaderMode::Lut3d),
        "analytic" => Ok(ShaderMode::Analytic),
        other => bail!("Unknown shader mode '{}' (expected lut3d or analytic)", other),
    }
}

/// Format byte count for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
