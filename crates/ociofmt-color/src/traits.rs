//! The configuration contract the importer depends on.
//!
//! The plugin only ever talks to a color configuration through
//! [`ColorConfig`], so tests can substitute a hand-built config and the
//! YAML [`Config`] stays an implementation detail.

use crate::config::Config;
use crate::error::{ColorError, ColorResult};
use crate::processor::Processor;

/// Read-only view of a color-management configuration.
///
/// # Example
///
/// ```rust,ignore
/// use ociofmt_color::{ColorConfig, Config};
///
/// let config = Config::builtin();
/// let device = config.default_display_device().unwrap();
/// let view = config.default_display_transform(&device).unwrap();
/// let cs = config.display_colorspace(&device, &view)?;
/// ```
pub trait ColorConfig: Send + Sync {
    /// Name of the default display device.
    fn default_display_device(&self) -> Option<String>;

    /// Name of the default view (display transform) for `device`.
    fn default_display_transform(&self, device: &str) -> Option<String>;

    /// Color space a device/transform pair converts to.
    fn display_colorspace(&self, device: &str, transform: &str) -> ColorResult<String>;

    /// Color space defined for `role`, if any.
    fn colorspace_for_role(&self, role: &str) -> Option<String>;

    /// Number of defined roles.
    fn num_roles(&self) -> usize;

    /// Role name at `index`.
    fn role_name(&self, index: usize) -> Option<String>;

    /// Compiles a conversion between two color spaces (or role names).
    fn processor(&self, src: &str, dst: &str) -> ColorResult<Processor>;
}

impl ColorConfig for Config {
    fn default_display_device(&self) -> Option<String> {
        self.default_display().map(str::to_string)
    }

    fn default_display_transform(&self, device: &str) -> Option<String> {
        self.default_view(device).map(str::to_string)
    }

    fn display_colorspace(&self, device: &str, transform: &str) -> ColorResult<String> {
        Config::display_colorspace(self, device, transform).map(str::to_string)
    }

    fn colorspace_for_role(&self, role: &str) -> Option<String> {
        let name = self.roles().get(role)?;
        // A role pointing at an undefined space is treated as absent.
        self.colorspaces()
            .iter()
            .find(|cs| cs.matches_name(name))
            .map(|cs| cs.name().to_string())
    }

    fn num_roles(&self) -> usize {
        self.roles().len()
    }

    fn role_name(&self, index: usize) -> Option<String> {
        self.roles().name_at(index).map(str::to_string)
    }

    fn processor(&self, src: &str, dst: &str) -> ColorResult<Processor> {
        Config::processor(self, src, dst)
    }
}

/// Resolves `role` to its color space or fails with [`ColorError::RoleNotDefined`].
pub fn require_role(config: &dyn ColorConfig, role: &str) -> ColorResult<String> {
    config
        .colorspace_for_role(role)
        .ok_or_else(|| ColorError::RoleNotDefined { role: role.into() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;

    #[test]
    fn builtin_through_trait() {
        let config: Box<dyn ColorConfig> = Box::new(Config::builtin());
        assert_eq!(config.default_display_device().as_deref(), Some("sRGB"));
        assert_eq!(config.default_display_transform("sRGB").as_deref(), Some("Standard"));
        assert_eq!(
            config.display_colorspace("sRGB", "Standard").unwrap(),
            builtin::SRGB_DISPLAY
        );
        assert_eq!(config.colorspace_for_role("data").as_deref(), Some(builtin::RAW));
        assert_eq!(config.num_roles(), 6);
        assert_eq!(config.role_name(0).as_deref(), Some("reference"));
        assert!(config.role_name(6).is_none());
    }

    #[test]
    fn dangling_role_is_absent() {
        let mut config = Config::new();
        config.set_role("scene_linear", "missing");
        assert!(config.colorspace_for_role("scene_linear").is_none());
        assert!(matches!(
            require_role(&config, "scene_linear"),
            Err(ColorError::RoleNotDefined { .. })
        ));
    }
}
