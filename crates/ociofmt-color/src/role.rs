//! Standard color space roles.
//!
//! Roles name color spaces by purpose rather than by their concrete name.
//! The mapping keeps config file order so roles can be enumerated by index.
//!
//! # Roles used by the importer
//!
//! - `scene_linear` - Scene-referred linear working space
//! - `compositing_log` - Log space for film scans
//! - `data` - Non-color data (normals, masks, etc.)
//! - `matte_paint` - Matte painting space
//! - `texture_paint` - Texture painting space

/// Standard OCIO role names.
pub mod names {
    /// Scene-referred linear reference.
    pub const REFERENCE: &str = "reference";
    /// Default input color space.
    pub const DEFAULT: &str = "default";
    /// Non-color data (normals, masks).
    pub const DATA: &str = "data";
    /// Scene-referred linear working space.
    pub const SCENE_LINEAR: &str = "scene_linear";
    /// Compositing log space.
    pub const COMPOSITING_LOG: &str = "compositing_log";
    /// Color grading space.
    pub const COLOR_TIMING: &str = "color_timing";
    /// Texture painting space.
    pub const TEXTURE_PAINT: &str = "texture_paint";
    /// Matte painting space.
    pub const MATTE_PAINT: &str = "matte_paint";
    /// Color picker display space.
    pub const COLOR_PICKING: &str = "color_picking";
}

/// Role to color space mapping, in definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roles {
    entries: Vec<(String, String)>,
}

impl Roles {
    /// Creates an empty roles mapping.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a role mapping, replacing an earlier definition in place.
    pub fn define(&mut self, role: impl Into<String>, colorspace: impl Into<String>) {
        let role = role.into();
        let colorspace = colorspace.into();
        match self.entries.iter_mut().find(|(r, _)| *r == role) {
            Some(entry) => entry.1 = colorspace,
            None => self.entries.push((role, colorspace)),
        }
    }

    /// Gets the color space name for a role.
    pub fn get(&self, role: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(r, _)| r == role)
            .map(|(_, cs)| cs.as_str())
    }

    /// Checks if a role is defined.
    #[inline]
    pub fn has(&self, role: &str) -> bool {
        self.get(role).is_some()
    }

    /// Number of defined roles.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no role is defined.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Role name at `index`.
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(r, _)| r.as_str())
    }

    /// Iterates `(role, colorspace)` pairs in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(r, cs)| (r.as_str(), cs.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_definition_order() {
        let mut roles = Roles::new();
        roles.define(names::SCENE_LINEAR, "lin");
        roles.define(names::DATA, "raw");
        roles.define(names::SCENE_LINEAR, "linear");

        assert_eq!(roles.len(), 2);
        assert_eq!(roles.name_at(0), Some("scene_linear"));
        assert_eq!(roles.get("scene_linear"), Some("linear"));
        assert_eq!(roles.name_at(2), None);
        assert!(!roles.has("matte_paint"));
    }
}
