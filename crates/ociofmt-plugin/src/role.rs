//! Role registry.
//!
//! A fixed table links each [`Role`] to the configuration's role name and
//! to the label shown in the role menus. [`Role::Display`] is the one entry
//! without a configuration name: it resolves through the default display.

use std::fmt;
use std::str::FromStr;

use ociofmt_color::{role_names, ColorConfig};
use serde::{Deserialize, Serialize};

/// Color-management intent chosen for the input or the output of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// No role; no transform is applied.
    #[default]
    Unknown,
    /// Default display device and view.
    Display,
    /// Scene-referred linear.
    SceneLinear,
    /// Log encoding for film scans.
    CompositingLog,
    /// Non-color data.
    Data,
    /// Matte painting space.
    MattePaint,
    /// Texture painting space.
    TexturePaint,
}

struct Entry {
    role: Role,
    name: Option<&'static str>,
    label: &'static str,
}

const TABLE: &[Entry] = &[
    Entry {
        role: Role::SceneLinear,
        name: Some(role_names::SCENE_LINEAR),
        label: "Scene Linear",
    },
    Entry {
        role: Role::CompositingLog,
        name: Some(role_names::COMPOSITING_LOG),
        label: "Compositing Log",
    },
    Entry {
        role: Role::MattePaint,
        name: Some(role_names::MATTE_PAINT),
        label: "Matte Paint",
    },
    Entry {
        role: Role::TexturePaint,
        name: Some(role_names::TEXTURE_PAINT),
        label: "Texture Paint",
    },
    Entry {
        role: Role::Data,
        name: Some(role_names::DATA),
        label: "Data",
    },
    // pseudo-role, resolved through the default display
    Entry {
        role: Role::Display,
        name: None,
        label: "Display",
    },
];

fn entry(role: Role) -> Option<&'static Entry> {
    TABLE.iter().find(|e| e.role == role)
}

impl Role {
    /// Every role with a table entry.
    pub const ALL: [Role; 6] = [
        Role::SceneLinear,
        Role::CompositingLog,
        Role::MattePaint,
        Role::TexturePaint,
        Role::Data,
        Role::Display,
    ];

    /// Configuration role name. `None` for [`Role::Display`] and
    /// [`Role::Unknown`].
    pub fn name(self) -> Option<&'static str> {
        entry(self).and_then(|e| e.name)
    }

    /// Role for a configuration role name, [`Role::Unknown`] if none matches.
    pub fn from_name(name: &str) -> Role {
        TABLE
            .iter()
            .find(|e| e.name == Some(name))
            .map_or(Role::Unknown, |e| e.role)
    }

    /// Menu label.
    pub fn label(self) -> &'static str {
        entry(self).map_or("unknown", |e| e.label)
    }

    /// Role for a menu label, [`Role::Unknown`] if none matches.
    pub fn from_label(label: &str) -> Role {
        TABLE
            .iter()
            .find(|e| e.label == label)
            .map_or(Role::Unknown, |e| e.role)
    }

    /// Whether this is the display pseudo-role.
    pub fn is_display(self) -> bool {
        self == Role::Display
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Display => f.write_str("display"),
            Role::Unknown => f.write_str("unknown"),
            r => f.write_str(r.name().unwrap_or("unknown")),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    /// Accepts configuration names, `display`, `unknown` and menu labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "display" => return Ok(Role::Display),
            "unknown" | "none" => return Ok(Role::Unknown),
            _ => {}
        }
        let by_name = Role::from_name(&s.to_ascii_lowercase().replace(['-', ' '], "_"));
        if by_name != Role::Unknown {
            return Ok(by_name);
        }
        match Role::from_label(s) {
            Role::Unknown => Err(format!("unknown role '{s}'")),
            r => Ok(r),
        }
    }
}

/// Whether `config` defines a color space for `role`.
///
/// The display pseudo-role is available when the config has a default
/// display; [`Role::Unknown`] never is.
pub fn is_available(config: &dyn ColorConfig, role: Role) -> bool {
    match role {
        Role::Display => config.default_display_device().is_some(),
        r => r
            .name()
            .is_some_and(|name| config.colorspace_for_role(name).is_some()),
    }
}

/// Roles the configuration defines a color space for, in config order.
///
/// Roles the importer does not know are skipped, as are roles whose
/// color space is missing.
pub fn available_roles(config: &dyn ColorConfig) -> Vec<Role> {
    let mut roles = Vec::new();
    for i in 0..config.num_roles() {
        let Some(name) = config.role_name(i) else {
            continue;
        };
        let role = Role::from_name(&name);
        if role != Role::Unknown && !roles.contains(&role) && is_available(config, role) {
            roles.push(role);
        }
    }
    roles
}

/// Output menu: the available roles followed by [`Role::Display`].
pub fn output_roles(config: &dyn ColorConfig) -> Vec<Role> {
    let mut roles = available_roles(config);
    if is_available(config, Role::Display) {
        roles.push(Role::Display);
    }
    roles
}

#[cfg(test)]
mod tests {
    use super::*;
    use ociofmt_color::{builtin, Config};

    #[test]
    fn names_round_trip() {
        for role in Role::ALL {
            match role.name() {
                Some(name) => assert_eq!(Role::from_name(name), role),
                None => assert_eq!(role, Role::Display),
            }
            assert_eq!(Role::from_label(role.label()), role);
        }
        assert_eq!(Role::Unknown.name(), None);
        assert_eq!(Role::from_name("color_timing"), Role::Unknown);
        assert_eq!(Role::from_label("Display"), Role::Display);
    }

    #[test]
    fn parse() {
        assert_eq!("scene_linear".parse(), Ok(Role::SceneLinear));
        assert_eq!("Compositing Log".parse(), Ok(Role::CompositingLog));
        assert_eq!("matte-paint".parse(), Ok(Role::MattePaint));
        assert_eq!("DISPLAY".parse(), Ok(Role::Display));
        assert!("reference".parse::<Role>().is_err());
        assert_eq!(Role::TexturePaint.to_string(), "texture_paint");
    }

    #[test]
    fn builtin_roles_in_config_order() {
        let config = builtin::importer_default();
        assert_eq!(
            available_roles(&config),
            vec![
                Role::SceneLinear,
                Role::CompositingLog,
                Role::Data,
                Role::MattePaint,
                Role::TexturePaint,
            ]
        );
        assert_eq!(output_roles(&config).last(), Some(&Role::Display));
    }

    #[test]
    fn undefined_roles_are_unavailable() {
        let mut config = Config::new();
        config.set_role("scene_linear", "nowhere");
        assert!(available_roles(&config).is_empty());
        assert!(!is_available(&config, Role::Display));
        assert!(output_roles(&config).is_empty());
        assert!(!is_available(&config, Role::Unknown));
    }
}
