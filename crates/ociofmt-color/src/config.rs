//! OCIO configuration file parsing and management.
//!
//! Loads `.ocio` YAML documents (profile versions 1 and 2). Transform
//! definitions are tagged YAML nodes such as `!<MatrixTransform> {...}`;
//! both the verbatim `!<Tag>` and the shorthand `!Tag` spellings are read.
//!
//! # Example
//!
//! ```ignore
//! use ociofmt_color::Config;
//!
//! let config = Config::from_file("studio/config.ocio")?;
//! let proc = config.processor("scene_linear", "texture_paint")?;
//! ```

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::builtin;
use crate::colorspace::ColorSpace;
use crate::display::{Display, DisplayManager, View};
use crate::error::{ColorError, ColorResult};
use crate::processor::Processor;
use crate::role::Roles;
use crate::transfer::TransferStyle;
use crate::transform::*;

/// Environment variable naming the active config file.
pub const OCIO_ENV: &str = "OCIO";

/// Config format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigVersion {
    /// OCIO v1.x.
    #[default]
    V1,
    /// OCIO v2.x.
    V2,
}

/// OCIO configuration.
///
/// Holds color spaces, roles and displays. Read-only once loaded; the
/// importer shares one instance across a whole session.
#[derive(Debug, Clone, Default)]
pub struct Config {
    name: String,
    version: ConfigVersion,
    working_dir: PathBuf,
    colorspaces: Vec<ColorSpace>,
    roles: Roles,
    displays: DisplayManager,
    active_displays: Vec<String>,
    active_views: Vec<String>,
}

impl Config {
    /// Creates a new empty configuration.
    pub fn new() -> Self {
        Self {
            working_dir: PathBuf::from("."),
            ..Default::default()
        }
    }

    /// The built-in fallback configuration.
    pub fn builtin() -> Self {
        builtin::importer_default()
    }

    /// Loads configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> ColorResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ColorError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let working_dir = path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let config = Self::from_yaml_str(&content, working_dir)?;
        info!(
            path = %path.display(),
            colorspaces = config.colorspaces.len(),
            roles = config.roles.len(),
            "loaded color config"
        );
        Ok(config)
    }

    /// Loads the active configuration: `explicit` if given, else the file
    /// named by `$OCIO`, else the built-in config.
    pub fn from_env_or_builtin(explicit: Option<&Path>) -> ColorResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match std::env::var_os(OCIO_ENV) {
            Some(p) if !p.is_empty() => Self::from_file(PathBuf::from(p)),
            _ => {
                debug!("no color config given, using built-in");
                Ok(Self::builtin())
            }
        }
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str, working_dir: PathBuf) -> ColorResult<Self> {
        let yaml = normalize_tags(yaml)?;
        let raw: RawConfig = serde_yaml::from_str(&yaml)?;
        Self::from_raw(raw, working_dir)
    }

    fn from_raw(raw: RawConfig, working_dir: PathBuf) -> ColorResult<Self> {
        let version_str = match &raw.ocio_profile_version {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            other => format!("{other:?}"),
        };
        let version = if version_str.starts_with('2') {
            ConfigVersion::V2
        } else if version_str.starts_with('1') {
            ConfigVersion::V1
        } else {
            return Err(ColorError::UnsupportedVersion {
                version: version_str,
            });
        };

        let mut config = Self {
            name: raw.name.unwrap_or_default(),
            version,
            working_dir,
            active_displays: string_list(raw.active_displays.as_ref()),
            active_views: string_list(raw.active_views.as_ref()),
            ..Default::default()
        };

        if let Some(roles) = raw.roles {
            for (role, cs) in roles {
                if let (Some(role), Some(cs)) = (role.as_str(), cs.as_str()) {
                    config.roles.define(role, cs);
                }
            }
        }

        for raw_cs in raw.colorspaces.unwrap_or_default() {
            let raw_cs: RawColorSpace = serde_yaml::from_value(untag(&raw_cs).clone())?;
            config.colorspaces.push(parse_colorspace(raw_cs)?);
        }

        if let Some(displays) = raw.displays {
            for (name, views) in displays {
                let Some(name) = name.as_str() else { continue };
                let mut display = Display::new(name);
                if let Value::Sequence(views) = untag(&views) {
                    for v in views {
                        let raw_view: RawView = serde_yaml::from_value(untag(v).clone())?;
                        let cs = raw_view
                            .colorspace
                            .or(raw_view.display_colorspace)
                            .ok_or_else(|| {
                                ColorError::Validation(format!(
                                    "view '{}' on display '{name}' has no colorspace",
                                    raw_view.name
                                ))
                            })?;
                        display.add_view(View::new(raw_view.name, cs));
                    }
                }
                config.displays.add_display(display);
            }
        }

        Ok(config)
    }

    /// Checks that roles and views reference defined color spaces.
    pub fn validate(&self) -> ColorResult<()> {
        for (role, cs) in self.roles.iter() {
            if !self.colorspaces.iter().any(|c| c.matches_name(cs)) {
                return Err(ColorError::Validation(format!(
                    "role '{role}' references undefined colorspace '{cs}'"
                )));
            }
        }
        for display in self.displays.displays() {
            for view in display.views() {
                if self.colorspace(view.colorspace()).is_none() {
                    return Err(ColorError::Validation(format!(
                        "view '{}' on '{}' references undefined colorspace '{}'",
                        view.name(),
                        display.name(),
                        view.colorspace()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Returns config name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the config name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns config version.
    #[inline]
    pub fn version(&self) -> ConfigVersion {
        self.version
    }

    /// Returns the working directory.
    #[inline]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Returns all color spaces.
    #[inline]
    pub fn colorspaces(&self) -> &[ColorSpace] {
        &self.colorspaces
    }

    /// Gets a color space by role, name or alias.
    pub fn colorspace(&self, name: &str) -> Option<&ColorSpace> {
        if let Some(cs_name) = self.roles.get(name) {
            return self.colorspaces.iter().find(|cs| cs.matches_name(cs_name));
        }
        self.colorspaces.iter().find(|cs| cs.matches_name(name))
    }

    /// Returns the roles mapping.
    #[inline]
    pub fn roles(&self) -> &Roles {
        &self.roles
    }

    /// Returns the display manager.
    #[inline]
    pub fn displays(&self) -> &DisplayManager {
        &self.displays
    }

    /// Returns active display names.
    #[inline]
    pub fn active_displays(&self) -> &[String] {
        &self.active_displays
    }

    /// Returns active view names.
    #[inline]
    pub fn active_views(&self) -> &[String] {
        &self.active_views
    }

    /// Returns the default display name.
    pub fn default_display(&self) -> Option<&str> {
        self.displays.default_display(&self.active_displays)
    }

    /// Returns the default view for a display.
    pub fn default_view(&self, display: &str) -> Option<&str> {
        self.displays
            .display(display)
            .and_then(|d| d.default_view(&self.active_views))
    }

    /// Color space a display/view pair converts to.
    pub fn display_colorspace(&self, display: &str, view: &str) -> ColorResult<&str> {
        let disp = self
            .displays
            .display(display)
            .ok_or_else(|| ColorError::DisplayNotFound {
                name: display.into(),
            })?;
        let v = disp.view(view).ok_or_else(|| ColorError::ViewNotFound {
            display: display.into(),
            view: view.into(),
        })?;
        Ok(v.colorspace())
    }

    /// Creates a processor for conversion between two color spaces.
    ///
    /// `src` and `dst` may be role names. Conversions touching a data
    /// space are identities.
    pub fn processor(&self, src: &str, dst: &str) -> ColorResult<Processor> {
        let src_cs = self
            .colorspace(src)
            .ok_or_else(|| ColorError::ColorSpaceNotFound { name: src.into() })?;
        let dst_cs = self
            .colorspace(dst)
            .ok_or_else(|| ColorError::ColorSpaceNotFound { name: dst.into() })?;

        if src_cs.is_data() || dst_cs.is_data() || src_cs.name() == dst_cs.name() {
            debug!(src = src_cs.name(), dst = dst_cs.name(), "identity conversion");
            return Ok(Processor::identity());
        }

        // Build transform chain: src -> reference -> dst
        let mut transforms = Vec::new();
        if let Some(t) = src_cs.to_reference_or_inverse() {
            transforms.push(t);
        }
        if let Some(t) = dst_cs.from_reference_or_inverse() {
            transforms.push(t);
        }

        let processor =
            Processor::from_transform(&Transform::group(transforms), TransformDirection::Forward)?;
        debug!(
            src = src_cs.name(),
            dst = dst_cs.name(),
            ops = processor.num_ops(),
            "built processor"
        );
        Ok(processor)
    }

    /// Adds a color space to the config.
    pub fn add_colorspace(&mut self, cs: ColorSpace) {
        self.colorspaces.push(cs);
    }

    /// Sets a role mapping.
    pub fn set_role(&mut self, role: impl Into<String>, colorspace: impl Into<String>) {
        self.roles.define(role, colorspace);
    }

    /// Adds a display.
    pub fn add_display(&mut self, display: Display) {
        self.displays.add_display(display);
    }
}

/// Rewrites verbatim `!<Tag>` tags to the `!Tag` shorthand.
fn normalize_tags(yaml: &str) -> ColorResult<String> {
    let re = Regex::new(r"!<(\w+)>").map_err(|e| ColorError::Validation(e.to_string()))?;
    Ok(re.replace_all(yaml, "!$1").into_owned())
}

fn untag(v: &Value) -> &Value {
    match v {
        Value::Tagged(t) => &t.value,
        other => other,
    }
}

/// Reads `[a, b]` or `"a, b"`.
fn string_list(v: Option<&Value>) -> Vec<String> {
    match v {
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(|i| i.as_str())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_colorspace(raw: RawColorSpace) -> ColorResult<ColorSpace> {
    let mut builder = ColorSpace::builder(&raw.name);
    if let Some(desc) = raw.description {
        builder = builder.description(desc.trim());
    }
    if let Some(family) = raw.family {
        builder = builder.family(family);
    }
    if raw.isdata == Some(true) {
        builder = builder.is_data(true);
    }
    for alias in raw.aliases.unwrap_or_default() {
        builder = builder.alias(alias);
    }

    let to_ref = raw
        .to_reference
        .or(raw.to_scene_reference)
        .or(raw.to_display_reference);
    let from_ref = raw
        .from_reference
        .or(raw.from_scene_reference)
        .or(raw.from_display_reference);
    if let Some(v) = to_ref {
        builder = builder.to_reference(parse_transform(&v)?);
    }
    if let Some(v) = from_ref {
        builder = builder.from_reference(parse_transform(&v)?);
    }
    Ok(builder.build())
}

/// Parses one transform node. A plain sequence is read as a group.
pub(crate) fn parse_transform(value: &Value) -> ColorResult<Transform> {
    let tagged = match value {
        Value::Sequence(items) => {
            let children = items.iter().map(parse_transform).collect::<ColorResult<_>>()?;
            return Ok(Transform::group(children));
        }
        Value::Tagged(t) => t,
        other => {
            return Err(ColorError::invalid(format!(
                "expected a tagged transform, found {other:?}"
            )));
        }
    };
    let tag = tagged.tag.to_string();
    let kind = tag.trim_start_matches('!');
    let body = match &tagged.value {
        Value::Null => Value::Mapping(Mapping::new()),
        v => v.clone(),
    };

    let t = match kind {
        "MatrixTransform" => {
            let raw: RawMatrix = serde_yaml::from_value(body)?;
            let matrix = match raw.matrix {
                Some(m) => fixed::<16>(&m, "matrix")?,
                None => MatrixTransform::IDENTITY,
            };
            let offset = match raw.offset {
                Some(o) => fixed::<4>(&o, "offset")?,
                None => [0.0; 4],
            };
            Transform::Matrix(MatrixTransform {
                matrix,
                offset,
                direction: direction(raw.direction.as_deref())?,
            })
        }
        "ExponentTransform" => {
            let raw: RawExponent = serde_yaml::from_value(body)?;
            Transform::Exponent(ExponentTransform {
                value: raw.value.rgba(1.0)?,
                negative_style: negative_style(raw.style.as_deref(), NegativeStyle::Clamp)?,
                direction: direction(raw.direction.as_deref())?,
            })
        }
        "ExponentWithLinearTransform" => {
            let raw: RawExponentWithLinear = serde_yaml::from_value(body)?;
            Transform::ExponentWithLinear(ExponentWithLinearTransform {
                gamma: raw.gamma.rgba(1.0)?,
                offset: raw.offset.rgba(0.0)?,
                negative_style: negative_style(raw.style.as_deref(), NegativeStyle::Linear)?,
                direction: direction(raw.direction.as_deref())?,
            })
        }
        "LogTransform" => {
            let raw: RawLog = serde_yaml::from_value(body)?;
            Transform::Log(LogTransform {
                base: raw.base.unwrap_or(2.0),
                direction: direction(raw.direction.as_deref())?,
            })
        }
        "LogAffineTransform" => {
            let raw: RawLogAffine = serde_yaml::from_value(body)?;
            let d = LogAffineTransform::default();
            Transform::LogAffine(LogAffineTransform {
                base: raw.base.unwrap_or(d.base),
                log_side_slope: rgb_or(raw.log_side_slope, d.log_side_slope)?,
                log_side_offset: rgb_or(raw.log_side_offset, d.log_side_offset)?,
                lin_side_slope: rgb_or(raw.lin_side_slope, d.lin_side_slope)?,
                lin_side_offset: rgb_or(raw.lin_side_offset, d.lin_side_offset)?,
                direction: direction(raw.direction.as_deref())?,
            })
        }
        "RangeTransform" => {
            let raw: RawRange = serde_yaml::from_value(body)?;
            let style = match raw.style.as_deref().map(str::to_ascii_lowercase).as_deref() {
                None | Some("clamp") => RangeStyle::Clamp,
                Some("noclamp") => RangeStyle::NoClamp,
                Some(other) => return Err(ColorError::invalid(format!("unknown range style '{other}'"))),
            };
            Transform::Range(RangeTransform {
                min_in: raw.min_in_value,
                max_in: raw.max_in_value,
                min_out: raw.min_out_value,
                max_out: raw.max_out_value,
                style,
                direction: direction(raw.direction.as_deref())?,
            })
        }
        "CDLTransform" => {
            let raw: RawCdl = serde_yaml::from_value(body)?;
            let d = CdlTransform::default();
            let style = match raw.style.as_deref().map(str::to_ascii_lowercase).as_deref() {
                None | Some("asc") | Some("asccdl") => CdlStyle::AscCdl,
                Some("noclamp") => CdlStyle::NoClamp,
                Some(other) => return Err(ColorError::invalid(format!("unknown CDL style '{other}'"))),
            };
            Transform::Cdl(CdlTransform {
                slope: raw.slope.map(|v| fixed::<3>(&v, "slope")).transpose()?.unwrap_or(d.slope),
                offset: raw.offset.map(|v| fixed::<3>(&v, "offset")).transpose()?.unwrap_or(d.offset),
                power: raw.power.map(|v| fixed::<3>(&v, "power")).transpose()?.unwrap_or(d.power),
                saturation: raw.sat.unwrap_or(d.saturation),
                style,
                direction: direction(raw.direction.as_deref())?,
            })
        }
        "BuiltinTransform" => {
            let raw: RawBuiltin = serde_yaml::from_value(body)?;
            let style = TransferStyle::from_name(&raw.style).ok_or_else(|| {
                ColorError::invalid(format!("unknown builtin transform style '{}'", raw.style))
            })?;
            Transform::builtin(style, direction(raw.direction.as_deref())?)
        }
        "GroupTransform" => {
            let raw: RawGroup = serde_yaml::from_value(body)?;
            let transforms = raw
                .children
                .iter()
                .map(parse_transform)
                .collect::<ColorResult<_>>()?;
            Transform::Group(GroupTransform {
                transforms,
                direction: direction(raw.direction.as_deref())?,
            })
        }
        other => {
            return Err(ColorError::invalid(format!("unsupported transform type '{other}'")));
        }
    };
    Ok(t)
}

fn direction(name: Option<&str>) -> ColorResult<TransformDirection> {
    match name {
        None => Ok(TransformDirection::Forward),
        Some(n) => TransformDirection::from_name(n)
            .ok_or_else(|| ColorError::invalid(format!("unknown direction '{n}'"))),
    }
}

fn negative_style(name: Option<&str>, default: NegativeStyle) -> ColorResult<NegativeStyle> {
    match name {
        None => Ok(default),
        Some(n) => NegativeStyle::from_name(n)
            .ok_or_else(|| ColorError::invalid(format!("unknown negative style '{n}'"))),
    }
}

fn fixed<const N: usize>(values: &[f64], what: &str) -> ColorResult<[f64; N]> {
    values.try_into().map_err(|_| {
        ColorError::invalid(format!("{what} needs {N} values, got {}", values.len()))
    })
}

fn rgb_or(v: Option<Floats>, default: [f64; 3]) -> ColorResult<[f64; 3]> {
    match v {
        None => Ok(default),
        Some(Floats::One(x)) => Ok([x; 3]),
        Some(Floats::Many(v)) => fixed::<3>(&v, "per-channel value"),
    }
}

/// A scalar or a per-channel list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Floats {
    One(f64),
    Many(Vec<f64>),
}

impl Floats {
    /// Expands to RGBA; a scalar covers RGB and alpha gets `alpha`.
    fn rgba(&self, alpha: f64) -> ColorResult<[f64; 4]> {
        match self {
            Floats::One(x) => Ok([*x, *x, *x, alpha]),
            Floats::Many(v) if v.len() == 3 => Ok([v[0], v[1], v[2], alpha]),
            Floats::Many(v) => fixed::<4>(v, "per-channel value"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    ocio_profile_version: Value,
    name: Option<String>,
    roles: Option<Mapping>,
    colorspaces: Option<Vec<Value>>,
    displays: Option<Mapping>,
    active_displays: Option<Value>,
    active_views: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawColorSpace {
    name: String,
    description: Option<String>,
    family: Option<String>,
    isdata: Option<bool>,
    aliases: Option<Vec<String>>,
    to_reference: Option<Value>,
    from_reference: Option<Value>,
    to_scene_reference: Option<Value>,
    from_scene_reference: Option<Value>,
    to_display_reference: Option<Value>,
    from_display_reference: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawView {
    name: String,
    colorspace: Option<String>,
    display_colorspace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMatrix {
    matrix: Option<Vec<f64>>,
    offset: Option<Vec<f64>>,
    direction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawExponent {
    value: Floats,
    style: Option<String>,
    direction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawExponentWithLinear {
    gamma: Floats,
    offset: Floats,
    style: Option<String>,
    direction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLog {
    base: Option<f64>,
    direction: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLogAffine {
    base: Option<f64>,
    log_side_slope: Option<Floats>,
    log_side_offset: Option<Floats>,
    lin_side_slope: Option<Floats>,
    lin_side_offset: Option<Floats>,
    direction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRange {
    min_in_value: Option<f64>,
    max_in_value: Option<f64>,
    min_out_value: Option<f64>,
    max_out_value: Option<f64>,
    style: Option<String>,
    direction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCdl {
    slope: Option<Vec<f64>>,
    offset: Option<Vec<f64>>,
    power: Option<Vec<f64>>,
    sat: Option<f64>,
    style: Option<String>,
    direction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBuiltin {
    style: String,
    direction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    #[serde(default)]
    children: Vec<Value>,
    direction: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const STUDIO_CONFIG: &str = r#"
ocio_profile_version: 2.1
name: studio

roles:
  scene_linear: lin_rec709
  compositing_log: lg10
  data: raw
  texture_paint: srgb8

active_displays: [Projector, sRGB]
active_views: []

displays:
  sRGB:
    - !<View> {name: Film, colorspace: srgb8}
    - !<View> {name: Raw, colorspace: raw}
  Monitor:
    - !<View> {name: Raw, colorspace: raw}

colorspaces:
  - !<ColorSpace>
    name: lin_rec709
    family: scene
    description: |
      Scene linear

  - !<ColorSpace>
    name: lg10
    family: log
    to_reference: !<GroupTransform>
      children:
        - !<LogAffineTransform> {base: 10, logSideSlope: 0.29325513, logSideOffset: 0.66959921, linSideOffset: 0.0108}
      direction: inverse

  - !<ColorSpace>
    name: raw
    isdata: true

  - !<ColorSpace>
    name: srgb8
    aliases: [sRGB - Texture]
    from_reference:
      - !MatrixTransform {matrix: [2, 0, 0, 0, 0, 2, 0, 0, 0, 0, 2, 0, 0, 0, 0, 1]}
      - !<BuiltinTransform> {style: srgb}
"#;

    fn studio() -> Config {
        Config::from_yaml_str(STUDIO_CONFIG, PathBuf::from(".")).unwrap()
    }

    #[test]
    fn parse_studio_config() {
        let config = studio();
        assert_eq!(config.version(), ConfigVersion::V2);
        assert_eq!(config.name(), "studio");
        assert_eq!(config.colorspaces().len(), 4);
        assert_eq!(config.roles().len(), 4);
        assert_eq!(config.roles().name_at(1), Some("compositing_log"));
        assert_eq!(config.colorspace("texture_paint").unwrap().name(), "srgb8");
        assert_eq!(config.colorspace("SRGB - texture").unwrap().name(), "srgb8");
        assert!(config.colorspace("matte_paint").is_none());
        config.validate().unwrap();
    }

    #[test]
    fn active_display_wins_when_defined() {
        let config = studio();
        // "Projector" is not defined, so the next active entry is used.
        assert_eq!(config.default_display(), Some("sRGB"));
        assert_eq!(config.default_view("sRGB"), Some("Film"));
        assert_eq!(config.display_colorspace("sRGB", "Film").unwrap(), "srgb8");
        assert!(matches!(
            config.display_colorspace("sRGB", "Nope"),
            Err(ColorError::ViewNotFound { .. })
        ));
    }

    #[test]
    fn file_order_without_active_list() {
        let yaml = STUDIO_CONFIG.replace("active_displays: [Projector, sRGB]", "");
        let config = Config::from_yaml_str(&yaml, PathBuf::from(".")).unwrap();
        assert_eq!(config.default_display(), Some("sRGB"));
        assert_eq!(config.displays().display_names().collect::<Vec<_>>(), ["sRGB", "Monitor"]);
    }

    #[test]
    fn processor_chains_through_reference() {
        let config = studio();
        let p = config.processor("scene_linear", "texture_paint").unwrap();
        let mut px = [[0.09_f32, 0.09, 0.09]];
        p.apply_rgb(&mut px);
        assert_abs_diff_eq!(px[0][0], TransferStyle::Srgb.encode(0.18), epsilon = 1e-5);

        let back = config.processor("texture_paint", "scene_linear").unwrap();
        back.apply_rgb(&mut px);
        assert_abs_diff_eq!(px[0][0], 0.09, epsilon = 1e-5);
    }

    #[test]
    fn log_space_round_trips() {
        let config = studio();
        let to_log = config.processor("scene_linear", "compositing_log").unwrap();
        let to_lin = config.processor("compositing_log", "scene_linear").unwrap();
        let mut px = [[0.18_f32, 0.5, 1.0]];
        to_log.apply_rgb(&mut px);
        assert!(px[0][0] > 0.3 && px[0][0] < 0.6, "{:?}", px);
        to_lin.apply_rgb(&mut px);
        assert_abs_diff_eq!(px[0][0], 0.18, epsilon = 1e-4);
        assert_abs_diff_eq!(px[0][2], 1.0, epsilon = 1e-4);
    }

    #[test]
    fn data_space_is_identity() {
        let config = studio();
        assert!(config.processor("data", "texture_paint").unwrap().is_identity());
        assert!(config.processor("scene_linear", "scene_linear").unwrap().is_identity());
    }

    #[test]
    fn missing_colorspace() {
        let err = studio().processor("scene_linear", "matte_paint").unwrap_err();
        assert!(matches!(err, ColorError::ColorSpaceNotFound { .. }));
    }

    #[test]
    fn v1_config_with_integer_version() {
        let yaml = "ocio_profile_version: 1\nroles: {data: raw}\ncolorspaces:\n  - !<ColorSpace> {name: raw, isdata: true}\n";
        let config = Config::from_yaml_str(yaml, PathBuf::from(".")).unwrap();
        assert_eq!(config.version(), ConfigVersion::V1);
        assert_eq!(config.default_display(), None);
    }

    #[test]
    fn bad_version_rejected() {
        let err = Config::from_yaml_str("ocio_profile_version: 3\n", PathBuf::from(".")).unwrap_err();
        assert!(matches!(err, ColorError::UnsupportedVersion { .. }));
    }

    #[test]
    fn unknown_builtin_rejected() {
        let yaml = "ocio_profile_version: 2\ncolorspaces:\n  - name: x\n    to_reference: !<BuiltinTransform> {style: pq}\n";
        let err = Config::from_yaml_str(yaml, PathBuf::from(".")).unwrap_err();
        assert!(matches!(err, ColorError::InvalidTransform { .. }));
    }

    #[test]
    fn exponent_scalar_and_list() {
        let v: Value = serde_yaml::from_str("!ExponentTransform {value: 2.2, style: mirror}").unwrap();
        let Transform::Exponent(e) = parse_transform(&v).unwrap() else {
            panic!("expected exponent")
        };
        assert_eq!(e.value, [2.2, 2.2, 2.2, 1.0]);
        assert_eq!(e.negative_style, NegativeStyle::Mirror);

        let v: Value = serde_yaml::from_str("!ExponentTransform {value: [1, 2, 3]}").unwrap();
        let Transform::Exponent(e) = parse_transform(&v).unwrap() else {
            panic!("expected exponent")
        };
        assert_eq!(e.value, [1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn short_matrix_rejected() {
        let v: Value = serde_yaml::from_str("!MatrixTransform {matrix: [1, 0, 0]}").unwrap();
        assert!(parse_transform(&v).is_err());
    }

    #[test]
    fn missing_file() {
        let err = Config::from_file("/nonexistent/config.ocio").unwrap_err();
        assert!(matches!(err, ColorError::ConfigNotFound { .. }));
    }

    #[test]
    fn explicit_path_beats_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ocio");
        std::fs::write(&path, STUDIO_CONFIG).unwrap();
        let config = Config::from_env_or_builtin(Some(&path)).unwrap();
        assert_eq!(config.name(), "studio");
        assert_eq!(config.working_dir(), dir.path());
    }

    #[test]
    fn tag_normalization() {
        assert_eq!(
            normalize_tags("a: !<MatrixTransform> {}").unwrap(),
            "a: !MatrixTransform {}"
        );
    }
}
