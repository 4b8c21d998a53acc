//! Built-in fallback configuration.
//!
//! Used when neither an explicit path nor `$OCIO` names a config. It
//! defines every role the importer asks for plus one sRGB display, so the
//! whole pipeline works without any file on disk.
//!
//! ```
//! use ociofmt_color::builtin;
//!
//! let config = builtin::importer_default();
//! assert_eq!(config.default_display(), Some("sRGB"));
//! ```

use crate::colorspace::ColorSpace;
use crate::config::Config;
use crate::display::{Display, View};
use crate::role;
use crate::transfer::TransferStyle;
use crate::transform::{Transform, TransformDirection};

/// Scene-linear reference space.
pub const LINEAR: &str = "linear";
/// Cineon log space.
pub const CINEON: &str = "cineon";
/// Non-color data.
pub const RAW: &str = "raw";
/// sRGB-encoded texture space.
pub const SRGB_TEXTURE: &str = "srgb_texture";
/// Gamma 2.2 matte painting space.
pub const GAMMA22: &str = "gamma22";
/// sRGB display space.
pub const SRGB_DISPLAY: &str = "srgb_display";
/// Rec.709 display space.
pub const REC709_DISPLAY: &str = "rec709_display";

/// Creates the importer's fallback configuration.
pub fn importer_default() -> Config {
    let mut config = Config::new();
    config.set_name("ociofmt built-in");

    config.add_colorspace(
        ColorSpace::builder(LINEAR)
            .family("scene")
            .description("Scene-linear reference")
            .build(),
    );
    config.add_colorspace(encoded(CINEON, "log", TransferStyle::Cineon, "Cineon printing density"));
    config.add_colorspace(
        ColorSpace::builder(RAW)
            .family("data")
            .description("Non-color data, never transformed")
            .is_data(true)
            .build(),
    );
    config.add_colorspace(
        ColorSpace::builder(SRGB_TEXTURE)
            .alias("sRGB - Texture")
            .family("texture")
            .description("sRGB encoded texture")
            .from_reference(Transform::builtin(TransferStyle::Srgb, TransformDirection::Forward))
            .build(),
    );
    config.add_colorspace(encoded(GAMMA22, "matte", TransferStyle::Gamma22, "Gamma 2.2 matte painting"));
    config.add_colorspace(encoded(SRGB_DISPLAY, "display", TransferStyle::Srgb, "sRGB monitor"));
    config.add_colorspace(encoded(REC709_DISPLAY, "display", TransferStyle::Rec709, "Rec.709 video"));

    config.set_role(role::names::REFERENCE, LINEAR);
    config.set_role(role::names::SCENE_LINEAR, LINEAR);
    config.set_role(role::names::COMPOSITING_LOG, CINEON);
    config.set_role(role::names::DATA, RAW);
    config.set_role(role::names::MATTE_PAINT, GAMMA22);
    config.set_role(role::names::TEXTURE_PAINT, SRGB_TEXTURE);

    let mut srgb = Display::new("sRGB");
    srgb.add_view(View::new("Standard", SRGB_DISPLAY));
    srgb.add_view(View::new("Raw", RAW));
    config.add_display(srgb);

    let mut rec709 = Display::new("Rec.709");
    rec709.add_view(View::new("Standard", REC709_DISPLAY));
    rec709.add_view(View::new("Raw", RAW));
    config.add_display(rec709);

    config
}

fn encoded(name: &str, family: &str, style: TransferStyle, desc: &str) -> ColorSpace {
    ColorSpace::builder(name)
        .family(family)
        .description(desc)
        .from_reference(Transform::builtin(style, TransformDirection::Forward))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_importer_role_is_defined() {
        let config = importer_default();
        for r in [
            role::names::SCENE_LINEAR,
            role::names::COMPOSITING_LOG,
            role::names::DATA,
            role::names::MATTE_PAINT,
            role::names::TEXTURE_PAINT,
        ] {
            assert!(config.colorspace(r).is_some(), "{r}");
        }
        config.validate().unwrap();
    }

    #[test]
    fn default_display_view() {
        let config = importer_default();
        assert_eq!(config.default_view("sRGB"), Some("Standard"));
        assert_eq!(config.display_colorspace("sRGB", "Standard").unwrap(), SRGB_DISPLAY);
    }
}
