//! OCIO-style color management for the importer.
//!
//! This crate covers the color side of an import:
//! - Load `.ocio` YAML configurations (or fall back to a built-in one)
//! - Resolve roles and display/view pairs to color spaces
//! - Compile conversions into a [`Processor`] and apply them to pixels
//! - Bake processors into 3D LUTs and emit GLSL for preview
//!
//! # Quick Start
//!
//! ```
//! use ociofmt_color::{builtin, Config};
//!
//! let config = Config::builtin();
//! let processor = config.processor(builtin::LINEAR, builtin::SRGB_DISPLAY).unwrap();
//!
//! let mut pixels = [[0.18_f32, 0.18, 0.18]];
//! processor.apply_rgb(&mut pixels);
//! assert!(pixels[0][0] > 0.4);
//! ```
//!
//! # Roles
//!
//! ```
//! use ociofmt_color::{builtin, ColorConfig, Config};
//!
//! let config = Config::builtin();
//! assert_eq!(config.colorspace_for_role("data").as_deref(), Some(builtin::RAW));
//! ```
//!
//! # Loading External Configs
//!
//! ```ignore
//! use ociofmt_color::Config;
//!
//! // explicit path, then $OCIO, then the built-in config
//! let config = Config::from_env_or_builtin(None)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod baker;
mod cache;
mod colorspace;
mod config;
mod display;
mod error;
mod gpu;
mod processor;
mod traits;
mod transfer;
mod transform;

pub mod builtin;
pub mod role;

pub use baker::{BakedLut3D, Baker};
pub use cache::ProcessorCache;
pub use colorspace::{ColorSpace, ColorSpaceBuilder};
pub use config::{Config, ConfigVersion, OCIO_ENV};
pub use display::{Display, DisplayManager, View};
pub use error::{ColorError, ColorResult};
pub use gpu::{lut_domain_mapping, GpuProcessor, ShaderMode};
pub use processor::{Processor, ProcessorOp};
pub use role::{names as role_names, Roles};
pub use traits::{require_role, ColorConfig};
pub use transfer::TransferStyle;
pub use transform::{
    BuiltinTransform, CdlStyle, CdlTransform, ExponentTransform, ExponentWithLinearTransform,
    GroupTransform, LogAffineTransform, LogTransform, MatrixTransform, NegativeStyle,
    RangeStyle, RangeTransform, Transform, TransformDirection,
};
