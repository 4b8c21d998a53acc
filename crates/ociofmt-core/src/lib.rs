//! # ociofmt-core
//!
//! Core types shared by every crate of the OCIO import plugin.
//!
//! - [`ImageMetadata`] - what a decoder learned about an opened file
//! - [`DataFormat`] - sample storage formats, file-side and host-side
//! - [`convert_samples`] - float working buffer to host sample buffer
//!
//! ## Crate Structure
//!
//! ```text
//! ociofmt-core (this crate)
//!    ^
//!    +-- ociofmt-color   (configuration, processors, LUT/shader emission)
//!    +-- ociofmt-io      (decoders)
//!    +-- ociofmt-preview (preview compiler)
//!    +-- ociofmt-plugin  (roles, resolver, import state machine)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod convert;
pub mod error;
pub mod format;
pub mod spec;

pub use convert::{convert_samples, quantize_u16, quantize_u8, samples_to_f32};
pub use error::{Error, Result};
pub use format::DataFormat;
pub use spec::{default_channel_names, AttrValue, ImageMetadata, BITS_PER_SAMPLE};
