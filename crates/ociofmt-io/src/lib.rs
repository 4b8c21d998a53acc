//! # ociofmt-io
//!
//! Decoders for the OCIO import plugin.
//!
//! Decoding is a black box to the importer: open a file, get its
//! [`ImageMetadata`](ociofmt_core::ImageMetadata), decode the whole image to
//! packed `f32` samples, close.
//!
//! | Format | Feature | Depths |
//! |--------|---------|--------|
//! | PNG | `png` | 8, 16 |
//! | DPX | `dpx` | 8, 10, 12, 16 |
//! | Radiance HDR | `hdr` | float (RGBE) |
//!
//! ```ignore
//! use ociofmt_io::DecoderRegistry;
//!
//! let registry = DecoderRegistry::with_builtin();
//! let (mut handle, meta) = registry.open_for_read("scan.dpx")?;
//! println!("{meta}");
//! let pixels = handle.decode_full(&mut |done| {
//!     println!("{:.0}%", done * 100.0);
//!     true
//! })?;
//! ```

#![warn(missing_docs)]

mod decoder;
mod error;
mod registry;

#[cfg(feature = "dpx")]
pub mod dpx;
#[cfg(feature = "hdr")]
pub mod hdr;
#[cfg(feature = "png")]
pub mod png;

pub use decoder::{DecodeHandle, Decoder, Progress};
pub use error::{IoError, IoResult};
pub use registry::DecoderRegistry;
