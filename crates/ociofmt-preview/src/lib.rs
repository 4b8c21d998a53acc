//! # ociofmt-preview
//!
//! Real-time preview for the import dialog: the color pipeline is baked
//! into a 3D LUT, sampled by a generated fragment shader, and rebuilt only
//! when the processor's cache id changes.
//!
//! The graphics API sits behind [`GpuDevice`]. [`SoftwareDevice`] runs
//! headless; enable the `gl` feature for [`GlDevice`].
//!
//! ```
//! use ociofmt_color::{Processor, ShaderMode};
//! use ociofmt_core::{DataFormat, ImageMetadata};
//! use ociofmt_preview::{PreviewSurface, SoftwareDevice, SyncOutcome};
//!
//! let meta = ImageMetadata::new(2, 2, 3, DataFormat::U8);
//! let pixels = vec![0.5; meta.sample_count()];
//! let mut surface =
//!     PreviewSurface::new(SoftwareDevice::new(), &meta, &pixels, 16, ShaderMode::Lut3d).unwrap();
//! assert_eq!(surface.sync(&Processor::identity()).unwrap(), SyncOutcome::Rebuilt);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compiler;
pub mod device;
pub mod error;
pub mod software;
pub mod surface;

#[cfg(feature = "gl")]
pub mod gl;

pub use compiler::{
    fragment_source, LutShaderBundle, PreviewCompiler, SyncOutcome, DEFAULT_LUT_EDGE, FUNCTION_NAME,
};
pub use device::{GpuDevice, IMAGE_SAMPLER, IMAGE_UNIT, LUT_SAMPLER, LUT_UNIT};
pub use error::{PreviewError, PreviewResult, ShaderStage};
pub use software::{SoftHandle, SoftTexture, SoftwareDevice};
pub use surface::PreviewSurface;

#[cfg(feature = "gl")]
pub use gl::GlDevice;
