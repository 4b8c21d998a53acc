//! Decoder traits.
//!
//! A [`Decoder`] recognizes a file kind and opens files of that kind. Opening
//! parses the header only; the returned [`DecodeHandle`] carries the
//! [`ImageMetadata`] and decodes the pixels on demand into packed,
//! channel-interleaved `f32` samples.

use std::path::Path;

use ociofmt_core::ImageMetadata;

use crate::{IoError, IoResult};

/// Progress observer called during decode with the fraction done in `[0, 1]`.
///
/// The return value asks to continue; decoders never cancel.
pub type Progress<'a> = &'a mut dyn FnMut(f32) -> bool;

/// A file-format decoder.
///
/// # Example
///
/// ```rust,ignore
/// use ociofmt_io::{Decoder, DecodeHandle, IoResult};
///
/// struct MyDecoder;
///
/// impl Decoder for MyDecoder {
///     fn name(&self) -> &'static str { "My" }
///     fn extensions(&self) -> &'static [&'static str] { &["my"] }
///     fn can_read(&self, header: &[u8]) -> bool { header.starts_with(b"MY") }
///     fn open(&self, path: &Path) -> IoResult<Box<dyn DecodeHandle>> { todo!() }
/// }
/// ```
pub trait Decoder: Send + Sync {
    /// Human-readable format name.
    fn name(&self) -> &'static str;

    /// File extensions without dots, lowercase.
    fn extensions(&self) -> &'static [&'static str];

    /// Checks the leading bytes of a file for this format's magic number.
    fn can_read(&self, header: &[u8]) -> bool;

    /// Opens `path` and parses its header.
    fn open(&self, path: &Path) -> IoResult<Box<dyn DecodeHandle>>;
}

/// An opened file.
pub trait DecodeHandle: Send {
    /// Metadata of subimage 0.
    fn metadata(&self) -> &ImageMetadata;

    /// Decodes the whole image into normalized `f32` samples.
    ///
    /// Integer samples map their code range onto `[0, 1]`. The buffer holds
    /// `width * height * channels` values, scanlines top to bottom.
    fn decode_full(&mut self, progress: Progress<'_>) -> IoResult<Vec<f32>>;

    /// Releases the handle.
    fn close(self: Box<Self>) {}
}

/// Reports progress for scanline `y` of `height`.
pub(crate) fn report_row(progress: &mut dyn FnMut(f32) -> bool, y: usize, height: usize) {
    if height > 0 {
        let _ = progress((y + 1) as f32 / height as f32);
    }
}

/// Reserves room for `additional` more elements, failing instead of aborting.
pub(crate) fn try_reserve<T>(buf: &mut Vec<T>, additional: usize) -> IoResult<()> {
    buf.try_reserve(additional).map_err(|e| {
        IoError::OutOfMemory(format!(
            "{additional} x {} bytes: {e}",
            std::mem::size_of::<T>()
        ))
    })
}

/// Zero-filled buffer of `len` elements.
pub(crate) fn try_zeroed<T: Clone + Default>(len: usize) -> IoResult<Vec<T>> {
    let mut buf = Vec::new();
    try_reserve(&mut buf, len)?;
    buf.resize(len, T::default());
    Ok(buf)
}
