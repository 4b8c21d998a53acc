//! Decoder registry with format detection.
//!
//! The registry owns the known decoders and picks one for a file: magic
//! bytes first, then the file extension.
//!
//! # Example
//!
//! ```ignore
//! use ociofmt_io::DecoderRegistry;
//!
//! let registry = DecoderRegistry::with_builtin();
//! let (mut handle, meta) = registry.open_for_read("plate.dpx")?;
//! let pixels = handle.decode_full(&mut |_| true)?;
//! handle.close();
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use ociofmt_core::ImageMetadata;

use crate::decoder::{DecodeHandle, Decoder};
use crate::{IoError, IoResult};

/// Bytes read from a file for magic detection.
const HEADER_PROBE: usize = 16;

/// Registered decoders in priority order.
#[derive(Clone, Default)]
pub struct DecoderRegistry {
    decoders: Vec<Arc<dyn Decoder>>,
}

impl std::fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl DecoderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the decoders enabled by crate features.
    pub fn with_builtin() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "png")]
        registry.register(crate::png::PngDecoder);
        #[cfg(feature = "dpx")]
        registry.register(crate::dpx::DpxDecoder);
        #[cfg(feature = "hdr")]
        registry.register(crate::hdr::HdrDecoder);
        registry
    }

    /// Adds a decoder. Earlier registrations win ties.
    pub fn register(&mut self, decoder: impl Decoder + 'static) {
        self.decoders.push(Arc::new(decoder));
    }

    /// Names of the registered decoders.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.decoders.iter().map(|d| d.name())
    }

    /// Number of registered decoders.
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Returns true if no decoder is registered.
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Picks a decoder for `path`.
    ///
    /// Unreadable files fall through to extension matching so the caller
    /// sees the real open error from the decoder.
    pub fn find_for(&self, path: impl AsRef<Path>) -> Option<Arc<dyn Decoder>> {
        let path = path.as_ref();
        let header = read_header(path).unwrap_or_default();

        if let Some(d) = self.decoders.iter().find(|d| d.can_read(&header)) {
            return Some(Arc::clone(d));
        }

        let ext = path.extension()?.to_str()?.to_lowercase();
        self.decoders
            .iter()
            .find(|d| d.extensions().contains(&ext.as_str()))
            .cloned()
    }

    /// Opens `path` with the matching decoder.
    ///
    /// # Errors
    ///
    /// [`IoError::NoDecoder`] when nothing recognizes the file; otherwise
    /// whatever the decoder reports while parsing the header.
    pub fn open_for_read(
        &self,
        path: impl AsRef<Path>,
    ) -> IoResult<(Box<dyn DecodeHandle>, ImageMetadata)> {
        let path = path.as_ref();
        let decoder = self.find_for(path).ok_or_else(|| IoError::NoDecoder {
            path: path.to_path_buf(),
        })?;
        tracing::debug!(path = %path.display(), decoder = decoder.name(), "opening");

        let handle = decoder.open(path)?;
        let meta = handle.metadata().clone();
        Ok((handle, meta))
    }
}

fn read_header(path: &Path) -> IoResult<Vec<u8>> {
    let mut header = Vec::with_capacity(HEADER_PROBE);
    File::open(path)?
        .take(HEADER_PROBE as u64)
        .read_to_end(&mut header)?;
    Ok(header)
}
