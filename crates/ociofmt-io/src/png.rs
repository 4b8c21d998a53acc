//! PNG decoder.
//!
//! Reads 8-bit and 16-bit grayscale, gray+alpha, RGB and RGBA files.
//! Palette and sub-byte images are expanded by the `png` crate to 8-bit,
//! and a `tRNS` chunk becomes a real alpha channel.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ociofmt_core::{DataFormat, ImageMetadata};

use crate::decoder::{report_row, DecodeHandle, Decoder, Progress};
use crate::{IoError, IoResult};

const MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// PNG decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngDecoder;

impl Decoder for PngDecoder {
    fn name(&self) -> &'static str {
        "PNG"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["png"]
    }

    fn can_read(&self, header: &[u8]) -> bool {
        header.len() >= 8 && header[..8] == MAGIC
    }

    fn open(&self, path: &Path) -> IoResult<Box<dyn DecodeHandle>> {
        let file = File::open(path)?;
        let mut decoder = png::Decoder::new(BufReader::new(file));
        decoder.set_transformations(png::Transformations::EXPAND);
        let reader = decoder
            .read_info()
            .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

        let (color_type, bit_depth) = reader.output_color_type();
        let channels = match color_type {
            png::ColorType::Grayscale => 1,
            png::ColorType::GrayscaleAlpha => 2,
            png::ColorType::Rgb => 3,
            png::ColorType::Rgba => 4,
            other => {
                return Err(IoError::UnsupportedFormat(format!("PNG color type {other:?}")));
            }
        };
        let format = match bit_depth {
            png::BitDepth::Eight => DataFormat::U8,
            png::BitDepth::Sixteen => DataFormat::U16,
            other => return Err(IoError::UnsupportedBitDepth(format!("PNG {other:?}"))),
        };

        let info = reader.info();
        let meta = ImageMetadata::new(info.width, info.height, channels, format);
        meta.validate()?;
        tracing::debug!(path = %path.display(), %meta, "opened PNG");

        Ok(Box::new(PngHandle {
            reader: Some(reader),
            meta,
        }))
    }
}

struct PngHandle {
    reader: Option<png::Reader<BufReader<File>>>,
    meta: ImageMetadata,
}

impl DecodeHandle for PngHandle {
    fn metadata(&self) -> &ImageMetadata {
        &self.meta
    }

    fn decode_full(&mut self, progress: Progress<'_>) -> IoResult<Vec<f32>> {
        let mut reader = self
            .reader
            .take()
            .ok_or_else(|| IoError::InvalidHandle("PNG already decoded".into()))?;

        let size = reader
            .output_buffer_size()
            .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
        let mut buf = vec![0u8; size];
        let info = reader
            .next_frame(&mut buf)
            .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

        let height = self.meta.height as usize;
        let row_samples = self.meta.width as usize * self.meta.channels;
        let mut out = Vec::with_capacity(row_samples * height);

        for (y, row) in buf[..info.buffer_size()]
            .chunks(info.line_size)
            .take(height)
            .enumerate()
        {
            match self.meta.format {
                DataFormat::U16 => out.extend(
                    row.chunks_exact(2)
                        .take(row_samples)
                        .map(|c| u16::from_be_bytes([c[0], c[1]]) as f32 / 65535.0),
                ),
                _ => out.extend(row.iter().take(row_samples).map(|&b| b as f32 / 255.0)),
            }
            report_row(progress, y, height);
        }

        if out.len() != self.meta.sample_count() {
            return Err(IoError::DecodeError(format!(
                "PNG decoded {} samples, expected {}",
                out.len(),
                self.meta.sample_count()
            )));
        }
        Ok(out)
    }
}
