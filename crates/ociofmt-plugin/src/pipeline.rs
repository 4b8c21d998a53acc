//! Pixel pipeline: transform application and host buffer layout.

use ociofmt_color::Processor;
use ociofmt_core::{convert_samples, DataFormat, ImageMetadata};
use tracing::{debug, trace};

use crate::error::{ImportError, ImportResult};

/// Applies `processor` in place to a packed float buffer.
///
/// Identity processors are skipped and the buffer is left untouched.
/// Returns whether the buffer was transformed.
pub fn apply(
    processor: &Processor,
    buf: &mut [f32],
    width: u32,
    height: u32,
    channels: usize,
) -> ImportResult<bool> {
    if processor.is_identity() {
        trace!("identity transform, buffer untouched");
        return Ok(false);
    }
    processor
        .apply_packed(buf, width as usize, height as usize, channels)
        .map_err(|e| ImportError::BadParameters(e.to_string()))?;
    debug!(width, height, channels, ops = processor.num_ops(), "applied transform");
    Ok(true)
}

/// Byte strides of an interleaved host buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostLayout {
    /// Host sample format.
    pub format: DataFormat,
    /// Bytes between planes (one sample).
    pub plane_bytes: usize,
    /// Bytes between columns (one pixel).
    pub col_bytes: usize,
    /// Bytes between rows.
    pub row_bytes: usize,
    /// Bytes of the whole buffer.
    pub image_bytes: usize,
}

impl HostLayout {
    /// Layout of `meta` at host `depth` bits.
    ///
    /// # Errors
    ///
    /// [`ImportError::UnsupportedFormat`] for a depth other than 8, 16 or
    /// 32, [`ImportError::OutOfMemory`] when the buffer size overflows.
    pub fn new(meta: &ImageMetadata, depth: u32) -> ImportResult<Self> {
        let format = DataFormat::from_host_depth(depth)
            .ok_or_else(|| ImportError::UnsupportedFormat(format!("{depth}-bit host samples")))?;
        let too_large = || {
            ImportError::OutOfMemory(format!(
                "{}x{}x{} image at {depth} bits",
                meta.width, meta.height, meta.channels
            ))
        };
        let plane_bytes = format.bytes();
        let col_bytes = meta
            .channels
            .checked_mul(plane_bytes)
            .ok_or_else(too_large)?;
        let row_bytes = (meta.width as usize)
            .checked_mul(col_bytes)
            .ok_or_else(too_large)?;
        let image_bytes = (meta.height as usize)
            .checked_mul(row_bytes)
            .filter(|n| *n <= isize::MAX as usize)
            .ok_or_else(too_large)?;
        Ok(Self {
            format,
            plane_bytes,
            col_bytes,
            row_bytes,
            image_bytes,
        })
    }
}

/// Converts the float buffer to the host format described by `layout`.
pub fn to_host(pixels: &[f32], meta: &ImageMetadata, layout: &HostLayout) -> ImportResult<Vec<u8>> {
    let out = convert_samples(pixels, layout.format, meta.alpha_channel, meta.z_channel)?;
    if out.len() != layout.image_bytes {
        return Err(ImportError::BadParameters(format!(
            "converted {} bytes, layout needs {}",
            out.len(),
            layout.image_bytes
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ociofmt_color::{builtin, Config};
    use ociofmt_core::samples_to_f32;

    fn ramp(n: usize) -> Vec<f32> {
        (0..n).map(|i| i as f32 / (n - 1) as f32).collect()
    }

    #[test]
    fn identity_is_skipped() {
        let mut buf = ramp(12);
        let before = buf.clone();
        let p = Config::builtin().processor(builtin::RAW, builtin::SRGB_DISPLAY).unwrap();
        assert!(!apply(&p, &mut buf, 2, 2, 3).unwrap());
        assert_eq!(buf, before);
    }

    #[test]
    fn apply_is_deterministic() {
        let p = Config::builtin()
            .processor(builtin::LINEAR, builtin::GAMMA22)
            .unwrap();
        let src = ramp(4 * 4 * 4);
        let mut a = src.clone();
        let mut b = src.clone();
        assert!(apply(&p, &mut a, 4, 4, 4).unwrap());
        apply(&p, &mut b, 4, 4, 4).unwrap();
        assert_eq!(a, b);
        // alpha untouched
        assert_eq!(a[3], src[3]);
    }

    #[test]
    fn wrong_buffer_is_rejected() {
        let p = Config::builtin()
            .processor(builtin::LINEAR, builtin::GAMMA22)
            .unwrap();
        let mut buf = vec![0.5; 5];
        assert!(matches!(
            apply(&p, &mut buf, 2, 1, 3),
            Err(ImportError::BadParameters(_))
        ));
    }

    #[test]
    fn layout_strides() {
        let meta = ImageMetadata::new(64, 64, 3, DataFormat::U16);
        let l = HostLayout::new(&meta, 16).unwrap();
        assert_eq!((l.plane_bytes, l.col_bytes, l.row_bytes), (2, 6, 384));
        assert_eq!(l.image_bytes, 64 * 64 * 3 * 2);

        let l = HostLayout::new(&meta, 8).unwrap();
        assert_eq!(l.row_bytes, 192);
        assert!(matches!(
            HostLayout::new(&meta, 12),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn host_round_trip_bounds() {
        let meta = ImageMetadata::new(1001, 1, 1, DataFormat::F32);
        let src = ramp(1001);
        for (depth, tol) in [(8, 1.0 / 255.0), (16, 1.0 / 65535.0), (32, 0.0)] {
            let layout = HostLayout::new(&meta, depth).unwrap();
            let bytes = to_host(&src, &meta, &layout).unwrap();
            let back = samples_to_f32(&bytes, layout.format).unwrap();
            for (a, b) in src.iter().zip(&back) {
                assert_abs_diff_eq!(*a, *b, epsilon = tol + f32::EPSILON);
            }
        }
    }
}
