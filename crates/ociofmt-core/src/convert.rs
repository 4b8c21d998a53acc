//! Conversion between the float working buffer and host sample buffers.
//!
//! The importer keeps decoded pixels as packed, channel-interleaved `f32`.
//! Before a buffer is handed to the host it is cast to the host's sample
//! width with [`convert_samples`]. The cast is purely numeric and identical
//! for every channel; alpha and depth channels receive no special treatment.
//!
//! Host buffers use native byte order.

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::format::DataFormat;

/// Quantizes a float sample to 8 bits.
///
/// Values are clamped to `[0, 1]`; NaN maps to zero.
#[inline]
pub fn quantize_u8(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Quantizes a float sample to 16 bits.
///
/// Values are clamped to `[0, 1]`; NaN maps to zero.
#[inline]
pub fn quantize_u16(v: f32) -> u16 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 65535.0).round() as u16
}

/// Converts a packed float buffer to host samples of format `dst`.
///
/// `alpha` and `depth` are the special channel indices of the image. They
/// are accepted for parity with the host protocol but every channel is
/// converted the same way.
///
/// # Errors
///
/// [`Error::UnsupportedFormat`] when `dst` is not one of the host formats
/// (8-bit, 16-bit, 32-bit float).
pub fn convert_samples(
    src: &[f32],
    dst: DataFormat,
    alpha: Option<usize>,
    depth: Option<usize>,
) -> Result<Vec<u8>> {
    let _ = (alpha, depth);
    let out = match dst {
        DataFormat::U8 => src.par_iter().map(|&v| quantize_u8(v)).collect(),
        DataFormat::U16 => src
            .par_iter()
            .flat_map_iter(|&v| quantize_u16(v).to_ne_bytes())
            .collect(),
        DataFormat::F32 => src
            .par_iter()
            .flat_map_iter(|&v| v.to_ne_bytes())
            .collect(),
        DataFormat::F16 => return Err(Error::unsupported(dst)),
    };
    Ok(out)
}

/// Reads packed samples of format `src` back into normalized floats.
///
/// Integer formats map their full code range to `[0, 1]`.
///
/// # Errors
///
/// [`Error::BufferSize`] when `bytes` is not a whole number of samples.
pub fn samples_to_f32(bytes: &[u8], src: DataFormat) -> Result<Vec<f32>> {
    let width = src.bytes();
    if bytes.len() % width != 0 {
        return Err(Error::BufferSize {
            expected: bytes.len() / width * width + width,
            actual: bytes.len(),
        });
    }
    let out = match src {
        DataFormat::U8 => bytes.par_iter().map(|&b| b as f32 / 255.0).collect(),
        DataFormat::U16 => bytes
            .par_chunks_exact(2)
            .map(|c| u16::from_ne_bytes([c[0], c[1]]) as f32 / 65535.0)
            .collect(),
        DataFormat::F16 => bytes
            .par_chunks_exact(2)
            .map(|c| half::f16::from_bits(u16::from_ne_bytes([c[0], c[1]])).to_f32())
            .collect(),
        DataFormat::F32 => bytes
            .par_chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f32> {
        (0..n).map(|i| i as f32 / (n - 1) as f32).collect()
    }

    #[test]
    fn u8_round_trip_within_one_code() {
        let src = ramp(1001);
        let bytes = convert_samples(&src, DataFormat::U8, None, None).unwrap();
        assert_eq!(bytes.len(), src.len());
        let back = samples_to_f32(&bytes, DataFormat::U8).unwrap();
        for (a, b) in src.iter().zip(&back) {
            assert!((a - b).abs() <= 1.0 / 255.0, "{a} vs {b}");
        }
    }

    #[test]
    fn u16_round_trip_within_one_code() {
        let src = ramp(4097);
        let bytes = convert_samples(&src, DataFormat::U16, Some(3), None).unwrap();
        assert_eq!(bytes.len(), src.len() * 2);
        let back = samples_to_f32(&bytes, DataFormat::U16).unwrap();
        for (a, b) in src.iter().zip(&back) {
            assert!((a - b).abs() <= 1.0 / 65535.0, "{a} vs {b}");
        }
    }

    #[test]
    fn f32_is_identity() {
        let src = vec![-0.5, 0.0, 0.25, 1.0, 7.5];
        let bytes = convert_samples(&src, DataFormat::F32, None, None).unwrap();
        assert_eq!(samples_to_f32(&bytes, DataFormat::F32).unwrap(), src);
    }

    #[test]
    fn out_of_range_clamps() {
        let bytes = convert_samples(&[-1.0, 2.0, f32::NAN], DataFormat::U8, None, None).unwrap();
        assert_eq!(bytes, vec![0, 255, 0]);
    }

    #[test]
    fn alpha_is_converted_like_color() {
        let src = [0.5, 0.5, 0.5, 0.5];
        let bytes = convert_samples(&src, DataFormat::U8, Some(3), None).unwrap();
        assert!(bytes.iter().all(|&b| b == 128));
    }

    #[test]
    fn half_destination_is_rejected() {
        let err = convert_samples(&[0.0], DataFormat::F16, None, None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn half_source_decodes() {
        let h = half::f16::from_f32(0.75).to_bits().to_ne_bytes();
        assert_eq!(samples_to_f32(&h, DataFormat::F16).unwrap(), vec![0.75]);
    }

    #[test]
    fn ragged_buffer_is_rejected() {
        assert!(samples_to_f32(&[0, 1, 2], DataFormat::U16).is_err());
    }
}
