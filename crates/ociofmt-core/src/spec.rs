//! Decoded image metadata.
//!
//! [`ImageMetadata`] is the "header" a decoder produces when a file is
//! opened: dimensions, channel layout, the sample format stored in the file,
//! special channel indices and a free-form attribute bag. It is built once
//! per open file and never mutated afterwards.
//!
//! The stride helpers take the *target* format explicitly, since the host
//! buffer is usually stored at a different width than the file:
//!
//! ```rust
//! use ociofmt_core::{DataFormat, ImageMetadata};
//!
//! let meta = ImageMetadata::new(64, 64, 3, DataFormat::U8);
//! assert_eq!(meta.pixel_bytes(DataFormat::U16), 6);
//! assert_eq!(meta.scanline_bytes(DataFormat::U16), 384);
//! assert_eq!(meta.image_bytes(DataFormat::U16), 64 * 64 * 3 * 2);
//! ```

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::format::DataFormat;

/// Attribute key carrying the bit depth stored in the file.
pub const BITS_PER_SAMPLE: &str = "BitsPerSample";

/// Attribute value that can be stored in image metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Signed integer value
    Int(i64),
    /// Unsigned integer value
    UInt(u64),
    /// Floating-point value
    Float(f64),
    /// String value
    Str(String),
}

impl AttrValue {
    /// Returns this value as an integer, if it is integer-typed.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Returns this value as a float, if numeric.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::UInt(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Str(_) => None,
        }
    }

    /// Returns this value as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for AttrValue {
    fn from(v: u32) -> Self {
        Self::UInt(v as u64)
    }
}

impl From<f32> for AttrValue {
    fn from(v: f32) -> Self {
        Self::Float(v as f64)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// Metadata of one decoded subimage.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadata {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Number of interleaved channels.
    pub channels: usize,
    /// Sample format stored in the file.
    pub format: DataFormat,
    /// Index of the alpha channel, if any.
    pub alpha_channel: Option<usize>,
    /// Index of the depth (Z) channel, if any.
    pub z_channel: Option<usize>,
    /// Per-channel names, `channels` entries long.
    pub channel_names: Vec<String>,
    /// Free-form attributes read from the file header.
    pub attributes: HashMap<String, AttrValue>,
}

impl ImageMetadata {
    /// Creates metadata with conventional channel names.
    ///
    /// Alpha is detected from the generated names, so a 2- or 4-channel image
    /// gets its last channel flagged as alpha.
    pub fn new(width: u32, height: u32, channels: usize, format: DataFormat) -> Self {
        let channel_names = default_channel_names(channels);
        let mut meta = Self {
            width,
            height,
            channels,
            format,
            alpha_channel: None,
            z_channel: None,
            channel_names,
            attributes: HashMap::new(),
        };
        meta.detect_special_channels();
        meta
    }

    /// Replaces channel names and re-detects alpha and depth channels.
    pub fn with_channel_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channel_names = names.into_iter().map(Into::into).collect();
        self.detect_special_channels();
        self
    }

    fn detect_special_channels(&mut self) {
        self.alpha_channel = self.channel_names.iter().position(|name| {
            let lower = name.to_lowercase();
            lower == "a" || lower == "alpha"
        });
        self.z_channel = self.channel_names.iter().position(|name| {
            let lower = name.to_lowercase();
            lower == "z" || lower == "depth"
        });
    }

    /// Checks that the dimensions are usable for buffer arithmetic.
    pub fn validate(&self) -> Result<()> {
        let ok = self.width > 0
            && self.height > 0
            && self.channels > 0
            && (self.width as usize)
                .checked_mul(self.height as usize)
                .and_then(|n| n.checked_mul(self.channels))
                .and_then(|n| n.checked_mul(DataFormat::F32.bytes()))
                .is_some();
        if ok {
            Ok(())
        } else {
            Err(Error::InvalidDimensions {
                width: self.width,
                height: self.height,
                channels: self.channels,
            })
        }
    }

    /// Sets an attribute.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Gets an attribute.
    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    /// Gets an integer attribute.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.attr(key).and_then(AttrValue::as_int)
    }

    /// Bit depth stored in the file, when the decoder reported one.
    #[inline]
    pub fn bits_per_sample(&self) -> Option<i64> {
        self.get_int(BITS_PER_SAMPLE)
    }

    /// Total number of samples (`width * height * channels`).
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.width as usize * self.height as usize * self.channels
    }

    /// Bytes of one channel sample at `format`.
    #[inline]
    pub fn channel_bytes(&self, format: DataFormat) -> usize {
        format.bytes()
    }

    /// Bytes of one pixel at `format`.
    #[inline]
    pub fn pixel_bytes(&self, format: DataFormat) -> usize {
        self.channels * format.bytes()
    }

    /// Bytes of one scanline at `format`.
    #[inline]
    pub fn scanline_bytes(&self, format: DataFormat) -> usize {
        self.width as usize * self.pixel_bytes(format)
    }

    /// Bytes of the whole image at `format`.
    #[inline]
    pub fn image_bytes(&self, format: DataFormat) -> usize {
        self.height as usize * self.scanline_bytes(format)
    }
}

impl std::fmt::Display for ImageMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} {} {}ch",
            self.width, self.height, self.format, self.channels
        )
    }
}

/// Conventional channel names for a channel count.
pub fn default_channel_names(channels: usize) -> Vec<String> {
    let base: &[&str] = match channels {
        1 => &["Y"],
        2 => &["Y", "A"],
        3 => &["R", "G", "B"],
        _ => &["R", "G", "B", "A"],
    };
    (0..channels)
        .map(|i| match base.get(i) {
            Some(name) => (*name).to_string(),
            None => format!("channel{i}"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_follow_target_format() {
        let meta = ImageMetadata::new(64, 64, 3, DataFormat::U16);
        assert_eq!(meta.pixel_bytes(DataFormat::U16), 6);
        assert_eq!(meta.scanline_bytes(DataFormat::U16), 64 * 3 * 2);
        assert_eq!(meta.image_bytes(DataFormat::U16), 64 * 64 * 3 * 2);
        assert_eq!(meta.scanline_bytes(DataFormat::F32), 64 * 3 * 4);
        assert_eq!(meta.channel_bytes(DataFormat::U8), 1);
    }

    #[test]
    fn alpha_detection() {
        assert_eq!(ImageMetadata::new(1, 1, 3, DataFormat::U8).alpha_channel, None);
        assert_eq!(ImageMetadata::new(1, 1, 4, DataFormat::U8).alpha_channel, Some(3));
        assert_eq!(ImageMetadata::new(1, 1, 2, DataFormat::U8).alpha_channel, Some(1));

        let meta = ImageMetadata::new(1, 1, 5, DataFormat::F32)
            .with_channel_names(["R", "G", "B", "A", "Z"]);
        assert_eq!(meta.alpha_channel, Some(3));
        assert_eq!(meta.z_channel, Some(4));
    }

    #[test]
    fn bits_per_sample_attribute() {
        let mut meta = ImageMetadata::new(8, 8, 3, DataFormat::U16);
        assert_eq!(meta.bits_per_sample(), None);
        meta.set_attr(BITS_PER_SAMPLE, 10u32);
        assert_eq!(meta.bits_per_sample(), Some(10));
        meta.set_attr(BITS_PER_SAMPLE, "ten");
        assert_eq!(meta.bits_per_sample(), None);
    }

    #[test]
    fn extra_channels_get_generic_names() {
        let names = default_channel_names(6);
        assert_eq!(names[3], "A");
        assert_eq!(names[5], "channel5");
    }

    #[test]
    fn validate_rejects_empty() {
        assert!(ImageMetadata::new(0, 4, 3, DataFormat::U8).validate().is_err());
        assert!(ImageMetadata::new(4, 4, 0, DataFormat::U8).validate().is_err());
        assert!(ImageMetadata::new(4, 4, 3, DataFormat::U8).validate().is_ok());
    }
}
