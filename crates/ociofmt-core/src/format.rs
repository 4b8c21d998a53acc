//! Sample storage formats.
//!
//! [`DataFormat`] describes how a single channel sample is stored, both for
//! the format a decoder detected in a file and for the host buffer the
//! importer fills. Hosts only accept [`DataFormat::U8`], [`DataFormat::U16`]
//! and [`DataFormat::F32`]; [`DataFormat::F16`] appears only as a file format.

/// Runtime sample storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataFormat {
    /// 8-bit unsigned integer.
    U8,
    /// 16-bit unsigned integer.
    #[default]
    U16,
    /// 16-bit half-precision float.
    F16,
    /// 32-bit single-precision float.
    F32,
}

impl DataFormat {
    /// Number of bytes per channel sample.
    #[inline]
    pub const fn bytes(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 | Self::F16 => 2,
            Self::F32 => 4,
        }
    }

    /// Number of bits per channel sample.
    #[inline]
    pub const fn bits(&self) -> u32 {
        (self.bytes() * 8) as u32
    }

    /// Whether this is a floating-point format (half included).
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::F16 | Self::F32)
    }

    /// Whether a host buffer may use this format.
    #[inline]
    pub const fn is_host_format(&self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::F32)
    }

    /// Maps a host depth field (bits per plane) to a host format.
    ///
    /// Returns `None` for any depth other than 8, 16 or 32.
    pub const fn from_host_depth(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(Self::U8),
            16 => Some(Self::U16),
            32 => Some(Self::F32),
            _ => None,
        }
    }

    /// Maximum integer code value, or `1.0` for float formats.
    #[inline]
    pub const fn max_value(&self) -> f32 {
        match self {
            Self::U8 => 255.0,
            Self::U16 => 65535.0,
            Self::F16 | Self::F32 => 1.0,
        }
    }

    /// Short name for display.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::F16 => "f16",
            Self::F32 => "f32",
        }
    }
}

impl std::fmt::Display for DataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(DataFormat::U8.bytes(), 1);
        assert_eq!(DataFormat::U16.bytes(), 2);
        assert_eq!(DataFormat::F16.bits(), 16);
        assert_eq!(DataFormat::F32.bits(), 32);
    }

    #[test]
    fn host_depths() {
        assert_eq!(DataFormat::from_host_depth(8), Some(DataFormat::U8));
        assert_eq!(DataFormat::from_host_depth(16), Some(DataFormat::U16));
        assert_eq!(DataFormat::from_host_depth(32), Some(DataFormat::F32));
        assert_eq!(DataFormat::from_host_depth(1), None);
        assert!(!DataFormat::F16.is_host_format());
        assert!(DataFormat::F16.is_float());
    }
}
