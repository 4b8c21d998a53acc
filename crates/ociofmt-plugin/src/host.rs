//! Host side of the read protocol.
//!
//! The host owns a [`HostRecord`] for the lifetime of an import and passes
//! it to every step together with its callbacks. The plugin fills in the
//! image description fields and, during `ReadContinue`, the pixel buffer.

use std::fmt;
use std::path::PathBuf;

/// Result code returned to the host. Values match the host SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum ResultCode {
    /// Success.
    NoErr = 0,
    /// The file cannot be read.
    CannotRead = -30501,
    /// Allocation failed.
    MemFull = -108,
    /// A step was invoked with missing session state.
    BadParameters = -30500,
    /// The host lacks a required callback.
    HostInsufficient = -30900,
}

impl ResultCode {
    /// Numeric value handed to the host.
    pub const fn code(self) -> i16 {
        self as i16
    }

    /// Returns true for [`ResultCode::NoErr`].
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::NoErr)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoErr => "noErr",
            Self::CannotRead => "formatCannotRead",
            Self::MemFull => "memFullErr",
            Self::BadParameters => "formatBadParameters",
            Self::HostInsufficient => "errPlugInHostInsufficient",
        };
        write!(f, "{name} ({})", self.code())
    }
}

/// Step requested by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Show the about box. No session state is touched.
    About,
    /// Prepare for a read.
    ReadPrepare,
    /// Open, decode and transform.
    ReadStart,
    /// Hand the pixels over.
    ReadContinue,
    /// Release the session.
    ReadFinish,
}

/// Color mode of the imported document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageMode {
    /// One channel.
    Grayscale,
    /// Three or more channels.
    #[default]
    RgbColor,
}

/// Pixel rectangle, bottom and right exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    /// First row.
    pub top: i32,
    /// First column.
    pub left: i32,
    /// One past the last row.
    pub bottom: i32,
    /// One past the last column.
    pub right: i32,
}

impl Rect {
    /// Rectangle covering a whole `width` x `height` image, `None` when
    /// either extent does not fit the host's signed coordinates.
    pub fn full(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            top: 0,
            left: 0,
            bottom: i32::try_from(height).ok()?,
            right: i32::try_from(width).ok()?,
        })
    }
}

/// Fields shared between host and plugin during an import.
#[derive(Debug, Clone, Default)]
pub struct HostRecord {
    /// File being imported.
    pub file: PathBuf,
    /// Bytes the host should pre-buffer; zero means unconstrained.
    pub max_data: i32,
    /// Image width.
    pub width: u32,
    /// Image height.
    pub height: u32,
    /// Bits per plane.
    pub depth: u32,
    /// Channel count.
    pub planes: usize,
    /// Alpha plane, -1 when the image has none.
    pub transparency_plane: i32,
    /// Document color mode.
    pub image_mode: ImageMode,
    /// First plane in `data`.
    pub lo_plane: usize,
    /// Last plane in `data`.
    pub hi_plane: usize,
    /// Byte offset between columns.
    pub col_bytes: usize,
    /// Byte offset between rows.
    pub row_bytes: usize,
    /// Byte offset between planes.
    pub plane_bytes: usize,
    /// Area covered by `data`.
    pub the_rect: Rect,
    /// Buffer handed over during `ReadContinue`, `None` otherwise.
    pub data: Option<Vec<u8>>,
}

impl HostRecord {
    /// Record for importing `file`.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            transparency_plane: -1,
            ..Self::default()
        }
    }
}

/// Callbacks provided by the host.
pub trait HostCallbacks {
    /// Reports progress as `done` out of `total`.
    fn progress(&mut self, done: f64, total: f64);

    /// Consumes the buffer described by `record`.
    fn advance_state(&mut self, record: &HostRecord) -> ResultCode;

    /// Whether the host provides the resource callbacks the plugin needs.
    fn has_resource_procs(&self) -> bool {
        true
    }

    /// Asks the host buffer suite for `bytes` bytes.
    fn allocate_buffer(&mut self, bytes: usize) -> bool {
        let _ = bytes;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdk_values() {
        assert_eq!(ResultCode::NoErr.code(), 0);
        assert_eq!(ResultCode::CannotRead.code(), -30501);
        assert_eq!(ResultCode::MemFull.code(), -108);
        assert_eq!(ResultCode::BadParameters.code(), -30500);
        assert_eq!(ResultCode::HostInsufficient.code(), -30900);
        assert_eq!(ResultCode::CannotRead.to_string(), "formatCannotRead (-30501)");
    }

    #[test]
    fn fresh_record() {
        let r = HostRecord::new("a.png");
        assert_eq!(r.transparency_plane, -1);
        assert_eq!(r.image_mode, ImageMode::RgbColor);
        assert!(r.data.is_none());
        assert_eq!(Rect::full(4, 2), Some(Rect { top: 0, left: 0, bottom: 2, right: 4 }));
    }

    #[test]
    fn rect_past_signed_range() {
        let edge = i32::MAX as u32;
        assert_eq!(Rect::full(edge, 1).map(|r| r.right), Some(i32::MAX));
        assert_eq!(Rect::full(edge + 1, 1), None);
        assert_eq!(Rect::full(1, u32::MAX), None);
    }
}
