//! DPX (SMPTE 268M) decoder.
//!
//! Film scans are the usual source of 10-bit log material, so this decoder
//! records the stored bit depth as the `BitsPerSample` attribute.
//!
//! | Depth | Storage | Host format |
//! |-------|---------|-------------|
//! | 8-bit | 1 byte/component | U8 |
//! | 10-bit | 3 components per 32-bit word | U16 |
//! | 12-bit | high bits of a 16-bit word | U16 |
//! | 16-bit | 2 bytes/component | U16 |
//!
//! Scanlines are padded to 32-bit boundaries. Both byte orders are read;
//! the magic number decides which.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use ociofmt_core::{DataFormat, ImageMetadata, BITS_PER_SAMPLE};

use crate::decoder::{report_row, try_reserve, try_zeroed, DecodeHandle, Decoder, Progress};
use crate::{IoError, IoResult};

/// "SDPX", big-endian files.
const MAGIC_BE: u32 = 0x5344_5058;
/// "XPDS", little-endian files.
const MAGIC_LE: u32 = 0x5850_4453;

/// Offset of the first image element descriptor.
const IMAGE_ELEMENT: u64 = 768;

/// DPX decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct DpxDecoder;

impl Decoder for DpxDecoder {
    fn name(&self) -> &'static str {
        "DPX"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["dpx"]
    }

    fn can_read(&self, header: &[u8]) -> bool {
        header.len() >= 4 && matches!(BigEndian::read_u32(header), MAGIC_BE | MAGIC_LE)
    }

    fn open(&self, path: &Path) -> IoResult<Box<dyn DecodeHandle>> {
        let mut reader = BufReader::new(File::open(path)?);
        let header = DpxHeader::read(&mut reader)?;

        let mut meta = ImageMetadata::new(header.width, header.height, header.channels(), header.format()?);
        meta.validate()?;
        meta.set_attr(BITS_PER_SAMPLE, header.bit_depth as i64);
        meta.set_attr("dpx:Transfer", header.transfer as i64);
        meta.set_attr("dpx:Packing", header.packing as i64);
        meta.set_attr(
            "dpx:Endian",
            if header.big_endian { "big" } else { "little" },
        );
        tracing::debug!(path = %path.display(), %meta, bits = header.bit_depth, "opened DPX");

        Ok(Box::new(DpxHandle {
            path: path.to_path_buf(),
            header,
            meta,
            decoded: false,
        }))
    }
}

/// Fields of the 2048-byte header we use.
#[derive(Debug, Clone)]
struct DpxHeader {
    big_endian: bool,
    image_offset: u32,
    width: u32,
    height: u32,
    descriptor: u8,
    transfer: u8,
    bit_depth: u8,
    packing: u16,
}

impl DpxHeader {
    fn read<R: Read + Seek>(reader: &mut R) -> IoResult<Self> {
        let magic = reader.read_u32::<BigEndian>()?;
        match magic {
            MAGIC_BE => Self::read_fields::<BigEndian, R>(reader, true),
            MAGIC_LE => Self::read_fields::<LittleEndian, R>(reader, false),
            _ => Err(IoError::DecodeError(format!("invalid DPX magic: 0x{magic:08X}"))),
        }
    }

    fn read_fields<B: ByteOrder, R: Read + Seek>(reader: &mut R, big_endian: bool) -> IoResult<Self> {
        let image_offset = reader.read_u32::<B>()?;

        // orientation (u16), element count (u16), then pixels per line and lines
        reader.seek(SeekFrom::Start(IMAGE_ELEMENT + 4))?;
        let width = reader.read_u32::<B>()?;
        let height = reader.read_u32::<B>()?;

        // data sign, low/high data and code values
        reader.seek(SeekFrom::Current(20))?;
        let descriptor = reader.read_u8()?;
        let transfer = reader.read_u8()?;
        let _colorimetric = reader.read_u8()?;
        let bit_depth = reader.read_u8()?;
        let packing = reader.read_u16::<B>()?;

        Ok(Self {
            big_endian,
            image_offset,
            width,
            height,
            descriptor,
            transfer,
            bit_depth,
            packing,
        })
    }

    fn channels(&self) -> usize {
        match self.descriptor {
            6 => 1,       // luma
            51 | 52 => 4, // RGBA, ABGR
            _ => 3,       // RGB and anything we treat as RGB
        }
    }

    fn format(&self) -> IoResult<DataFormat> {
        match self.bit_depth {
            8 => Ok(DataFormat::U8),
            10 | 12 | 16 => Ok(DataFormat::U16),
            other => Err(IoError::UnsupportedBitDepth(format!("DPX {other}-bit"))),
        }
    }

    /// Bytes of one stored scanline, including padding to a 32-bit word.
    fn row_bytes(&self) -> usize {
        let comps = self.width as usize * self.channels();
        match self.bit_depth {
            8 => comps.div_ceil(4) * 4,
            10 => comps.div_ceil(3) * 4,
            _ => (comps * 2).div_ceil(4) * 4,
        }
    }
}

struct DpxHandle {
    path: PathBuf,
    header: DpxHeader,
    meta: ImageMetadata,
    decoded: bool,
}

impl DecodeHandle for DpxHandle {
    fn metadata(&self) -> &ImageMetadata {
        &self.meta
    }

    fn decode_full(&mut self, progress: Progress<'_>) -> IoResult<Vec<f32>> {
        if self.decoded {
            return Err(IoError::InvalidHandle("DPX already decoded".into()));
        }
        self.decoded = true;

        let h = &self.header;
        let file = File::open(&self.path)?;
        let height = h.height as usize;
        let comps = h.width as usize * h.channels();

        // the header must not promise more pixels than the file holds
        let needed = (h.row_bytes() as u64)
            .checked_mul(height as u64)
            .and_then(|n| n.checked_add(h.image_offset as u64));
        let available = file.metadata()?.len();
        if needed.is_none_or(|n| n > available) {
            return Err(IoError::DecodeError(format!(
                "DPX truncated: {}x{} needs {} bytes, file has {available}",
                h.width,
                h.height,
                needed.map_or_else(|| "too many".to_string(), |n| n.to_string())
            )));
        }

        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(h.image_offset as u64))?;
        let mut row = try_zeroed::<u8>(h.row_bytes())?;
        let mut out = Vec::new();
        try_reserve(&mut out, comps * height)?;

        for y in 0..height {
            reader
                .read_exact(&mut row)
                .map_err(|e| IoError::DecodeError(format!("DPX scanline {y}: {e}")))?;
            if h.big_endian {
                unpack_row::<BigEndian>(&row, comps, h.bit_depth, h.packing, &mut out);
            } else {
                unpack_row::<LittleEndian>(&row, comps, h.bit_depth, h.packing, &mut out);
            }
            report_row(progress, y, height);
        }

        if h.descriptor == 52 {
            for px in out.chunks_exact_mut(4) {
                px.reverse();
            }
        }
        Ok(out)
    }
}

/// Appends `comps` normalized components decoded from one stored scanline.
fn unpack_row<B: ByteOrder>(row: &[u8], comps: usize, bits: u8, packing: u16, out: &mut Vec<f32>) {
    match bits {
        8 => out.extend(row[..comps].iter().map(|&v| v as f32 / 255.0)),
        10 => {
            // method B puts the padding bits at the top of the word
            let shifts: [u32; 3] = if packing == 2 { [20, 10, 0] } else { [22, 12, 2] };
            let words = row.chunks_exact(4).map(B::read_u32);
            out.extend(
                words
                    .flat_map(|w| shifts.map(|s| ((w >> s) & 0x3FF) as f32 / 1023.0))
                    .take(comps),
            );
        }
        12 => out.extend(
            row.chunks_exact(2)
                .take(comps)
                .map(|c| (B::read_u16(c) >> 4) as f32 / 4095.0),
        ),
        _ => out.extend(
            row.chunks_exact(2)
                .take(comps)
                .map(|c| B::read_u16(c) as f32 / 65535.0),
        ),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use byteorder::WriteBytesExt;
    use std::io::Write;

    /// Writes a minimal DPX file with already packed scanline bytes.
    pub(crate) fn write_dpx<B: ByteOrder>(
        path: &Path,
        width: u32,
        height: u32,
        descriptor: u8,
        bits: u8,
        pixels: &[u8],
    ) {
        let mut header = vec![0u8; 2048];
        let magic = if B::read_u16(&[0, 1]) == 1 { MAGIC_BE } else { MAGIC_LE };
        BigEndian::write_u32(&mut header[0..4], magic);
        B::write_u32(&mut header[4..8], 2048);
        B::write_u32(&mut header[772..776], width);
        B::write_u32(&mut header[776..780], height);
        header[800] = descriptor;
        header[801] = 1;
        header[803] = bits;
        B::write_u16(&mut header[804..806], 1);

        let mut file = File::create(path).unwrap();
        file.write_all(&header).unwrap();
        file.write_all(pixels).unwrap();
    }

    fn packed10<B: ByteOrder>(rgb: &[[u32; 3]]) -> Vec<u8> {
        let mut out = Vec::new();
        for p in rgb {
            out.write_u32::<B>((p[0] << 22) | (p[1] << 12) | (p[2] << 2)).unwrap();
        }
        out
    }

    #[test]
    fn magic() {
        assert!(DpxDecoder.can_read(b"SDPX"));
        assert!(DpxDecoder.can_read(b"XPDS"));
        assert!(!DpxDecoder.can_read(b"#?RA"));
    }

    #[test]
    fn ten_bit_big_endian() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.dpx");
        let px = packed10::<BigEndian>(&[[1023, 0, 512], [95, 445, 685]]);
        write_dpx::<BigEndian>(&path, 2, 1, 50, 10, &px);

        let mut handle = DpxDecoder.open(&path).unwrap();
        let meta = handle.metadata().clone();
        assert_eq!((meta.width, meta.height, meta.channels), (2, 1, 3));
        assert_eq!(meta.format, DataFormat::U16);
        assert_eq!(meta.bits_per_sample(), Some(10));

        let data = handle.decode_full(&mut |_| true).unwrap();
        assert_eq!(data.len(), 6);
        assert_eq!(data[0], 1.0);
        assert_eq!(data[1], 0.0);
        assert_abs_diff_eq!(data[2], 512.0 / 1023.0, epsilon = 1e-6);
        assert_abs_diff_eq!(data[5], 685.0 / 1023.0, epsilon = 1e-6);
    }

    #[test]
    fn ten_bit_little_endian() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("le.dpx");
        let px = packed10::<LittleEndian>(&[[100, 200, 300]]);
        write_dpx::<LittleEndian>(&path, 1, 1, 50, 10, &px);

        let data = DpxDecoder.open(&path).unwrap().decode_full(&mut |_| true).unwrap();
        assert_abs_diff_eq!(data[0], 100.0 / 1023.0, epsilon = 1e-6);
        assert_abs_diff_eq!(data[2], 300.0 / 1023.0, epsilon = 1e-6);
    }

    #[test]
    fn eight_bit_rows_are_padded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("8.dpx");
        // 1x2 RGB: 3 bytes per row padded to 4
        write_dpx::<BigEndian>(&path, 1, 2, 50, 8, &[255, 0, 0, 9, 0, 255, 0, 9]);

        let mut progress = Vec::new();
        let data = DpxDecoder
            .open(&path)
            .unwrap()
            .decode_full(&mut |f| {
                progress.push(f);
                true
            })
            .unwrap();
        assert_eq!(data, vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(progress, vec![0.5, 1.0]);
    }

    #[test]
    fn sixteen_bit_luma() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("y.dpx");
        write_dpx::<BigEndian>(&path, 2, 1, 6, 16, &[0xFF, 0xFF, 0x00, 0x00]);

        let mut handle = DpxDecoder.open(&path).unwrap();
        assert_eq!(handle.metadata().channels, 1);
        assert_eq!(handle.decode_full(&mut |_| true).unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn truncated_data_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.dpx");
        write_dpx::<BigEndian>(&path, 4, 4, 50, 10, &[0; 8]);
        let mut handle = DpxDecoder.open(&path).unwrap();
        assert!(matches!(
            handle.decode_full(&mut |_| true),
            Err(IoError::DecodeError(_))
        ));
    }

    #[test]
    fn oversized_header_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.dpx");
        write_dpx::<BigEndian>(&path, 200_000, 200_000, 50, 16, &[]);

        let mut handle = DpxDecoder.open(&path).unwrap();
        assert_eq!(handle.metadata().width, 200_000);
        match handle.decode_full(&mut |_| true) {
            Err(IoError::DecodeError(msg)) => assert!(msg.contains("truncated")),
            other => panic!("expected a decode error, got {other:?}"),
        }
    }

    #[test]
    fn odd_depth_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odd.dpx");
        write_dpx::<BigEndian>(&path, 1, 1, 50, 32, &[0; 12]);
        assert!(matches!(
            DpxDecoder.open(&path),
            Err(IoError::UnsupportedBitDepth(_))
        ));
    }
}
