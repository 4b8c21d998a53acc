//! Radiance HDR (RGBE) decoder.
//!
//! Reads flat and new-style RLE scanlines into scene-referred `f32` RGB.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use ociofmt_core::{DataFormat, ImageMetadata};

use crate::decoder::{report_row, try_reserve, try_zeroed, DecodeHandle, Decoder, Progress};
use crate::{IoError, IoResult};

const HDR_MAGIC: &str = "#?";

/// Radiance HDR decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct HdrDecoder;

impl Decoder for HdrDecoder {
    fn name(&self) -> &'static str {
        "Radiance HDR"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["hdr", "pic", "rgbe"]
    }

    fn can_read(&self, header: &[u8]) -> bool {
        header.starts_with(HDR_MAGIC.as_bytes())
    }

    fn open(&self, path: &Path) -> IoResult<Box<dyn DecodeHandle>> {
        let mut reader = BufReader::new(File::open(path)?);
        let meta = read_header(&mut reader)?;
        meta.validate()?;
        tracing::debug!(path = %path.display(), %meta, "opened HDR");
        Ok(Box::new(HdrHandle {
            reader: Some(reader),
            meta,
        }))
    }
}

struct HdrHandle {
    reader: Option<BufReader<File>>,
    meta: ImageMetadata,
}

impl DecodeHandle for HdrHandle {
    fn metadata(&self) -> &ImageMetadata {
        &self.meta
    }

    fn decode_full(&mut self, progress: Progress<'_>) -> IoResult<Vec<f32>> {
        let mut reader = self
            .reader
            .take()
            .ok_or_else(|| IoError::InvalidHandle("HDR already decoded".into()))?;
        read_pixels(
            &mut reader,
            self.meta.width as usize,
            self.meta.height as usize,
            progress,
        )
    }
}

fn read_header<R: BufRead>(reader: &mut R) -> IoResult<ImageMetadata> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    if !line.starts_with(HDR_MAGIC) {
        return Err(IoError::DecodeError("HDR magic not found".into()));
    }

    let mut attrs = Vec::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(IoError::DecodeError("missing HDR resolution line".into()));
        }
        let line = trim_line(&line);
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('+') || line.starts_with('-') {
            let (w, h) = parse_resolution(line)
                .ok_or_else(|| IoError::DecodeError(format!("invalid HDR resolution line: {line}")))?;
            let mut meta = ImageMetadata::new(w, h, 3, DataFormat::F32);
            for (k, v) in attrs {
                meta.set_attr(k, v);
            }
            return Ok(meta);
        }

        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim();
            match key.trim().to_uppercase().as_str() {
                "FORMAT" => {
                    if value.to_lowercase().contains("xyze") {
                        return Err(IoError::UnsupportedFormat("XYZE Radiance files".into()));
                    }
                    attrs.push(("hdr:Format", ociofmt_core::AttrValue::from(value)));
                }
                "EXPOSURE" => {
                    if let Ok(v) = value.parse::<f64>() {
                        attrs.push(("hdr:Exposure", v.into()));
                    }
                }
                "GAMMA" => {
                    if let Ok(v) = value.parse::<f64>() {
                        attrs.push(("hdr:Gamma", v.into()));
                    }
                }
                "SOFTWARE" => attrs.push(("Software", value.into())),
                _ => {}
            }
        }
    }
}

fn read_pixels<R: Read>(
    reader: &mut R,
    width: usize,
    height: usize,
    progress: &mut dyn FnMut(f32) -> bool,
) -> IoResult<Vec<f32>> {
    // grown per scanline so a lying header cannot force one huge allocation
    let mut data: Vec<f32> = Vec::new();
    let mut scanline = try_zeroed::<u8>(width * 4)?;

    for y in 0..height {
        try_reserve(&mut data, width * 3)?;
        let mut head = [0u8; 4];
        reader.read_exact(&mut head)?;

        let rle = (8..=0x7fff).contains(&width)
            && head[0] == 2
            && head[1] == 2
            && head[2] & 0x80 == 0;
        if rle {
            decode_rle_scanline(reader, width, &mut scanline, head)?;
        } else {
            scanline[..4].copy_from_slice(&head);
            reader.read_exact(&mut scanline[4..])?;
        }

        for px in scanline.chunks_exact(4) {
            data.extend(rgbe_to_f32(px[0], px[1], px[2], px[3]));
        }
        report_row(progress, y, height);
    }

    Ok(data)
}

fn decode_rle_scanline<R: Read>(
    reader: &mut R,
    width: usize,
    out: &mut [u8],
    header: [u8; 4],
) -> IoResult<()> {
    let encoded_width = ((header[2] as usize) << 8) | (header[3] as usize);
    if encoded_width != width {
        return Err(IoError::DecodeError("HDR RLE width mismatch".into()));
    }

    let mut channel = vec![0u8; width];
    for c in 0..4 {
        let mut idx = 0usize;
        while idx < width {
            let count = read_byte(reader)? as usize;
            if count > 128 {
                let run = count - 128;
                if idx + run > width {
                    return Err(IoError::DecodeError("HDR RLE run overflows scanline".into()));
                }
                let value = read_byte(reader)?;
                channel[idx..idx + run].fill(value);
                idx += run;
            } else {
                if count == 0 || idx + count > width {
                    return Err(IoError::DecodeError("bad HDR RLE literal".into()));
                }
                reader.read_exact(&mut channel[idx..idx + count])?;
                idx += count;
            }
        }

        for (x, &v) in channel.iter().enumerate() {
            out[x * 4 + c] = v;
        }
    }

    Ok(())
}

fn read_byte<R: Read>(reader: &mut R) -> IoResult<u8> {
    let mut b = [0u8; 1];
    reader.read_exact(&mut b)?;
    Ok(b[0])
}

fn rgbe_to_f32(r: u8, g: u8, b: u8, e: u8) -> [f32; 3] {
    if e == 0 {
        return [0.0; 3];
    }
    let f = 2.0_f32.powi(e as i32 - 136);
    [r as f32 * f, g as f32 * f, b as f32 * f]
}

fn parse_resolution(line: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 4 {
        return None;
    }

    let mut width = 0u32;
    let mut height = 0u32;
    for pair in parts.chunks_exact(2) {
        let value: u32 = pair[1].parse().ok()?;
        if pair[0].ends_with('X') {
            width = value;
        } else if pair[0].ends_with('Y') {
            height = value;
        }
    }

    (width > 0 && height > 0).then_some((width, height))
}

fn trim_line(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}
