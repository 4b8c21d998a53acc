//! The read protocol end to end, against a recording host.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ociofmt_color::Config;
use ociofmt_io::DecoderRegistry;
use ociofmt_plugin::{
    AcceptDefaults, Cancel, FixedRoles, HostCallbacks, HostRecord, ImageMode, Plugin,
    PluginSettings, Rect, ResultCode, Role, RoleSelector, Selector, SessionState,
};

/// What the host saw during one `advanceState`.
#[derive(Debug, Clone)]
struct Handoff {
    data: Vec<u8>,
    row_bytes: usize,
    col_bytes: usize,
    plane_bytes: usize,
    planes: (usize, usize),
    rect: Rect,
}

#[derive(Debug, Default)]
struct RecordingHost {
    progress: Vec<(f64, f64)>,
    handoffs: Vec<Handoff>,
    refuse_buffer: bool,
}

impl HostCallbacks for RecordingHost {
    fn progress(&mut self, done: f64, total: f64) {
        self.progress.push((done, total));
    }

    fn advance_state(&mut self, record: &HostRecord) -> ResultCode {
        let Some(data) = record.data.as_ref() else {
            return ResultCode::BadParameters;
        };
        self.handoffs.push(Handoff {
            data: data.clone(),
            row_bytes: record.row_bytes,
            col_bytes: record.col_bytes,
            plane_bytes: record.plane_bytes,
            planes: (record.lo_plane, record.hi_plane),
            rect: record.the_rect,
        });
        ResultCode::NoErr
    }

    fn allocate_buffer(&mut self, _bytes: usize) -> bool {
        !self.refuse_buffer
    }
}

fn plugin<S: RoleSelector>(selector: S) -> Plugin<S> {
    Plugin::new(
        Arc::new(Config::builtin()),
        DecoderRegistry::with_builtin(),
        PluginSettings::default(),
        selector,
    )
}

fn write_png(path: &Path, w: u32, h: u32, color: png::ColorType, depth: png::BitDepth, data: &[u8]) {
    let mut enc = png::Encoder::new(BufWriter::new(File::create(path).unwrap()), w, h);
    enc.set_color(color);
    enc.set_depth(depth);
    enc.write_header().unwrap().write_image_data(data).unwrap();
}

/// 64x64 RGB, 16 bits per sample.
fn rgb16(dir: &Path) -> (PathBuf, Vec<u16>) {
    let path = dir.join("plate.png");
    let samples: Vec<u16> = (0..64 * 64 * 3).map(|i| (i * 5 % 65536) as u16).collect();
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_be_bytes()).collect();
    write_png(&path, 64, 64, png::ColorType::Rgb, png::BitDepth::Sixteen, &bytes);
    (path, samples)
}

/// Big-endian 10-bit RGB DPX, method A packing.
fn dpx10(dir: &Path, w: u32, h: u32) -> PathBuf {
    let path = dir.join("scan.dpx");
    let mut header = vec![0u8; 2048];
    header[0..4].copy_from_slice(b"SDPX");
    header[4..8].copy_from_slice(&2048u32.to_be_bytes());
    header[772..776].copy_from_slice(&w.to_be_bytes());
    header[776..780].copy_from_slice(&h.to_be_bytes());
    header[800] = 50;
    header[801] = 3;
    header[803] = 10;
    header[804..806].copy_from_slice(&1u16.to_be_bytes());
    let mut f = File::create(&path).unwrap();
    f.write_all(&header).unwrap();
    for i in 0..w * h {
        let v = (i * 37) % 1024;
        f.write_all(&((v << 22) | (v << 12) | (v << 2)).to_be_bytes()).unwrap();
    }
    path
}

fn run<S: RoleSelector>(
    plugin: &mut Plugin<S>,
    record: &mut HostRecord,
    host: &mut RecordingHost,
    steps: &[Selector],
) -> Vec<ResultCode> {
    steps
        .iter()
        .map(|s| plugin.dispatch(*s, record, host))
        .collect()
}

const ALL: [Selector; 4] = [
    Selector::ReadPrepare,
    Selector::ReadStart,
    Selector::ReadContinue,
    Selector::ReadFinish,
];

#[test]
fn rgb16_png_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let (path, samples) = rgb16(dir.path());
    let mut p = plugin(AcceptDefaults);
    let mut record = HostRecord::new(&path);
    let mut host = RecordingHost::default();

    let codes = run(&mut p, &mut record, &mut host, &ALL[..2]);
    assert_eq!(codes, vec![ResultCode::NoErr; 2]);
    let session = p.session().unwrap();
    assert_eq!(session.input_role(), Role::Data);
    assert_eq!(session.output_role(), Role::MattePaint);
    assert!(!session.transformed());
    assert_eq!((record.width, record.height), (64, 64));
    assert_eq!(record.planes, 3);
    assert_eq!(record.transparency_plane, -1);
    assert_eq!(record.image_mode, ImageMode::RgbColor);
    assert_eq!(record.depth, 16);

    let codes = run(&mut p, &mut record, &mut host, &ALL[2..]);
    assert_eq!(codes, vec![ResultCode::NoErr; 2]);
    assert_eq!(p.state(), SessionState::Finished);
    assert!(p.session().is_none());
    assert!(record.data.is_none());

    assert_eq!(host.handoffs.len(), 1);
    let h = &host.handoffs[0];
    assert_eq!(h.data.len(), 64 * 64 * 3 * 2);
    assert_eq!(h.row_bytes, 64 * 3 * 2);
    assert_eq!((h.col_bytes, h.plane_bytes), (6, 2));
    assert_eq!(h.planes, (0, 2));
    assert_eq!(Some(h.rect), Rect::full(64, 64));

    // data role: samples come back bit-exact
    let back: Vec<u16> = h
        .data
        .chunks_exact(2)
        .map(|c| u16::from_ne_bytes([c[0], c[1]]))
        .collect();
    assert_eq!(back, samples);

    // one report per row, then conversion and handoff
    assert_eq!(host.progress.len(), 64 + 2);
    assert!(host.progress[..64].iter().all(|(d, t)| *d <= 1.0 && *t == 1.2));
    assert_eq!(host.progress[63].0, 1.0);
    assert_eq!(host.progress[64..], [(1.1, 1.2), (1.2, 1.2)]);
}

#[test]
fn no_decoder_fails_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "not an image").unwrap();
    let mut p = plugin(AcceptDefaults);
    let mut record = HostRecord::new(&path);
    let mut host = RecordingHost::default();

    let codes = run(&mut p, &mut record, &mut host, &ALL[..2]);
    assert_eq!(codes, vec![ResultCode::NoErr, ResultCode::CannotRead]);
    assert_eq!(p.state(), SessionState::Failed);
    assert!(p.session().is_none());
    assert!(host.progress.is_empty());

    // a host that keeps going gets nothing
    let codes = run(&mut p, &mut record, &mut host, &ALL[2..]);
    assert_eq!(codes, vec![ResultCode::BadParameters; 2]);
    assert!(host.handoffs.is_empty());
}

#[test]
fn missing_file_fails_start() {
    let mut p = plugin(AcceptDefaults);
    let mut record = HostRecord::new("/nonexistent/plate.png");
    let mut host = RecordingHost::default();
    let codes = run(&mut p, &mut record, &mut host, &ALL[..2]);
    assert_eq!(codes[1], ResultCode::CannotRead);
}

#[test]
fn single_channel_is_grayscale() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mask.png");
    let data: Vec<u8> = (0..8 * 8).map(|i| (i * 4) as u8).collect();
    write_png(&path, 8, 8, png::ColorType::Grayscale, png::BitDepth::Eight, &data);

    let selector = FixedRoles {
        input: Some(Role::SceneLinear),
        output: Some(Role::Display),
    };
    let mut p = plugin(selector);
    let mut record = HostRecord::new(&path);
    let mut host = RecordingHost::default();
    let codes = run(&mut p, &mut record, &mut host, &ALL);
    assert_eq!(codes, vec![ResultCode::NoErr; 4]);
    assert_eq!(record.image_mode, ImageMode::Grayscale);
    assert_eq!(record.planes, 1);
    assert_eq!(host.handoffs[0].data.len(), 8 * 8 * 2);
    assert_eq!(host.handoffs[0].planes, (0, 0));
}

#[test]
fn alpha_plane_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sprite.png");
    write_png(&path, 2, 2, png::ColorType::Rgba, png::BitDepth::Eight, &[128; 16]);
    let mut p = plugin(AcceptDefaults);
    let mut record = HostRecord::new(&path);
    let mut host = RecordingHost::default();
    run(&mut p, &mut record, &mut host, &ALL[..2]);
    assert_eq!(record.transparency_plane, 3);
    assert_eq!(record.planes, 4);
}

#[test]
fn ten_bit_dpx_is_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dpx10(dir.path(), 4, 2);
    let mut p = plugin(AcceptDefaults);
    let mut record = HostRecord::new(&path);
    let mut host = RecordingHost::default();
    run(&mut p, &mut record, &mut host, &ALL[..2]);

    let session = p.session().unwrap();
    assert_eq!(session.input_role(), Role::CompositingLog);
    assert_eq!(session.output_role(), Role::MattePaint);
    assert!(session.transformed());
}

/// 16-bit RGB DPX header with no pixel data behind it.
fn dpx_header_only(dir: &Path, w: u32, h: u32) -> PathBuf {
    let path = dir.join("header.dpx");
    let mut header = vec![0u8; 2048];
    header[0..4].copy_from_slice(b"SDPX");
    header[4..8].copy_from_slice(&2048u32.to_be_bytes());
    header[772..776].copy_from_slice(&w.to_be_bytes());
    header[776..780].copy_from_slice(&h.to_be_bytes());
    header[800] = 50;
    header[803] = 16;
    std::fs::write(&path, &header).unwrap();
    path
}

#[test]
fn oversized_header_fails_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dpx_header_only(dir.path(), 200_000, 200_000);
    let mut p = plugin(AcceptDefaults);
    let mut record = HostRecord::new(&path);
    let mut host = RecordingHost::default();
    let codes = run(&mut p, &mut record, &mut host, &ALL[..2]);
    assert_eq!(codes, vec![ResultCode::NoErr, ResultCode::CannotRead]);
    assert_eq!(p.state(), SessionState::Failed);
    assert!(p.session().is_none());
}

#[test]
fn width_past_host_range_fails_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dpx_header_only(dir.path(), 1 << 31, 1);
    let mut p = plugin(AcceptDefaults);
    let mut record = HostRecord::new(&path);
    let mut host = RecordingHost::default();
    let codes = run(&mut p, &mut record, &mut host, &ALL[..2]);
    assert_eq!(codes, vec![ResultCode::NoErr, ResultCode::BadParameters]);
    assert_eq!(p.state(), SessionState::Failed);
    // refused before any decoding
    assert!(host.progress.is_empty());
}

#[test]
fn unknown_output_leaves_pixels_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dpx10(dir.path(), 4, 2);

    let mut keep = plugin(FixedRoles {
        input: None,
        output: Some(Role::Unknown),
    });
    let mut record = HostRecord::new(&path);
    let mut host = RecordingHost::default();
    run(&mut keep, &mut record, &mut host, &ALL[..3]);
    assert!(!keep.session().unwrap().transformed());
    assert!(keep.session().unwrap().processor().is_identity());

    // same bytes as a data-to-data import
    let mut data = plugin(FixedRoles {
        input: Some(Role::Data),
        output: Some(Role::Data),
    });
    let mut record = HostRecord::new(&path);
    let mut reference = RecordingHost::default();
    run(&mut data, &mut record, &mut reference, &ALL[..3]);
    assert_eq!(host.handoffs[0].data, reference.handoffs[0].data);
}

#[test]
fn cancelled_selection_cannot_read() {
    let dir = tempfile::tempdir().unwrap();
    let (path, _) = rgb16(dir.path());
    let mut p = plugin(Cancel);
    let mut record = HostRecord::new(&path);
    let mut host = RecordingHost::default();
    let codes = run(&mut p, &mut record, &mut host, &ALL[..2]);
    assert_eq!(codes[1], ResultCode::CannotRead);
    assert!(p.session().is_none());
}

#[test]
fn undefined_role_fails_start() {
    let dir = tempfile::tempdir().unwrap();
    let (path, _) = rgb16(dir.path());
    let mut config = Config::builtin();
    config.set_role("texture_paint", "missing");
    let mut p = Plugin::new(
        Arc::new(config),
        DecoderRegistry::with_builtin(),
        PluginSettings::default(),
        FixedRoles {
            input: Some(Role::SceneLinear),
            output: Some(Role::TexturePaint),
        },
    );
    let mut record = HostRecord::new(&path);
    let mut host = RecordingHost::default();
    let codes = run(&mut p, &mut record, &mut host, &ALL[..2]);
    assert_eq!(codes[1], ResultCode::CannotRead);
}

#[test]
fn refused_buffer_is_out_of_memory() {
    let dir = tempfile::tempdir().unwrap();
    let (path, _) = rgb16(dir.path());
    let mut p = plugin(AcceptDefaults);
    let mut record = HostRecord::new(&path);
    let mut host = RecordingHost {
        refuse_buffer: true,
        ..RecordingHost::default()
    };
    let codes = run(&mut p, &mut record, &mut host, &ALL[..3]);
    assert_eq!(codes[2], ResultCode::MemFull);
    assert!(host.handoffs.is_empty());
    assert!(record.data.is_none());
    assert_eq!(p.state(), SessionState::Failed);
}

#[test]
fn eight_bit_host_depth() {
    let dir = tempfile::tempdir().unwrap();
    let (path, _) = rgb16(dir.path());
    let settings = PluginSettings {
        host_depth: 8,
        ..PluginSettings::default()
    };
    let mut p = Plugin::new(
        Arc::new(Config::builtin()),
        DecoderRegistry::with_builtin(),
        settings,
        AcceptDefaults,
    );
    let mut record = HostRecord::new(&path);
    let mut host = RecordingHost::default();
    run(&mut p, &mut record, &mut host, &ALL);
    assert_eq!(record.depth, 8);
    assert_eq!(host.handoffs[0].data.len(), 64 * 64 * 3);
    assert_eq!(host.handoffs[0].row_bytes, 64 * 3);
}

#[test]
fn prepare_starts_over_after_failure() {
    let dir = tempfile::tempdir().unwrap();
    let (path, _) = rgb16(dir.path());
    let mut p = plugin(AcceptDefaults);
    let mut record = HostRecord::new(dir.path().join("missing.png"));
    let mut host = RecordingHost::default();
    run(&mut p, &mut record, &mut host, &ALL[..2]);
    assert_eq!(p.state(), SessionState::Failed);

    let mut record = HostRecord::new(&path);
    let codes = run(&mut p, &mut record, &mut host, &ALL);
    assert_eq!(codes, vec![ResultCode::NoErr; 4]);
}
