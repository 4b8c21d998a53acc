//! Headless device.
//!
//! Keeps uploaded data in memory and checks shader text structurally, so
//! the compiler can run without a GL context (CLI, tests). Compilation
//! accepts a source when its braces and parentheses balance, it has a
//! `main` function, and every sampler it declares is used.

use std::collections::HashMap;

use crate::device::{GpuDevice, IMAGE_SAMPLER, LUT_SAMPLER};

/// Object id handed out by [`SoftwareDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoftHandle(u32);

/// Texture contents kept by the software device.
#[derive(Debug, Clone, PartialEq)]
pub enum SoftTexture {
    /// `edge^3` RGB LUT.
    Lut {
        /// Samples per axis.
        edge: usize,
        /// RGB triples, red fastest.
        data: Vec<f32>,
    },
    /// 2D image.
    Image {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
        /// 3 or 4.
        channels: usize,
        /// Packed samples.
        data: Vec<f32>,
    },
}

/// In-memory [`GpuDevice`].
#[derive(Debug, Default)]
pub struct SoftwareDevice {
    next_id: u32,
    textures: HashMap<SoftHandle, SoftTexture>,
    shaders: HashMap<SoftHandle, String>,
    programs: HashMap<SoftHandle, SoftHandle>,
    bound: Option<(SoftHandle, u32, u32)>,
    units: HashMap<u32, SoftHandle>,
}

impl SoftwareDevice {
    /// Creates an empty device.
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self) -> SoftHandle {
        self.next_id += 1;
        SoftHandle(self.next_id)
    }

    /// Texture contents, if the texture is alive.
    pub fn texture(&self, texture: SoftHandle) -> Option<&SoftTexture> {
        self.textures.get(&texture)
    }

    /// Source of a live shader.
    pub fn shader_source(&self, shader: SoftHandle) -> Option<&str> {
        self.shaders.get(&shader).map(String::as_str)
    }

    /// Program made current by the last [`GpuDevice::bind_samplers`] call,
    /// with its image and LUT units.
    pub fn bound_program(&self) -> Option<(SoftHandle, u32, u32)> {
        self.bound
    }

    /// Texture bound to `unit` by [`GpuDevice::bind_textures`].
    pub fn texture_on_unit(&self, unit: u32) -> Option<SoftHandle> {
        self.units.get(&unit).copied()
    }

    /// Number of live objects (textures, shaders, programs).
    pub fn live_objects(&self) -> usize {
        self.textures.len() + self.shaders.len() + self.programs.len()
    }
}

impl GpuDevice for SoftwareDevice {
    type Texture = SoftHandle;
    type Shader = SoftHandle;
    type Program = SoftHandle;

    fn create_lut_texture(&mut self, edge: usize) -> Result<SoftHandle, String> {
        if edge < 2 {
            return Err(format!("invalid LUT edge {edge}"));
        }
        let id = self.alloc();
        self.textures.insert(
            id,
            SoftTexture::Lut {
                edge,
                data: vec![0.0; edge * edge * edge * 3],
            },
        );
        Ok(id)
    }

    fn upload_lut(&mut self, texture: SoftHandle, edge: usize, data: &[f32]) -> Result<(), String> {
        match self.textures.get_mut(&texture) {
            Some(SoftTexture::Lut { edge: e, data: d }) if *e == edge && d.len() == data.len() => {
                d.copy_from_slice(data);
                Ok(())
            }
            Some(_) => Err(format!("LUT upload does not match texture {texture:?}")),
            None => Err(format!("no texture {texture:?}")),
        }
    }

    fn create_image_texture(
        &mut self,
        width: u32,
        height: u32,
        channels: usize,
        data: &[f32],
    ) -> Result<SoftHandle, String> {
        if !matches!(channels, 3 | 4) {
            return Err(format!("image textures take 3 or 4 channels, got {channels}"));
        }
        if data.len() != width as usize * height as usize * channels {
            return Err(format!("image data holds {} samples", data.len()));
        }
        let id = self.alloc();
        self.textures.insert(
            id,
            SoftTexture::Image {
                width,
                height,
                channels,
                data: data.to_vec(),
            },
        );
        Ok(id)
    }

    fn compile_fragment(&mut self, source: &str) -> Result<SoftHandle, String> {
        check_source(source)?;
        let id = self.alloc();
        self.shaders.insert(id, source.to_string());
        Ok(id)
    }

    fn link_program(&mut self, shader: SoftHandle) -> Result<SoftHandle, String> {
        let source = self
            .shaders
            .get(&shader)
            .ok_or_else(|| format!("no shader {shader:?}"))?;
        if !source.contains("gl_FragColor") {
            return Err("fragment shader never writes gl_FragColor".into());
        }
        let id = self.alloc();
        self.programs.insert(id, shader);
        Ok(id)
    }

    fn bind_samplers(&mut self, program: SoftHandle, image_unit: u32, lut_unit: u32) {
        if self.programs.contains_key(&program) {
            self.bound = Some((program, image_unit, lut_unit));
        }
    }

    fn bind_textures(&mut self, image: SoftHandle, image_unit: u32, lut: SoftHandle, lut_unit: u32) {
        // a handle of the wrong kind leaves its unit untouched, as GL would
        if let Some(SoftTexture::Image { .. }) = self.textures.get(&image) {
            self.units.insert(image_unit, image);
        }
        if let Some(SoftTexture::Lut { .. }) = self.textures.get(&lut) {
            self.units.insert(lut_unit, lut);
        }
    }

    fn delete_texture(&mut self, texture: SoftHandle) {
        self.textures.remove(&texture);
        self.units.retain(|_, t| *t != texture);
    }

    fn delete_shader(&mut self, shader: SoftHandle) {
        self.shaders.remove(&shader);
    }

    fn delete_program(&mut self, program: SoftHandle) {
        self.programs.remove(&program);
        if self.bound.is_some_and(|(p, ..)| p == program) {
            self.bound = None;
        }
    }
}

/// Structural checks standing in for a GLSL compiler.
fn check_source(source: &str) -> Result<(), String> {
    let mut depth = [0i32; 2];
    for (n, line) in source.lines().enumerate() {
        for ch in line.chars() {
            match ch {
                '{' => depth[0] += 1,
                '}' => depth[0] -= 1,
                '(' => depth[1] += 1,
                ')' => depth[1] -= 1,
                _ => {}
            }
            if depth.iter().any(|d| *d < 0) {
                return Err(format!("0:{}: unexpected '{ch}'", n + 1));
            }
        }
    }
    if depth != [0, 0] {
        return Err("unexpected end of source".into());
    }
    if !source.contains("void main()") {
        return Err("missing main()".into());
    }
    for sampler in [IMAGE_SAMPLER, LUT_SAMPLER] {
        let declared = source.contains(&format!(" {sampler};"));
        let uses = source.matches(sampler).count();
        if declared && uses < 2 {
            return Err(format!("sampler '{sampler}' declared but never used"));
        }
    }
    Ok(())
}
