//! OpenGL device through `glow`.
//!
//! The caller owns the context and must keep it current while the device
//! is used.

use std::sync::Arc;

use glow::HasContext;

use crate::device::{GpuDevice, IMAGE_SAMPLER, LUT_SAMPLER};

type Gl = glow::Context;

/// [`GpuDevice`] on a shared `glow` context.
pub struct GlDevice {
    gl: Arc<Gl>,
}

impl GlDevice {
    /// Wraps a context.
    pub fn new(gl: Arc<Gl>) -> Self {
        Self { gl }
    }

    /// The context.
    pub fn gl(&self) -> &Gl {
        &self.gl
    }
}

impl std::fmt::Debug for GlDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlDevice").finish_non_exhaustive()
    }
}

fn dim(v: usize) -> Result<i32, String> {
    i32::try_from(v).map_err(|_| format!("texture dimension {v} out of range"))
}

impl GpuDevice for GlDevice {
    type Texture = <Gl as HasContext>::Texture;
    type Shader = <Gl as HasContext>::Shader;
    type Program = <Gl as HasContext>::Program;

    fn create_lut_texture(&mut self, edge: usize) -> Result<Self::Texture, String> {
        let e = dim(edge)?;
        let zeros = vec![0f32; edge * edge * edge * 3];
        // SAFETY: context is current; the upload slice outlives the call.
        unsafe {
            let tex = self.gl.create_texture()?;
            self.gl.bind_texture(glow::TEXTURE_3D, Some(tex));
            for (pname, value) in [
                (glow::TEXTURE_MIN_FILTER, glow::LINEAR),
                (glow::TEXTURE_MAG_FILTER, glow::LINEAR),
                (glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE),
                (glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE),
                (glow::TEXTURE_WRAP_R, glow::CLAMP_TO_EDGE),
            ] {
                self.gl.tex_parameter_i32(glow::TEXTURE_3D, pname, value as i32);
            }
            self.gl.tex_image_3d(
                glow::TEXTURE_3D,
                0,
                glow::RGB16F as i32,
                e,
                e,
                e,
                0,
                glow::RGB,
                glow::FLOAT,
                glow::PixelUnpackData::Slice(Some(bytemuck::cast_slice(&zeros))),
            );
            Ok(tex)
        }
    }

    fn upload_lut(&mut self, texture: Self::Texture, edge: usize, data: &[f32]) -> Result<(), String> {
        if data.len() != edge * edge * edge * 3 {
            return Err(format!("LUT data holds {} samples", data.len()));
        }
        let e = dim(edge)?;
        // SAFETY: context is current; size checked above.
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_3D, Some(texture));
            self.gl.tex_sub_image_3d(
                glow::TEXTURE_3D,
                0,
                0,
                0,
                0,
                e,
                e,
                e,
                glow::RGB,
                glow::FLOAT,
                glow::PixelUnpackData::Slice(Some(bytemuck::cast_slice(data))),
            );
        }
        Ok(())
    }

    fn create_image_texture(
        &mut self,
        width: u32,
        height: u32,
        channels: usize,
        data: &[f32],
    ) -> Result<Self::Texture, String> {
        let format = match channels {
            3 => glow::RGB,
            4 => glow::RGBA,
            n => return Err(format!("image textures take 3 or 4 channels, got {n}")),
        };
        if data.len() != width as usize * height as usize * channels {
            return Err(format!("image data holds {} samples", data.len()));
        }
        let (w, h) = (dim(width as usize)?, dim(height as usize)?);
        // SAFETY: context is current; size checked above.
        unsafe {
            let tex = self.gl.create_texture()?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(tex));
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA16F as i32,
                w,
                h,
                0,
                format,
                glow::FLOAT,
                glow::PixelUnpackData::Slice(Some(bytemuck::cast_slice(data))),
            );
            Ok(tex)
        }
    }

    fn compile_fragment(&mut self, source: &str) -> Result<Self::Shader, String> {
        // SAFETY: context is current.
        unsafe {
            let shader = self.gl.create_shader(glow::FRAGMENT_SHADER)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if self.gl.get_shader_compile_status(shader) {
                Ok(shader)
            } else {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                Err(log)
            }
        }
    }

    fn link_program(&mut self, shader: Self::Shader) -> Result<Self::Program, String> {
        // SAFETY: context is current.
        unsafe {
            let program = self.gl.create_program()?;
            self.gl.attach_shader(program, shader);
            self.gl.link_program(program);
            if self.gl.get_program_link_status(program) {
                Ok(program)
            } else {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                Err(log)
            }
        }
    }

    fn bind_samplers(&mut self, program: Self::Program, image_unit: u32, lut_unit: u32) {
        // SAFETY: context is current.
        unsafe {
            self.gl.use_program(Some(program));
            let image = self.gl.get_uniform_location(program, IMAGE_SAMPLER);
            self.gl.uniform_1_i32(image.as_ref(), image_unit as i32);
            let lut = self.gl.get_uniform_location(program, LUT_SAMPLER);
            self.gl.uniform_1_i32(lut.as_ref(), lut_unit as i32);
        }
    }

    fn bind_textures(&mut self, image: Self::Texture, image_unit: u32, lut: Self::Texture, lut_unit: u32) {
        // SAFETY: context is current.
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + image_unit);
            self.gl.bind_texture(glow::TEXTURE_2D, Some(image));
            self.gl.active_texture(glow::TEXTURE0 + lut_unit);
            self.gl.bind_texture(glow::TEXTURE_3D, Some(lut));
            self.gl.active_texture(glow::TEXTURE0);
        }
    }

    fn delete_texture(&mut self, texture: Self::Texture) {
        // SAFETY: context is current.
        unsafe { self.gl.delete_texture(texture) }
    }

    fn delete_shader(&mut self, shader: Self::Shader) {
        // SAFETY: context is current.
        unsafe { self.gl.delete_shader(shader) }
    }

    fn delete_program(&mut self, program: Self::Program) {
        // SAFETY: context is current.
        unsafe { self.gl.delete_program(program) }
    }
}
