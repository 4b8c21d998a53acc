//! The GPU seam.
//!
//! Everything the preview needs from a graphics API. Calls must happen on
//! the thread that owns the context, with the context current.

use std::fmt::Debug;

/// Texture unit the image is bound to.
pub const IMAGE_UNIT: u32 = 1;
/// Texture unit the 3D LUT is bound to.
pub const LUT_UNIT: u32 = 2;

/// Sampler uniform for the image texture.
pub const IMAGE_SAMPLER: &str = "tex1";
/// Sampler uniform for the LUT texture.
pub const LUT_SAMPLER: &str = "tex2";

/// Graphics device used by the preview compiler.
///
/// Errors are the driver's log text.
pub trait GpuDevice {
    /// Texture object.
    type Texture: Copy + Eq + Debug;
    /// Compiled fragment shader.
    type Shader: Copy + Eq + Debug;
    /// Linked program.
    type Program: Copy + Eq + Debug;

    /// Allocates an `edge^3` RGB float texture with linear filtering and
    /// edge clamping.
    fn create_lut_texture(&mut self, edge: usize) -> Result<Self::Texture, String>;

    /// Replaces the contents of a LUT texture. `data` holds `edge^3` RGB
    /// triples, red fastest.
    fn upload_lut(&mut self, texture: Self::Texture, edge: usize, data: &[f32]) -> Result<(), String>;

    /// Creates a 2D float texture from packed RGB (`channels == 3`) or RGBA
    /// (`channels == 4`) samples.
    fn create_image_texture(
        &mut self,
        width: u32,
        height: u32,
        channels: usize,
        data: &[f32],
    ) -> Result<Self::Texture, String>;

    /// Compiles fragment shader source.
    fn compile_fragment(&mut self, source: &str) -> Result<Self::Shader, String>;

    /// Links a program from one fragment shader.
    fn link_program(&mut self, shader: Self::Shader) -> Result<Self::Program, String>;

    /// Makes `program` current and points its samplers at the texture units.
    fn bind_samplers(&mut self, program: Self::Program, image_unit: u32, lut_unit: u32);

    /// Binds the 2D `image` texture to `image_unit` and the 3D `lut`
    /// texture to `lut_unit`.
    fn bind_textures(&mut self, image: Self::Texture, image_unit: u32, lut: Self::Texture, lut_unit: u32);

    /// Deletes a texture.
    fn delete_texture(&mut self, texture: Self::Texture);

    /// Deletes a shader.
    fn delete_shader(&mut self, shader: Self::Shader);

    /// Deletes a program.
    fn delete_program(&mut self, program: Self::Program);
}
