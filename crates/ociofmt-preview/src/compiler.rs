//! Preview compiler: processor to 3D LUT plus fragment program.
//!
//! [`PreviewCompiler::sync`] rebuilds only when the LUT cache id of the
//! processor changes. A rebuild is commit-on-success: the new shader and
//! program are compiled, linked and bound before the old ones are deleted,
//! so a failed build leaves the previous bundle fully usable.
//!
//! ```ignore
//! use ociofmt_preview::{PreviewCompiler, SoftwareDevice};
//! use ociofmt_color::ShaderMode;
//!
//! let mut compiler = PreviewCompiler::new(SoftwareDevice::new(), 32, ShaderMode::Lut3d)?;
//! compiler.sync(&processor, 32)?; // Rebuilt
//! compiler.sync(&processor, 32)?; // Unchanged
//! ```

use ociofmt_color::{Baker, GpuProcessor, Processor, ShaderMode};
use tracing::{debug, info, warn};

use crate::device::{GpuDevice, IMAGE_UNIT, LUT_UNIT};
use crate::error::{PreviewError, PreviewResult, ShaderStage};

/// Edge length of the preview LUT.
pub const DEFAULT_LUT_EDGE: usize = 32;

/// Name of the generated color function.
pub const FUNCTION_NAME: &str = "OCIODisplay";

/// Fixed part of the preview fragment shader. The color function is
/// prepended by [`fragment_source`].
const FRAGMENT_MAIN: &str = "\
uniform sampler2D tex1;
uniform sampler3D tex2;

void main()
{
    vec4 col = texture2D(tex1, gl_TexCoord[0].st);
    gl_FragColor = OCIODisplay(col, tex2);
}
";

/// Builds the complete preview fragment shader for `processor`.
pub fn fragment_source(processor: &Processor, mode: ShaderMode, edge: usize) -> String {
    let ocio = GpuProcessor::from_processor(processor).shader_text(FUNCTION_NAME, mode, edge);
    format!("#version 120\n\n{ocio}\n{FRAGMENT_MAIN}")
}

/// What [`PreviewCompiler::sync`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Cache id matched; nothing was touched.
    Unchanged,
    /// LUT and program were rebuilt.
    Rebuilt,
}

/// A 3D LUT texture plus the program that samples it, valid for one cache id.
pub struct LutShaderBundle<D: GpuDevice> {
    edge: usize,
    lut_texture: Option<D::Texture>,
    lut: Vec<f32>,
    program: Option<(D::Shader, D::Program)>,
    cache_id: Option<String>,
    shader_text: String,
}

impl<D: GpuDevice> LutShaderBundle<D> {
    /// LUT samples per axis.
    pub fn edge(&self) -> usize {
        self.edge
    }

    /// Cache id the bundle was built from, `None` before the first build.
    pub fn cache_id(&self) -> Option<&str> {
        self.cache_id.as_deref()
    }

    /// CPU copy of the LUT, `edge^3` RGB triples, red fastest.
    pub fn lut(&self) -> &[f32] {
        &self.lut
    }

    /// Source of the current fragment shader.
    pub fn shader_text(&self) -> &str {
        &self.shader_text
    }

    /// LUT texture.
    pub fn lut_texture(&self) -> Option<D::Texture> {
        self.lut_texture
    }

    /// Current linked program.
    pub fn program(&self) -> Option<D::Program> {
        self.program.map(|(_, p)| p)
    }

    /// Returns true once a program has been built.
    pub fn is_ready(&self) -> bool {
        self.program.is_some()
    }
}

impl<D: GpuDevice> std::fmt::Debug for LutShaderBundle<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LutShaderBundle")
            .field("edge", &self.edge)
            .field("lut_texture", &self.lut_texture)
            .field("program", &self.program)
            .field("cache_id", &self.cache_id)
            .finish_non_exhaustive()
    }
}

/// Owns a device and the bundle built on it.
pub struct PreviewCompiler<D: GpuDevice> {
    device: D,
    bundle: LutShaderBundle<D>,
    mode: ShaderMode,
}

impl<D: GpuDevice> PreviewCompiler<D> {
    /// Allocates the LUT texture. No program exists until the first
    /// [`sync`](Self::sync).
    pub fn new(mut device: D, edge: usize, mode: ShaderMode) -> PreviewResult<Self> {
        let texture = device.create_lut_texture(edge).map_err(PreviewError::Device)?;
        Ok(Self {
            device,
            bundle: LutShaderBundle {
                edge,
                lut_texture: Some(texture),
                lut: vec![0.0; edge * edge * edge * 3],
                program: None,
                cache_id: None,
                shader_text: String::new(),
            },
            mode,
        })
    }

    /// Current bundle.
    pub fn bundle(&self) -> &LutShaderBundle<D> {
        &self.bundle
    }

    /// Shader mode used for rebuilds.
    pub fn mode(&self) -> ShaderMode {
        self.mode
    }

    /// The device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// The device, mutably.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Brings the bundle up to date with `processor`.
    ///
    /// # Errors
    ///
    /// [`PreviewError::ShaderBuildFailure`] carries the driver log; the
    /// previous bundle is untouched and keeps rendering.
    pub fn sync(&mut self, processor: &Processor, edge: usize) -> PreviewResult<SyncOutcome> {
        let id = processor.lut_cache_id(edge);
        if self.bundle.cache_id.as_deref() == Some(id.as_str()) {
            debug!(cache_id = short(&id), "preview up to date");
            return Ok(SyncOutcome::Unchanged);
        }

        let lut = Baker::new(processor).bake_lut_3d(edge)?;
        let text = fragment_source(processor, self.mode, edge);

        let shader = self
            .device
            .compile_fragment(&text)
            .map_err(|log| build_failure(ShaderStage::Compile, log))?;
        let program = match self.device.link_program(shader) {
            Ok(p) => p,
            Err(log) => {
                self.device.delete_shader(shader);
                return Err(build_failure(ShaderStage::Link, log));
            }
        };

        let resized = if edge != self.bundle.edge || self.bundle.lut_texture.is_none() {
            match self.device.create_lut_texture(edge) {
                Ok(t) => Some(t),
                Err(e) => {
                    self.discard(shader, program, None);
                    return Err(PreviewError::Device(e));
                }
            }
        } else {
            None
        };
        let target = match resized.or(self.bundle.lut_texture) {
            Some(t) => t,
            None => {
                self.discard(shader, program, None);
                return Err(PreviewError::Device("no LUT texture".into()));
            }
        };
        if let Err(e) = self.device.upload_lut(target, edge, &lut.data) {
            self.discard(shader, program, resized);
            return Err(PreviewError::Device(e));
        }
        self.device.bind_samplers(program, IMAGE_UNIT, LUT_UNIT);

        // commit
        if let Some((old_shader, old_program)) = self.bundle.program.replace((shader, program)) {
            self.device.delete_program(old_program);
            self.device.delete_shader(old_shader);
        }
        if let Some(t) = resized {
            if let Some(old) = self.bundle.lut_texture.replace(t) {
                self.device.delete_texture(old);
            }
            self.bundle.edge = edge;
        }
        self.bundle.lut = lut.data;
        self.bundle.shader_text = text;
        info!(cache_id = short(&id), edge, ops = processor.num_ops(), "preview rebuilt");
        self.bundle.cache_id = Some(id);
        Ok(SyncOutcome::Rebuilt)
    }

    fn discard(&mut self, shader: D::Shader, program: D::Program, texture: Option<D::Texture>) {
        self.device.delete_program(program);
        self.device.delete_shader(shader);
        if let Some(t) = texture {
            self.device.delete_texture(t);
        }
    }

    /// Deletes every GPU object of the bundle. Idempotent.
    pub fn release(&mut self) {
        if let Some((shader, program)) = self.bundle.program.take() {
            self.device.delete_program(program);
            self.device.delete_shader(shader);
        }
        if let Some(t) = self.bundle.lut_texture.take() {
            self.device.delete_texture(t);
        }
        self.bundle.cache_id = None;
    }
}

impl<D: GpuDevice> Drop for PreviewCompiler<D> {
    fn drop(&mut self) {
        self.release();
    }
}

fn short(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

fn build_failure(stage: ShaderStage, log: String) -> PreviewError {
    warn!(%stage, "preview shader build failed, keeping previous program:\n{log}");
    PreviewError::ShaderBuildFailure { stage, log }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::software::SoftwareDevice;
    use ociofmt_color::{builtin, Config};

    fn srgb() -> Processor {
        Config::builtin()
            .processor(builtin::LINEAR, builtin::SRGB_DISPLAY)
            .unwrap()
    }

    #[test]
    fn fragment_source_is_complete() {
        let text = fragment_source(&srgb(), ShaderMode::Lut3d, 32);
        assert!(text.starts_with("#version 120"));
        assert!(text.contains("vec4 OCIODisplay(vec4 inPixel, sampler3D lut3d)"));
        assert!(text.contains("gl_FragColor = OCIODisplay(col, tex2);"));
    }

    #[test]
    fn first_sync_builds_then_hits() {
        let mut c = PreviewCompiler::new(SoftwareDevice::new(), 8, ShaderMode::Lut3d).unwrap();
        assert!(!c.bundle().is_ready());

        let p = srgb();
        assert_eq!(c.sync(&p, 8).unwrap(), SyncOutcome::Rebuilt);
        assert!(c.bundle().is_ready());
        assert_eq!(c.bundle().cache_id(), Some(p.lut_cache_id(8).as_str()));
        assert_eq!(c.sync(&p, 8).unwrap(), SyncOutcome::Unchanged);

        // LUT texture, shader, program
        assert_eq!(c.device().live_objects(), 3);
        let (bound, image, lut) = c.device().bound_program().unwrap();
        assert_eq!(Some(bound), c.bundle().program());
        assert_eq!((image, lut), (IMAGE_UNIT, LUT_UNIT));
    }

    #[test]
    fn rebuild_replaces_objects() {
        let mut c = PreviewCompiler::new(SoftwareDevice::new(), 4, ShaderMode::Lut3d).unwrap();
        c.sync(&srgb(), 4).unwrap();
        let first = c.bundle().program();

        c.sync(&Processor::identity(), 4).unwrap();
        assert_ne!(c.bundle().program(), first);
        assert_eq!(c.device().live_objects(), 3);
        assert_eq!(c.bundle().lut()[3], 1.0 / 3.0);
    }

    #[test]
    fn edge_change_reallocates_texture() {
        let mut c = PreviewCompiler::new(SoftwareDevice::new(), 4, ShaderMode::Lut3d).unwrap();
        let p = srgb();
        c.sync(&p, 4).unwrap();
        let old = c.bundle().lut_texture();
        assert_eq!(c.sync(&p, 6).unwrap(), SyncOutcome::Rebuilt);
        assert_ne!(c.bundle().lut_texture(), old);
        assert_eq!(c.bundle().edge(), 6);
        assert_eq!(c.bundle().lut().len(), 6 * 6 * 6 * 3);
        assert_eq!(c.device().live_objects(), 3);
    }

    #[test]
    fn release_is_idempotent() {
        let mut c = PreviewCompiler::new(SoftwareDevice::new(), 4, ShaderMode::Analytic).unwrap();
        c.sync(&srgb(), 4).unwrap();
        c.release();
        c.release();
        assert_eq!(c.device().live_objects(), 0);
        assert!(!c.bundle().is_ready());
    }
}
