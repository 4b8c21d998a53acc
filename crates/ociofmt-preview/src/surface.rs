//! Preview surface: image texture plus compiler, torn down together.

use ociofmt_color::{Processor, ShaderMode};
use ociofmt_core::ImageMetadata;
use tracing::warn;

use crate::compiler::{PreviewCompiler, SyncOutcome};
use crate::device::{GpuDevice, IMAGE_UNIT, LUT_UNIT};
use crate::error::{PreviewError, PreviewResult};

/// Everything drawn by the preview widget.
pub struct PreviewSurface<D: GpuDevice> {
    compiler: PreviewCompiler<D>,
    image_texture: Option<D::Texture>,
    edge: usize,
    aspect: f32,
}

impl<D: GpuDevice> PreviewSurface<D> {
    /// Uploads the decoded image and allocates the LUT texture.
    ///
    /// Gray images are expanded to RGB and gray+alpha to RGBA.
    ///
    /// # Errors
    ///
    /// [`PreviewError::UnsupportedImage`] for zero or more than four
    /// channels, [`PreviewError::Buffer`] when `pixels` does not match
    /// `meta`.
    pub fn new(
        device: D,
        meta: &ImageMetadata,
        pixels: &[f32],
        edge: usize,
        mode: ShaderMode,
    ) -> PreviewResult<Self> {
        if pixels.len() != meta.sample_count() {
            return Err(ociofmt_core::Error::BufferSize {
                expected: meta.sample_count(),
                actual: pixels.len(),
            }
            .into());
        }
        let (channels, rgb) = texture_samples(meta.channels, pixels).ok_or_else(|| {
            warn!(channels = meta.channels, "cannot build a preview texture");
            PreviewError::UnsupportedImage {
                channels: meta.channels,
            }
        })?;

        let mut compiler = PreviewCompiler::new(device, edge, mode)?;
        let image_texture = compiler
            .device_mut()
            .create_image_texture(meta.width, meta.height, channels, &rgb)
            .map_err(PreviewError::Device)?;

        let aspect = if meta.height == 0 {
            1.0
        } else {
            meta.width as f32 / meta.height as f32
        };

        Ok(Self {
            compiler,
            image_texture: Some(image_texture),
            edge,
            aspect,
        })
    }

    /// Re-syncs the LUT and program with `processor`, rebinding the
    /// textures after a rebuild.
    pub fn sync(&mut self, processor: &Processor) -> PreviewResult<SyncOutcome> {
        let outcome = self.compiler.sync(processor, self.edge)?;
        if outcome == SyncOutcome::Rebuilt {
            self.bind()?;
        }
        Ok(outcome)
    }

    /// Makes the program current with the image and LUT on their units.
    /// Call before each draw when other code shares the context.
    ///
    /// # Errors
    ///
    /// [`PreviewError::Device`] before the first successful sync or after
    /// [`destroy`](Self::destroy).
    pub fn bind(&mut self) -> PreviewResult<()> {
        let bundle = self.compiler.bundle();
        let (Some(program), Some(lut), Some(image)) =
            (bundle.program(), bundle.lut_texture(), self.image_texture)
        else {
            return Err(PreviewError::Device("nothing to bind".into()));
        };
        let device = self.compiler.device_mut();
        device.bind_samplers(program, IMAGE_UNIT, LUT_UNIT);
        device.bind_textures(image, IMAGE_UNIT, lut, LUT_UNIT);
        Ok(())
    }

    /// The compiler and its bundle.
    pub fn compiler(&self) -> &PreviewCompiler<D> {
        &self.compiler
    }

    /// Image texture, `None` after [`destroy`](Self::destroy).
    pub fn image_texture(&self) -> Option<D::Texture> {
        self.image_texture
    }

    /// Image width over height.
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Quad `[x0, y0, x1, y1]` that fits the image into a window while
    /// keeping its aspect, centred on the free axis.
    pub fn viewport_quad(&self, win_width: u32, win_height: u32) -> [f32; 4] {
        let (w, h) = (win_width as f32, win_height as f32);
        let window_aspect = if win_height == 0 { 1.0 } else { w / h };
        if window_aspect > self.aspect {
            let img_w = self.aspect * h;
            [w * 0.5 - img_w * 0.5, 0.0, w * 0.5 + img_w * 0.5, h]
        } else {
            let img_h = w / self.aspect;
            [0.0, h * 0.5 - img_h * 0.5, w, h * 0.5 + img_h * 0.5]
        }
    }

    /// Deletes the image texture and the bundle.
    pub fn destroy(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(t) = self.image_texture.take() {
            self.compiler.device_mut().delete_texture(t);
        }
        self.compiler.release();
    }
}

impl<D: GpuDevice> Drop for PreviewSurface<D> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Samples laid out for an RGB or RGBA texture.
fn texture_samples(channels: usize, pixels: &[f32]) -> Option<(usize, Vec<f32>)> {
    match channels {
        1 => Some((3, pixels.iter().flat_map(|&g| [g, g, g]).collect())),
        2 => Some((
            4,
            pixels
                .chunks_exact(2)
                .flat_map(|ga| [ga[0], ga[0], ga[0], ga[1]])
                .collect(),
        )),
        3 | 4 => Some((channels, pixels.to_vec())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::software::{SoftTexture, SoftwareDevice};
    use approx::assert_relative_eq;
    use ociofmt_core::DataFormat;

    fn surface(w: u32, h: u32, channels: usize) -> PreviewResult<PreviewSurface<SoftwareDevice>> {
        let meta = ImageMetadata::new(w, h, channels, DataFormat::U16);
        let pixels = vec![0.25; meta.sample_count()];
        PreviewSurface::new(SoftwareDevice::new(), &meta, &pixels, 4, ShaderMode::Lut3d)
    }

    #[test]
    fn gray_is_expanded() {
        let s = surface(2, 2, 1).unwrap();
        let tex = s.image_texture().unwrap();
        match s.compiler().device().texture(tex) {
            Some(SoftTexture::Image { channels, data, .. }) => {
                assert_eq!(*channels, 3);
                assert_eq!(data.len(), 12);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn gray_alpha_is_rgba() {
        let s = surface(1, 1, 2).unwrap();
        let tex = s.image_texture().unwrap();
        assert!(matches!(
            s.compiler().device().texture(tex),
            Some(SoftTexture::Image { channels: 4, .. })
        ));
    }

    #[test]
    fn too_many_channels() {
        assert!(matches!(
            surface(1, 1, 5),
            Err(PreviewError::UnsupportedImage { channels: 5 })
        ));
    }

    #[test]
    fn buffer_mismatch() {
        let meta = ImageMetadata::new(2, 2, 3, DataFormat::U8);
        let r = PreviewSurface::new(SoftwareDevice::new(), &meta, &[0.0; 3], 4, ShaderMode::Lut3d);
        assert!(matches!(r, Err(PreviewError::Buffer(_))));
    }

    #[test]
    fn letterbox() {
        let s = surface(200, 100, 3).unwrap();
        assert_relative_eq!(s.aspect(), 2.0);
        // tall window: bars top and bottom
        assert_eq!(s.viewport_quad(100, 100), [0.0, 25.0, 100.0, 75.0]);
        // wide window: bars left and right
        assert_eq!(s.viewport_quad(400, 100), [100.0, 0.0, 300.0, 100.0]);
    }

    #[test]
    fn sync_through_surface() {
        let mut s = surface(1, 1, 4).unwrap();
        let p = Processor::identity();
        assert_eq!(s.sync(&p).unwrap(), SyncOutcome::Rebuilt);
        assert_eq!(s.sync(&p).unwrap(), SyncOutcome::Unchanged);
        // image, LUT, shader, program
        assert_eq!(s.compiler().device().live_objects(), 4);
    }

    #[test]
    fn rebuild_binds_both_textures() {
        let mut s = surface(2, 1, 3).unwrap();
        assert!(matches!(s.bind(), Err(PreviewError::Device(_))));

        s.sync(&Processor::identity()).unwrap();
        let device = s.compiler().device();
        assert_eq!(device.texture_on_unit(IMAGE_UNIT), s.image_texture());
        assert_eq!(device.texture_on_unit(LUT_UNIT), s.compiler().bundle().lut_texture());
        let (program, image_unit, lut_unit) = device.bound_program().unwrap();
        assert_eq!(Some(program), s.compiler().bundle().program());
        assert_eq!((image_unit, lut_unit), (IMAGE_UNIT, LUT_UNIT));
        assert!(s.bind().is_ok());
    }
}
