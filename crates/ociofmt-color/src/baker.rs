//! LUT baking for processors.
//!
//! Samples a processor on a regular lattice over `[0, 1]^3`. The lattice is
//! stored red-fastest, which is both the `.cube` order and the order an
//! OpenGL 3D texture expects (x = red, y = green, z = blue).
//!
//! # Example
//!
//! ```ignore
//! use ociofmt_color::{Baker, Config};
//!
//! let processor = Config::builtin().processor("linear", "srgb_display")?;
//! let baker = Baker::new(&processor);
//! let lut = baker.bake_lut_3d(32)?;
//! baker.write_cube_3d("preview.cube", &lut)?;
//! ```

use std::io::Write;
use std::path::Path;

use crate::error::{ColorError, ColorResult};
use crate::processor::Processor;

/// Baked 3D LUT data.
#[derive(Debug, Clone, PartialEq)]
pub struct BakedLut3D {
    /// LUT size per dimension (e.g., 32 for 32x32x32).
    pub size: usize,
    /// Input domain minimum per channel.
    pub domain_min: [f32; 3],
    /// Input domain maximum per channel.
    pub domain_max: [f32; 3],
    /// RGB triplets, `size^3 * 3` values, red varying fastest.
    pub data: Vec<f32>,
}

impl BakedLut3D {
    /// Output triple at lattice index `(r, g, b)`.
    pub fn at(&self, r: usize, g: usize, b: usize) -> [f32; 3] {
        let i = ((b * self.size + g) * self.size + r) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

/// LUT baker for converting processors to lookup tables.
#[derive(Debug)]
pub struct Baker<'a> {
    processor: &'a Processor,
}

impl<'a> Baker<'a> {
    /// Creates a new baker for the given processor.
    pub fn new(processor: &'a Processor) -> Self {
        Self { processor }
    }

    /// Bakes the processor to an `edge^3` 3D LUT over `[0, 1]^3`.
    ///
    /// # Errors
    ///
    /// [`ColorError::Validation`] when `edge < 2`.
    pub fn bake_lut_3d(&self, edge: usize) -> ColorResult<BakedLut3D> {
        if edge < 2 {
            return Err(ColorError::Validation("LUT size must be at least 2".into()));
        }

        let scale = 1.0 / (edge - 1) as f32;
        let mut lattice = Vec::with_capacity(edge * edge * edge);
        for b in 0..edge {
            for g in 0..edge {
                for r in 0..edge {
                    lattice.push([r as f32 * scale, g as f32 * scale, b as f32 * scale]);
                }
            }
        }
        self.processor.apply_rgb(&mut lattice);

        Ok(BakedLut3D {
            size: edge,
            domain_min: [0.0; 3],
            domain_max: [1.0; 3],
            data: lattice.into_iter().flatten().collect(),
        })
    }

    /// Writes a 3D LUT in `.cube` format.
    pub fn write_cube_3d_to(&self, out: &mut impl Write, lut: &BakedLut3D) -> ColorResult<()> {
        writeln!(out, "# Created by ociofmt")?;
        writeln!(out, "TITLE \"Baked 3D LUT\"")?;
        writeln!(out)?;
        writeln!(out, "LUT_3D_SIZE {}", lut.size)?;
        writeln!(
            out,
            "DOMAIN_MIN {:.10} {:.10} {:.10}",
            lut.domain_min[0], lut.domain_min[1], lut.domain_min[2]
        )?;
        writeln!(
            out,
            "DOMAIN_MAX {:.10} {:.10} {:.10}",
            lut.domain_max[0], lut.domain_max[1], lut.domain_max[2]
        )?;
        writeln!(out)?;

        for rgb in lut.data.chunks_exact(3) {
            writeln!(out, "{:.10} {:.10} {:.10}", rgb[0], rgb[1], rgb[2])?;
        }
        Ok(())
    }

    /// Writes a 3D LUT to a `.cube` file.
    pub fn write_cube_3d(&self, path: impl AsRef<Path>, lut: &BakedLut3D) -> ColorResult<()> {
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        self.write_cube_3d_to(&mut file, lut)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{MatrixTransform, Transform, TransformDirection};

    #[test]
    fn identity_lattice_is_red_fastest() {
        let p = Processor::identity();
        let lut = Baker::new(&p).bake_lut_3d(3).unwrap();
        assert_eq!(lut.data.len(), 27 * 3);
        assert_eq!(&lut.data[..6], &[0.0, 0.0, 0.0, 0.5, 0.0, 0.0]);
        assert_eq!(lut.at(2, 1, 0), [1.0, 0.5, 0.0]);
        assert_eq!(lut.at(0, 0, 2), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn processor_is_sampled() {
        let mut m = MatrixTransform::IDENTITY;
        m[0] = 0.0;
        m[1] = 1.0;
        m[4] = 1.0;
        m[5] = 0.0;
        let p = Processor::from_transform(&Transform::matrix(m), TransformDirection::Forward).unwrap();
        let lut = Baker::new(&p).bake_lut_3d(2).unwrap();
        // red and green swapped
        assert_eq!(lut.at(1, 0, 0), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn tiny_edge_rejected() {
        let p = Processor::identity();
        assert!(Baker::new(&p).bake_lut_3d(1).is_err());
    }

    #[test]
    fn cube_text() {
        let p = Processor::identity();
        let baker = Baker::new(&p);
        let lut = baker.bake_lut_3d(2).unwrap();
        let mut out = Vec::new();
        baker.write_cube_3d_to(&mut out, &lut).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("LUT_3D_SIZE 2"));
        assert_eq!(text.lines().filter(|l| l.starts_with(char::is_numeric)).count(), 8);
        assert!(text.lines().last().unwrap().starts_with("1.0000000000 1.0000000000 1.0000000000"));
    }
}
