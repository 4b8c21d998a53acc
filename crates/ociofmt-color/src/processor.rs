//! Transform processor for applying color conversions.
//!
//! A [`Processor`] is a transform chain compiled down to a flat list of
//! [`ProcessorOp`]s. Directions are resolved at compile time, so every op
//! knows which way it runs. Adjacent matrices are folded together and
//! identities dropped.
//!
//! # Example
//!
//! ```ignore
//! use ociofmt_color::Config;
//!
//! let config = Config::builtin()?;
//! let processor = config.processor("linear", "sRGB")?;
//!
//! let mut pixels = [[0.18_f32, 0.18, 0.18]; 4];
//! processor.apply_rgb(&mut pixels);
//! ```

use glam::DMat4;
use rayon::prelude::*;
use sha2::{Digest, Sha256};

use crate::error::{ColorError, ColorResult};
use crate::transfer::TransferStyle;
use crate::transform::*;

/// Rec.709 luma weights used by CDL saturation.
const LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Smallest argument fed to a logarithm.
const LOG_FLOOR: f32 = 1e-10;

/// Compiled operation.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum ProcessorOp {
    /// 4x4 matrix + offset, row-major.
    Matrix { matrix: [f32; 16], offset: [f32; 4] },
    /// Power function.
    Exponent {
        value: [f32; 4],
        negative_style: NegativeStyle,
    },
    /// Power with linear toe. `forward` decodes.
    ExponentWithLinear {
        gamma: [f32; 4],
        offset: [f32; 4],
        negative_style: NegativeStyle,
        forward: bool,
    },
    /// Logarithm. `forward` takes the log.
    Log { base: f32, forward: bool },
    /// Logarithm with affine terms.
    LogAffine {
        base: f32,
        log_side_slope: [f32; 3],
        log_side_offset: [f32; 3],
        lin_side_slope: [f32; 3],
        lin_side_offset: [f32; 3],
        forward: bool,
    },
    /// Scale/offset with optional clamps.
    Range {
        scale: f32,
        offset: f32,
        clamp_min: Option<f32>,
        clamp_max: Option<f32>,
    },
    /// ASC CDL.
    Cdl {
        slope: [f32; 3],
        offset: [f32; 3],
        power: [f32; 3],
        saturation: f32,
        style: CdlStyle,
        forward: bool,
    },
    /// Named transfer curve. `forward` encodes.
    Transfer { style: TransferStyle, forward: bool },
}

impl ProcessorOp {
    /// Returns true if this operation leaves every value unchanged.
    pub fn is_identity(&self) -> bool {
        match self {
            ProcessorOp::Matrix { matrix, offset } => {
                let identity = MatrixTransform::IDENTITY;
                let is_identity_matrix = matrix
                    .iter()
                    .zip(identity.iter())
                    .all(|(a, b)| (*a as f64 - b).abs() < 1e-6);
                let is_zero_offset = offset.iter().all(|v| v.abs() < 1e-6);
                is_identity_matrix && is_zero_offset
            }
            ProcessorOp::Exponent {
                value,
                negative_style,
            } => {
                value[..3].iter().all(|v| (v - 1.0).abs() < 1e-6)
                    && matches!(negative_style, NegativeStyle::PassThru | NegativeStyle::Mirror)
            }
            ProcessorOp::Range {
                scale,
                offset,
                clamp_min,
                clamp_max,
            } => {
                (scale - 1.0).abs() < 1e-6
                    && offset.abs() < 1e-6
                    && clamp_min.is_none()
                    && clamp_max.is_none()
            }
            ProcessorOp::Cdl {
                slope,
                offset,
                power,
                saturation,
                style,
                ..
            } => {
                *style == CdlStyle::NoClamp
                    && slope.iter().all(|v| (v - 1.0).abs() < 1e-6)
                    && offset.iter().all(|v| v.abs() < 1e-6)
                    && power.iter().all(|v| (v - 1.0).abs() < 1e-6)
                    && (saturation - 1.0).abs() < 1e-6
            }
            ProcessorOp::Transfer { style, .. } => *style == TransferStyle::Linear,
            ProcessorOp::ExponentWithLinear { .. }
            | ProcessorOp::Log { .. }
            | ProcessorOp::LogAffine { .. } => false,
        }
    }

    /// Applies this operation to one RGB triple.
    #[inline]
    pub fn apply(&self, px: &mut [f32; 3]) {
        match self {
            ProcessorOp::Matrix { matrix, offset } => {
                let [r, g, b] = *px;
                px[0] = r * matrix[0] + g * matrix[1] + b * matrix[2] + offset[0];
                px[1] = r * matrix[4] + g * matrix[5] + b * matrix[6] + offset[1];
                px[2] = r * matrix[8] + g * matrix[9] + b * matrix[10] + offset[2];
            }
            ProcessorOp::Exponent {
                value,
                negative_style,
            } => {
                for (v, e) in px.iter_mut().zip(value) {
                    *v = apply_negative(*v, *negative_style, |x| x.powf(*e));
                }
            }
            ProcessorOp::ExponentWithLinear {
                gamma,
                offset,
                negative_style,
                forward,
            } => {
                for i in 0..3 {
                    let curve = Moncurve::new(gamma[i], offset[i]);
                    px[i] = match negative_style {
                        NegativeStyle::Linear => curve.eval(px[i], *forward),
                        style => apply_negative(px[i], *style, |x| curve.eval(x, *forward)),
                    };
                }
            }
            ProcessorOp::Log { base, forward } => {
                for v in px.iter_mut() {
                    *v = if *forward {
                        v.max(LOG_FLOOR).log(*base)
                    } else {
                        base.powf(*v)
                    };
                }
            }
            ProcessorOp::LogAffine {
                base,
                log_side_slope,
                log_side_offset,
                lin_side_slope,
                lin_side_offset,
                forward,
            } => {
                for i in 0..3 {
                    px[i] = if *forward {
                        let lin = (lin_side_slope[i] * px[i] + lin_side_offset[i]).max(LOG_FLOOR);
                        log_side_slope[i] * lin.log(*base) + log_side_offset[i]
                    } else {
                        let e = (px[i] - log_side_offset[i]) / log_side_slope[i];
                        (base.powf(e) - lin_side_offset[i]) / lin_side_slope[i]
                    };
                }
            }
            ProcessorOp::Range {
                scale,
                offset,
                clamp_min,
                clamp_max,
            } => {
                for v in px.iter_mut() {
                    let mut out = *v * scale + offset;
                    if let Some(lo) = clamp_min {
                        out = out.max(*lo);
                    }
                    if let Some(hi) = clamp_max {
                        out = out.min(*hi);
                    }
                    *v = out;
                }
            }
            ProcessorOp::Cdl {
                slope,
                offset,
                power,
                saturation,
                style,
                forward,
            } => {
                if *forward {
                    cdl_forward(px, slope, offset, power, *saturation, *style);
                } else {
                    cdl_inverse(px, slope, offset, power, *saturation, *style);
                }
            }
            ProcessorOp::Transfer { style, forward } => {
                for v in px.iter_mut() {
                    *v = style.apply(*v, *forward);
                }
            }
        }
    }
}

fn apply_negative(v: f32, style: NegativeStyle, f: impl Fn(f32) -> f32) -> f32 {
    match style {
        NegativeStyle::Clamp | NegativeStyle::Linear => f(v.max(0.0)),
        NegativeStyle::Mirror => v.signum() * f(v.abs()),
        NegativeStyle::PassThru => {
            if v < 0.0 {
                v
            } else {
                f(v)
            }
        }
    }
}

/// Gamma-with-linear-toe curve (`forward` decodes).
///
/// `break_pnt` is on the encoded axis; `slope` is linear per encoded unit.
struct Moncurve {
    gamma: f32,
    offset: f32,
    break_pnt: f32,
    slope: f32,
}

impl Moncurve {
    fn new(gamma: f32, offset: f32) -> Self {
        if gamma <= 1.0 || offset <= 0.0 {
            return Self {
                gamma,
                offset: 0.0,
                break_pnt: 0.0,
                slope: 1.0,
            };
        }
        let break_pnt = offset / (gamma - 1.0);
        let slope = ((gamma - 1.0) / offset)
            * ((offset * gamma) / ((gamma - 1.0) * (1.0 + offset))).powf(gamma);
        Self {
            gamma,
            offset,
            break_pnt,
            slope,
        }
    }

    #[inline]
    fn eval(&self, v: f32, forward: bool) -> f32 {
        if forward {
            if v > self.break_pnt {
                ((v + self.offset) / (1.0 + self.offset)).powf(self.gamma)
            } else {
                v * self.slope
            }
        } else if v <= self.break_pnt * self.slope {
            v / self.slope
        } else {
            (1.0 + self.offset) * v.powf(1.0 / self.gamma) - self.offset
        }
    }
}

#[inline]
fn luma(px: &[f32; 3]) -> f32 {
    px[0] * LUMA[0] + px[1] * LUMA[1] + px[2] * LUMA[2]
}

fn cdl_forward(
    px: &mut [f32; 3],
    slope: &[f32; 3],
    offset: &[f32; 3],
    power: &[f32; 3],
    sat: f32,
    style: CdlStyle,
) {
    for i in 0..3 {
        let v = px[i] * slope[i] + offset[i];
        px[i] = match style {
            CdlStyle::AscCdl => v.clamp(0.0, 1.0).powf(power[i]),
            CdlStyle::NoClamp if v > 0.0 => v.powf(power[i]),
            CdlStyle::NoClamp => v,
        };
    }
    let y = luma(px);
    for v in px.iter_mut() {
        *v = y + sat * (*v - y);
        if style == CdlStyle::AscCdl {
            *v = v.clamp(0.0, 1.0);
        }
    }
}

fn cdl_inverse(
    px: &mut [f32; 3],
    slope: &[f32; 3],
    offset: &[f32; 3],
    power: &[f32; 3],
    sat: f32,
    style: CdlStyle,
) {
    let clamp = |v: f32| {
        if style == CdlStyle::AscCdl {
            v.clamp(0.0, 1.0)
        } else {
            v
        }
    };
    for v in px.iter_mut() {
        *v = clamp(*v);
    }
    let y = luma(px);
    for v in px.iter_mut() {
        *v = clamp(y + (*v - y) / sat);
    }
    for i in 0..3 {
        let v = if px[i] > 0.0 {
            px[i].powf(1.0 / power[i])
        } else {
            px[i]
        };
        px[i] = (v - offset[i]) / slope[i];
    }
}

/// Compiled transform processor.
///
/// Holds an optimized op list ready for pixel application. Processors are
/// immutable once built and safe to share between threads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Processor {
    ops: Vec<ProcessorOp>,
}

impl Processor {
    /// Creates an identity processor.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Compiles a transform in the given direction.
    ///
    /// # Errors
    ///
    /// [`ColorError::InvalidTransform`] for singular matrices, degenerate
    /// ranges, zero CDL slopes or saturation, or unusable log parameters.
    pub fn from_transform(transform: &Transform, direction: TransformDirection) -> ColorResult<Self> {
        let mut p = Self::default();
        p.compile(transform, direction)?;
        p.optimize();
        Ok(p)
    }

    /// Compiled ops.
    pub fn ops(&self) -> &[ProcessorOp] {
        &self.ops
    }

    /// Returns the number of operations.
    #[inline]
    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// Checks if processor is identity (no-op).
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.ops.is_empty()
    }

    /// Drops identities and folds adjacent matrices.
    pub fn optimize(&mut self) {
        self.ops.retain(|op| !op.is_identity());
        self.combine_matrices();
        self.ops.retain(|op| !op.is_identity());
    }

    fn combine_matrices(&mut self) {
        if self.ops.len() < 2 {
            return;
        }

        let mut result = Vec::with_capacity(self.ops.len());
        let mut pending: Option<([f32; 16], [f32; 4])> = None;

        for op in self.ops.drain(..) {
            if let ProcessorOp::Matrix { matrix, offset } = &op {
                pending = Some(match pending.take() {
                    // Combine: new_m * prev_m, new_m * prev_o + new_o
                    Some((prev_m, prev_o)) => {
                        let m = mat4_mul(matrix, &prev_m);
                        let o = mat4_apply(matrix, &prev_o);
                        (m, [o[0] + offset[0], o[1] + offset[1], o[2] + offset[2], o[3] + offset[3]])
                    }
                    None => (*matrix, *offset),
                });
            } else {
                if let Some((matrix, offset)) = pending.take() {
                    result.push(ProcessorOp::Matrix { matrix, offset });
                }
                result.push(op);
            }
        }
        if let Some((matrix, offset)) = pending {
            result.push(ProcessorOp::Matrix { matrix, offset });
        }
        self.ops = result;
    }

    fn compile(&mut self, transform: &Transform, direction: TransformDirection) -> ColorResult<()> {
        let dir = direction.combine(transform.direction());
        let forward = dir == TransformDirection::Forward;
        match transform {
            Transform::Matrix(m) => {
                let (matrix, offset) = if forward {
                    (m.matrix, m.offset)
                } else {
                    invert_matrix(&m.matrix, &m.offset)?
                };
                self.ops.push(ProcessorOp::Matrix {
                    matrix: matrix.map(|v| v as f32),
                    offset: offset.map(|v| v as f32),
                });
            }
            Transform::Exponent(e) => {
                if !forward && e.value[..3].iter().any(|v| v.abs() < 1e-12) {
                    return Err(ColorError::invalid("cannot invert a zero exponent"));
                }
                let value = if forward {
                    e.value.map(|v| v as f32)
                } else {
                    e.value.map(|v| (1.0 / v) as f32)
                };
                self.ops.push(ProcessorOp::Exponent {
                    value,
                    negative_style: e.negative_style,
                });
            }
            Transform::ExponentWithLinear(e) => {
                self.ops.push(ProcessorOp::ExponentWithLinear {
                    gamma: e.gamma.map(|v| v as f32),
                    offset: e.offset.map(|v| v as f32),
                    negative_style: e.negative_style,
                    forward,
                });
            }
            Transform::Log(l) => {
                check_log_base(l.base)?;
                self.ops.push(ProcessorOp::Log {
                    base: l.base as f32,
                    forward,
                });
            }
            Transform::LogAffine(l) => {
                check_log_base(l.base)?;
                if l.log_side_slope.iter().chain(&l.lin_side_slope).any(|v| v.abs() < 1e-12) {
                    return Err(ColorError::invalid("log affine slopes must be non-zero"));
                }
                self.ops.push(ProcessorOp::LogAffine {
                    base: l.base as f32,
                    log_side_slope: l.log_side_slope.map(|v| v as f32),
                    log_side_offset: l.log_side_offset.map(|v| v as f32),
                    lin_side_slope: l.lin_side_slope.map(|v| v as f32),
                    lin_side_offset: l.lin_side_offset.map(|v| v as f32),
                    forward,
                });
            }
            Transform::Range(r) => self.ops.push(compile_range(r, forward)?),
            Transform::Cdl(c) => {
                if c.slope.iter().any(|v| v.abs() < 1e-12) {
                    return Err(ColorError::invalid("CDL slope must be non-zero"));
                }
                if c.power.iter().any(|v| *v <= 0.0) {
                    return Err(ColorError::invalid("CDL power must be positive"));
                }
                if !forward && c.saturation.abs() < 1e-12 {
                    return Err(ColorError::invalid("cannot invert a zero CDL saturation"));
                }
                self.ops.push(ProcessorOp::Cdl {
                    slope: c.slope.map(|v| v as f32),
                    offset: c.offset.map(|v| v as f32),
                    power: c.power.map(|v| v as f32),
                    saturation: c.saturation as f32,
                    style: c.style,
                    forward,
                });
            }
            Transform::Builtin(b) => self.ops.push(ProcessorOp::Transfer {
                style: b.style,
                forward,
            }),
            Transform::Group(g) => {
                if forward {
                    for t in &g.transforms {
                        self.compile(t, TransformDirection::Forward)?;
                    }
                } else {
                    for t in g.transforms.iter().rev() {
                        self.compile(t, TransformDirection::Inverse)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Applies the transform to RGB pixels in-place.
    pub fn apply_rgb(&self, pixels: &mut [[f32; 3]]) {
        if self.ops.is_empty() {
            return;
        }
        pixels.par_iter_mut().for_each(|px| self.apply_one(px));
    }

    /// Applies the transform to a single RGB triple.
    #[inline]
    pub fn apply_one(&self, px: &mut [f32; 3]) {
        for op in &self.ops {
            op.apply(px);
        }
    }

    /// Applies the transform in place to a packed, channel-interleaved
    /// float image.
    ///
    /// With three or more channels the first three are treated as RGB and
    /// the rest pass through. With one or two channels the first channel is
    /// fed through all three lanes as grey and the red result written back.
    ///
    /// # Errors
    ///
    /// [`ColorError::Validation`] when `channels` is zero or the buffer does
    /// not hold exactly `width * height * channels` samples.
    pub fn apply_packed(
        &self,
        buf: &mut [f32],
        width: usize,
        height: usize,
        channels: usize,
    ) -> ColorResult<()> {
        if channels == 0 {
            return Err(ColorError::Validation("image has no channels".into()));
        }
        let expected = width * height * channels;
        if buf.len() != expected {
            return Err(ColorError::Validation(format!(
                "buffer holds {} samples, expected {expected} ({width}x{height}x{channels})",
                buf.len()
            )));
        }
        if self.ops.is_empty() || expected == 0 {
            return Ok(());
        }

        buf.par_chunks_mut(width * channels).for_each(|row| {
            for px in row.chunks_exact_mut(channels) {
                if channels >= 3 {
                    let mut rgb = [px[0], px[1], px[2]];
                    self.apply_one(&mut rgb);
                    px[..3].copy_from_slice(&rgb);
                } else {
                    let mut rgb = [px[0]; 3];
                    self.apply_one(&mut rgb);
                    px[0] = rgb[0];
                }
            }
        });
        Ok(())
    }

    /// Content hash of the compiled ops.
    ///
    /// Two processors with equal ids produce identical output, so the id
    /// can key LUT and shader caches.
    pub fn cache_id(&self) -> String {
        let mut hasher = Sha256::new();
        for op in &self.ops {
            hasher.update(format!("{op:?}").as_bytes());
            hasher.update(b";");
        }
        format!("{:x}", hasher.finalize())
    }

    /// Cache id for a 3D LUT of `edge` samples per axis baked from this processor.
    pub fn lut_cache_id(&self, edge: usize) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.cache_id().as_bytes());
        hasher.update(format!("lut3d:{edge}").as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

fn check_log_base(base: f64) -> ColorResult<()> {
    if base <= 0.0 || (base - 1.0).abs() < 1e-12 {
        return Err(ColorError::invalid(format!("log base {base} is not usable")));
    }
    Ok(())
}

fn compile_range(r: &RangeTransform, forward: bool) -> ColorResult<ProcessorOp> {
    let (min_in, max_in, min_out, max_out) = if forward {
        (r.min_in, r.max_in, r.min_out, r.max_out)
    } else {
        (r.min_out, r.max_out, r.min_in, r.max_in)
    };
    let clamp = r.style == RangeStyle::Clamp;
    let lo_pair = min_in.zip(min_out);
    let hi_pair = max_in.zip(max_out);

    let op = match (lo_pair, hi_pair) {
        (Some((mini, mino)), Some((maxi, maxo))) => {
            if (maxi - mini).abs() < 1e-12 {
                return Err(ColorError::invalid("range input min equals input max"));
            }
            let scale = (maxo - mino) / (maxi - mini);
            let offset = mino - scale * mini;
            ProcessorOp::Range {
                scale: scale as f32,
                offset: offset as f32,
                clamp_min: clamp.then_some(mino.min(maxo) as f32),
                clamp_max: clamp.then_some(mino.max(maxo) as f32),
            }
        }
        (Some((mini, mino)), None) => ProcessorOp::Range {
            scale: 1.0,
            offset: (mino - mini) as f32,
            clamp_min: Some(mino as f32),
            clamp_max: None,
        },
        (None, Some((maxi, maxo))) => ProcessorOp::Range {
            scale: 1.0,
            offset: (maxo - maxi) as f32,
            clamp_min: None,
            clamp_max: Some(maxo as f32),
        },
        (None, None) => ProcessorOp::Range {
            scale: 1.0,
            offset: 0.0,
            clamp_min: None,
            clamp_max: None,
        },
    };
    Ok(op)
}

/// Inverts a row-major 4x4 matrix and offset: `M^-1`, `-M^-1 * offset`.
fn invert_matrix(m: &[f64; 16], offset: &[f64; 4]) -> ColorResult<([f64; 16], [f64; 4])> {
    // Row-major data read as columns is the transpose.
    let mat = DMat4::from_cols_array(m).transpose();
    if mat.determinant().abs() < 1e-12 {
        return Err(ColorError::invalid(
            "cannot invert singular matrix (determinant near zero)",
        ));
    }
    let inv = mat.inverse().transpose().to_cols_array();
    let mut inv_offset = [0.0; 4];
    for (i, o) in inv_offset.iter_mut().enumerate() {
        *o = -(0..4).map(|j| inv[i * 4 + j] * offset[j]).sum::<f64>();
    }
    Ok((inv, inv_offset))
}

/// 4x4 matrix multiply (row-major layout).
fn mat4_mul(a: &[f32; 16], b: &[f32; 16]) -> [f32; 16] {
    let mut r = [0.0; 16];
    for i in 0..4 {
        for j in 0..4 {
            r[i * 4 + j] = a[i * 4] * b[j]
                + a[i * 4 + 1] * b[4 + j]
                + a[i * 4 + 2] * b[8 + j]
                + a[i * 4 + 3] * b[12 + j];
        }
    }
    r
}

/// Applies a 4x4 matrix to a 4-vector (row-major layout).
fn mat4_apply(m: &[f32; 16], v: &[f32; 4]) -> [f32; 4] {
    [
        m[0] * v[0] + m[1] * v[1] + m[2] * v[2] + m[3] * v[3],
        m[4] * v[0] + m[5] * v[1] + m[6] * v[2] + m[7] * v[3],
        m[8] * v[0] + m[9] * v[1] + m[10] * v[2] + m[11] * v[3],
        m[12] * v[0] + m[13] * v[1] + m[14] * v[2] + m[15] * v[3],
    ]
}
