//! Transform definitions for color space conversions.
//!
//! A color space's `to_reference` / `from_reference` chain is a list of
//! these transforms. They are compiled into a [`Processor`](crate::Processor)
//! before any pixel is touched.

use crate::transfer::TransferStyle;

/// Transform application direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformDirection {
    /// Forward transform.
    #[default]
    Forward,
    /// Inverse transform.
    Inverse,
}

impl TransformDirection {
    /// Returns the opposite direction.
    #[inline]
    pub fn inverse(self) -> Self {
        match self {
            Self::Forward => Self::Inverse,
            Self::Inverse => Self::Forward,
        }
    }

    /// Combines an outer direction with the direction stored on a transform.
    #[inline]
    pub fn combine(self, inner: Self) -> Self {
        match self {
            Self::Forward => inner,
            Self::Inverse => inner.inverse(),
        }
    }

    /// Parses `forward` / `inverse` (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "forward" => Some(Self::Forward),
            "inverse" => Some(Self::Inverse),
            _ => None,
        }
    }
}

/// Color transform definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    /// 4x4 matrix plus offset.
    Matrix(MatrixTransform),
    /// Pure power function.
    Exponent(ExponentTransform),
    /// Power function with a linear toe (sRGB-style).
    ExponentWithLinear(ExponentWithLinearTransform),
    /// Logarithm of a fixed base.
    Log(LogTransform),
    /// Logarithm with affine pre/post terms.
    LogAffine(LogAffineTransform),
    /// Linear remap with optional clamping.
    Range(RangeTransform),
    /// ASC CDL.
    Cdl(CdlTransform),
    /// Named transfer curve.
    Builtin(BuiltinTransform),
    /// Ordered list of transforms.
    Group(GroupTransform),
}

impl Transform {
    /// Creates a forward matrix transform from a row-major 4x4 array.
    pub fn matrix(m: [f64; 16]) -> Self {
        Self::Matrix(MatrixTransform {
            matrix: m,
            offset: [0.0; 4],
            direction: TransformDirection::Forward,
        })
    }

    /// Creates a forward group transform.
    pub fn group(transforms: Vec<Transform>) -> Self {
        Self::Group(GroupTransform {
            transforms,
            direction: TransformDirection::Forward,
        })
    }

    /// Creates a builtin transfer transform.
    pub fn builtin(style: TransferStyle, direction: TransformDirection) -> Self {
        Self::Builtin(BuiltinTransform { style, direction })
    }

    /// Direction stored on this transform.
    pub fn direction(&self) -> TransformDirection {
        match self {
            Self::Matrix(t) => t.direction,
            Self::Exponent(t) => t.direction,
            Self::ExponentWithLinear(t) => t.direction,
            Self::Log(t) => t.direction,
            Self::LogAffine(t) => t.direction,
            Self::Range(t) => t.direction,
            Self::Cdl(t) => t.direction,
            Self::Builtin(t) => t.direction,
            Self::Group(t) => t.direction,
        }
    }

    /// Returns the inverse of this transform.
    pub fn inverse(self) -> Self {
        match self {
            Self::Matrix(mut t) => {
                t.direction = t.direction.inverse();
                Self::Matrix(t)
            }
            Self::Exponent(mut t) => {
                t.direction = t.direction.inverse();
                Self::Exponent(t)
            }
            Self::ExponentWithLinear(mut t) => {
                t.direction = t.direction.inverse();
                Self::ExponentWithLinear(t)
            }
            Self::Log(mut t) => {
                t.direction = t.direction.inverse();
                Self::Log(t)
            }
            Self::LogAffine(mut t) => {
                t.direction = t.direction.inverse();
                Self::LogAffine(t)
            }
            Self::Range(mut t) => {
                t.direction = t.direction.inverse();
                Self::Range(t)
            }
            Self::Cdl(mut t) => {
                t.direction = t.direction.inverse();
                Self::Cdl(t)
            }
            Self::Builtin(mut t) => {
                t.direction = t.direction.inverse();
                Self::Builtin(t)
            }
            Self::Group(mut t) => {
                t.direction = t.direction.inverse();
                Self::Group(t)
            }
        }
    }
}

/// 4x4 matrix + offset transform.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixTransform {
    /// 4x4 matrix in row-major order.
    pub matrix: [f64; 16],
    /// RGBA offset.
    pub offset: [f64; 4],
    /// Direction.
    pub direction: TransformDirection,
}

impl MatrixTransform {
    /// Identity matrix.
    pub const IDENTITY: [f64; 16] = [
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
    ];
}

/// Negative value handling for power functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NegativeStyle {
    /// Clamp negatives to zero.
    #[default]
    Clamp,
    /// Mirror: `sign(x) * f(|x|)`.
    Mirror,
    /// Pass negatives through unchanged.
    PassThru,
    /// Extend the linear segment below zero.
    Linear,
}

impl NegativeStyle {
    /// Parses an OCIO style name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "clamp" => Some(Self::Clamp),
            "mirror" => Some(Self::Mirror),
            "pass_thru" | "passthru" => Some(Self::PassThru),
            "linear" => Some(Self::Linear),
            _ => None,
        }
    }
}

/// Exponent/gamma transform: `out = in ^ value`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentTransform {
    /// Per-channel exponents [R, G, B, A].
    pub value: [f64; 4],
    /// Negative handling style.
    pub negative_style: NegativeStyle,
    /// Direction.
    pub direction: TransformDirection,
}

/// Gamma with linear segment.
///
/// Forward decodes (`encoded -> linear`), matching OCIO:
/// `out = ((in + offset) / (1 + offset)) ^ gamma` above the break point.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentWithLinearTransform {
    /// Per-channel gamma [R, G, B, A].
    pub gamma: [f64; 4],
    /// Per-channel offset [R, G, B, A].
    pub offset: [f64; 4],
    /// Negative handling style.
    pub negative_style: NegativeStyle,
    /// Direction.
    pub direction: TransformDirection,
}

/// Log transform: forward is `log_base(in)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogTransform {
    /// Base of logarithm.
    pub base: f64,
    /// Direction.
    pub direction: TransformDirection,
}

/// Log with affine terms.
///
/// Forward: `log_slope * log_base(lin_slope * in + lin_offset) + log_offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogAffineTransform {
    /// Base of logarithm.
    pub base: f64,
    /// Log-side slope per channel.
    pub log_side_slope: [f64; 3],
    /// Log-side offset per channel.
    pub log_side_offset: [f64; 3],
    /// Linear-side slope per channel.
    pub lin_side_slope: [f64; 3],
    /// Linear-side offset per channel.
    pub lin_side_offset: [f64; 3],
    /// Direction.
    pub direction: TransformDirection,
}

impl Default for LogAffineTransform {
    fn default() -> Self {
        Self {
            base: 2.0,
            log_side_slope: [1.0; 3],
            log_side_offset: [0.0; 3],
            lin_side_slope: [1.0; 3],
            lin_side_offset: [0.0; 3],
            direction: TransformDirection::Forward,
        }
    }
}

/// Range clamp style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeStyle {
    /// Clamp values to the output range.
    #[default]
    Clamp,
    /// Scale only.
    NoClamp,
}

/// Range remapping transform.
///
/// A missing min or max pair leaves that side unbounded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RangeTransform {
    /// Input min.
    pub min_in: Option<f64>,
    /// Input max.
    pub max_in: Option<f64>,
    /// Output min.
    pub min_out: Option<f64>,
    /// Output max.
    pub max_out: Option<f64>,
    /// Style.
    pub style: RangeStyle,
    /// Direction.
    pub direction: TransformDirection,
}

/// CDL clamping style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CdlStyle {
    /// ASC CDL v1.2: clamp to [0, 1].
    #[default]
    AscCdl,
    /// No clamping; negatives bypass the power.
    NoClamp,
}

/// ASC Color Decision List transform.
#[derive(Debug, Clone, PartialEq)]
pub struct CdlTransform {
    /// Per-channel slope [R, G, B].
    pub slope: [f64; 3],
    /// Per-channel offset [R, G, B].
    pub offset: [f64; 3],
    /// Per-channel power [R, G, B].
    pub power: [f64; 3],
    /// Saturation (1.0 = no change).
    pub saturation: f64,
    /// CDL style.
    pub style: CdlStyle,
    /// Direction.
    pub direction: TransformDirection,
}

impl Default for CdlTransform {
    fn default() -> Self {
        Self {
            slope: [1.0; 3],
            offset: [0.0; 3],
            power: [1.0; 3],
            saturation: 1.0,
            style: CdlStyle::default(),
            direction: TransformDirection::Forward,
        }
    }
}

/// Named transfer curve. Forward encodes (`linear -> encoded`).
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinTransform {
    /// Curve.
    pub style: TransferStyle,
    /// Direction.
    pub direction: TransformDirection,
}

/// Ordered group of transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTransform {
    /// Children, applied in order when forward.
    pub transforms: Vec<Transform>,
    /// Direction.
    pub direction: TransformDirection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_combination() {
        use TransformDirection::*;
        assert_eq!(Forward.combine(Inverse), Inverse);
        assert_eq!(Inverse.combine(Inverse), Forward);
        assert_eq!(Inverse.combine(Forward), Inverse);
        assert_eq!(TransformDirection::from_name("INVERSE"), Some(Inverse));
        assert_eq!(TransformDirection::from_name("sideways"), None);
    }

    #[test]
    fn inverse_flips_stored_direction() {
        let t = Transform::matrix(MatrixTransform::IDENTITY).inverse();
        assert_eq!(t.direction(), TransformDirection::Inverse);
        let g = Transform::group(vec![t]).inverse();
        assert_eq!(g.direction(), TransformDirection::Inverse);
    }
}
