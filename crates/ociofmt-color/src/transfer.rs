//! Named transfer curves.
//!
//! Each curve has a scalar `encode` (linear to encoded) and `decode`
//! (encoded to linear) and a GLSL rendition used by the analytic shader
//! path. The GLSL form evaluates both branches and selects with
//! `mix(.., .., step(cut, x))`, so log arguments are floored to stay finite.

use std::fmt::Write;

const LN2: f32 = std::f32::consts::LN_2;

// ACEScct
const CCT_X_BRK: f32 = 0.0078125;
const CCT_Y_BRK: f32 = 0.155_251_14;
const CCT_A: f32 = 10.540_238;
const CCT_B: f32 = 0.072_905_53;

// ACEScc
const CC_MIN: f32 = 1.0 / 65536.0;
const CC_THRESHOLD: f32 = 1.0 / 32768.0;
const CC_DECODE_THRESHOLD: f32 = (9.72 - 15.0) / 17.52;

// ARRI LogC3, EI 800
const LOGC_CUT: f32 = 0.010591;
const LOGC_A: f32 = 5.555556;
const LOGC_B: f32 = 0.052272;
const LOGC_C: f32 = 0.247190;
const LOGC_D: f32 = 0.385537;
const LOGC_E: f32 = 5.367655;
const LOGC_F: f32 = 0.092809;

// Cineon printing density, 95 black / 685 white
const CINEON_WHITE: f32 = 685.0;
const CINEON_GAMMA: f32 = 300.0;

fn cineon_black() -> f32 {
    10f32.powf((95.0 - CINEON_WHITE) / CINEON_GAMMA)
}

/// Transfer curve identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferStyle {
    /// Identity.
    Linear,
    /// IEC 61966-2-1 sRGB.
    Srgb,
    /// ITU-R BT.709 camera curve.
    Rec709,
    /// Pure 2.2 power.
    Gamma22,
    /// Pure 2.4 power.
    Gamma24,
    /// ACEScct (log with linear toe).
    AcesCct,
    /// ACEScc (pure log).
    AcesCc,
    /// ARRI LogC3 at EI 800.
    LogC3,
    /// Kodak Cineon log.
    Cineon,
}

impl TransferStyle {
    /// Looks up a curve by config name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let n = name.to_ascii_lowercase().replace(['-', '_', ' '], "");
        Some(match n.as_str() {
            "linear" => Self::Linear,
            "srgb" => Self::Srgb,
            "rec709" | "bt709" => Self::Rec709,
            "gamma2.2" | "gamma22" => Self::Gamma22,
            "gamma2.4" | "gamma24" => Self::Gamma24,
            "acescct" => Self::AcesCct,
            "acescc" => Self::AcesCc,
            "logc3" | "logc" => Self::LogC3,
            "cineon" => Self::Cineon,
            _ => return None,
        })
    }

    /// Canonical config name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Srgb => "srgb",
            Self::Rec709 => "rec709",
            Self::Gamma22 => "gamma2.2",
            Self::Gamma24 => "gamma2.4",
            Self::AcesCct => "acescct",
            Self::AcesCc => "acescc",
            Self::LogC3 => "logc3",
            Self::Cineon => "cineon",
        }
    }

    /// Encodes a linear value.
    #[inline]
    pub fn encode(&self, x: f32) -> f32 {
        match self {
            Self::Linear => x,
            Self::Srgb => {
                if x <= 0.0031308 {
                    x * 12.92
                } else {
                    1.055 * x.powf(1.0 / 2.4) - 0.055
                }
            }
            Self::Rec709 => {
                if x < 0.018 {
                    x * 4.5
                } else {
                    1.099 * x.powf(0.45) - 0.099
                }
            }
            Self::Gamma22 => gamma_encode(x, 2.2),
            Self::Gamma24 => gamma_encode(x, 2.4),
            Self::AcesCct => {
                if x <= CCT_X_BRK {
                    CCT_A * x + CCT_B
                } else {
                    (x.log2() + 9.72) / 17.52
                }
            }
            Self::AcesCc => {
                if x <= 0.0 {
                    (CC_MIN.ln() / LN2 + 9.72) / 17.52
                } else if x < CC_THRESHOLD {
                    ((CC_MIN + x * 0.5).ln() / LN2 + 9.72) / 17.52
                } else {
                    (x.ln() / LN2 + 9.72) / 17.52
                }
            }
            Self::LogC3 => {
                if x > LOGC_CUT {
                    LOGC_C * (LOGC_A * x + LOGC_B).log10() + LOGC_D
                } else {
                    LOGC_E * x + LOGC_F
                }
            }
            Self::Cineon => {
                let black = cineon_black();
                let v = (x * (1.0 - black) + black).max(1e-10);
                (CINEON_WHITE + CINEON_GAMMA * v.log10()) / 1023.0
            }
        }
    }

    /// Decodes an encoded value to linear.
    #[inline]
    pub fn decode(&self, y: f32) -> f32 {
        match self {
            Self::Linear => y,
            Self::Srgb => {
                if y <= 0.04045 {
                    y / 12.92
                } else {
                    ((y + 0.055) / 1.055).powf(2.4)
                }
            }
            Self::Rec709 => {
                if y < 0.081 {
                    y / 4.5
                } else {
                    ((y + 0.099) / 1.099).powf(1.0 / 0.45)
                }
            }
            Self::Gamma22 => gamma_decode(y, 2.2),
            Self::Gamma24 => gamma_decode(y, 2.4),
            Self::AcesCct => {
                if y <= CCT_Y_BRK {
                    (y - CCT_B) / CCT_A
                } else {
                    2f32.powf(y * 17.52 - 9.72)
                }
            }
            Self::AcesCc => {
                if y < CC_DECODE_THRESHOLD {
                    (2f32.powf(y * 17.52 - 9.72) - CC_MIN) * 2.0
                } else {
                    2f32.powf(y * 17.52 - 9.72)
                }
            }
            Self::LogC3 => {
                if y > LOGC_E * LOGC_CUT + LOGC_F {
                    (10f32.powf((y - LOGC_D) / LOGC_C) - LOGC_B) / LOGC_A
                } else {
                    (y - LOGC_F) / LOGC_E
                }
            }
            Self::Cineon => {
                let black = cineon_black();
                let v = 10f32.powf((1023.0 * y - CINEON_WHITE) / CINEON_GAMMA);
                (v - black) / (1.0 - black)
            }
        }
    }

    /// Applies the curve in the given direction (`forward` encodes).
    #[inline]
    pub fn apply(&self, v: f32, forward: bool) -> f32 {
        if forward { self.encode(v) } else { self.decode(v) }
    }

    /// Emits GLSL statements that transform the `vec3` named `var` in place.
    pub fn write_glsl(&self, out: &mut String, var: &str, forward: bool) {
        let body = match (self, forward) {
            (Self::Linear, _) => return,
            (Self::Srgb, true) => piecewise(
                var,
                0.0031308,
                &format!("{var} * 12.92"),
                &format!("1.055 * pow(max({var}, vec3(0.0)), vec3(1.0 / 2.4)) - 0.055"),
            ),
            (Self::Srgb, false) => piecewise(
                var,
                0.04045,
                &format!("{var} / 12.92"),
                &format!("pow(max(({var} + 0.055) / 1.055, vec3(0.0)), vec3(2.4))"),
            ),
            (Self::Rec709, true) => piecewise(
                var,
                0.018,
                &format!("{var} * 4.5"),
                &format!("1.099 * pow(max({var}, vec3(0.0)), vec3(0.45)) - 0.099"),
            ),
            (Self::Rec709, false) => piecewise(
                var,
                0.081,
                &format!("{var} / 4.5"),
                &format!("pow(max(({var} + 0.099) / 1.099, vec3(0.0)), vec3(1.0 / 0.45))"),
            ),
            (Self::Gamma22, f) => gamma_glsl(var, 2.2, f),
            (Self::Gamma24, f) => gamma_glsl(var, 2.4, f),
            (Self::AcesCct, true) => piecewise(
                var,
                CCT_X_BRK,
                &format!("{} * {var} + {}", glsl_f(CCT_A), glsl_f(CCT_B)),
                &format!("(log2(max({var}, vec3(1e-10))) + 9.72) / 17.52"),
            ),
            (Self::AcesCct, false) => piecewise(
                var,
                CCT_Y_BRK,
                &format!("({var} - {}) / {}", glsl_f(CCT_B), glsl_f(CCT_A)),
                &format!("exp2({var} * 17.52 - 9.72)"),
            ),
            (Self::AcesCc, true) => format!(
                "{var} = (log2(mix({} + max({var}, vec3(0.0)) * 0.5, {var}, step({}, {var}))) + 9.72) / 17.52;\n",
                glsl_f(CC_MIN),
                glsl_f(CC_THRESHOLD)
            ),
            (Self::AcesCc, false) => piecewise(
                var,
                CC_DECODE_THRESHOLD,
                &format!("(exp2({var} * 17.52 - 9.72) - {}) * 2.0", glsl_f(CC_MIN)),
                &format!("exp2({var} * 17.52 - 9.72)"),
            ),
            (Self::LogC3, true) => piecewise(
                var,
                LOGC_CUT,
                &format!("{} * {var} + {}", glsl_f(LOGC_E), glsl_f(LOGC_F)),
                &format!(
                    "{} * log2(max({} * {var} + {}, vec3(1e-10))) / log2(10.0) + {}",
                    glsl_f(LOGC_C),
                    glsl_f(LOGC_A),
                    glsl_f(LOGC_B),
                    glsl_f(LOGC_D)
                ),
            ),
            (Self::LogC3, false) => piecewise(
                var,
                LOGC_E * LOGC_CUT + LOGC_F,
                &format!("({var} - {}) / {}", glsl_f(LOGC_F), glsl_f(LOGC_E)),
                &format!(
                    "(pow(vec3(10.0), ({var} - {}) / {}) - {}) / {}",
                    glsl_f(LOGC_D),
                    glsl_f(LOGC_C),
                    glsl_f(LOGC_B),
                    glsl_f(LOGC_A)
                ),
            ),
            (Self::Cineon, true) => {
                let black = cineon_black();
                format!(
                    "{var} = ({} + {} * log2(max({var} * {} + {}, vec3(1e-10))) / log2(10.0)) / 1023.0;\n",
                    glsl_f(CINEON_WHITE),
                    glsl_f(CINEON_GAMMA),
                    glsl_f(1.0 - black),
                    glsl_f(black)
                )
            }
            (Self::Cineon, false) => {
                let black = cineon_black();
                format!(
                    "{var} = (pow(vec3(10.0), (1023.0 * {var} - {}) / {}) - {}) / {};\n",
                    glsl_f(CINEON_WHITE),
                    glsl_f(CINEON_GAMMA),
                    glsl_f(black),
                    glsl_f(1.0 - black)
                )
            }
        };
        out.push_str("    ");
        out.push_str(&body);
    }
}

#[inline]
fn gamma_encode(x: f32, g: f32) -> f32 {
    if x <= 0.0 { 0.0 } else { x.powf(1.0 / g) }
}

#[inline]
fn gamma_decode(y: f32, g: f32) -> f32 {
    if y <= 0.0 { 0.0 } else { y.powf(g) }
}

fn gamma_glsl(var: &str, g: f32, forward: bool) -> String {
    let e = if forward { 1.0 / g } else { g };
    format!("{var} = pow(max({var}, vec3(0.0)), vec3({}));\n", glsl_f(e))
}

/// `var = x < cut ? lin : curve`, branch-free.
fn piecewise(var: &str, cut: f32, lin: &str, curve: &str) -> String {
    format!(
        "{var} = mix({lin}, {curve}, step(vec3({}), {var}));\n",
        glsl_f(cut)
    )
}

/// Formats a float as a GLSL literal (always carries a decimal point).
pub(crate) fn glsl_f(v: f32) -> String {
    let mut s = String::new();
    let _ = write!(s, "{v:?}");
    if !s.contains(['.', 'e', 'E']) && !s.contains("inf") && !s.contains("NaN") {
        s.push_str(".0");
    }
    s
}
