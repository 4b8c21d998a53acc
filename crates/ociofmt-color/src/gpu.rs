//! GPU shader text for real-time preview.
//!
//! Emits a GLSL 1.20 function
//!
//! ```glsl
//! vec4 <name>(vec4 inPixel, sampler3D lut3d)
//! ```
//!
//! that the preview fragment shader calls once per pixel. In
//! [`ShaderMode::Lut3d`] the function samples a baked 3D LUT; in
//! [`ShaderMode::Analytic`] every op is inlined as math and the sampler is
//! left unused.
//!
//! # Example
//!
//! ```ignore
//! use ociofmt_color::{GpuProcessor, ShaderMode};
//!
//! let gpu = GpuProcessor::from_processor(&processor);
//! let text = gpu.shader_text("OCIODisplay", ShaderMode::Lut3d, 32);
//! ```

use serde::{Deserialize, Serialize};

use crate::processor::{Processor, ProcessorOp};
use crate::transfer::glsl_f;
use crate::transform::{CdlStyle, NegativeStyle};

/// How the transform is expressed in the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderMode {
    /// Sample a baked 3D LUT.
    #[default]
    Lut3d,
    /// Inline the transform math.
    Analytic,
}

/// Texture coordinate mapping for a LUT of `edge` samples per axis.
///
/// Returns `(scale, offset)` such that `coord = value * scale + offset`
/// hits texel centres at 0 and 1.
pub fn lut_domain_mapping(edge: usize) -> (f32, f32) {
    let n = edge.max(1) as f32;
    ((n - 1.0) / n, 1.0 / (2.0 * n))
}

/// GPU shader generator for a compiled processor.
#[derive(Debug, Clone)]
pub struct GpuProcessor {
    ops: Vec<ProcessorOp>,
    cache_id: String,
}

impl GpuProcessor {
    /// Creates a GPU processor from a CPU processor.
    pub fn from_processor(processor: &Processor) -> Self {
        Self {
            ops: processor.ops().to_vec(),
            cache_id: processor.cache_id(),
        }
    }

    /// Cache id of the source processor.
    pub fn cache_id(&self) -> &str {
        &self.cache_id
    }

    /// Generates the shader function text.
    pub fn shader_text(&self, function_name: &str, mode: ShaderMode, edge: usize) -> String {
        let mut code = String::new();
        line(&mut code, format!("// ociofmt {} {}", mode_name(mode), self.cache_id));
        line(&mut code, "");
        line(
            &mut code,
            format!("vec4 {function_name}(vec4 inPixel, sampler3D lut3d)"),
        );
        line(&mut code, "{");
        line(&mut code, "    vec3 c = inPixel.rgb;");

        match mode {
            ShaderMode::Lut3d => {
                let (scale, offset) = lut_domain_mapping(edge);
                line(
                    &mut code,
                    format!(
                        "    c = texture3D(lut3d, c * {} + {}).rgb;",
                        glsl_f(scale),
                        glsl_f(offset)
                    ),
                );
            }
            ShaderMode::Analytic => {
                for (i, op) in self.ops.iter().enumerate() {
                    line(&mut code, format!("    // op {i}"));
                    emit_op(&mut code, op);
                }
            }
        }

        line(&mut code, "    return vec4(c, inPixel.a);");
        line(&mut code, "}");
        code
    }
}

fn mode_name(mode: ShaderMode) -> &'static str {
    match mode {
        ShaderMode::Lut3d => "lut3d",
        ShaderMode::Analytic => "analytic",
    }
}

fn line(out: &mut String, s: impl AsRef<str>) {
    out.push_str(s.as_ref());
    out.push('\n');
}

fn vec3(v: [f32; 3]) -> String {
    format!("vec3({}, {}, {})", glsl_f(v[0]), glsl_f(v[1]), glsl_f(v[2]))
}

fn rgb(v: &[f32; 4]) -> [f32; 3] {
    [v[0], v[1], v[2]]
}

/// Wraps `body` (which rewrites `c` in place) with negative-value handling.
fn with_negative_style(out: &mut String, style: NegativeStyle, body: impl FnOnce(&mut String)) {
    match style {
        NegativeStyle::Linear => body(out),
        NegativeStyle::Clamp => {
            line(out, "    c = max(c, vec3(0.0));");
            body(out);
        }
        NegativeStyle::Mirror => {
            line(out, "    {");
            line(out, "    vec3 sgn = sign(c);");
            line(out, "    c = abs(c);");
            body(out);
            line(out, "    c *= sgn;");
            line(out, "    }");
        }
        NegativeStyle::PassThru => {
            line(out, "    {");
            line(out, "    vec3 orig = c;");
            line(out, "    c = max(c, vec3(0.0));");
            body(out);
            line(out, "    c = mix(c, orig, vec3(lessThan(orig, vec3(0.0))));");
            line(out, "    }");
        }
    }
}

fn emit_op(out: &mut String, op: &ProcessorOp) {
    match op {
        ProcessorOp::Matrix { matrix: m, offset } => {
            // GLSL mat3 is column-major
            line(
                out,
                format!(
                    "    c = mat3({}, {}, {}) * c + {};",
                    vec3([m[0], m[4], m[8]]),
                    vec3([m[1], m[5], m[9]]),
                    vec3([m[2], m[6], m[10]]),
                    vec3(rgb(offset))
                ),
            );
        }
        ProcessorOp::Exponent {
            value,
            negative_style,
        } => {
            let e = vec3(rgb(value));
            with_negative_style(out, *negative_style, |out| {
                line(out, format!("    c = pow(c, {e});"));
            });
        }
        ProcessorOp::ExponentWithLinear {
            gamma,
            offset,
            negative_style,
            forward,
        } => {
            let mut brk = [0.0f32; 3];
            let mut slope = [1.0f32; 3];
            for i in 0..3 {
                let (g, o) = (gamma[i], offset[i]);
                if g > 1.0 && o > 0.0 {
                    brk[i] = o / (g - 1.0);
                    slope[i] = ((g - 1.0) / o) * ((o * g) / ((g - 1.0) * (1.0 + o))).powf(g);
                }
            }
            let g = vec3(rgb(gamma));
            let o = vec3(rgb(offset));
            let s = vec3(slope);
            let body = if *forward {
                format!(
                    "    c = mix(c * {s}, pow(max((c + {o}) / (vec3(1.0) + {o}), vec3(0.0)), {g}), step({}, c));",
                    vec3(brk)
                )
            } else {
                let lin_brk = [brk[0] * slope[0], brk[1] * slope[1], brk[2] * slope[2]];
                format!(
                    "    c = mix(c / {s}, (vec3(1.0) + {o}) * pow(max(c, vec3(0.0)), vec3(1.0) / {g}) - {o}, step({}, c));",
                    vec3(lin_brk)
                )
            };
            with_negative_style(out, *negative_style, |out| line(out, body));
        }
        ProcessorOp::Log { base, forward } => {
            if *forward {
                line(
                    out,
                    format!(
                        "    c = log2(max(c, vec3(1e-10))) / {};",
                        glsl_f(base.log2())
                    ),
                );
            } else {
                line(out, format!("    c = pow(vec3({}), c);", glsl_f(*base)));
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
            let (ls, lo, ns, no) = (
                vec3(*log_side_slope),
                vec3(*log_side_offset),
                vec3(*lin_side_slope),
                vec3(*lin_side_offset),
            );
            if *forward {
                line(
                    out,
                    format!(
                        "    c = {ls} * log2(max({ns} * c + {no}, vec3(1e-10))) / {} + {lo};",
                        glsl_f(base.log2())
                    ),
                );
            } else {
                line(
                    out,
                    format!(
                        "    c = (pow(vec3({}), (c - {lo}) / {ls}) - {no}) / {ns};",
                        glsl_f(*base)
                    ),
                );
            }
        }
        ProcessorOp::Range {
            scale,
            offset,
            clamp_min,
            clamp_max,
        } => {
            line(
                out,
                format!("    c = c * {} + {};", glsl_f(*scale), glsl_f(*offset)),
            );
            if let Some(lo) = clamp_min {
                line(out, format!("    c = max(c, vec3({}));", glsl_f(*lo)));
            }
            if let Some(hi) = clamp_max {
                line(out, format!("    c = min(c, vec3({}));", glsl_f(*hi)));
            }
        }
        ProcessorOp::Cdl {
            slope,
            offset,
            power,
            saturation,
            style,
            forward,
        } => emit_cdl(out, slope, offset, power, *saturation, *style, *forward),
        ProcessorOp::Transfer { style, forward } => style.write_glsl(out, "c", *forward),
    }
}

fn emit_cdl(
    out: &mut String,
    slope: &[f32; 3],
    offset: &[f32; 3],
    power: &[f32; 3],
    sat: f32,
    style: CdlStyle,
    forward: bool,
) {
    let (s, o, p) = (vec3(*slope), vec3(*offset), vec3(*power));
    let sat = glsl_f(sat);
    let clamp = style == CdlStyle::AscCdl;
    let luma = "dot(c, vec3(0.2126, 0.7152, 0.0722))";

    line(out, "    {");
    if forward {
        if clamp {
            line(out, format!("    c = pow(clamp(c * {s} + {o}, 0.0, 1.0), {p});"));
        } else {
            line(out, format!("    c = c * {s} + {o};"));
            line(
                out,
                format!("    c = mix(c, pow(max(c, vec3(0.0)), {p}), vec3(greaterThan(c, vec3(0.0))));"),
            );
        }
        line(out, format!("    float luma = {luma};"));
        line(out, format!("    c = vec3(luma) + {sat} * (c - vec3(luma));"));
        if clamp {
            line(out, "    c = clamp(c, 0.0, 1.0);");
        }
    } else {
        if clamp {
            line(out, "    c = clamp(c, 0.0, 1.0);");
        }
        line(out, format!("    float luma = {luma};"));
        line(out, format!("    c = vec3(luma) + (c - vec3(luma)) / {sat};"));
        if clamp {
            line(out, "    c = clamp(c, 0.0, 1.0);");
        }
        line(
            out,
            format!("    c = mix(c, pow(max(c, vec3(0.0)), vec3(1.0) / {p}), vec3(greaterThan(c, vec3(0.0))));"),
        );
        line(out, format!("    c = (c - {o}) / {s};"));
    }
    line(out, "    }");
}
