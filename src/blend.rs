// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

//! Blend modes and the shader sources behind them.
//!
//! Every [`BlendMode`] owns one fragment shader. The shader samples the texture,
//! the backdrop copied from the render target and the optional mask, applies the
//! separable blend function and writes straight-alpha source-over output:
//!
//! ```text
//! a      = src.a * opacity * coverage
//! Cs'    = mix(Cs, B(Cb, Cs), backdrop.a)
//! out.a  = a + backdrop.a * (1 - a)
//! out.rgb = (a * Cs' + backdrop.a * (1 - a) * Cb) / out.a
//! ```
//!
//! [`BlendMode::blend_channel`] and [`composite_pixel`] are CPU mirrors of the
//! GLSL, used to pin the formulas.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CompositorError;

/// Prefix of program names owned by the texture itself.
pub const RESERVED_PREFIX: &str = "~";

/// Name of the identity program every texture activates on creation.
pub const DEFAULT_PROGRAM: &str = "~default";

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Add,
    Subtract,
}

impl BlendMode {
    pub const ALL: [BlendMode; 14] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::ColorDodge,
        BlendMode::ColorBurn,
        BlendMode::HardLight,
        BlendMode::SoftLight,
        BlendMode::Difference,
        BlendMode::Exclusion,
        BlendMode::Add,
        BlendMode::Subtract,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::ColorDodge => "color_dodge",
            BlendMode::ColorBurn => "color_burn",
            BlendMode::HardLight => "hard_light",
            BlendMode::SoftLight => "soft_light",
            BlendMode::Difference => "difference",
            BlendMode::Exclusion => "exclusion",
            BlendMode::Add => "add",
            BlendMode::Subtract => "subtract",
        }
    }

    /// Registry name of the program that draws with this mode.
    pub fn program_name(self) -> &'static str {
        match self {
            BlendMode::Normal => "~blend_normal",
            BlendMode::Multiply => "~blend_multiply",
            BlendMode::Screen => "~blend_screen",
            BlendMode::Overlay => "~blend_overlay",
            BlendMode::Darken => "~blend_darken",
            BlendMode::Lighten => "~blend_lighten",
            BlendMode::ColorDodge => "~blend_color_dodge",
            BlendMode::ColorBurn => "~blend_color_burn",
            BlendMode::HardLight => "~blend_hard_light",
            BlendMode::SoftLight => "~blend_soft_light",
            BlendMode::Difference => "~blend_difference",
            BlendMode::Exclusion => "~blend_exclusion",
            BlendMode::Add => "~blend_add",
            BlendMode::Subtract => "~blend_subtract",
        }
    }

    /// GLSL body of `float blend_channel(float b, float s)` for this mode.
    fn glsl_channel(self) -> &'static str {
        match self {
            BlendMode::Normal => "return s;",
            BlendMode::Multiply => "return b * s;",
            BlendMode::Screen => "return b + s - b * s;",
            BlendMode::Overlay => {
                "return b <= 0.5 ? 2.0 * s * b : 1.0 - 2.0 * (1.0 - s) * (1.0 - b);"
            }
            BlendMode::Darken => "return min(b, s);",
            BlendMode::Lighten => "return max(b, s);",
            BlendMode::ColorDodge => {
                "if (b <= 0.0) return 0.0;\n    if (s >= 1.0) return 1.0;\n    return min(1.0, b / (1.0 - s));"
            }
            BlendMode::ColorBurn => {
                "if (b >= 1.0) return 1.0;\n    if (s <= 0.0) return 0.0;\n    return 1.0 - min(1.0, (1.0 - b) / s);"
            }
            BlendMode::HardLight => {
                "return s <= 0.5 ? 2.0 * s * b : 1.0 - 2.0 * (1.0 - s) * (1.0 - b);"
            }
            BlendMode::SoftLight => {
                "if (s <= 0.5) return b - (1.0 - 2.0 * s) * b * (1.0 - b);\n    float d = b <= 0.25 ? ((16.0 * b - 12.0) * b + 4.0) * b : sqrt(b);\n    return b + (2.0 * s - 1.0) * (d - b);"
            }
            BlendMode::Difference => "return abs(b - s);",
            BlendMode::Exclusion => "return b + s - 2.0 * b * s;",
            BlendMode::Add => "return min(b + s, 1.0);",
            BlendMode::Subtract => "return max(b - s, 0.0);",
        }
    }

    /// CPU mirror of the per-channel blend function. `b` is the backdrop, `s` the source.
    pub fn blend_channel(self, b: f32, s: f32) -> f32 {
        match self {
            BlendMode::Normal => s,
            BlendMode::Multiply => b * s,
            BlendMode::Screen => b + s - b * s,
            BlendMode::Overlay => BlendMode::HardLight.blend_channel(s, b),
            BlendMode::Darken => b.min(s),
            BlendMode::Lighten => b.max(s),
            BlendMode::ColorDodge => {
                if b <= 0.0 {
                    0.0
                } else if s >= 1.0 {
                    1.0
                } else {
                    (b / (1.0 - s)).min(1.0)
                }
            }
            BlendMode::ColorBurn => {
                if b >= 1.0 {
                    1.0
                } else if s <= 0.0 {
                    0.0
                } else {
                    1.0 - ((1.0 - b) / s).min(1.0)
                }
            }
            BlendMode::HardLight => {
                if s <= 0.5 {
                    2.0 * s * b
                } else {
                    1.0 - 2.0 * (1.0 - s) * (1.0 - b)
                }
            }
            BlendMode::SoftLight => {
                if s <= 0.5 {
                    b - (1.0 - 2.0 * s) * b * (1.0 - b)
                } else {
                    let d = if b <= 0.25 {
                        ((16.0 * b - 12.0) * b + 4.0) * b
                    } else {
                        b.sqrt()
                    };
                    b + (2.0 * s - 1.0) * (d - b)
                }
            }
            BlendMode::Difference => (b - s).abs(),
            BlendMode::Exclusion => b + s - 2.0 * b * s,
            BlendMode::Add => (b + s).min(1.0),
            BlendMode::Subtract => (b - s).max(0.0),
        }
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlendMode {
    type Err = CompositorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlendMode::ALL
            .into_iter()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| CompositorError::InvalidBlendMode(s.to_string()))
    }
}

/// CPU mirror of the blend shaders' compositing step. Colors are straight-alpha RGBA.
pub fn composite_pixel(
    mode: BlendMode,
    backdrop: [f32; 4],
    source: [f32; 4],
    coverage: f32,
) -> [f32; 4] {
    let a = (source[3] * coverage).clamp(0.0, 1.0);
    let ab = backdrop[3];
    let out_a = a + ab * (1.0 - a);
    if out_a <= 0.0 {
        return [0.0; 4];
    }

    let mut out = [0.0, 0.0, 0.0, out_a];
    for i in 0..3 {
        let blended = mode.blend_channel(backdrop[i], source[i]).clamp(0.0, 1.0);
        let mixed = source[i] + (blended - source[i]) * ab;
        out[i] = (a * mixed + ab * (1.0 - a) * backdrop[i]) / out_a;
    }
    out
}

/// Vertex stage shared by the default and blend programs.
///
/// `a_position` is the unit quad; the quad is placed in pixel space at
/// `u_offset * u_texture_size` with size `u_size` and mapped onto the viewport.
pub const DEFAULT_VERTEX_SHADER: &str = r#"precision highp float;

layout(location = 0) in vec2 a_position;

uniform vec4 u_viewport;
uniform vec2 u_size;
uniform vec2 u_offset;
uniform vec2 u_texture_size;

out vec2 v_uv;

void main() {
    vec2 pixel = u_offset * u_texture_size + a_position * u_size;
    vec2 clip = pixel / u_viewport.zw * 2.0 - 1.0;
    gl_Position = vec4(clip.x, -clip.y, 0.0, 1.0);
    // Pixels are uploaded bottom-up, so the quad's top edge samples t = 1.
    v_uv = vec2(a_position.x, 1.0 - a_position.y);
}
"#;

/// Identity fragment stage.
pub const DEFAULT_FRAGMENT_SHADER: &str = r#"precision highp float;

uniform sampler2D u_image;

in vec2 v_uv;
out vec4 frag_color;

void main() {
    frag_color = texture(u_image, v_uv);
}
"#;

const BLEND_PRELUDE: &str = r#"precision highp float;

uniform sampler2D u_image;
uniform sampler2D u_backdrop;
uniform sampler2D u_mask;
uniform int u_use_mask;
uniform float u_opacity;
uniform vec4 u_viewport;

in vec2 v_uv;
out vec4 frag_color;
"#;

const BLEND_MAIN: &str = r#"
vec3 blend(vec3 b, vec3 s) {
    return vec3(blend_channel(b.r, s.r), blend_channel(b.g, s.g), blend_channel(b.b, s.b));
}

float mask_coverage() {
    if (u_use_mask == 0) {
        return 1.0;
    }
    vec4 m = texture(u_mask, v_uv);
    return m.a * dot(m.rgb, vec3(0.2126, 0.7152, 0.0722));
}

void main() {
    vec4 src = texture(u_image, v_uv);
    vec4 dst = texture(u_backdrop, (gl_FragCoord.xy - u_viewport.xy) / u_viewport.zw);

    float a = clamp(src.a * u_opacity * mask_coverage(), 0.0, 1.0);
    vec3 mixed = mix(src.rgb, clamp(blend(dst.rgb, src.rgb), 0.0, 1.0), dst.a);
    float out_a = a + dst.a * (1.0 - a);
    vec3 rgb = out_a > 0.0 ? (a * mixed + dst.a * (1.0 - a) * dst.rgb) / out_a : vec3(0.0);
    frag_color = vec4(rgb, out_a);
}
"#;

/// Fragment stage of the program registered for `mode`.
pub fn fragment_source(mode: BlendMode) -> String {
    format!(
        "{}\nfloat blend_channel(float b, float s) {{\n    {}\n}}\n{}",
        BLEND_PRELUDE,
        mode.glsl_channel(),
        BLEND_MAIN
    )
}
