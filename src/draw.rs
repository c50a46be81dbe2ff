// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

use glam::Vec2;

use crate::blend::BlendMode;
use crate::handles::TextureUnit;
use crate::program::{Mask, UniformValue, Uniforms};

pub const U_IMAGE: &str = "u_image";
pub const U_SIZE: &str = "u_size";
pub const U_OFFSET: &str = "u_offset";
pub const U_OPACITY: &str = "u_opacity";
pub const U_TEXTURE_SIZE: &str = "u_texture_size";

/// Placement and compositing parameters for [`Texture::draw`](crate::Texture::draw).
///
/// Offsets and sizes are in pixels. `width` and `height` only take effect when
/// both are given; otherwise the texture draws at its native size.
#[derive(Debug, Clone, Copy)]
pub struct DrawOptions<'a> {
    pub x: f32,
    pub y: f32,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub opacity: f32,
    pub mode: BlendMode,
    pub mask: Option<Mask<'a>>,
}

impl Default for DrawOptions<'_> {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: None,
            height: None,
            opacity: 1.0,
            mode: BlendMode::Normal,
            mask: None,
        }
    }
}

impl<'a> DrawOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn mode(mut self, mode: BlendMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mask(mut self, mask: Mask<'a>) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Output size: explicit when both dimensions are set, else `native`.
    pub fn resolve_size(&self, native: (u32, u32)) -> Vec2 {
        match (self.width, self.height) {
            (Some(width), Some(height)) => Vec2::new(width, height),
            _ => Vec2::new(native.0 as f32, native.1 as f32),
        }
    }

    /// Offset normalized by the texture's own size, independent of the output size.
    pub fn normalized_offset(&self, native: (u32, u32)) -> Vec2 {
        let normalize = |value: f32, extent: u32| {
            if extent == 0 { 0.0 } else { value / extent as f32 }
        };
        Vec2::new(normalize(self.x, native.0), normalize(self.y, native.1))
    }

    /// Uniforms a blend program receives for this draw.
    pub(crate) fn uniforms(&self, unit: TextureUnit, native: (u32, u32)) -> Uniforms {
        Uniforms::new()
            .with(U_IMAGE, UniformValue::Sampler(unit))
            .with(U_SIZE, UniformValue::Vec2(self.resolve_size(native)))
            .with(U_OFFSET, UniformValue::Vec2(self.normalized_offset(native)))
            .with(U_OPACITY, UniformValue::Float(self.opacity))
            .with(
                U_TEXTURE_SIZE,
                UniformValue::Vec2(Vec2::new(native.0 as f32, native.1 as f32)),
            )
    }
}
