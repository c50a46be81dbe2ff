// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

use std::fmt::Debug;

use crate::error::Result;
use crate::handles::TextureUnit;
use crate::program::{ImportTable, ShaderProgram};

/// The GPU operations a [`Texture`](crate::Texture) needs from its context.
///
/// [`GlowBackend`](crate::GlowBackend) implements this on top of OpenGL.
pub trait GraphicsBackend {
    type Texture: Copy + Debug;
    type Program: ShaderProgram;

    /// Unit new textures use when the caller does not pick one.
    fn primary_unit(&self) -> TextureUnit {
        TextureUnit(0)
    }

    /// Units the backend binds its own textures to while drawing.
    /// Textures must not sample from them.
    fn reserved_units(&self) -> Vec<TextureUnit> {
        Vec::new()
    }

    fn create_texture(&self) -> Result<Self::Texture>;

    /// Upload tightly packed RGBA8 `pixels`, leaving `texture` bound on `unit`.
    fn upload_texture(
        &self,
        texture: Self::Texture,
        unit: TextureUnit,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<()>;

    fn bind_texture(&self, texture: Self::Texture, unit: TextureUnit);

    fn delete_texture(&self, texture: Self::Texture);

    /// Compile and link a program, resolving `@use` imports from `imports`.
    fn build_program(
        &self,
        vertex: &str,
        fragment: &str,
        imports: &ImportTable,
    ) -> Result<Self::Program>;
}
