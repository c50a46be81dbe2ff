// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

//! GPU texture compositing: upload image and video sources as textures and
//! draw them through named shader programs with blend modes, opacity and masks.

mod backend;
mod blend;
mod draw;
mod error;
mod glow_backend;
mod handles;
mod program;
mod settings;
mod source;
mod texture;

#[cfg(test)]
mod test_support;

pub use backend::GraphicsBackend;
pub use blend::{
    BlendMode, DEFAULT_FRAGMENT_SHADER, DEFAULT_PROGRAM, DEFAULT_VERTEX_SHADER, RESERVED_PREFIX,
    composite_pixel, fragment_source,
};
pub use draw::{DrawOptions, U_IMAGE, U_OFFSET, U_OPACITY, U_SIZE, U_TEXTURE_SIZE};
pub use error::{CompositorError, Result};
pub use glow_backend::{GlowBackend, GlowProgram, IMPORT_DIRECTIVE, expand_imports};
pub use handles::TextureUnit;
pub use program::{ImportTable, Mask, ShaderProgram, UniformValue, Uniforms};
pub use settings::{RendererSettings, Settings, SettingsError};
pub use source::{FrameSource, ImageSource, PixelFormat, PixelStore, Source};
pub use texture::Texture;
