// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

use thiserror::Error;

/// Errors surfaced by textures, sources and backends.
#[derive(Debug, Error)]
pub enum CompositorError {
    #[error("Source is not ready for upload")]
    SourceNotReady,

    #[error("Unsupported source type: {0}")]
    UnsupportedSourceType(String),

    #[error("Expected {expected} bytes of pixel data, got {actual}")]
    PixelSize { expected: usize, actual: usize },

    #[error("Texture unit {0} is reserved by the backend")]
    ReservedUnit(u32),

    #[error("Texture has been disposed")]
    Disposed,

    #[error("Program already registered: {0}")]
    DuplicateName(String),

    #[error("Program name is reserved: {0}")]
    ReservedName(String),

    #[error("No program for blend mode: {0}")]
    InvalidBlendMode(String),

    #[error("Unknown shader import: {0}")]
    UnknownImport(String),

    #[error("Shader compilation failed: {0}")]
    ShaderCompile(String),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Image Error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, CompositorError>;
