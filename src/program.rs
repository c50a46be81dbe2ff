// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

use std::collections::HashMap;
use std::fmt;

use glam::Vec2;

use crate::error::Result;
use crate::handles::TextureUnit;
use crate::source::Source;

/// Named shader-source fragments substituted into programs at build time.
pub type ImportTable = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Int(i32),
    Sampler(TextureUnit),
}

/// Uniform values handed to [`ShaderProgram::apply`], keyed by GLSL name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Uniforms {
    values: HashMap<String, UniformValue>,
}

impl Uniforms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: UniformValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: UniformValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Per-pixel coverage for a draw.
#[derive(Clone, Copy)]
pub enum Mask<'a> {
    /// Uploaded by the program into its own mask texture.
    Source(&'a dyn Source),
    /// A texture already bound on this unit.
    Unit(TextureUnit),
}

impl fmt::Debug for Mask<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mask::Source(source) => f
                .debug_tuple("Source")
                .field(&source.dimensions().ok())
                .finish(),
            Mask::Unit(unit) => f.debug_tuple("Unit").field(unit).finish(),
        }
    }
}

/// A compiled, invocable vertex+fragment pair.
pub trait ShaderProgram {
    /// Make this the current program without drawing.
    fn activate(&self);

    /// Set `uniforms`, bind `mask` and draw into the active render target.
    fn apply(&self, uniforms: &Uniforms, mask: Option<&Mask<'_>>) -> Result<()>;

    /// Release the GPU program. The program must not be applied afterwards.
    fn dispose(&mut self);
}
