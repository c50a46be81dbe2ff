// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

/// A texture image unit (`GL_TEXTURE0 + n`).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
pub struct TextureUnit(pub u32);

impl TextureUnit {
    pub fn gl_enum(self) -> u32 {
        glow::TEXTURE0 + self.0
    }

    /// Value a `sampler2D` uniform expects for this unit.
    pub fn sampler_index(self) -> i32 {
        self.0 as i32
    }
}
