// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

//! A backend that records calls instead of talking to a GPU.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::backend::GraphicsBackend;
use crate::error::{CompositorError, Result};
use crate::handles::TextureUnit;
use crate::program::{ImportTable, Mask, ShaderProgram, Uniforms};

#[derive(Debug, Clone, PartialEq)]
pub struct UploadRecord {
    pub texture: u32,
    pub unit: TextureUnit,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaskRecord {
    Source(u32, u32),
    Unit(TextureUnit),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplyRecord {
    pub program: u32,
    pub uniforms: Uniforms,
    pub mask: Option<MaskRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateTexture(u32),
    Upload(UploadRecord),
    BindTexture { texture: u32, unit: TextureUnit },
    DeleteTexture(u32),
    BuildProgram(u32),
    Activate(u32),
    Apply(ApplyRecord),
    DisposeProgram(u32),
}

type CallLog = Rc<RefCell<Vec<Call>>>;

#[derive(Default)]
pub struct RecordingBackend {
    calls: CallLog,
    next_id: Cell<u32>,
    builds_left: Cell<Option<usize>>,
    primary_unit: Cell<TextureUnit>,
    reserved: RefCell<Vec<TextureUnit>>,
}

impl RecordingBackend {
    fn next_id(&self) -> u32 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    /// Let `count` more program builds succeed, then fail every build.
    pub fn fail_builds_after(&self, count: usize) {
        self.builds_left.set(Some(count));
    }

    pub fn set_primary_unit(&self, unit: TextureUnit) {
        self.primary_unit.set(unit);
    }

    pub fn reserve_units(&self, units: &[TextureUnit]) {
        *self.reserved.borrow_mut() = units.to_vec();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Upload(upload) => Some(upload),
                _ => None,
            })
            .collect()
    }

    pub fn applies(&self) -> Vec<ApplyRecord> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Apply(apply) => Some(apply),
                _ => None,
            })
            .collect()
    }

    pub fn activated(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Activate(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn deleted_textures(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::DeleteTexture(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn disposed_programs(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::DisposeProgram(id) => Some(id),
                _ => None,
            })
            .collect()
    }
}

impl GraphicsBackend for RecordingBackend {
    type Texture = u32;
    type Program = RecordingProgram;

    fn primary_unit(&self) -> TextureUnit {
        self.primary_unit.get()
    }

    fn reserved_units(&self) -> Vec<TextureUnit> {
        self.reserved.borrow().clone()
    }

    fn create_texture(&self) -> Result<u32> {
        let id = self.next_id();
        self.calls.borrow_mut().push(Call::CreateTexture(id));
        Ok(id)
    }

    fn upload_texture(
        &self,
        texture: u32,
        unit: TextureUnit,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<()> {
        self.calls.borrow_mut().push(Call::Upload(UploadRecord {
            texture,
            unit,
            width,
            height,
            pixels: pixels.to_vec(),
        }));
        Ok(())
    }

    fn bind_texture(&self, texture: u32, unit: TextureUnit) {
        self.calls
            .borrow_mut()
            .push(Call::BindTexture { texture, unit });
    }

    fn delete_texture(&self, texture: u32) {
        self.calls.borrow_mut().push(Call::DeleteTexture(texture));
    }

    fn build_program(
        &self,
        vertex: &str,
        fragment: &str,
        imports: &ImportTable,
    ) -> Result<RecordingProgram> {
        if let Some(left) = self.builds_left.get() {
            if left == 0 {
                return Err(CompositorError::ShaderCompile("recording failure".into()));
            }
            self.builds_left.set(Some(left - 1));
        }

        let id = self.next_id();
        self.calls.borrow_mut().push(Call::BuildProgram(id));
        Ok(RecordingProgram {
            id,
            vertex: vertex.to_string(),
            fragment: fragment.to_string(),
            imports: imports.clone(),
            calls: self.calls.clone(),
        })
    }
}

pub struct RecordingProgram {
    id: u32,
    vertex: String,
    fragment: String,
    imports: ImportTable,
    calls: CallLog,
}

impl RecordingProgram {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn vertex(&self) -> &str {
        &self.vertex
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Import table as it was when the program was built.
    pub fn imports(&self) -> &ImportTable {
        &self.imports
    }
}

impl ShaderProgram for RecordingProgram {
    fn activate(&self) {
        self.calls.borrow_mut().push(Call::Activate(self.id));
    }

    fn apply(&self, uniforms: &Uniforms, mask: Option<&Mask<'_>>) -> Result<()> {
        let mask = match mask {
            None => None,
            Some(Mask::Unit(unit)) => Some(MaskRecord::Unit(*unit)),
            Some(Mask::Source(source)) => {
                let (width, height) = source.dimensions()?;
                Some(MaskRecord::Source(width, height))
            }
        };
        self.calls.borrow_mut().push(Call::Apply(ApplyRecord {
            program: self.id,
            uniforms: uniforms.clone(),
            mask,
        }));
        Ok(())
    }

    fn dispose(&mut self) {
        self.calls.borrow_mut().push(Call::DisposeProgram(self.id));
    }
}
