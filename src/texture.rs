// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, trace};

use crate::backend::GraphicsBackend;
use crate::blend::{self, BlendMode, DEFAULT_PROGRAM, RESERVED_PREFIX};
use crate::draw::DrawOptions;
use crate::error::{CompositorError, Result};
use crate::handles::TextureUnit;
use crate::program::{ImportTable, ShaderProgram};
use crate::source::{PixelStore, Source};

/// A GPU texture bound to one visual source, plus the shader programs that draw it.
///
/// Creation registers [`DEFAULT_PROGRAM`] and one program per [`BlendMode`];
/// further programs can be registered by name. Names starting with `~` belong
/// to the texture.
pub struct Texture<B: GraphicsBackend> {
    backend: Rc<B>,
    unit: TextureUnit,
    gl_tex: B::Texture,
    source: Box<dyn Source>,
    width: u32,
    height: u32,
    disposed: bool,
    programs: HashMap<String, B::Program>,
    imports: ImportTable,
}

impl<B: GraphicsBackend> Texture<B> {
    /// Upload `source` into a new texture that samples from `unit`.
    ///
    /// Fails with [`CompositorError::ReservedUnit`] for units the backend draws with.
    pub fn new(backend: Rc<B>, unit: TextureUnit, source: Box<dyn Source>) -> Result<Self> {
        check_unit(&*backend, unit)?;
        if !source.is_ready() {
            return Err(CompositorError::SourceNotReady);
        }
        let (width, height) = source.dimensions()?;
        let gl_tex = backend.create_texture()?;

        // From here on, Drop releases whatever has been allocated.
        let mut texture = Self {
            backend,
            unit,
            gl_tex,
            source,
            width,
            height,
            disposed: false,
            programs: HashMap::new(),
            imports: ImportTable::new(),
        };
        texture.upload(texture.source.as_ref(), width, height)?;

        texture.insert_program(DEFAULT_PROGRAM, blend::DEFAULT_FRAGMENT_SHADER, blend::DEFAULT_VERTEX_SHADER)?;
        for mode in BlendMode::ALL {
            let fragment = blend::fragment_source(mode);
            texture.insert_program(mode.program_name(), &fragment, blend::DEFAULT_VERTEX_SHADER)?;
        }
        if let Some(program) = texture.programs.get(DEFAULT_PROGRAM) {
            program.activate();
        }

        debug!(
            "Created {}x{} texture {:?} on unit {} with {} programs",
            width,
            height,
            texture.gl_tex,
            unit.0,
            texture.programs.len()
        );
        Ok(texture)
    }

    /// Like [`Texture::new`], on the backend's primary unit.
    pub fn on_primary_unit(backend: Rc<B>, source: Box<dyn Source>) -> Result<Self> {
        let unit = backend.primary_unit();
        Self::new(backend, unit, source)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The unit this texture samples from by default.
    pub fn unit(&self) -> TextureUnit {
        self.unit
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn check_alive(&self) -> Result<()> {
        if self.disposed {
            Err(CompositorError::Disposed)
        } else {
            Ok(())
        }
    }

    fn upload(&self, source: &dyn Source, width: u32, height: u32) -> Result<()> {
        let pixels = PixelStore::UPLOAD.apply(source.pixels()?, width, height)?;
        self.backend
            .upload_texture(self.gl_tex, self.unit, width, height, &pixels)
    }

    /// Composite this texture onto the active render target.
    pub fn draw(&self, options: &DrawOptions<'_>) -> Result<()> {
        self.use_unit(None)?;

        let program = self
            .programs
            .get(options.mode.program_name())
            .ok_or_else(|| CompositorError::InvalidBlendMode(options.mode.to_string()))?;
        let uniforms = options.uniforms(self.unit, self.size());

        trace!(
            "Drawing texture {:?} with {} at ({}, {}) opacity {}",
            self.gl_tex,
            options.mode,
            options.x,
            options.y,
            options.opacity
        );
        program.apply(&uniforms, options.mask.as_ref())
    }

    /// Re-upload pixels, optionally switching to a new source first.
    ///
    /// The source is checked for readiness and its dimensions are read again,
    /// so a shared source may change size between updates. On any failure the
    /// current source and dimensions stay as they were.
    pub fn update(&mut self, source: Option<Box<dyn Source>>) -> Result<()> {
        self.check_alive()?;

        let candidate = source.as_deref().unwrap_or(self.source.as_ref());
        if !candidate.is_ready() {
            return Err(CompositorError::SourceNotReady);
        }
        let (width, height) = candidate.dimensions()?;
        self.upload(candidate, width, height)?;

        if let Some(source) = source {
            self.source = source;
        }
        if (width, height) != (self.width, self.height) {
            debug!(
                "Texture {:?} resized from {}x{} to {}x{}",
                self.gl_tex, self.width, self.height, width, height
            );
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Bind this texture to `target`, or to its own unit when `None`.
    pub fn use_unit(&self, target: Option<TextureUnit>) -> Result<()> {
        self.check_alive()?;
        let unit = target.unwrap_or(self.unit);
        check_unit(&*self.backend, unit)?;
        self.backend.bind_texture(self.gl_tex, unit);
        Ok(())
    }

    /// Build and store a program. Missing stages fall back to the default shaders.
    pub fn register_program(
        &mut self,
        name: &str,
        fragment: Option<&str>,
        vertex: Option<&str>,
    ) -> Result<&B::Program> {
        self.check_alive()?;
        if name.starts_with(RESERVED_PREFIX) {
            return Err(CompositorError::ReservedName(name.to_string()));
        }
        if self.programs.contains_key(name) {
            return Err(CompositorError::DuplicateName(name.to_string()));
        }

        self.insert_program(
            name,
            fragment.unwrap_or(blend::DEFAULT_FRAGMENT_SHADER),
            vertex.unwrap_or(blend::DEFAULT_VERTEX_SHADER),
        )
    }

    fn insert_program(&mut self, name: &str, fragment: &str, vertex: &str) -> Result<&B::Program> {
        let program = self.backend.build_program(vertex, fragment, &self.imports)?;
        debug!("Registered program {}", name);
        let program = self.programs.entry(name.to_string()).or_insert(program);
        Ok(&*program)
    }

    /// Dispose and forget a program. Unknown names are ignored.
    pub fn deregister_program(&mut self, name: &str) -> Result<()> {
        self.check_alive()?;
        if let Some(mut program) = self.programs.remove(name) {
            program.dispose();
            debug!("Deregistered program {}", name);
        }
        Ok(())
    }

    pub fn has_program(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    pub fn program(&self, name: &str) -> Result<Option<&B::Program>> {
        self.check_alive()?;
        Ok(self.programs.get(name))
    }

    pub fn program_names(&self) -> impl Iterator<Item = &str> {
        self.programs.keys().map(String::as_str)
    }

    /// Set a named import for programs registered from now on.
    pub fn register_import(&mut self, name: &str, source: &str) -> Result<()> {
        self.check_alive()?;
        self.imports.insert(name.to_string(), source.to_string());
        Ok(())
    }

    pub fn deregister_import(&mut self, name: &str) -> Result<()> {
        self.check_alive()?;
        self.imports.remove(name);
        Ok(())
    }

    pub fn import(&self, name: &str) -> Option<&str> {
        self.imports.get(name).map(String::as_str)
    }

    /// Release the GPU texture and every program. Later calls fail with
    /// [`CompositorError::Disposed`]; disposing twice is a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        for (_, mut program) in self.programs.drain() {
            program.dispose();
        }
        self.imports.clear();
        self.backend.delete_texture(self.gl_tex);
        debug!("Disposed texture {:?}", self.gl_tex);
    }
}

fn check_unit<B: GraphicsBackend>(backend: &B, unit: TextureUnit) -> Result<()> {
    if backend.reserved_units().contains(&unit) {
        return Err(CompositorError::ReservedUnit(unit.0));
    }
    Ok(())
}

impl<B: GraphicsBackend> Drop for Texture<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::draw::{U_OFFSET, U_OPACITY, U_SIZE};
    use crate::program::{Mask, UniformValue};
    use crate::source::{FrameSource, PixelFormat};
    use crate::test_support::{Call, MaskRecord, RecordingBackend};
    use approx::assert_relative_eq;
    use glam::Vec2;
    use image::RgbaImage;

    fn frame(width: u32, height: u32) -> FrameSource {
        FrameSource::new(width, height, PixelFormat::Rgba8)
            .with_frame(vec![255; (width * height * 4) as usize])
    }

    fn texture(width: u32, height: u32) -> (Rc<RecordingBackend>, Texture<RecordingBackend>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let backend = Rc::new(RecordingBackend::default());
        let texture =
            Texture::new(backend.clone(), TextureUnit(0), Box::new(frame(width, height))).unwrap();
        (backend, texture)
    }

    #[test]
    fn test_new_registers_default_and_blend_programs() {
        let (_backend, texture) = texture(4, 4);
        assert!(texture.has_program(DEFAULT_PROGRAM));
        for mode in BlendMode::ALL {
            assert!(texture.has_program(&format!("~blend_{}", mode)));
        }
        assert_eq!(texture.program_names().count(), BlendMode::ALL.len() + 1);
    }

    #[test]
    fn test_new_uploads_flipped_pixels_and_activates_default() {
        let backend = Rc::new(RecordingBackend::default());
        // Top row red, bottom row blue.
        let source = FrameSource::new(1, 2, PixelFormat::Rgba8)
            .with_frame(vec![255, 0, 0, 255, 0, 0, 255, 255]);
        let texture = Texture::new(backend.clone(), TextureUnit(3), Box::new(source)).unwrap();

        assert_eq!(texture.size(), (1, 2));
        let uploads = backend.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].unit, TextureUnit(3));
        assert_eq!(uploads[0].pixels, vec![0, 0, 255, 255, 255, 0, 0, 255]);

        let default_id = texture.program(DEFAULT_PROGRAM).unwrap().unwrap().id();
        assert_eq!(backend.activated(), vec![default_id]);
    }

    #[test]
    fn test_new_rejects_source_that_is_not_ready() {
        let backend = Rc::new(RecordingBackend::default());
        let source = FrameSource::new(4, 4, PixelFormat::Rgba8);
        let result = Texture::new(backend.clone(), TextureUnit(0), Box::new(source));
        assert!(matches!(result, Err(CompositorError::SourceNotReady)));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_new_rejects_unsupported_source() {
        let backend = Rc::new(RecordingBackend::default());
        let source = FrameSource::new(4, 4, PixelFormat::Other(0x3231_564e)).with_frame(vec![0; 24]);
        let result = Texture::new(backend, TextureUnit(0), Box::new(source));
        assert!(matches!(result, Err(CompositorError::UnsupportedSourceType(_))));
    }

    #[test]
    fn test_failed_program_build_releases_texture() {
        let backend = Rc::new(RecordingBackend::default());
        backend.fail_builds_after(3);
        let result = Texture::new(backend.clone(), TextureUnit(0), Box::new(frame(2, 2)));
        assert!(matches!(result, Err(CompositorError::ShaderCompile(_))));
        assert_eq!(backend.deleted_textures().len(), 1);
        assert_eq!(backend.disposed_programs().len(), 3);
    }

    #[test]
    fn test_draw_multiply_uniforms() {
        let (backend, texture) = texture(200, 100);
        let options = DrawOptions::new()
            .at(10.0, 20.0)
            .opacity(0.5)
            .mode(BlendMode::Multiply);
        texture.draw(&options).unwrap();

        let multiply_id = texture
            .program(BlendMode::Multiply.program_name())
            .unwrap()
            .unwrap()
            .id();
        let applies = backend.applies();
        assert_eq!(applies.len(), 1);
        assert_eq!(applies[0].program, multiply_id);
        assert!(applies[0].mask.is_none());

        let Some(UniformValue::Vec2(offset)) = applies[0].uniforms.get(U_OFFSET) else {
            panic!("missing offset uniform");
        };
        assert_relative_eq!(offset.x, 0.05);
        assert_relative_eq!(offset.y, 0.2);
        assert_eq!(
            applies[0].uniforms.get(U_SIZE),
            Some(&UniformValue::Vec2(Vec2::new(200.0, 100.0)))
        );
        assert_eq!(
            applies[0].uniforms.get(U_OPACITY),
            Some(&UniformValue::Float(0.5))
        );
    }

    #[test]
    fn test_draw_binds_texture_before_applying() {
        let (backend, texture) = texture(8, 8);
        backend.clear();
        texture.draw(&DrawOptions::default()).unwrap();

        let calls = backend.calls();
        assert!(matches!(calls[0], Call::BindTexture { unit: TextureUnit(0), .. }));
        assert!(matches!(calls[1], Call::Apply(_)));
    }

    #[test]
    fn test_draw_passes_mask_through() {
        let (backend, texture) = texture(8, 8);
        let options = DrawOptions::new().mask(Mask::Unit(TextureUnit(5)));
        texture.draw(&options).unwrap();
        assert_eq!(backend.applies()[0].mask, Some(MaskRecord::Unit(TextureUnit(5))));
    }

    #[test]
    fn test_draw_with_source_mask() {
        let (backend, texture) = texture(8, 8);
        let mask = frame(3, 2);
        let options = DrawOptions::new().mode(BlendMode::Overlay).mask(Mask::Source(&mask));
        texture.draw(&options).unwrap();
        assert_eq!(backend.applies()[0].mask, Some(MaskRecord::Source(3, 2)));
    }

    #[test]
    fn test_draw_without_blend_program_is_invalid_blend_mode() {
        let (_backend, mut texture) = texture(8, 8);
        texture
            .deregister_program(BlendMode::Screen.program_name())
            .unwrap();
        let result = texture.draw(&DrawOptions::new().mode(BlendMode::Screen));
        assert!(matches!(result, Err(CompositorError::InvalidBlendMode(mode)) if mode == "screen"));
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let (_backend, mut texture) = texture(8, 8);
        let first = texture.register_program("sepia", Some("// sepia"), None).unwrap().id();

        let result = texture.register_program("sepia", Some("// other"), None);
        assert!(matches!(result, Err(CompositorError::DuplicateName(name)) if name == "sepia"));

        let kept = texture.program("sepia").unwrap().unwrap();
        assert_eq!(kept.id(), first);
        assert_eq!(kept.fragment(), "// sepia");
    }

    #[test]
    fn test_register_program_defaults_stages() {
        let (_backend, mut texture) = texture(8, 8);
        let program = texture.register_program("plain", None, None).unwrap();
        assert_eq!(program.fragment(), blend::DEFAULT_FRAGMENT_SHADER);
        assert_eq!(program.vertex(), blend::DEFAULT_VERTEX_SHADER);
    }

    #[test]
    fn test_reserved_names_are_rejected() {
        let (_backend, mut texture) = texture(8, 8);
        let result = texture.register_program("~mine", None, None);
        assert!(matches!(result, Err(CompositorError::ReservedName(_))));
        assert!(!texture.has_program("~mine"));
    }

    #[test]
    fn test_deregister_unknown_program_is_noop() {
        let (backend, mut texture) = texture(8, 8);
        let before: Vec<String> = {
            let mut names: Vec<String> = texture.program_names().map(String::from).collect();
            names.sort();
            names
        };
        texture.deregister_program("missing").unwrap();
        let mut after: Vec<String> = texture.program_names().map(String::from).collect();
        after.sort();
        assert_eq!(before, after);
        assert!(backend.disposed_programs().is_empty());
    }

    #[test]
    fn test_deregister_disposes_program() {
        let (backend, mut texture) = texture(8, 8);
        let id = texture.register_program("glow", None, None).unwrap().id();
        texture.deregister_program("glow").unwrap();
        assert!(!texture.has_program("glow"));
        assert_eq!(backend.disposed_programs(), vec![id]);
        assert!(texture.program("glow").unwrap().is_none());
    }

    #[test]
    fn test_imports_only_affect_later_programs() {
        let (_backend, mut texture) = texture(8, 8);
        texture.register_import("foo", "srcA").unwrap();
        texture.register_program("early", None, None).unwrap();

        texture.register_import("foo", "srcB").unwrap();
        texture.register_program("late", None, None).unwrap();

        assert_eq!(texture.import("foo"), Some("srcB"));
        let early = texture.program("early").unwrap().unwrap();
        let late = texture.program("late").unwrap().unwrap();
        assert_eq!(early.imports().get("foo").map(String::as_str), Some("srcA"));
        assert_eq!(late.imports().get("foo").map(String::as_str), Some("srcB"));
    }

    #[test]
    fn test_deregister_import_is_idempotent() {
        let (_backend, mut texture) = texture(8, 8);
        texture.register_import("noise", "float noise();").unwrap();
        texture.deregister_import("noise").unwrap();
        texture.deregister_import("noise").unwrap();
        assert_eq!(texture.import("noise"), None);
    }

    #[test]
    fn test_update_with_unready_source_keeps_state() {
        let (backend, mut texture) = texture(8, 4);
        backend.clear();
        let pending = FrameSource::new(16, 16, PixelFormat::Rgba8);
        let result = texture.update(Some(Box::new(pending)));
        assert!(matches!(result, Err(CompositorError::SourceNotReady)));
        assert_eq!(texture.size(), (8, 4));
        assert!(backend.uploads().is_empty());

        // The original source is still bound.
        texture.update(None).unwrap();
        assert_eq!(backend.uploads()[0].width, 8);
    }

    #[test]
    fn test_update_replaces_source_and_dimensions() {
        let (backend, mut texture) = texture(8, 4);
        texture.update(Some(Box::new(frame(3, 5)))).unwrap();
        assert_eq!(texture.size(), (3, 5));
        let last = backend.uploads().pop().unwrap();
        assert_eq!((last.width, last.height), (3, 5));
    }

    #[test]
    fn test_update_same_source_twice_keeps_dimensions() {
        let (_backend, mut texture) = texture(8, 4);
        texture.update(Some(Box::new(frame(6, 2)))).unwrap();
        let first = texture.size();
        texture.update(Some(Box::new(frame(6, 2)))).unwrap();
        assert_eq!(texture.size(), first);
    }

    #[test]
    fn test_update_advances_shared_video_frames() {
        let backend = Rc::new(RecordingBackend::default());
        let video = Rc::new(RefCell::new(
            FrameSource::new(1, 1, PixelFormat::Rgba8).with_frame(vec![1, 1, 1, 255]),
        ));
        let mut texture =
            Texture::new(backend.clone(), TextureUnit(0), Box::new(video.clone())).unwrap();

        video.borrow_mut().push_frame(vec![2, 2, 2, 255]);
        texture.update(None).unwrap();

        let uploads = backend.uploads();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[1].pixels, vec![2, 2, 2, 255]);
    }

    #[test]
    fn test_update_rereads_dimensions_of_shared_source() {
        let backend = Rc::new(RecordingBackend::default());
        let shared = Rc::new(RefCell::new(RgbaImage::new(4, 4)));
        let mut texture =
            Texture::new(backend.clone(), TextureUnit(0), Box::new(shared.clone())).unwrap();

        // Top row of the replacement is 255, bottom row 0.
        let mut wide = RgbaImage::new(8, 2);
        for x in 0..8 {
            wide.put_pixel(x, 0, image::Rgba([255, 255, 255, 255]));
        }
        *shared.borrow_mut() = wide;
        texture.update(None).unwrap();

        assert_eq!(texture.size(), (8, 2));
        let last = backend.uploads().pop().unwrap();
        assert_eq!((last.width, last.height), (8, 2));
        assert_eq!(&last.pixels[..32], &[0; 32][..]);
        assert_eq!(&last.pixels[32..], &[255; 32][..]);
    }

    #[test]
    fn test_update_with_unready_shared_source_fails() {
        let backend = Rc::new(RecordingBackend::default());
        let video = Rc::new(RefCell::new(
            FrameSource::new(2, 2, PixelFormat::Rgba8).with_frame(vec![0; 16]),
        ));
        let mut texture =
            Texture::new(backend.clone(), TextureUnit(0), Box::new(video.clone())).unwrap();
        backend.clear();

        video.borrow_mut().push_frame(vec![0; 5]);
        let result = texture.update(None);

        assert!(matches!(result, Err(CompositorError::SourceNotReady)));
        assert!(backend.uploads().is_empty());
        assert_eq!(texture.size(), (2, 2));
    }

    #[test]
    fn test_update_with_wrong_pixel_count_keeps_state() {
        struct Lying;
        impl Source for Lying {
            fn is_ready(&self) -> bool {
                true
            }
            fn dimensions(&self) -> Result<(u32, u32)> {
                Ok((4, 4))
            }
            fn pixels(&self) -> Result<std::borrow::Cow<'_, [u8]>> {
                Ok(std::borrow::Cow::Owned(vec![0; 4]))
            }
        }

        let (backend, mut texture) = texture(2, 2);
        backend.clear();
        let result = texture.update(Some(Box::new(Lying)));
        assert!(matches!(
            result,
            Err(CompositorError::PixelSize {
                expected: 64,
                actual: 4
            })
        ));
        assert_eq!(texture.size(), (2, 2));
        assert!(backend.uploads().is_empty());
    }

    #[test]
    fn test_new_rejects_reserved_unit() {
        let backend = Rc::new(RecordingBackend::default());
        backend.reserve_units(&[TextureUnit(1), TextureUnit(2)]);
        let result = Texture::new(backend.clone(), TextureUnit(2), Box::new(frame(2, 2)));
        assert!(matches!(result, Err(CompositorError::ReservedUnit(2))));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_use_unit_rejects_reserved_unit() {
        let (backend, texture) = texture(8, 8);
        backend.reserve_units(&[TextureUnit(1)]);
        backend.clear();
        let result = texture.use_unit(Some(TextureUnit(1)));
        assert!(matches!(result, Err(CompositorError::ReservedUnit(1))));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_on_primary_unit_uses_backend_unit() {
        let backend = Rc::new(RecordingBackend::default());
        backend.set_primary_unit(TextureUnit(4));
        let texture = Texture::on_primary_unit(backend.clone(), Box::new(frame(2, 2))).unwrap();
        assert_eq!(texture.unit(), TextureUnit(4));
        assert_eq!(backend.uploads()[0].unit, TextureUnit(4));
    }

    #[test]
    fn test_use_unit_binds_target() {
        let (backend, texture) = texture(8, 8);
        backend.clear();
        texture.use_unit(Some(TextureUnit(7))).unwrap();
        assert!(matches!(
            backend.calls()[0],
            Call::BindTexture { unit: TextureUnit(7), .. }
        ));
    }

    #[test]
    fn test_operations_after_dispose_fail() {
        let (_backend, mut texture) = texture(8, 8);
        texture.dispose();
        assert!(texture.is_disposed());

        assert!(matches!(texture.update(None), Err(CompositorError::Disposed)));
        assert!(matches!(
            texture.register_program("late", None, None),
            Err(CompositorError::Disposed)
        ));
        assert!(matches!(texture.use_unit(None), Err(CompositorError::Disposed)));
        assert!(matches!(texture.program(DEFAULT_PROGRAM), Err(CompositorError::Disposed)));
        assert!(matches!(
            texture.draw(&DrawOptions::default()),
            Err(CompositorError::Disposed)
        ));
        assert!(matches!(
            texture.register_import("a", "b"),
            Err(CompositorError::Disposed)
        ));
        assert!(matches!(
            texture.deregister_program(DEFAULT_PROGRAM),
            Err(CompositorError::Disposed)
        ));
        assert!(!texture.has_program(DEFAULT_PROGRAM));
    }

    #[test]
    fn test_dispose_releases_everything_once() {
        let (backend, mut texture) = texture(8, 8);
        texture.register_program("extra", None, None).unwrap();
        texture.dispose();
        texture.dispose();
        drop(texture);

        assert_eq!(backend.deleted_textures().len(), 1);
        assert_eq!(backend.disposed_programs().len(), BlendMode::ALL.len() + 2);
    }

    #[test]
    fn test_drop_releases_undisposed_texture() {
        let (backend, texture) = texture(8, 8);
        drop(texture);
        assert_eq!(backend.deleted_textures().len(), 1);
        assert_eq!(backend.disposed_programs().len(), BlendMode::ALL.len() + 1);
    }
}
