// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

//! OpenGL implementation of [`GraphicsBackend`] and [`ShaderProgram`] using `glow`.
//!
//! Every program draws the same unit quad. Blend programs read the render
//! target through a backdrop texture that is refreshed from the current
//! viewport right before each draw, so the blend math runs in the fragment
//! shader instead of the fixed-function blender.

use std::collections::HashMap;
use std::rc::Rc;

use glow::HasContext;
use log::{debug, trace, warn};

use crate::backend::GraphicsBackend;
use crate::error::{CompositorError, Result};
use crate::handles::TextureUnit;
use crate::program::{ImportTable, Mask, ShaderProgram, UniformValue, Uniforms};
use crate::settings::RendererSettings;
use crate::source::PixelStore;

/// Line prefix that pulls a named import into a shader.
pub const IMPORT_DIRECTIVE: &str = "@use";

const MAX_IMPORT_DEPTH: usize = 16;

/// Replace every `@use <name>` line with the import registered under `name`.
///
/// Imports may themselves contain `@use` lines. The name may be quoted and
/// may end with `;`.
pub fn expand_imports(source: &str, imports: &ImportTable) -> Result<String> {
    let mut stack = Vec::new();
    expand_into(source, imports, &mut stack)
}

fn expand_into<'a>(source: &str, imports: &'a ImportTable, stack: &mut Vec<&'a str>) -> Result<String> {
    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix(IMPORT_DIRECTIVE) else {
            out.push_str(line);
            out.push('\n');
            continue;
        };
        if !rest.starts_with(char::is_whitespace) {
            out.push_str(line);
            out.push('\n');
            continue;
        }

        let name = rest.trim().trim_end_matches(';').trim().trim_matches('"');
        let (key, body) = imports
            .get_key_value(name)
            .ok_or_else(|| CompositorError::UnknownImport(name.to_string()))?;
        if stack.contains(&key.as_str()) || stack.len() >= MAX_IMPORT_DEPTH {
            return Err(CompositorError::ShaderCompile(format!(
                "import cycle through {}",
                name
            )));
        }

        stack.push(key.as_str());
        out.push_str(&expand_into(body, imports, stack)?);
        stack.pop();
    }
    Ok(out)
}

/// Run `draw` with a GL capability turned off, then restore it if it was on.
fn with_capability_disabled(enabled: bool, mut set: impl FnMut(bool), draw: impl FnOnce()) {
    if enabled {
        set(false);
    }
    draw();
    if enabled {
        set(true);
    }
}

/// GL objects shared by every program built from one backend.
struct DrawResources {
    gl: Rc<glow::Context>,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    backdrop: glow::Texture,
    mask: glow::Texture,
}

impl DrawResources {
    unsafe fn new(gl: &Rc<glow::Context>) -> Result<Self> {
        unsafe {
            let vao = gl.create_vertex_array().map_err(CompositorError::Gpu)?;
            gl.bind_vertex_array(Some(vao));

            let vbo = gl.create_buffer().map_err(CompositorError::Gpu)?;
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));

            // Unit quad as a triangle strip, in draw-rectangle space (y down).
            #[rustfmt::skip]
            let vertices: [f32; 8] = [
                0.0, 0.0,
                1.0, 0.0,
                0.0, 1.0,
                1.0, 1.0,
            ];
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&vertices),
                glow::STATIC_DRAW,
            );
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, 2 * size_of::<f32>() as i32, 0);

            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            let backdrop = create_sampling_texture(gl, false)?;
            let mask = create_sampling_texture(gl, true)?;

            Ok(Self {
                gl: gl.clone(),
                vao,
                vbo,
                backdrop,
                mask,
            })
        }
    }
}

impl Drop for DrawResources {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_vertex_array(self.vao);
            self.gl.delete_buffer(self.vbo);
            self.gl.delete_texture(self.backdrop);
            self.gl.delete_texture(self.mask);
        }
    }
}

unsafe fn create_sampling_texture(gl: &glow::Context, linear: bool) -> Result<glow::Texture> {
    unsafe {
        let tex = gl.create_texture().map_err(|e| {
            warn!("Failed to allocate texture: {}", e);
            CompositorError::Gpu(e)
        })?;
        let filter = (if linear { glow::LINEAR } else { glow::NEAREST }) as i32;
        gl.bind_texture(glow::TEXTURE_2D, Some(tex));
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, filter);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, filter);
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_WRAP_S,
            glow::CLAMP_TO_EDGE as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_WRAP_T,
            glow::CLAMP_TO_EDGE as i32,
        );
        gl.bind_texture(glow::TEXTURE_2D, None);
        Ok(tex)
    }
}

unsafe fn upload_rgba(
    gl: &glow::Context,
    tex: glow::Texture,
    unit: TextureUnit,
    width: u32,
    height: u32,
    pixels: &[u8],
) -> Result<()> {
    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(CompositorError::Gpu(format!(
            "expected {} bytes for {}x{} RGBA, got {}",
            expected,
            width,
            height,
            pixels.len()
        )));
    }

    unsafe {
        gl.active_texture(unit.gl_enum());
        gl.bind_texture(glow::TEXTURE_2D, Some(tex));
        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGBA8 as i32,
            width as i32,
            height as i32,
            0,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            glow::PixelUnpackData::Slice(Some(pixels)),
        );
    }
    Ok(())
}

pub struct GlowBackend {
    gl: Rc<glow::Context>,
    glsl_version: String,
    primary_unit: TextureUnit,
    mask_unit: TextureUnit,
    backdrop_unit: TextureUnit,
    linear_filtering: bool,
    resources: Rc<DrawResources>,
}

impl GlowBackend {
    /// Needs a current GL 3.3 core / GLES 3.0 / WebGL2 context.
    ///
    /// Fails with [`CompositorError::ReservedUnit`] when the primary unit is also
    /// the mask or backdrop unit.
    pub fn new(gl: Rc<glow::Context>, settings: &RendererSettings) -> Result<Self> {
        if settings.reserved_units().contains(&settings.primary_unit()) {
            return Err(CompositorError::ReservedUnit(settings.primary_unit));
        }
        let resources = unsafe { DrawResources::new(&gl)? };
        debug!(
            "GL backend ready: GLSL {}, primary unit {}, mask unit {}, backdrop unit {}",
            settings.glsl_version,
            settings.primary_unit,
            settings.mask_unit,
            settings.backdrop_unit
        );
        Ok(Self {
            gl,
            glsl_version: settings.glsl_version.clone(),
            primary_unit: settings.primary_unit(),
            mask_unit: settings.mask_unit(),
            backdrop_unit: settings.backdrop_unit(),
            linear_filtering: settings.linear_filtering,
            resources: Rc::new(resources),
        })
    }

    pub fn gl(&self) -> &Rc<glow::Context> {
        &self.gl
    }

    fn with_version(&self, source: &str) -> String {
        format!("#version {}\n{}", self.glsl_version, source)
    }

    unsafe fn compile_stage(&self, stage: u32, source: &str) -> Result<glow::Shader> {
        unsafe {
            let gl = &self.gl;
            let shader = gl.create_shader(stage).map_err(CompositorError::Gpu)?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);
            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                let kind = if stage == glow::VERTEX_SHADER {
                    "Vertex"
                } else {
                    "Fragment"
                };
                return Err(CompositorError::ShaderCompile(format!(
                    "{} shader compilation failed: {}",
                    kind, log
                )));
            }
            Ok(shader)
        }
    }
}

impl GraphicsBackend for GlowBackend {
    type Texture = glow::Texture;
    type Program = GlowProgram;

    fn primary_unit(&self) -> TextureUnit {
        self.primary_unit
    }

    fn reserved_units(&self) -> Vec<TextureUnit> {
        vec![self.mask_unit, self.backdrop_unit]
    }

    fn create_texture(&self) -> Result<glow::Texture> {
        unsafe { create_sampling_texture(&self.gl, self.linear_filtering) }
    }

    fn upload_texture(
        &self,
        texture: glow::Texture,
        unit: TextureUnit,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<()> {
        unsafe { upload_rgba(&self.gl, texture, unit, width, height, pixels) }
    }

    fn bind_texture(&self, texture: glow::Texture, unit: TextureUnit) {
        unsafe {
            self.gl.active_texture(unit.gl_enum());
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        }
    }

    fn delete_texture(&self, texture: glow::Texture) {
        unsafe { self.gl.delete_texture(texture) }
    }

    fn build_program(
        &self,
        vertex: &str,
        fragment: &str,
        imports: &ImportTable,
    ) -> Result<GlowProgram> {
        let vertex_src = self.with_version(&expand_imports(vertex, imports)?);
        let fragment_src = self.with_version(&expand_imports(fragment, imports)?);

        unsafe {
            let gl = &self.gl;
            let vertex_shader = self.compile_stage(glow::VERTEX_SHADER, &vertex_src)?;
            let fragment_shader = match self.compile_stage(glow::FRAGMENT_SHADER, &fragment_src) {
                Ok(shader) => shader,
                Err(e) => {
                    gl.delete_shader(vertex_shader);
                    return Err(e);
                }
            };

            let program = match gl.create_program() {
                Ok(program) => program,
                Err(e) => {
                    gl.delete_shader(vertex_shader);
                    gl.delete_shader(fragment_shader);
                    return Err(CompositorError::Gpu(e));
                }
            };
            gl.attach_shader(program, vertex_shader);
            gl.attach_shader(program, fragment_shader);
            gl.link_program(program);
            let linked = gl.get_program_link_status(program);

            gl.detach_shader(program, vertex_shader);
            gl.detach_shader(program, fragment_shader);
            gl.delete_shader(vertex_shader);
            gl.delete_shader(fragment_shader);

            if !linked {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(CompositorError::ShaderCompile(format!(
                    "Program linking failed: {}",
                    log
                )));
            }

            let mut uniforms = HashMap::new();
            let count = gl.get_program_parameter_i32(program, glow::ACTIVE_UNIFORMS);
            for i in 0..count {
                let Some(info) = gl.get_active_uniform(program, i as u32) else {
                    continue;
                };
                if let Some(loc) = gl.get_uniform_location(program, &info.name) {
                    let name = info.name.trim_end_matches("[0]").to_string();
                    uniforms.insert(name, loc);
                }
            }
            trace!("Linked program {:?} with {} active uniforms", program, uniforms.len());

            Ok(GlowProgram {
                gl: gl.clone(),
                program: Some(program),
                uniforms,
                mask_unit: self.mask_unit,
                backdrop_unit: self.backdrop_unit,
                resources: self.resources.clone(),
            })
        }
    }
}

pub struct GlowProgram {
    gl: Rc<glow::Context>,
    program: Option<glow::Program>,
    uniforms: HashMap<String, glow::UniformLocation>,
    mask_unit: TextureUnit,
    backdrop_unit: TextureUnit,
    resources: Rc<DrawResources>,
}

impl GlowProgram {
    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.contains_key(name)
    }

    pub fn uniform_names(&self) -> impl Iterator<Item = &str> {
        self.uniforms.keys().map(String::as_str)
    }

    unsafe fn set_uniform(&self, name: &str, value: &UniformValue) {
        let Some(loc) = self.uniforms.get(name) else {
            trace!("Skipping uniform {} not used by program", name);
            return;
        };
        unsafe {
            let gl = &self.gl;
            match value {
                UniformValue::Float(v) => gl.uniform_1_f32(Some(loc), *v),
                UniformValue::Vec2(v) => gl.uniform_2_f32(Some(loc), v.x, v.y),
                UniformValue::Int(i) => gl.uniform_1_i32(Some(loc), *i),
                UniformValue::Sampler(unit) => gl.uniform_1_i32(Some(loc), unit.sampler_index()),
            }
        }
    }

    /// Copy the viewport into the backdrop texture for the blend shaders to read.
    unsafe fn capture_backdrop(&self, viewport: [i32; 4]) {
        unsafe {
            let gl = &self.gl;
            gl.active_texture(self.backdrop_unit.gl_enum());
            gl.bind_texture(glow::TEXTURE_2D, Some(self.resources.backdrop));
            gl.copy_tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA,
                viewport[0],
                viewport[1],
                viewport[2],
                viewport[3],
                0,
            );
            self.set_uniform("u_backdrop", &UniformValue::Sampler(self.backdrop_unit));
        }
    }

    unsafe fn bind_mask(&self, mask: Option<&Mask<'_>>) -> Result<()> {
        let unit = match mask {
            None => {
                unsafe { self.set_uniform("u_use_mask", &UniformValue::Int(0)) };
                return Ok(());
            }
            Some(Mask::Unit(unit)) => *unit,
            Some(Mask::Source(source)) => {
                if !source.is_ready() {
                    return Err(CompositorError::SourceNotReady);
                }
                let (width, height) = source.dimensions()?;
                let pixels = PixelStore::UPLOAD.apply(source.pixels()?, width, height)?;
                unsafe {
                    upload_rgba(
                        &self.gl,
                        self.resources.mask,
                        self.mask_unit,
                        width,
                        height,
                        &pixels,
                    )?
                };
                self.mask_unit
            }
        };
        unsafe {
            self.set_uniform("u_mask", &UniformValue::Sampler(unit));
            self.set_uniform("u_use_mask", &UniformValue::Int(1));
        }
        Ok(())
    }
}

impl ShaderProgram for GlowProgram {
    fn activate(&self) {
        unsafe { self.gl.use_program(self.program) }
    }

    fn apply(&self, uniforms: &Uniforms, mask: Option<&Mask<'_>>) -> Result<()> {
        let Some(program) = self.program else {
            return Err(CompositorError::Gpu("program has been disposed".into()));
        };

        unsafe {
            let gl = &self.gl;
            gl.use_program(Some(program));

            let mut viewport = [0; 4];
            gl.get_parameter_i32_slice(glow::VIEWPORT, &mut viewport);
            if let Some(loc) = self.uniforms.get("u_viewport") {
                gl.uniform_4_f32(
                    Some(loc),
                    viewport[0] as f32,
                    viewport[1] as f32,
                    viewport[2] as f32,
                    viewport[3] as f32,
                );
            }

            if self.has_uniform("u_backdrop") {
                self.capture_backdrop(viewport);
            }
            self.bind_mask(mask)?;

            for (name, value) in uniforms.iter() {
                self.set_uniform(name, value);
            }

            with_capability_disabled(
                gl.is_enabled(glow::BLEND),
                |on| {
                    if on {
                        gl.enable(glow::BLEND)
                    } else {
                        gl.disable(glow::BLEND)
                    }
                },
                || {
                    gl.bind_vertex_array(Some(self.resources.vao));
                    gl.draw_arrays(glow::TRIANGLE_STRIP, 0, 4);
                    gl.bind_vertex_array(None);
                },
            );
        }
        Ok(())
    }

    fn dispose(&mut self) {
        if let Some(program) = self.program.take() {
            unsafe { self.gl.delete_program(program) }
        } else {
            warn!("Program disposed twice");
        }
    }
}

impl Drop for GlowProgram {
    fn drop(&mut self) {
        if let Some(program) = self.program.take() {
            unsafe { self.gl.delete_program(program) }
        }
    }
}
