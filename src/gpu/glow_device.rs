//! OpenGL / WebGL device backed by `glow`.
//!
//! # Safety
//!
//! A [`GlowDevice`] must only be used while its context is current on the
//! calling thread. Every trait method issues raw GL calls under that
//! assumption.

use glow::HasContext;
use rustc_hash::FxHashMap;

use super::locations::UniformLocationTable;
use super::{
    BufferId, GraphicsDevice, IndexType, Primitive, RawProgram, RawShader, RawUniform,
    ShaderKind, UniformValue, VertexArrayId, VertexAttribLayout,
};
use crate::shader::GlApiVersion;

/// [`GraphicsDevice`] over a `glow::Context`.
///
/// Native GL objects live in lookup tables keyed by the crate's `u32`
/// handles. Geometry objects are created outside the core and registered
/// with [`register_vertex_array`](Self::register_vertex_array) and
/// [`register_buffer`](Self::register_buffer).
pub struct GlowDevice {
    gl: glow::Context,
    version: GlApiVersion,
    next_id: u32,
    shaders: FxHashMap<RawShader, glow::Shader>,
    programs: FxHashMap<RawProgram, glow::Program>,
    uniforms: UniformLocationTable<glow::UniformLocation>,
    vertex_arrays: FxHashMap<VertexArrayId, glow::VertexArray>,
    buffers: FxHashMap<BufferId, glow::Buffer>,
}

impl GlowDevice {
    #[must_use]
    pub fn new(gl: glow::Context) -> Self {
        let v = gl.version();
        let version = if v.major >= 3 {
            GlApiVersion::Gles3
        } else {
            GlApiVersion::Gles2
        };
        log::info!(
            "GL context {}.{} (embedded: {}), assembling for {version:?}",
            v.major,
            v.minor,
            v.is_embedded
        );
        Self {
            gl,
            version,
            next_id: 1,
            shaders: FxHashMap::default(),
            programs: FxHashMap::default(),
            uniforms: UniformLocationTable::default(),
            vertex_arrays: FxHashMap::default(),
            buffers: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    pub fn register_vertex_array(&mut self, vao: glow::VertexArray) -> VertexArrayId {
        let id = VertexArrayId(self.alloc());
        self.vertex_arrays.insert(id, vao);
        id
    }

    pub fn register_buffer(&mut self, buffer: glow::Buffer) -> BufferId {
        let id = BufferId(self.alloc());
        self.buffers.insert(id, buffer);
        id
    }

    fn alloc(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn gl_primitive(p: Primitive) -> u32 {
    match p {
        Primitive::Points => glow::POINTS,
        Primitive::Lines => glow::LINES,
        Primitive::LineStrip => glow::LINE_STRIP,
        Primitive::Triangles => glow::TRIANGLES,
        Primitive::TriangleStrip => glow::TRIANGLE_STRIP,
        Primitive::TriangleFan => glow::TRIANGLE_FAN,
    }
}

impl GraphicsDevice for GlowDevice {
    fn api_version(&self) -> GlApiVersion {
        self.version
    }

    fn supports_vertex_arrays(&self) -> bool {
        self.version == GlApiVersion::Gles3
            || self.gl.supported_extensions().contains("OES_vertex_array_object")
    }

    fn compile_shader(&mut self, kind: ShaderKind, source: &str) -> Result<RawShader, String> {
        let stage = match kind {
            ShaderKind::Vertex => glow::VERTEX_SHADER,
            ShaderKind::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe {
            let shader = self.gl.create_shader(stage)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(log);
            }
            let id = RawShader(self.alloc());
            self.shaders.insert(id, shader);
            Ok(id)
        }
    }

    fn delete_shader(&mut self, shader: RawShader) {
        if let Some(s) = self.shaders.remove(&shader) {
            unsafe { self.gl.delete_shader(s) };
        }
    }

    fn link_program(
        &mut self,
        vertex: RawShader,
        fragment: RawShader,
    ) -> Result<RawProgram, String> {
        let (Some(&vs), Some(&fs)) = (self.shaders.get(&vertex), self.shaders.get(&fragment))
        else {
            return Err("invalid shader object".to_owned());
        };
        unsafe {
            let program = self.gl.create_program()?;
            self.gl.attach_shader(program, vs);
            self.gl.attach_shader(program, fs);
            self.gl.link_program(program);
            self.gl.detach_shader(program, vs);
            self.gl.detach_shader(program, fs);
            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(log);
            }
            let id = RawProgram(self.alloc());
            self.programs.insert(id, program);
            Ok(id)
        }
    }

    fn delete_program(&mut self, program: RawProgram) {
        if let Some(p) = self.programs.remove(&program) {
            unsafe { self.gl.delete_program(p) };
        }
        self.uniforms.remove_program(program);
    }

    fn use_program(&mut self, program: RawProgram) {
        let native = self.programs.get(&program).copied();
        unsafe { self.gl.use_program(native) };
    }

    fn uniform_location(&mut self, program: RawProgram, name: &str) -> Option<RawUniform> {
        if let Some(id) = self.uniforms.lookup(program, name) {
            return Some(id);
        }
        let native = *self.programs.get(&program)?;
        let location = unsafe { self.gl.get_uniform_location(native, name) }?;
        let id = RawUniform(self.alloc());
        self.uniforms.insert(id, program, name, location);
        Some(id)
    }

    fn attrib_location(&mut self, program: RawProgram, name: &str) -> Option<u32> {
        let native = *self.programs.get(&program)?;
        unsafe { self.gl.get_attrib_location(native, name) }
    }

    fn enable_vertex_attrib(&mut self, location: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(location) };
    }

    fn disable_vertex_attrib(&mut self, location: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(location) };
    }

    fn write_uniform(&mut self, location: RawUniform, value: &UniformValue) {
        let Some(loc) = self.uniforms.native(location) else {
            log::warn!("write to unknown uniform location {location:?}");
            return;
        };
        let loc = Some(loc);
        let data = value.as_f32_slice();
        unsafe {
            match value {
                UniformValue::Float(v) => self.gl.uniform_1_f32(loc, *v),
                UniformValue::Int(v) => self.gl.uniform_1_i32(loc, *v),
                UniformValue::Vec2(_) => self.gl.uniform_2_f32_slice(loc, data),
                UniformValue::Vec3(_) => self.gl.uniform_3_f32_slice(loc, data),
                UniformValue::Vec4(_) => self.gl.uniform_4_f32_slice(loc, data),
                UniformValue::Mat3(_) => self.gl.uniform_matrix_3_f32_slice(loc, false, data),
                UniformValue::Mat4(_) => self.gl.uniform_matrix_4_f32_slice(loc, false, data),
            }
        }
    }

    fn bind_vertex_array(&mut self, vao: VertexArrayId) {
        let native = self.vertex_arrays.get(&vao).copied();
        unsafe { self.gl.bind_vertex_array(native) };
    }

    fn unbind_vertex_array(&mut self) {
        unsafe { self.gl.bind_vertex_array(None) };
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferId, layout: &VertexAttribLayout) {
        let native = self.buffers.get(&buffer).copied();
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, native);
            self.gl.vertex_attrib_pointer_f32(
                layout.location,
                layout.components,
                glow::FLOAT,
                false,
                layout.stride,
                layout.offset,
            );
        }
    }

    fn bind_index_buffer(&mut self, buffer: BufferId) {
        let native = self.buffers.get(&buffer).copied();
        unsafe { self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, native) };
    }

    fn draw_elements(&mut self, primitive: Primitive, count: u32, index_type: IndexType) {
        let ty = match index_type {
            IndexType::U16 => glow::UNSIGNED_SHORT,
            IndexType::U32 => glow::UNSIGNED_INT,
        };
        unsafe {
            self.gl
                .draw_elements(gl_primitive(primitive), count as i32, ty, 0);
        }
    }

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) {
        unsafe {
            self.gl
                .draw_arrays(gl_primitive(primitive), first as i32, count as i32);
        }
    }
}

impl Drop for GlowDevice {
    fn drop(&mut self) {
        unsafe {
            for (_, program) in self.programs.drain() {
                self.gl.delete_program(program);
            }
            for (_, shader) in self.shaders.drain() {
                self.gl.delete_shader(shader);
            }
        }
    }
}
