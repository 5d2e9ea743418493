//! Recording device without a GL context.
//!
//! [`HeadlessDevice`] behaves like a permissive GL driver: shaders always
//! compile unless a failure is injected, uniform and attribute locations
//! exist only for names the linked sources declare, and every call is
//! appended to a log that tests inspect.

use rustc_hash::FxHashMap;

use super::locations::UniformLocationTable;
use super::{
    BufferId, GraphicsDevice, IndexType, Primitive, RawProgram, RawShader, RawUniform,
    ShaderKind, UniformValue, VertexArrayId, VertexAttribLayout,
};
use crate::shader::GlApiVersion;

/// One recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    CompileShader(ShaderKind),
    DeleteShader(RawShader),
    LinkProgram(RawProgram),
    DeleteProgram(RawProgram),
    UseProgram(RawProgram),
    EnableVertexAttrib(u32),
    DisableVertexAttrib(u32),
    WriteUniform {
        program: RawProgram,
        name: String,
        value: UniformValue,
    },
    BindVertexArray(VertexArrayId),
    UnbindVertexArray,
    BindVertexBuffer {
        buffer: BufferId,
        location: u32,
    },
    BindIndexBuffer(BufferId),
    DrawElements {
        primitive: Primitive,
        count: u32,
        index_type: IndexType,
    },
    DrawArrays {
        primitive: Primitive,
        first: u32,
        count: u32,
    },
}

#[derive(Debug)]
struct HeadlessShader {
    source: String,
}

#[derive(Debug)]
struct HeadlessProgram {
    /// Declared uniform name -> array length (1 for scalars).
    uniforms: FxHashMap<String, usize>,
    /// Declared vertex inputs in declaration order.
    attributes: Vec<String>,
    vertex_source: String,
    fragment_source: String,
}

/// In-memory [`GraphicsDevice`] that records calls.
#[derive(Debug)]
pub struct HeadlessDevice {
    version: GlApiVersion,
    vertex_arrays: bool,
    next_id: u32,
    shaders: FxHashMap<RawShader, HeadlessShader>,
    programs: FxHashMap<RawProgram, HeadlessProgram>,
    locations: UniformLocationTable<()>,
    fail_compile: Vec<String>,
    fail_link: Vec<String>,
    calls: Vec<GpuCall>,
}

impl HeadlessDevice {
    /// VAOs are reported as supported on GLES3 only.
    #[must_use]
    pub fn new(version: GlApiVersion) -> Self {
        Self {
            version,
            vertex_arrays: version == GlApiVersion::Gles3,
            next_id: 1,
            shaders: FxHashMap::default(),
            programs: FxHashMap::default(),
            locations: UniformLocationTable::default(),
            fail_compile: Vec::new(),
            fail_link: Vec::new(),
            calls: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_vertex_arrays(mut self, supported: bool) -> Self {
        self.vertex_arrays = supported;
        self
    }

    /// Makes compilation fail for any source containing `needle`.
    pub fn fail_compile_when(&mut self, needle: impl Into<String>) {
        self.fail_compile.push(needle.into());
    }

    /// Makes linking fail when either stage contains `needle`.
    pub fn fail_link_when(&mut self, needle: impl Into<String>) {
        self.fail_link.push(needle.into());
    }

    #[must_use]
    pub fn calls(&self) -> &[GpuCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn count(&self, pred: impl Fn(&GpuCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    #[must_use]
    pub fn program_binds(&self) -> usize {
        self.count(|c| matches!(c, GpuCall::UseProgram(_)))
    }

    #[must_use]
    pub fn binds_of(&self, program: RawProgram) -> usize {
        self.count(|c| *c == GpuCall::UseProgram(program))
    }

    #[must_use]
    pub fn vertex_array_binds(&self) -> usize {
        self.count(|c| matches!(c, GpuCall::BindVertexArray(_)))
    }

    #[must_use]
    pub fn vertex_buffer_binds(&self) -> usize {
        self.count(|c| matches!(c, GpuCall::BindVertexBuffer { .. }))
    }

    #[must_use]
    pub fn draw_calls(&self) -> usize {
        self.count(|c| matches!(c, GpuCall::DrawElements { .. } | GpuCall::DrawArrays { .. }))
    }

    #[must_use]
    pub fn uniform_writes(&self, name: &str) -> usize {
        self.count(|c| matches!(c, GpuCall::WriteUniform { name: n, .. } if n == name))
    }

    /// Last value written to `name` on any program.
    #[must_use]
    pub fn last_uniform(&self, name: &str) -> Option<UniformValue> {
        self.calls.iter().rev().find_map(|c| match c {
            GpuCall::WriteUniform { name: n, value, .. } if n == name => Some(*value),
            _ => None,
        })
    }

    #[must_use]
    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    /// Uniform locations currently handed out across live programs.
    #[must_use]
    pub fn live_uniform_locations(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn program_sources(&self, program: RawProgram) -> Option<(&str, &str)> {
        self.programs
            .get(&program)
            .map(|p| (p.vertex_source.as_str(), p.fragment_source.as_str()))
    }

    fn alloc(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new(GlApiVersion::Gles3)
    }
}

/// Splits `name[3]` into (`name`, 3).
fn split_array(token: &str) -> (&str, usize) {
    match token.split_once('[') {
        Some((base, rest)) => {
            let len = rest.trim_end_matches(']').parse().unwrap_or(1);
            (base, len)
        }
        None => (token, 1),
    }
}

/// Variable name of a `qualifier ... type name;` declaration line.
fn declared_name(line: &str) -> Option<&str> {
    let decl = line.trim().strip_suffix(';')?;
    decl.split_whitespace().last()
}

fn scan_uniforms(source: &str, out: &mut FxHashMap<String, usize>) {
    for line in source.lines() {
        if !line.trim_start().starts_with("uniform ") {
            continue;
        }
        if let Some(token) = declared_name(line) {
            let (base, len) = split_array(token);
            out.insert(base.to_owned(), len);
        }
    }
}

fn scan_attributes(vertex: &str, out: &mut Vec<String>) {
    for line in vertex.lines() {
        let trimmed = line.trim_start();
        if !(trimmed.starts_with("attribute ") || trimmed.starts_with("in ")) {
            continue;
        }
        if let Some(name) = declared_name(trimmed) {
            out.push(name.to_owned());
        }
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn api_version(&self) -> GlApiVersion {
        self.version
    }

    fn supports_vertex_arrays(&self) -> bool {
        self.vertex_arrays
    }

    fn compile_shader(&mut self, kind: ShaderKind, source: &str) -> Result<RawShader, String> {
        self.calls.push(GpuCall::CompileShader(kind));
        if let Some(needle) = self.fail_compile.iter().find(|n| source.contains(n.as_str())) {
            return Err(format!("ERROR: 0:1: '{needle}' : syntax error"));
        }
        let id = RawShader(self.alloc());
        self.shaders.insert(
            id,
            HeadlessShader {
                source: source.to_owned(),
            },
        );
        Ok(id)
    }

    fn delete_shader(&mut self, shader: RawShader) {
        self.calls.push(GpuCall::DeleteShader(shader));
        self.shaders.remove(&shader);
    }

    fn link_program(
        &mut self,
        vertex: RawShader,
        fragment: RawShader,
    ) -> Result<RawProgram, String> {
        let (Some(vs), Some(fs)) = (self.shaders.get(&vertex), self.shaders.get(&fragment)) else {
            return Err("invalid shader object".to_owned());
        };
        if let Some(needle) = self
            .fail_link
            .iter()
            .find(|n| vs.source.contains(n.as_str()) || fs.source.contains(n.as_str()))
        {
            return Err(format!("error: '{needle}' cannot be linked"));
        }

        let mut uniforms = FxHashMap::default();
        scan_uniforms(&vs.source, &mut uniforms);
        scan_uniforms(&fs.source, &mut uniforms);
        let mut attributes = Vec::new();
        scan_attributes(&vs.source, &mut attributes);

        let program = HeadlessProgram {
            uniforms,
            attributes,
            vertex_source: vs.source.clone(),
            fragment_source: fs.source.clone(),
        };
        let id = RawProgram(self.alloc());
        self.programs.insert(id, program);
        self.calls.push(GpuCall::LinkProgram(id));
        Ok(id)
    }

    fn delete_program(&mut self, program: RawProgram) {
        self.calls.push(GpuCall::DeleteProgram(program));
        self.programs.remove(&program);
        self.locations.remove_program(program);
    }

    fn use_program(&mut self, program: RawProgram) {
        self.calls.push(GpuCall::UseProgram(program));
    }

    fn uniform_location(&mut self, program: RawProgram, name: &str) -> Option<RawUniform> {
        if let Some(loc) = self.locations.lookup(program, name) {
            return Some(loc);
        }

        let declared = self.programs.get(&program)?;
        let (base, index) = match name.split_once('[') {
            Some((base, rest)) => (base, rest.trim_end_matches(']').parse::<usize>().ok()?),
            None => (name, 0),
        };
        let len = *declared.uniforms.get(base)?;
        if index >= len {
            return None;
        }

        let loc = RawUniform(self.alloc());
        self.locations.insert(loc, program, name, ());
        Some(loc)
    }

    fn attrib_location(&mut self, program: RawProgram, name: &str) -> Option<u32> {
        let declared = self.programs.get(&program)?;
        declared
            .attributes
            .iter()
            .position(|a| a == name)
            .map(|i| i as u32)
    }

    fn enable_vertex_attrib(&mut self, location: u32) {
        self.calls.push(GpuCall::EnableVertexAttrib(location));
    }

    fn disable_vertex_attrib(&mut self, location: u32) {
        self.calls.push(GpuCall::DisableVertexAttrib(location));
    }

    fn write_uniform(&mut self, location: RawUniform, value: &UniformValue) {
        let (program, name) = self
            .locations
            .describe(location)
            .map_or((RawProgram(0), String::new()), |(p, n)| (p, n.to_owned()));
        self.calls.push(GpuCall::WriteUniform {
            program,
            name,
            value: *value,
        });
    }

    fn bind_vertex_array(&mut self, vao: VertexArrayId) {
        self.calls.push(GpuCall::BindVertexArray(vao));
    }

    fn unbind_vertex_array(&mut self) {
        self.calls.push(GpuCall::UnbindVertexArray);
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferId, layout: &VertexAttribLayout) {
        self.calls.push(GpuCall::BindVertexBuffer {
            buffer,
            location: layout.location,
        });
    }

    fn bind_index_buffer(&mut self, buffer: BufferId) {
        self.calls.push(GpuCall::BindIndexBuffer(buffer));
    }

    fn draw_elements(&mut self, primitive: Primitive, count: u32, index_type: IndexType) {
        self.calls.push(GpuCall::DrawElements {
            primitive,
            count,
            index_type,
        });
    }

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) {
        self.calls.push(GpuCall::DrawArrays {
            primitive,
            first,
            count,
        });
    }
}
