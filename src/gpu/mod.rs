//! GPU device abstraction
//!
//! [`GraphicsDevice`] is the narrow slice of a GL / WebGL context the core
//! needs: shader and program objects, uniform and attribute locations,
//! vertex state binds and draw calls. Handles are plain `u32` newtypes so the
//! trait stays object safe and devices can keep their native objects behind
//! lookup tables.
//!
//! Two devices ship with the crate:
//! - [`HeadlessDevice`]: records every call, used by tests and benches
//! - `GlowDevice` (feature `glow`): real OpenGL / WebGL through `glow`

pub mod headless;
pub mod locations;

#[cfg(feature = "glow")]
pub mod glow_device;

pub use headless::{GpuCall, HeadlessDevice};
pub use locations::UniformLocationTable;

#[cfg(feature = "glow")]
pub use glow_device::GlowDevice;

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::shader::GlApiVersion;

macro_rules! raw_handle {
    ($($(#[$doc:meta])* $name:ident;)*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub u32);
        )*
    };
}

raw_handle! {
    /// Compiled shader object.
    RawShader;
    /// Linked program object.
    RawProgram;
    /// Uniform location within one program.
    RawUniform;
    /// Vertex array object.
    VertexArrayId;
    /// Vertex or index buffer.
    BufferId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Primitive {
    Points,
    Lines,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexType {
    #[default]
    U16,
    U32,
}

/// Attribute layout for binding a vertex buffer without a VAO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribLayout {
    pub location: u32,
    pub components: i32,
    pub stride: i32,
    pub offset: i32,
}

/// A value written to a uniform location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue {
    /// Float payload in column-major order. Empty for [`UniformValue::Int`].
    #[must_use]
    pub fn as_f32_slice(&self) -> &[f32] {
        match self {
            UniformValue::Float(v) => std::slice::from_ref(v),
            UniformValue::Int(_) => &[],
            UniformValue::Vec2(v) => bytemuck::cast_slice(std::slice::from_ref(v)),
            UniformValue::Vec3(v) => bytemuck::cast_slice(std::slice::from_ref(v)),
            UniformValue::Vec4(v) => bytemuck::cast_slice(std::slice::from_ref(v)),
            UniformValue::Mat3(m) => bytemuck::cast_slice(std::slice::from_ref(m)),
            UniformValue::Mat4(m) => bytemuck::cast_slice(std::slice::from_ref(m)),
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        Self::Vec4(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(m: Mat4) -> Self {
        Self::Mat4(m)
    }
}

/// The GL operations the core issues.
///
/// Calls are synchronous from the caller's point of view. Compile and link
/// return the driver info log on failure.
pub trait GraphicsDevice {
    fn api_version(&self) -> GlApiVersion;

    /// Whether vertex array objects are available.
    fn supports_vertex_arrays(&self) -> bool;

    fn compile_shader(&mut self, kind: ShaderKind, source: &str) -> Result<RawShader, String>;
    fn delete_shader(&mut self, shader: RawShader);

    fn link_program(&mut self, vertex: RawShader, fragment: RawShader)
    -> Result<RawProgram, String>;
    fn delete_program(&mut self, program: RawProgram);
    fn use_program(&mut self, program: RawProgram);

    fn uniform_location(&mut self, program: RawProgram, name: &str) -> Option<RawUniform>;
    fn attrib_location(&mut self, program: RawProgram, name: &str) -> Option<u32>;
    fn enable_vertex_attrib(&mut self, location: u32);
    fn disable_vertex_attrib(&mut self, location: u32);

    fn write_uniform(&mut self, location: RawUniform, value: &UniformValue);

    fn bind_vertex_array(&mut self, vao: VertexArrayId);
    /// Returns to the default vertex array state.
    fn unbind_vertex_array(&mut self);
    fn bind_vertex_buffer(&mut self, buffer: BufferId, layout: &VertexAttribLayout);
    fn bind_index_buffer(&mut self, buffer: BufferId);

    fn draw_elements(&mut self, primitive: Primitive, count: u32, index_type: IndexType);
    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32);
}
