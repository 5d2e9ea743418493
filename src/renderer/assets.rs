//! GPU-side assets referenced by meshes.
//!
//! Buffer and vertex-array creation happen outside the core; geometries are
//! registered here with the device handles they were given.

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use super::material::RenderMaterial;
use crate::gpu::{BufferId, IndexType, Primitive, VertexArrayId, VertexAttribLayout};
use crate::shader::VertexAttributes;

new_key_type! {
    pub struct GeometryHandle;
    pub struct MaterialHandle;
}

/// One vertex attribute stream in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexStream {
    pub attribute: VertexAttributes,
    pub buffer: BufferId,
    pub stride: i32,
    pub offset: i32,
}

impl VertexStream {
    /// Tightly packed stream at offset 0.
    #[must_use]
    pub fn packed(attribute: VertexAttributes, buffer: BufferId) -> Self {
        Self {
            attribute,
            buffer,
            stride: 0,
            offset: 0,
        }
    }

    /// Layout for binding this stream at `location` without a VAO.
    #[must_use]
    pub fn layout(&self, location: u32) -> VertexAttribLayout {
        VertexAttribLayout {
            location,
            components: self.attribute.components().unwrap_or(4),
            stride: self.stride,
            offset: self.offset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBuffer {
    pub buffer: BufferId,
    pub count: u32,
    pub index_type: IndexType,
}

/// Uploaded geometry.
///
/// `index_buffers` holds one entry per material of the meshes using it; a
/// geometry without index buffers is drawn with `draw_arrays`.
#[derive(Debug, Clone, Default)]
pub struct GpuGeometry {
    pub vertex_array: Option<VertexArrayId>,
    pub streams: SmallVec<[VertexStream; 5]>,
    pub index_buffers: SmallVec<[IndexBuffer; 2]>,
    pub vertex_count: u32,
    pub primitive: Primitive,
}

impl GpuGeometry {
    #[must_use]
    pub fn new(vertex_count: u32) -> Self {
        Self {
            vertex_count,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_vertex_array(mut self, vao: VertexArrayId) -> Self {
        self.vertex_array = Some(vao);
        self
    }

    #[must_use]
    pub fn with_stream(mut self, stream: VertexStream) -> Self {
        self.streams.push(stream);
        self
    }

    #[must_use]
    pub fn with_indices(mut self, buffer: BufferId, count: u32, index_type: IndexType) -> Self {
        self.index_buffers.push(IndexBuffer {
            buffer,
            count,
            index_type,
        });
        self
    }

    /// Union of the attributes of all streams.
    #[must_use]
    pub fn attributes(&self) -> VertexAttributes {
        self.streams
            .iter()
            .fold(VertexAttributes::empty(), |acc, s| acc | s.attribute)
    }

    #[must_use]
    pub fn stream(&self, attribute: VertexAttributes) -> Option<&VertexStream> {
        self.streams.iter().find(|s| s.attribute == attribute)
    }
}

/// Geometry and material storage addressed by slot-map handles.
#[derive(Debug, Default)]
pub struct RenderAssets {
    geometries: SlotMap<GeometryHandle, GpuGeometry>,
    materials: SlotMap<MaterialHandle, Box<dyn RenderMaterial>>,
}

impl RenderAssets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_geometry(&mut self, geometry: GpuGeometry) -> GeometryHandle {
        self.geometries.insert(geometry)
    }

    #[must_use]
    pub fn geometry(&self, handle: GeometryHandle) -> Option<&GpuGeometry> {
        self.geometries.get(handle)
    }

    pub fn add_material(&mut self, material: impl RenderMaterial + 'static) -> MaterialHandle {
        self.materials.insert(Box::new(material))
    }

    #[must_use]
    pub fn material(&self, handle: MaterialHandle) -> Option<&dyn RenderMaterial> {
        self.materials.get(handle).map(|m| &**m)
    }

    pub fn material_mut(&mut self, handle: MaterialHandle) -> Option<&mut (dyn RenderMaterial + 'static)> {
        self.materials.get_mut(handle).map(|m| &mut **m)
    }

    /// Downcasts a material to its concrete type.
    pub fn material_as_mut<T: RenderMaterial + 'static>(&mut self, handle: MaterialHandle) -> Option<&mut T> {
        self.materials
            .get_mut(handle)
            .and_then(|m| m.as_any_mut().downcast_mut::<T>())
    }

    pub(crate) fn remove_material(&mut self, handle: MaterialHandle) -> Option<Box<dyn RenderMaterial>> {
        self.materials.remove(handle)
    }

    pub(crate) fn split(
        &mut self,
    ) -> (
        &SlotMap<GeometryHandle, GpuGeometry>,
        &mut SlotMap<MaterialHandle, Box<dyn RenderMaterial>>,
    ) {
        (&self.geometries, &mut self.materials)
    }
}
