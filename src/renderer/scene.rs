//! Per-pass inputs supplied by the scene traversal.
//!
//! Hierarchy, culling and animation live outside the core; by the time a
//! [`RenderPass`] reaches the dispatcher every transform is already resolved
//! to world space.

use glam::{Mat4, Vec3};
use smallvec::SmallVec;

use super::assets::{GeometryHandle, MaterialHandle};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub view: Mat4,
    pub projection: Mat4,
    /// Camera-to-world transform.
    pub world: Mat4,
}

impl Camera {
    /// Builds a camera from its view and projection matrices.
    #[must_use]
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self {
            view,
            projection,
            world: view.inverse(),
        }
    }

    /// Right-handed look-at camera with a perspective projection.
    #[must_use]
    pub fn perspective_look_at(eye: Vec3, target: Vec3, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::new(
            Mat4::look_at_rh(eye, target, Vec3::Y),
            Mat4::perspective_rh_gl(fov_y, aspect, near, far),
        )
    }

    #[must_use]
    pub fn projection_view(&self) -> Mat4 {
        self.projection * self.view
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.world.w_axis.truncate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Emits from `position`.
    Point { position: Vec3 },
    /// Travels along `direction`.
    Directional { direction: Vec3 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
}

impl Light {
    #[must_use]
    pub fn point(position: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Point { position },
            color,
            intensity,
        }
    }

    #[must_use]
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional { direction },
            color,
            intensity,
        }
    }

    /// Used when a lit material is drawn in a pass without lights.
    #[must_use]
    pub fn default_point() -> Self {
        Self::point(Vec3::ZERO, Vec3::ONE, 1.0)
    }

    #[must_use]
    pub fn radiance(&self) -> Vec3 {
        self.color * self.intensity
    }
}

/// A visible mesh as the dispatcher sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub geometry: GeometryHandle,
    /// One material per sub-surface, drawn in order.
    pub materials: SmallVec<[MaterialHandle; 2]>,
    pub world: Mat4,
    pub inverse_world: Mat4,
    pub visible: bool,
    /// Opacity accumulated over the mesh's ancestry.
    pub opacity: f32,
}

impl Mesh {
    #[must_use]
    pub fn new(geometry: GeometryHandle, material: MaterialHandle, world: Mat4) -> Self {
        Self::with_materials(geometry, [material], world)
    }

    #[must_use]
    pub fn with_materials(
        geometry: GeometryHandle,
        materials: impl IntoIterator<Item = MaterialHandle>,
        world: Mat4,
    ) -> Self {
        Self {
            geometry,
            materials: materials.into_iter().collect(),
            world,
            inverse_world: world.inverse(),
            visible: true,
            opacity: 1.0,
        }
    }

    /// World-space position of the mesh origin.
    #[must_use]
    pub fn translation(&self) -> Vec3 {
        self.world.w_axis.truncate()
    }
}

/// One traversal of the scene to one target.
#[derive(Debug, Clone)]
pub struct RenderPass {
    pub index: u32,
    pub opaque: Vec<Mesh>,
    pub transparent: Vec<Mesh>,
    /// Debug overlays drawn after everything else.
    pub gizmos: Vec<Mesh>,
    pub camera: Option<Camera>,
    pub lights: Vec<Light>,
    /// Scene-wide opacity multiplier.
    pub opacity: f32,
}

impl Default for RenderPass {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RenderPass {
    #[must_use]
    pub fn new(index: u32) -> Self {
        Self {
            index,
            opaque: Vec::new(),
            transparent: Vec::new(),
            gizmos: Vec::new(),
            camera: None,
            lights: Vec::new(),
            opacity: 1.0,
        }
    }

    #[must_use]
    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = Some(camera);
        self
    }

    #[must_use]
    pub fn with_light(mut self, light: Light) -> Self {
        self.lights.push(light);
        self
    }

    #[must_use]
    pub fn with_opaque(mut self, mesh: Mesh) -> Self {
        self.opaque.push(mesh);
        self
    }

    #[must_use]
    pub fn with_transparent(mut self, mesh: Mesh) -> Self {
        self.transparent.push(mesh);
        self
    }

    #[must_use]
    pub fn with_gizmo(mut self, mesh: Mesh) -> Self {
        self.gizmos.push(mesh);
        self
    }
}
