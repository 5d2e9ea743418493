//! Draw Dispatcher
//!
//! Issues the minimal sequence of bind / upload / draw calls for a prepared
//! [`RenderPass`], remembering across calls what the GPU already holds:
//!
//! - the last bound geometry (skip the VAO bind for consecutive draws of it)
//! - the bound VAO and, without one, the enabled vertex attribute slots
//! - the last material fingerprint (skip program activation and material
//!   setup for consecutive draws of an unchanged material)
//! - the last render pass index (re-run material setup when the pass changes)
//!
//! Per mesh:
//!
//! ```text
//! bind geometry if it changed
//! for each material:
//!     resolve program variant       (skip draw if it failed to build)
//!     activate if fingerprint changed or the variant is not bound
//!     rebind vertex streams         (no VAO only; unused slots disabled)
//!     forced transform / opacity uploads, program constants
//!     light slots and view position in mesh-local space
//!     material setup + finalize when dirty / fingerprint / pass changed
//!     draw_elements or draw_arrays
//! ```
//!
//! Errors never abort the pass: a material that cannot draw is logged and
//! skipped, and the next mesh continues.

use glam::{Mat3, Mat4, Vec3};
use smallvec::SmallVec;

use super::assets::{GeometryHandle, GpuGeometry, RenderAssets};
use super::material::RenderMaterial;
use super::scene::{Camera, Light, LightKind, Mesh, RenderPass};
use super::settings::RendererSettings;
use crate::gpu::{GraphicsDevice, UniformValue, VertexArrayId};
use crate::program::{LightSlot, ProgramCache, ProgramId, UniformWriter, semantics};
use crate::shader::{AssemblyInputs, CapabilityRegistry};
use crate::utils::interner::{self, Symbol};

/// What the GPU holds from the previous draw call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawDispatchState {
    pub last_geometry: Option<GeometryHandle>,
    pub last_fingerprint: Option<String>,
    pub last_pass_index: Option<u32>,
    pub bound_vertex_array: Option<VertexArrayId>,
    /// Bit `n` set when attribute slot `n` of the default vertex array state
    /// is enabled.
    pub enabled_attributes: u32,
}

/// Counters for one [`DrawDispatcher::draw`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub draw_calls: u32,
    /// Material draws skipped (build failure, finalize refusal, missing asset).
    pub draws_skipped: u32,
    pub program_activations: u64,
    /// VAO binds, or vertex stream rebinds without VAOs.
    pub geometry_binds: u32,
    pub uniform_writes: u64,
    pub uniform_suppressed: u64,
}

impl std::ops::AddAssign for DrawStats {
    fn add_assign(&mut self, rhs: Self) {
        self.draw_calls += rhs.draw_calls;
        self.draws_skipped += rhs.draws_skipped;
        self.program_activations += rhs.program_activations;
        self.geometry_binds += rhs.geometry_binds;
        self.uniform_writes += rhs.uniform_writes;
        self.uniform_suppressed += rhs.uniform_suppressed;
    }
}

/// Semantics the dispatcher uploads itself, interned once.
#[derive(Debug, Clone, Copy)]
struct DrawSemantics {
    world: Symbol,
    model_view: Symbol,
    model_view_projection: Symbol,
    projection_view: Symbol,
    normal_matrix: Symbol,
    opacity: Symbol,
    view_position: Symbol,
}

impl DrawSemantics {
    fn new() -> Self {
        Self {
            world: interner::intern(semantics::WORLD),
            model_view: interner::intern(semantics::MODELVIEW),
            model_view_projection: interner::intern(semantics::MODELVIEWPROJECTION),
            projection_view: interner::intern(semantics::PROJECTION_VIEW),
            normal_matrix: interner::intern(semantics::NORMAL_MATRIX),
            opacity: interner::intern(semantics::OPACITY),
            view_position: interner::intern(semantics::VIEW_POSITION),
        }
    }
}

/// Per-pass values shared by every mesh of the pass.
struct PassFrame<'a> {
    index: u32,
    camera: Option<&'a Camera>,
    lights: &'a [Light],
    opacity: f32,
}

/// Owned by the renderer; one per frame loop.
#[derive(Debug)]
pub struct DrawDispatcher {
    state: DrawDispatchState,
    max_lights: usize,
    sort_transparent: bool,
    semantics: DrawSemantics,
    order: Vec<usize>,
}

impl DrawDispatcher {
    #[must_use]
    pub fn new(settings: &RendererSettings) -> Self {
        Self {
            state: DrawDispatchState::default(),
            max_lights: settings.max_lights,
            sort_transparent: settings.sort_transparent,
            semantics: DrawSemantics::new(),
            order: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &DrawDispatchState {
        &self.state
    }

    /// Forgets all cached GPU state, e.g. after the context was lost or
    /// another renderer touched it. Attribute slots enabled outside the
    /// dispatcher stay enabled.
    pub fn reset(&mut self) {
        self.state = DrawDispatchState::default();
    }

    /// Lights the pass's programs are assembled for: the pass lights up to
    /// `max_lights`, or a default point light when the pass has none.
    #[must_use]
    pub fn effective_lights(&self, pass: &RenderPass) -> SmallVec<[Light; 4]> {
        if self.max_lights == 0 {
            return SmallVec::new();
        }
        if pass.lights.is_empty() {
            return smallvec::smallvec![Light::default_point()];
        }
        pass.lights.iter().take(self.max_lights).copied().collect()
    }

    /// Draws opaque meshes, then transparent meshes back to front, then
    /// gizmos. Invisible meshes are skipped.
    pub fn draw<D: GraphicsDevice>(
        &mut self,
        cache: &mut ProgramCache<D>,
        registry: &CapabilityRegistry,
        assets: &mut RenderAssets,
        pass: &RenderPass,
    ) -> DrawStats {
        let before = cache.stats();
        let mut stats = DrawStats::default();
        let lights = self.effective_lights(pass);
        let frame = PassFrame {
            index: pass.index,
            camera: pass.camera.as_ref(),
            lights: &lights,
            opacity: pass.opacity,
        };

        for mesh in pass.opaque.iter().filter(|m| m.visible) {
            self.draw_mesh(cache, registry, assets, &frame, mesh, &mut stats);
        }

        let mut order = std::mem::take(&mut self.order);
        order.clear();
        order.extend(
            pass.transparent
                .iter()
                .enumerate()
                .filter(|(_, m)| m.visible)
                .map(|(i, _)| i),
        );
        if self.sort_transparent
            && let Some(camera) = frame.camera
        {
            let eye = camera.position();
            order.sort_by(|&a, &b| {
                let da = pass.transparent[a].translation().distance_squared(eye);
                let db = pass.transparent[b].translation().distance_squared(eye);
                db.total_cmp(&da)
            });
        }
        for &i in &order {
            self.draw_mesh(cache, registry, assets, &frame, &pass.transparent[i], &mut stats);
        }
        self.order = order;

        for gizmo in pass.gizmos.iter().filter(|m| m.visible) {
            self.draw_mesh(cache, registry, assets, &frame, gizmo, &mut stats);
        }

        let after = cache.stats();
        stats.program_activations = after.activations - before.activations;
        stats.uniform_writes = after.uniform_writes - before.uniform_writes;
        stats.uniform_suppressed = after.uniform_suppressed - before.uniform_suppressed;

        log::trace!("pass {}: {stats:?}", pass.index);
        stats
    }

    fn draw_mesh<D: GraphicsDevice>(
        &mut self,
        cache: &mut ProgramCache<D>,
        registry: &CapabilityRegistry,
        assets: &mut RenderAssets,
        frame: &PassFrame<'_>,
        mesh: &Mesh,
        stats: &mut DrawStats,
    ) {
        let (geometries, materials) = assets.split();
        let Some(geometry) = geometries.get(mesh.geometry) else {
            log::warn!("mesh references missing geometry {:?}", mesh.geometry);
            stats.draws_skipped += mesh.materials.len() as u32;
            return;
        };

        let geometry_changed = self.state.last_geometry != Some(mesh.geometry);
        let pass_changed = self.state.last_pass_index != Some(frame.index);
        let vao = geometry
            .vertex_array
            .filter(|_| cache.device().supports_vertex_arrays());
        if geometry_changed {
            match vao {
                Some(vao) => {
                    cache.device_mut().bind_vertex_array(vao);
                    self.state.bound_vertex_array = Some(vao);
                    stats.geometry_binds += 1;
                }
                // Streams must not land in the previous mesh's VAO.
                None if cache.device().supports_vertex_arrays()
                    && (self.state.bound_vertex_array.is_some() || self.state.last_geometry.is_none()) =>
                {
                    cache.device_mut().unbind_vertex_array();
                    self.state.bound_vertex_array = None;
                }
                None => {}
            }
        }

        let base_key = AssemblyInputs {
            attributes: geometry.attributes(),
            light_count: frame.lights.len(),
            camera_present: frame.camera.is_some(),
            ..AssemblyInputs::default()
        };
        let mut streams_program: Option<ProgramId> = None;

        for (index, handle) in mesh.materials.iter().enumerate() {
            let Some(material) = materials.get_mut(*handle) else {
                log::warn!("mesh references missing material {handle:?}");
                stats.draws_skipped += 1;
                continue;
            };
            let material: &mut dyn RenderMaterial = &mut **material;

            let key = AssemblyInputs {
                features: material.features(),
                ..base_key
            };
            let Some(program) = resolve_program(material, cache, registry, key) else {
                stats.draws_skipped += 1;
                continue;
            };

            let fingerprint = material.update_fingerprint();
            let fingerprint_changed = self.state.last_fingerprint.as_deref() != Some(fingerprint);
            let new_fingerprint = fingerprint_changed.then(|| fingerprint.to_owned());

            let mut switched = false;
            if fingerprint_changed || cache.active() != Some(program) {
                match cache.activate(program) {
                    Ok(bound) => switched = bound,
                    Err(e) => {
                        log::error!("cannot activate program for material {handle:?}: {e}");
                        stats.draws_skipped += 1;
                        continue;
                    }
                }
            }

            if vao.is_none() && streams_program != Some(program) && (geometry_changed || switched) {
                bind_streams(cache, program, geometry, &mut self.state.enabled_attributes);
                streams_program = Some(program);
                stats.geometry_binds += 1;
            }

            self.upload_transforms(cache, program, frame, mesh);
            if let Err(e) = cache.apply_constants(program) {
                log::error!("program constants: {e}");
            }
            self.upload_lights(cache, program, frame, mesh);

            let needs_setup = material.is_dirty()
                || material.shader().is_dirty()
                || fingerprint_changed
                || pass_changed
                || switched;
            if needs_setup {
                let mut writer = UniformWriter::new(cache, program);
                if material.set_uniforms(&mut writer) {
                    material.shader_mut().mark_dirty();
                } else {
                    material.shader_mut().clear_dirty();
                }
                if let Err(e) = material.finalize() {
                    log::warn!("material {handle:?} skipped: {e}");
                    self.state.last_fingerprint = None;
                    stats.draws_skipped += 1;
                    continue;
                }
            }

            let device = cache.device_mut();
            match geometry.index_buffers.get(index) {
                Some(ib) => {
                    device.bind_index_buffer(ib.buffer);
                    device.draw_elements(geometry.primitive, ib.count, ib.index_type);
                }
                None => device.draw_arrays(geometry.primitive, 0, geometry.vertex_count),
            }
            stats.draw_calls += 1;

            if let Some(fp) = new_fingerprint {
                self.state.last_fingerprint = Some(fp);
            }
        }

        self.state.last_geometry = Some(mesh.geometry);
        self.state.last_pass_index = Some(frame.index);
    }

    /// Per-draw transforms and opacity. Forced: they change with every mesh
    /// even when the program does not.
    fn upload_transforms<D: GraphicsDevice>(
        &self,
        cache: &mut ProgramCache<D>,
        program: ProgramId,
        frame: &PassFrame<'_>,
        mesh: &Mesh,
    ) {
        let (view, projection) = frame
            .camera
            .map_or((Mat4::IDENTITY, Mat4::IDENTITY), |c| (c.view, c.projection));
        let model_view = view * mesh.world;
        let s = &self.semantics;

        let values = [
            (s.world, UniformValue::Mat4(mesh.world)),
            (s.model_view, UniformValue::Mat4(model_view)),
            (s.model_view_projection, UniformValue::Mat4(projection * model_view)),
            (s.projection_view, UniformValue::Mat4(projection * view)),
            (
                s.normal_matrix,
                UniformValue::Mat3(Mat3::from_mat4(mesh.inverse_world.transpose())),
            ),
            (s.opacity, UniformValue::Float(mesh.opacity * frame.opacity)),
        ];
        for (semantic, value) in &values {
            let _ = cache.set_uniform(program, *semantic, value, true);
        }
    }

    /// Light slots and view position, transformed into mesh-local space.
    ///
    /// Point lights encode as `(position, 1)`, directional lights as
    /// `(-direction, 0)`; colors as `(color * intensity, 1)`.
    fn upload_lights<D: GraphicsDevice>(
        &self,
        cache: &mut ProgramCache<D>,
        program: ProgramId,
        frame: &PassFrame<'_>,
        mesh: &Mesh,
    ) {
        let slots: SmallVec<[LightSlot; 4]> = cache
            .get(program)
            .map(|p| p.light_slots().iter().copied().collect())
            .unwrap_or_default();

        let eye = frame.camera.map_or(Vec3::Z, Camera::position);
        let local_eye = mesh.inverse_world.transform_point3(eye);
        let _ = cache.set_uniform(program, self.semantics.view_position, &UniformValue::Vec3(local_eye), true);

        for (slot, light) in slots.iter().zip(frame.lights) {
            let position = match light.kind {
                LightKind::Point { position } => mesh.inverse_world.transform_point3(position).extend(1.0),
                LightKind::Directional { direction } => mesh
                    .inverse_world
                    .transform_vector3(-direction)
                    .normalize_or_zero()
                    .extend(0.0),
            };
            let _ = cache.set_uniform(program, slot.position, &UniformValue::Vec4(position), true);
            let _ = cache.set_uniform(
                program,
                slot.color,
                &UniformValue::Vec4(light.radiance().extend(1.0)),
                true,
            );
        }
    }
}

/// Refreshes a stale shader instance and returns the program variant for
/// `key`, building it on first use.
fn resolve_program<D: GraphicsDevice>(
    material: &mut dyn RenderMaterial,
    cache: &mut ProgramCache<D>,
    registry: &CapabilityRegistry,
    key: AssemblyInputs,
) -> Option<ProgramId> {
    let shader = material.shader_mut();
    if shader.is_stale(registry)
        && let Err(e) = shader.refresh(registry, cache)
    {
        log::warn!("shader instance {} refresh failed: {e}", shader.id());
    }
    shader.ensure_program(cache, key)
}

fn attribute_bit(location: u32) -> u32 {
    1_u32.checked_shl(location).unwrap_or(0)
}

fn attribute_slots(mask: u32) -> impl Iterator<Item = u32> {
    (0..u32::BITS).filter(move |slot| mask & (1 << slot) != 0)
}

/// Binds each vertex stream the program consumes at its attribute location,
/// enabling exactly those slots and disabling any left over from earlier
/// draws.
fn bind_streams<D: GraphicsDevice>(
    cache: &mut ProgramCache<D>,
    program: ProgramId,
    geometry: &GpuGeometry,
    enabled: &mut u32,
) {
    let bindings: SmallVec<[_; 5]> = cache
        .get(program)
        .map(|p| {
            p.attributes()
                .iter()
                .filter_map(|(attr, location)| geometry.stream(*attr).map(|s| (s.buffer, s.layout(*location))))
                .collect()
        })
        .unwrap_or_default();

    let wanted = bindings
        .iter()
        .fold(0, |mask, (_, layout)| mask | attribute_bit(layout.location));

    let device = cache.device_mut();
    for slot in attribute_slots(wanted & !*enabled) {
        device.enable_vertex_attrib(slot);
    }
    for slot in attribute_slots(*enabled & !wanted) {
        device.disable_vertex_attrib(slot);
    }
    *enabled = wanted;

    for (buffer, layout) in &bindings {
        device.bind_vertex_buffer(*buffer, layout);
    }
}
