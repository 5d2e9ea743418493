//! Draw Dispatcher Tests
//!
//! Tests for:
//! - Geometry bind skipping (VAO and vertex-stream paths)
//! - Fingerprint-gated program activation
//! - Material setup gating and finalize failure recovery
//! - Per-draw transforms, opacity and lights
//! - Draw order: opaque, transparent back to front, gizmos
//! - Broken program variants

use std::any::Any;

use glam::{Mat4, Vec3, Vec4};

use mosaic::gpu::{BufferId, GpuCall, IndexType, VertexArrayId};
use mosaic::program::{UniformWriter, semantics};
use mosaic::renderer::{
    Camera, GeometryHandle, GpuGeometry, Light, MaterialHandle, Mesh, RenderAssets, RenderMaterial, RenderPass,
    Renderer, RendererSettings, StandardMaterial, VertexStream,
};
use mosaic::shader::{GlApiVersion, ShaderClassId, ShaderInstance, VertexAttributes};
use mosaic::{HeadlessDevice, MosaicError, UniformValue};

/// Material with a caller-controlled fingerprint that counts its setups.
#[derive(Debug)]
struct ScriptedMaterial {
    shader: ShaderInstance,
    fingerprint: String,
    ready: bool,
    setups: u32,
}

impl RenderMaterial for ScriptedMaterial {
    fn shader(&self) -> &ShaderInstance {
        &self.shader
    }

    fn shader_mut(&mut self) -> &mut ShaderInstance {
        &mut self.shader
    }

    fn update_fingerprint(&mut self) -> &str {
        &self.fingerprint
    }

    fn set_uniforms(&mut self, writer: &mut UniformWriter<'_>) -> bool {
        self.setups += 1;
        writer.set(semantics::MATERIAL_BASE_COLOR, Vec4::ONE);
        writer.set(semantics::DIFFUSE_COLOR, Vec4::ONE);
        false
    }

    fn finalize(&mut self) -> mosaic::Result<()> {
        if self.ready {
            Ok(())
        } else {
            Err(MosaicError::MaterialSetup("not ready".to_owned()))
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn renderer(version: GlApiVersion) -> Renderer<HeadlessDevice> {
    init_logger();
    Renderer::new(HeadlessDevice::new(version), RendererSettings::default()).unwrap()
}

fn scripted(
    r: &Renderer<HeadlessDevice>,
    assets: &mut RenderAssets,
    class: ShaderClassId,
    fingerprint: &str,
) -> MaterialHandle {
    assets.add_material(ScriptedMaterial {
        shader: r.create_shader(class).unwrap(),
        fingerprint: fingerprint.to_owned(),
        ready: true,
        setups: 0,
    })
}

fn setups(assets: &mut RenderAssets, handle: MaterialHandle) -> u32 {
    assets.material_as_mut::<ScriptedMaterial>(handle).unwrap().setups
}

fn triangle(assets: &mut RenderAssets, id: u32) -> GeometryHandle {
    assets.add_geometry(
        GpuGeometry::new(3)
            .with_vertex_array(VertexArrayId(id))
            .with_stream(VertexStream::packed(VertexAttributes::POSITION, BufferId(id)))
            .with_stream(VertexStream::packed(VertexAttributes::NORMAL, BufferId(id + 100))),
    )
}

fn position_only(assets: &mut RenderAssets, buffer: u32) -> GeometryHandle {
    assets.add_geometry(
        GpuGeometry::new(3).with_stream(VertexStream::packed(VertexAttributes::POSITION, BufferId(buffer))),
    )
}

fn at(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(x, y, z))
}

/// Vertex state calls and draws, in order, as short labels.
fn vertex_state_log(device: &HeadlessDevice) -> Vec<String> {
    device
        .calls()
        .iter()
        .filter_map(|c| match c {
            GpuCall::BindVertexArray(vao) => Some(format!("vao{}", vao.0)),
            GpuCall::UnbindVertexArray => Some("unbind".to_owned()),
            GpuCall::EnableVertexAttrib(slot) => Some(format!("enable{slot}")),
            GpuCall::DisableVertexAttrib(slot) => Some(format!("disable{slot}")),
            GpuCall::BindVertexBuffer { buffer, location } => Some(format!("bind{}@{location}", buffer.0)),
            GpuCall::DrawArrays { .. } | GpuCall::DrawElements { .. } => Some("draw".to_owned()),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Geometry binds
// ============================================================================

#[test]
fn consecutive_draws_of_one_geometry_bind_it_once() {
    let mut r = renderer(GlApiVersion::Gles3);
    let mut assets = RenderAssets::new();
    let decal = r.builtins().decal;
    let material = scripted(&r, &mut assets, decal, "geo");
    let shared = triangle(&mut assets, 1);
    let other = triangle(&mut assets, 2);

    let pass = RenderPass::new(0)
        .with_opaque(Mesh::new(shared, material, at(0.0, 0.0, 0.0)))
        .with_opaque(Mesh::new(shared, material, at(1.0, 0.0, 0.0)));
    let stats = r.draw(&mut assets, &pass);

    assert_eq!(stats.draw_calls, 2);
    assert_eq!(stats.geometry_binds, 1);
    assert_eq!(r.device().vertex_array_binds(), 1);

    let pass = RenderPass::new(0).with_opaque(Mesh::new(other, material, Mat4::IDENTITY));
    r.draw(&mut assets, &pass);
    assert_eq!(r.device().vertex_array_binds(), 2);
}

#[test]
fn without_vertex_arrays_streams_are_bound_per_geometry_change() {
    let mut r = renderer(GlApiVersion::Gles2);
    let mut assets = RenderAssets::new();
    let decal = r.builtins().decal;
    let material = scripted(&r, &mut assets, decal, "streams");
    let geometry = triangle(&mut assets, 1);

    let pass = RenderPass::new(0)
        .with_opaque(Mesh::new(geometry, material, Mat4::IDENTITY))
        .with_opaque(Mesh::new(geometry, material, Mat4::IDENTITY));
    let stats = r.draw(&mut assets, &pass);

    assert_eq!(r.device().vertex_array_binds(), 0);
    assert_eq!(stats.geometry_binds, 1);
    // position and normal
    assert_eq!(r.device().vertex_buffer_binds(), 2);
}

#[test]
fn stream_binding_disables_slots_the_next_program_does_not_use() {
    let mut r = renderer(GlApiVersion::Gles2);
    let mut assets = RenderAssets::new();
    let decal = r.builtins().decal;
    let material = scripted(&r, &mut assets, decal, "slots");
    let full = triangle(&mut assets, 1);
    let bare = position_only(&mut assets, 3);

    let pass = RenderPass::new(0)
        .with_opaque(Mesh::new(full, material, Mat4::IDENTITY))
        .with_opaque(Mesh::new(bare, material, Mat4::IDENTITY))
        .with_opaque(Mesh::new(full, material, Mat4::IDENTITY));
    r.draw(&mut assets, &pass);

    assert_eq!(
        vertex_state_log(r.device()),
        [
            "enable0", "enable1", "bind1@0", "bind101@1", "draw",
            "disable1", "bind3@0", "draw",
            "enable1", "bind1@0", "bind101@1", "draw",
        ]
    );
    assert_eq!(r.dispatcher().state().enabled_attributes, 0b11);
}

#[test]
fn geometry_without_vao_unbinds_the_previous_vao() {
    let mut r = renderer(GlApiVersion::Gles3);
    let mut assets = RenderAssets::new();
    let decal = r.builtins().decal;
    let material = scripted(&r, &mut assets, decal, "mixed");
    let with_vao = triangle(&mut assets, 9);
    let bare = position_only(&mut assets, 3);

    let pass = RenderPass::new(0)
        .with_opaque(Mesh::new(with_vao, material, Mat4::IDENTITY))
        .with_opaque(Mesh::new(bare, material, Mat4::IDENTITY))
        .with_opaque(Mesh::new(with_vao, material, Mat4::IDENTITY));
    r.draw(&mut assets, &pass);

    assert_eq!(
        vertex_state_log(r.device()),
        ["vao9", "draw", "unbind", "enable0", "bind3@0", "draw", "vao9", "draw"]
    );
    assert_eq!(r.dispatcher().state().bound_vertex_array, Some(VertexArrayId(9)));
}

#[test]
fn indexed_geometry_draws_elements() {
    let mut r = renderer(GlApiVersion::Gles3);
    let mut assets = RenderAssets::new();
    let decal = r.builtins().decal;
    let material = scripted(&r, &mut assets, decal, "indexed");
    let geometry = assets.add_geometry(
        GpuGeometry::new(4)
            .with_vertex_array(VertexArrayId(7))
            .with_indices(BufferId(8), 6, IndexType::U16),
    );

    r.draw(&mut assets, &RenderPass::new(0).with_opaque(Mesh::new(geometry, material, Mat4::IDENTITY)));

    assert_eq!(
        r.device().count(|c| matches!(c, GpuCall::DrawElements { count: 6, .. })),
        1
    );
    assert_eq!(r.device().count(|c| matches!(c, GpuCall::DrawArrays { .. })), 0);
}

// ============================================================================
// Program activation
// ============================================================================

#[test]
fn unchanged_fingerprint_skips_activation() {
    let mut r = renderer(GlApiVersion::Gles3);
    let mut assets = RenderAssets::new();
    let (decal, lambert) = (r.builtins().decal, r.builtins().lambert);
    let f1 = scripted(&r, &mut assets, decal, "f1");
    let f2 = scripted(&r, &mut assets, lambert, "f2");
    let geometry = triangle(&mut assets, 1);

    let pass = RenderPass::new(0)
        .with_opaque(Mesh::new(geometry, f1, Mat4::IDENTITY))
        .with_opaque(Mesh::new(geometry, f1, Mat4::IDENTITY))
        .with_opaque(Mesh::new(geometry, f2, Mat4::IDENTITY));
    let stats = r.draw(&mut assets, &pass);

    let binds: Vec<_> = r
        .device()
        .calls()
        .iter()
        .filter_map(|c| match c {
            GpuCall::UseProgram(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert_eq!(stats.draw_calls, 3);
    assert_eq!(stats.program_activations, 2);
    assert_eq!(binds.len(), 2);
    assert_ne!(binds[0], binds[1]);
    assert_eq!(setups(&mut assets, f1), 1);
    assert_eq!(setups(&mut assets, f2), 1);
}

#[test]
fn shared_program_is_not_rebound_between_materials() {
    let mut r = renderer(GlApiVersion::Gles3);
    let mut assets = RenderAssets::new();
    let decal = r.builtins().decal;
    let a = scripted(&r, &mut assets, decal, "shared-a");
    let b = scripted(&r, &mut assets, decal, "shared-b");
    let geometry = triangle(&mut assets, 1);

    let pass = RenderPass::new(0)
        .with_opaque(Mesh::new(geometry, a, Mat4::IDENTITY))
        .with_opaque(Mesh::new(geometry, b, Mat4::IDENTITY));
    let stats = r.draw(&mut assets, &pass);

    assert_eq!(r.cache().stats().programs_linked, 1);
    assert_eq!(stats.program_activations, 1);
    assert_eq!(setups(&mut assets, a), 1);
    assert_eq!(setups(&mut assets, b), 1);
}

#[test]
fn pass_change_reruns_material_setup() {
    let mut r = renderer(GlApiVersion::Gles3);
    let mut assets = RenderAssets::new();
    let decal = r.builtins().decal;
    let material = scripted(&r, &mut assets, decal, "passes");
    let geometry = triangle(&mut assets, 1);
    let mesh = Mesh::new(geometry, material, Mat4::IDENTITY);

    let passes = [
        RenderPass::new(0).with_opaque(mesh.clone()),
        RenderPass::new(1).with_opaque(mesh.clone()),
    ];
    let stats = r.render(&mut assets, &passes);

    assert_eq!(stats.draw_calls, 2);
    assert_eq!(stats.program_activations, 1);
    assert_eq!(setups(&mut assets, material), 2);
}

#[test]
fn program_linked_by_hand_is_prepared_when_a_material_reuses_it() {
    let mut r = renderer(GlApiVersion::Gles3);
    let mut assets = RenderAssets::new();
    let decal = r.builtins().decal;
    let instance = r.create_shader(decal).unwrap();
    let source = r.assemble(&instance, VertexAttributes::POSITION | VertexAttributes::NORMAL, 1, false);
    let linked = r.compile_and_link(&source.vertex, &source.fragment).unwrap();
    assert!(r.cache().get(linked).unwrap().attributes().is_empty());

    let material = scripted(&r, &mut assets, decal, "by-hand");
    let geometry = triangle(&mut assets, 1);
    let stats = r.draw(&mut assets, &RenderPass::new(0).with_opaque(Mesh::new(geometry, material, Mat4::IDENTITY)));

    assert_eq!(stats.draw_calls, 1);
    assert_eq!(r.cache().stats().programs_linked, 1);
    let program = r.cache().get(linked).unwrap();
    assert_eq!(program.ref_count(), 2);
    assert_eq!(program.attributes().len(), 2);
    assert!(program.has_uniform(semantics::WORLD));
    assert_eq!(r.device().uniform_writes("worldMatrix"), 1);
    assert_eq!(r.device().uniform_writes("opacity"), 1);
}

// ============================================================================
// Finalize failures & broken variants
// ============================================================================

#[test]
fn finalize_failure_skips_draw_and_retries_next_frame() {
    let mut r = renderer(GlApiVersion::Gles3);
    let mut assets = RenderAssets::new();
    let decal = r.builtins().decal;
    let material = scripted(&r, &mut assets, decal, "pending");
    assets.material_as_mut::<ScriptedMaterial>(material).unwrap().ready = false;
    let geometry = triangle(&mut assets, 1);
    let pass = RenderPass::new(0).with_opaque(Mesh::new(geometry, material, Mat4::IDENTITY));

    let stats = r.draw(&mut assets, &pass);
    assert_eq!(stats.draw_calls, 0);
    assert_eq!(stats.draws_skipped, 1);
    assert!(r.dispatcher().state().last_fingerprint.is_none());

    assets.material_as_mut::<ScriptedMaterial>(material).unwrap().ready = true;
    let stats = r.draw(&mut assets, &pass);
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(setups(&mut assets, material), 2);
    assert_eq!(r.dispatcher().state().last_fingerprint.as_deref(), Some("pending"));
}

#[test]
fn texture_not_ready_skips_standard_material() {
    let mut r = renderer(GlApiVersion::Gles3);
    let mut assets = RenderAssets::new();
    let mut material = StandardMaterial::new(r.registry(), r.builtins().decal).unwrap();
    material.set_texture(Some(mosaic::renderer::TextureSlot { ready: false }));
    let material = assets.add_material(material);
    let geometry = triangle(&mut assets, 1);
    let pass = RenderPass::new(0).with_opaque(Mesh::new(geometry, material, Mat4::IDENTITY));

    assert_eq!(r.draw(&mut assets, &pass).draw_calls, 0);

    assets
        .material_as_mut::<StandardMaterial>(material)
        .unwrap()
        .set_texture_ready(true);
    assert_eq!(r.draw(&mut assets, &pass).draw_calls, 1);
}

#[test]
fn broken_variant_is_skipped_without_recompiling() {
    let mut r = renderer(GlApiVersion::Gles3);
    r.device_mut().fail_compile_when("shininess");
    let mut assets = RenderAssets::new();
    let (decal, phong) = (r.builtins().decal, r.builtins().phong);
    let good = scripted(&r, &mut assets, decal, "good");
    let broken = scripted(&r, &mut assets, phong, "broken");
    let geometry = triangle(&mut assets, 1);
    let pass = RenderPass::new(0)
        .with_opaque(Mesh::new(geometry, broken, Mat4::IDENTITY))
        .with_opaque(Mesh::new(geometry, good, Mat4::IDENTITY));

    let stats = r.draw(&mut assets, &pass);
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.draws_skipped, 1);

    let compiles = r.device().count(|c| matches!(c, GpuCall::CompileShader(_)));
    let stats = r.draw(&mut assets, &pass);
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(r.device().count(|c| matches!(c, GpuCall::CompileShader(_))), compiles);
}

// ============================================================================
// Per-draw uniforms
// ============================================================================

#[test]
fn transforms_are_written_for_every_draw() {
    let mut r = renderer(GlApiVersion::Gles3);
    let mut assets = RenderAssets::new();
    let decal = r.builtins().decal;
    let material = scripted(&r, &mut assets, decal, "transforms");
    let geometry = triangle(&mut assets, 1);
    let camera = Camera::perspective_look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 1.0, 1.0, 0.1, 100.0);

    let pass = RenderPass::new(0)
        .with_camera(camera)
        .with_opaque(Mesh::new(geometry, material, at(0.0, 0.0, 0.0)))
        .with_opaque(Mesh::new(geometry, material, at(2.0, 0.0, 0.0)));
    r.draw(&mut assets, &pass);

    assert_eq!(r.device().uniform_writes("worldMatrix"), 2);
    assert_eq!(r.device().uniform_writes("projectionAndViewMatrix"), 2);
    assert_eq!(
        r.device().last_uniform("projectionAndViewMatrix"),
        Some(UniformValue::Mat4(camera.projection_view()))
    );
    assert_eq!(r.device().last_uniform("worldMatrix"), Some(UniformValue::Mat4(at(2.0, 0.0, 0.0))));
}

#[test]
fn opacity_combines_mesh_and_pass() {
    let mut r = renderer(GlApiVersion::Gles3);
    let mut assets = RenderAssets::new();
    let decal = r.builtins().decal;
    let material = scripted(&r, &mut assets, decal, "opacity");
    let geometry = triangle(&mut assets, 1);
    let mut mesh = Mesh::new(geometry, material, Mat4::IDENTITY);
    mesh.opacity = 0.5;
    let mut pass = RenderPass::new(0).with_opaque(mesh);
    pass.opacity = 0.5;

    r.draw(&mut assets, &pass);

    assert_eq!(r.device().last_uniform("opacity"), Some(UniformValue::Float(0.25)));
}

#[test]
fn pass_without_lights_uses_default_point_light() {
    let mut r = renderer(GlApiVersion::Gles3);
    let mut assets = RenderAssets::new();
    let lambert = r.builtins().lambert;
    let material = scripted(&r, &mut assets, lambert, "default-light");
    let geometry = triangle(&mut assets, 1);

    r.draw(
        &mut assets,
        &RenderPass::new(0).with_opaque(Mesh::new(geometry, material, at(0.0, 2.0, 0.0))),
    );

    // origin seen from a mesh at y = 2
    assert_eq!(
        r.device().last_uniform("lightPosition[0]"),
        Some(UniformValue::Vec4(Vec4::new(0.0, -2.0, 0.0, 1.0)))
    );
    assert_eq!(r.device().last_uniform("lightDiffuse[0]"), Some(UniformValue::Vec4(Vec4::ONE)));
    assert_eq!(r.device().uniform_writes("lightPosition[1]"), 0);
}

#[test]
fn directional_lights_encode_direction_with_zero_w() {
    let mut r = renderer(GlApiVersion::Gles3);
    let mut assets = RenderAssets::new();
    let lambert = r.builtins().lambert;
    let material = scripted(&r, &mut assets, lambert, "sun");
    let geometry = triangle(&mut assets, 1);
    let pass = RenderPass::new(0)
        .with_light(Light::point(Vec3::new(1.0, 0.0, 0.0), Vec3::ONE, 2.0))
        .with_light(Light::directional(Vec3::new(0.0, -1.0, 0.0), Vec3::ONE, 1.0))
        .with_opaque(Mesh::new(geometry, material, Mat4::IDENTITY));

    r.draw(&mut assets, &pass);

    assert_eq!(
        r.device().last_uniform("lightPosition[0]"),
        Some(UniformValue::Vec4(Vec4::new(1.0, 0.0, 0.0, 1.0)))
    );
    assert_eq!(
        r.device().last_uniform("lightDiffuse[0]"),
        Some(UniformValue::Vec4(Vec4::new(2.0, 2.0, 2.0, 1.0)))
    );
    assert_eq!(
        r.device().last_uniform("lightPosition[1]"),
        Some(UniformValue::Vec4(Vec4::new(0.0, 1.0, 0.0, 0.0)))
    );
}

#[test]
fn lights_beyond_the_limit_are_dropped() {
    let settings = RendererSettings {
        max_lights: 1,
        ..RendererSettings::default()
    };
    let mut r = Renderer::new(HeadlessDevice::default(), settings).unwrap();
    let mut assets = RenderAssets::new();
    let lambert = r.builtins().lambert;
    let material = scripted(&r, &mut assets, lambert, "limited");
    let geometry = triangle(&mut assets, 1);
    let pass = RenderPass::new(0)
        .with_light(Light::point(Vec3::X, Vec3::ONE, 1.0))
        .with_light(Light::point(Vec3::Y, Vec3::ONE, 1.0))
        .with_opaque(Mesh::new(geometry, material, Mat4::IDENTITY));

    r.draw(&mut assets, &pass);

    assert_eq!(r.device().uniform_writes("lightPosition[0]"), 1);
    assert_eq!(r.device().uniform_writes("lightPosition[1]"), 0);
}

// ============================================================================
// Draw order
// ============================================================================

#[test]
fn draws_opaque_then_transparent_back_to_front_then_gizmos() {
    let mut r = renderer(GlApiVersion::Gles3);
    let mut assets = RenderAssets::new();
    let decal = r.builtins().decal;
    let material = scripted(&r, &mut assets, decal, "order");
    let geometry = triangle(&mut assets, 1);
    let camera = Camera::perspective_look_at(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 1.0, 1.0, 0.1, 100.0);

    let mut hidden = Mesh::new(geometry, material, at(9.0, 9.0, 9.0));
    hidden.visible = false;
    let pass = RenderPass::new(0)
        .with_camera(camera)
        .with_gizmo(Mesh::new(geometry, material, at(5.0, 0.0, 0.0)))
        .with_transparent(Mesh::new(geometry, material, at(0.0, 0.0, -1.0)))
        .with_transparent(Mesh::new(geometry, material, at(0.0, 0.0, -10.0)))
        .with_opaque(hidden)
        .with_opaque(Mesh::new(geometry, material, at(1.0, 0.0, 0.0)));
    r.draw(&mut assets, &pass);

    let worlds: Vec<Vec3> = r
        .device()
        .calls()
        .iter()
        .filter_map(|c| match c {
            GpuCall::WriteUniform {
                name,
                value: UniformValue::Mat4(m),
                ..
            } if name == "worldMatrix" => Some(m.w_axis.truncate()),
            _ => None,
        })
        .collect();
    assert_eq!(
        worlds,
        [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -10.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(5.0, 0.0, 0.0),
        ]
    );
}

// ============================================================================
// Registry edits & lifetime
// ============================================================================

#[test]
fn registry_edit_rebuilds_program_on_next_draw() {
    let mut r = renderer(GlApiVersion::Gles3);
    let mut assets = RenderAssets::new();
    let decal = r.builtins().decal;
    let material = scripted(&r, &mut assets, decal, "edited");
    let geometry = triangle(&mut assets, 1);
    let pass = RenderPass::new(0).with_opaque(Mesh::new(geometry, material, Mat4::IDENTITY));
    r.draw(&mut assets, &pass);

    let tint = mosaic::Capability::new("DispatchTint").fragment_shade(|_| "  rt0.rgb *= 0.5;\n".to_owned());
    r.registry_mut().register(decal, &tint).unwrap();
    r.draw(&mut assets, &pass);

    assert_eq!(r.cache().stats().programs_linked, 2);
    assert_eq!(r.cache().len(), 1);
    assert_eq!(r.device().live_programs(), 1);
}

#[test]
fn destroying_material_releases_its_programs() {
    let mut r = renderer(GlApiVersion::Gles3);
    let mut assets = RenderAssets::new();
    let decal = r.builtins().decal;
    let material = scripted(&r, &mut assets, decal, "doomed");
    let geometry = triangle(&mut assets, 1);
    r.draw(
        &mut assets,
        &RenderPass::new(0).with_opaque(Mesh::new(geometry, material, Mat4::IDENTITY)),
    );
    assert_eq!(r.device().live_programs(), 1);

    r.destroy_material(&mut assets, material);

    assert_eq!(r.device().live_programs(), 0);
    assert!(assets.material(material).is_none());
}
