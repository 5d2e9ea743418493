//! Renderer
//!
//! [`Renderer`] owns the capability registry, the program cache (and through
//! it the graphics device) and the draw dispatcher. Scene traversal, culling
//! and asset upload happen outside; the renderer consumes prepared
//! [`RenderPass`]es.

pub mod assets;
pub mod dispatch;
pub mod material;
pub mod scene;
pub mod settings;

pub use assets::{GeometryHandle, GpuGeometry, IndexBuffer, MaterialHandle, RenderAssets, VertexStream};
pub use dispatch::{DrawDispatchState, DrawDispatcher, DrawStats};
pub use material::{MaterialParams, RenderMaterial, StandardMaterial, TextureSlot};
pub use scene::{Camera, Light, LightKind, Mesh, RenderPass};
pub use settings::RendererSettings;

use crate::errors::Result;
use crate::gpu::GraphicsDevice;
use crate::program::{ProgramCache, ProgramId};
use crate::shader::{
    AssembledSource, AssemblyInputs, BuiltinClasses, CapabilityRegistry, GlslDialect, ShaderAssembler,
    ShaderClassId, ShaderInstance, VertexAttributes, register_builtin_classes,
};
use crate::utils::interner;

pub struct Renderer<D: GraphicsDevice> {
    settings: RendererSettings,
    registry: CapabilityRegistry,
    builtins: BuiltinClasses,
    cache: ProgramCache<D>,
    dispatcher: DrawDispatcher,
}

impl<D: GraphicsDevice> Renderer<D> {
    /// Creates a renderer with the built-in `decal`, `lambert` and `phong`
    /// classes registered.
    pub fn new(device: D, settings: RendererSettings) -> Result<Self> {
        let version = settings.api_version.unwrap_or_else(|| device.api_version());
        let dialect = GlslDialect::resolve(version, settings.precision);
        log::info!(
            "renderer: {version:?}, precision {:?}, vertex arrays: {}",
            settings.precision,
            device.supports_vertex_arrays()
        );

        interner::preload_common_semantics();
        let mut registry = CapabilityRegistry::new();
        let builtins = register_builtin_classes(&mut registry)?;

        let mut cache = ProgramCache::new(device, dialect);
        cache.set_log_source(settings.log_shader_source);

        Ok(Self {
            dispatcher: DrawDispatcher::new(&settings),
            settings,
            registry,
            builtins,
            cache,
        })
    }

    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    pub fn builtins(&self) -> BuiltinClasses {
        self.builtins
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Registry edits bump the class revision; materials pick them up on
    /// their next draw.
    pub fn registry_mut(&mut self) -> &mut CapabilityRegistry {
        &mut self.registry
    }

    pub fn cache(&self) -> &ProgramCache<D> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ProgramCache<D> {
        &mut self.cache
    }

    pub fn device(&self) -> &D {
        self.cache.device()
    }

    pub fn device_mut(&mut self) -> &mut D {
        self.cache.device_mut()
    }

    pub fn dispatcher(&self) -> &DrawDispatcher {
        &self.dispatcher
    }

    /// Snapshot of a class for a new material.
    pub fn create_shader(&self, class: ShaderClassId) -> Result<ShaderInstance> {
        ShaderInstance::new(&self.registry, class)
    }

    /// Assembles the instance's source for the given inputs without
    /// compiling it.
    pub fn assemble(
        &self,
        instance: &ShaderInstance,
        attributes: VertexAttributes,
        light_count: usize,
        camera_present: bool,
    ) -> AssembledSource {
        let assembler = ShaderAssembler::new(*self.cache.dialect());
        instance.assemble(
            &assembler,
            AssemblyInputs {
                attributes,
                light_count,
                camera_present,
                ..AssemblyInputs::default()
            },
        )
    }

    /// Compiles and links raw source. Failures are logged and yield `None`.
    pub fn compile_and_link(&mut self, vertex: &str, fragment: &str) -> Option<ProgramId> {
        match self.cache.compile_and_link(vertex, fragment) {
            Ok(id) => Some(id),
            Err(e) => {
                log::error!("{e}");
                None
            }
        }
    }

    pub fn draw(&mut self, assets: &mut RenderAssets, pass: &RenderPass) -> DrawStats {
        self.dispatcher.draw(&mut self.cache, &self.registry, assets, pass)
    }

    /// Draws passes in order and returns the summed counters.
    pub fn render(&mut self, assets: &mut RenderAssets, passes: &[RenderPass]) -> DrawStats {
        let mut total = DrawStats::default();
        for pass in passes {
            total += self.draw(assets, pass);
        }
        total
    }

    /// Forgets cached bind state, e.g. after external GL calls.
    pub fn reset_state(&mut self) {
        self.dispatcher.reset();
    }

    /// Removes a material and releases its programs. Programs shared with
    /// other materials stay linked until their last user is gone.
    pub fn destroy_material(&mut self, assets: &mut RenderAssets, handle: MaterialHandle) {
        if let Some(mut material) = assets.remove_material(handle) {
            material.shader_mut().release_programs(&mut self.cache);
        }
    }
}
