#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod errors;
pub mod gpu;
pub mod program;
pub mod renderer;
pub mod shader;
pub mod utils;

pub use errors::{MosaicError, Result};
pub use gpu::{GraphicsDevice, HeadlessDevice, UniformValue};
pub use program::{ProgramCache, ProgramId, UniformWriter, semantics};
pub use renderer::{
    Camera, DrawStats, GpuGeometry, Light, Mesh, RenderAssets, RenderMaterial, RenderPass, Renderer, RendererSettings,
    StandardMaterial,
};
pub use shader::{
    Capability, CapabilityRegistry, ClassBase, GlApiVersion, GlslDialect, ShaderAssembler, ShaderClassId,
    ShaderInstance, Stage, VertexAttributes,
};
pub use utils::interner;
