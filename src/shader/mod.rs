//! Shader composition
//!
//! Program source is built from capabilities rather than written per
//! material type:
//!
//! - [`CapabilityRegistry`]: per-class ordered stage lists of capabilities
//! - [`ShaderAssembler`]: concatenates stage fragments into GLSL text
//! - [`GlslDialect`]: the GLES2 / GLES3 keyword table, resolved once per assembly
//! - [`ShaderInstance`]: a material's snapshot of a class and its compiled variants
//! - [`library`]: built-in `decal`, `lambert` and `phong` classes

pub mod assembler;
pub mod capability;
pub mod context;
pub mod dialect;
pub mod instance;
pub mod library;
pub mod registry;
pub mod stage;

pub use assembler::{AssembledSource, AssemblyInputs, PROJECTION_VIEW_UNIFORM, ShaderAssembler};
pub use capability::{Capability, ClassBase, PrepareFragment, SourceFragment, StageFragments};
pub use context::{AssemblyContext, MaterialFeatures, VertexAttributes};
pub use dialect::{GlApiVersion, GlslDialect, Precision};
pub use instance::{ProgramVariantKey, ShaderInstance};
pub use library::{BuiltinClasses, register_builtin_classes};
pub use registry::{CapabilityRegistry, ShaderClassId, ShaderClassTable, ShaderTable};
pub use stage::Stage;
