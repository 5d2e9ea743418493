//! Shader Source Assembler
//!
//! Walks a [`ShaderTable`] and concatenates stage fragments into complete
//! vertex and fragment program text.
//!
//! Vertex program:
//!
//! ```text
//! [#version]  precision
//! <class VertexDefine>  <capability VertexDefine...>
//! [uniform mat4 projectionAndViewMatrix;]      (camera present)
//! void main(void) {
//!   <class VertexTransform>  <capability VertexTransform...>
//!   <class VertexShade>      <capability VertexShade...>
//! }
//! ```
//!
//! The fragment program mirrors it with `FragmentDefine` / `FragmentShade`,
//! declares `rt0` right after the precision line and, on GLES2 only, copies
//! `rt0` into `gl_FragColor` before closing `main()`.

use std::fmt::Write as _;

use super::context::{AssemblyContext, MaterialFeatures, VertexAttributes};
use super::dialect::GlslDialect;
use super::registry::ShaderTable;
use super::stage::Stage;

/// Name of the combined projection-view uniform declared when a camera is
/// present.
pub const PROJECTION_VIEW_UNIFORM: &str = "projectionAndViewMatrix";

/// Assembled vertex and fragment source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssembledSource {
    pub vertex: String,
    pub fragment: String,
}

/// Everything besides the class table that shapes the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AssemblyInputs {
    pub attributes: VertexAttributes,
    pub light_count: usize,
    pub camera_present: bool,
    pub features: MaterialFeatures,
}

/// Builds program source for one GL dialect.
#[derive(Debug, Clone, Copy)]
pub struct ShaderAssembler {
    dialect: GlslDialect,
}

impl ShaderAssembler {
    #[must_use]
    pub fn new(dialect: GlslDialect) -> Self {
        Self { dialect }
    }

    #[must_use]
    pub fn dialect(&self) -> &GlslDialect {
        &self.dialect
    }

    /// Assembles both programs. Pure: equal inputs give byte-identical text.
    #[must_use]
    pub fn assemble(&self, table: &ShaderTable, inputs: AssemblyInputs) -> AssembledSource {
        let ctx = AssemblyContext {
            dialect: &self.dialect,
            attributes: inputs.attributes | VertexAttributes::POSITION,
            light_count: inputs.light_count,
            camera_present: inputs.camera_present,
            features: inputs.features,
        };

        AssembledSource {
            vertex: self.vertex_source(table, &ctx),
            fragment: self.fragment_source(table, &ctx),
        }
    }

    fn vertex_source(&self, table: &ShaderTable, ctx: &AssemblyContext<'_>) -> String {
        let mut out = String::with_capacity(2048);
        out.push_str(self.dialect.version_directive);
        out.push_str(&self.dialect.precision_line());

        emit_stage(&mut out, table, Stage::VertexDefine, ctx);
        if ctx.camera_present {
            let _ = writeln!(out, "uniform mat4 {PROJECTION_VIEW_UNIFORM};");
        }

        out.push_str("void main(void) {\n");
        emit_stage(&mut out, table, Stage::VertexTransform, ctx);
        emit_stage(&mut out, table, Stage::VertexShade, ctx);
        out.push_str("}\n");
        out
    }

    fn fragment_source(&self, table: &ShaderTable, ctx: &AssemblyContext<'_>) -> String {
        let mut out = String::with_capacity(2048);
        out.push_str(self.dialect.version_directive);
        out.push_str(&self.dialect.precision_line());
        out.push_str(self.dialect.color_output_decl);

        emit_stage(&mut out, table, Stage::FragmentDefine, ctx);

        out.push_str("void main(void) {\n");
        emit_stage(&mut out, table, Stage::FragmentShade, ctx);
        if let Some(assign) = self.dialect.legacy_color_assignment {
            out.push_str(assign);
        }
        out.push_str("}\n");
        out
    }
}

/// Class base fragment first, then each capability in list order.
fn emit_stage(out: &mut String, table: &ShaderTable, stage: Stage, ctx: &AssemblyContext<'_>) {
    if let Some(base) = table.base().source(stage) {
        out.push_str(&base.emit(ctx));
    }
    for (_, fragment) in table.stage(stage) {
        if let Some(f) = fragment {
            out.push_str(&f.emit(ctx));
        }
    }
}
