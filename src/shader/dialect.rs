//! GLSL dialect table
//!
//! The two supported GL API major versions differ in a handful of keywords.
//! They are resolved once per assembly into a [`GlslDialect`] and handed to
//! every fragment through the assembly context, so fragments never branch on
//! the API version themselves.

use serde::{Deserialize, Serialize};

/// GL API generation the programs are assembled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlApiVersion {
    /// OpenGL ES 2.0 / WebGL 1 (GLSL ES 1.00)
    #[default]
    Gles2,
    /// OpenGL ES 3.0 / WebGL 2 (GLSL ES 3.00)
    Gles3,
}

/// Default float precision for fragment shaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Lowp,
    #[default]
    Mediump,
    Highp,
}

impl Precision {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Precision::Lowp => "lowp",
            Precision::Mediump => "mediump",
            Precision::Highp => "highp",
        }
    }
}

/// Version-dependent keywords, resolved once per assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlslDialect {
    pub version: GlApiVersion,
    /// Directive emitted as the first line; empty for GLSL ES 1.00.
    pub version_directive: &'static str,
    /// Qualifier of vertex stage inputs (`attribute` / `in`).
    pub vertex_in: &'static str,
    /// Qualifier of vertex stage outputs (`varying` / `out`).
    pub vertex_out: &'static str,
    /// Qualifier of fragment stage inputs (`varying` / `in`).
    pub fragment_in: &'static str,
    /// 2D texture sampling function (`texture2D` / `texture`).
    pub texture_fn: &'static str,
    /// Declaration of the color output `rt0`.
    pub color_output_decl: &'static str,
    /// Statement copying `rt0` into the fixed output, if the version needs it.
    pub legacy_color_assignment: Option<&'static str>,
    pub precision: Precision,
}

impl GlslDialect {
    #[must_use]
    pub const fn resolve(version: GlApiVersion, precision: Precision) -> Self {
        match version {
            GlApiVersion::Gles2 => Self {
                version,
                version_directive: "",
                vertex_in: "attribute",
                vertex_out: "varying",
                fragment_in: "varying",
                texture_fn: "texture2D",
                color_output_decl: "vec4 rt0;\n",
                legacy_color_assignment: Some("  gl_FragColor = rt0;\n"),
                precision,
            },
            GlApiVersion::Gles3 => Self {
                version,
                version_directive: "#version 300 es\n",
                vertex_in: "in",
                vertex_out: "out",
                fragment_in: "in",
                texture_fn: "texture",
                color_output_decl: "layout(location = 0) out vec4 rt0;\n",
                legacy_color_assignment: None,
                precision,
            },
        }
    }

    /// `precision <p> float;` line.
    #[must_use]
    pub fn precision_line(&self) -> String {
        format!("precision {} float;\n", self.precision.keyword())
    }
}
