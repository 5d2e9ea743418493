//! Assembly-time context handed to every source fragment.

use bitflags::bitflags;

use super::dialect::GlslDialect;

bitflags! {
    /// Vertex streams present on the geometry being drawn.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct VertexAttributes: u32 {
        const POSITION = 1 << 0;
        const NORMAL   = 1 << 1;
        const TANGENT  = 1 << 2;
        const COLOR    = 1 << 3;
        const TEXCOORD = 1 << 4;
    }
}

impl VertexAttributes {
    /// Semantic name of a single attribute flag (`position`, `normal`, ...).
    #[must_use]
    pub fn semantic(self) -> Option<&'static str> {
        match self {
            Self::POSITION => Some("position"),
            Self::NORMAL => Some("normal"),
            Self::TANGENT => Some("tangent"),
            Self::COLOR => Some("color"),
            Self::TEXCOORD => Some("texcoord"),
            _ => None,
        }
    }

    /// GLSL name the attribute is declared under (`aVertex_<semantic>`).
    #[must_use]
    pub fn glsl_name(self) -> Option<String> {
        self.semantic().map(|s| format!("aVertex_{s}"))
    }

    /// Number of float components per vertex.
    #[must_use]
    pub fn components(self) -> Option<i32> {
        match self {
            Self::POSITION | Self::NORMAL | Self::TANGENT => Some(3),
            Self::COLOR => Some(4),
            Self::TEXCOORD => Some(2),
            _ => None,
        }
    }
}

bitflags! {
    /// Material properties that change the assembled source.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MaterialFeatures: u32 {
        /// Sample a diffuse texture (requires texture coordinates).
        const USE_MAP = 1 << 0;
    }
}

/// Read-only inputs of one assembly.
///
/// Fragments receive this by shared reference and cannot mutate it, which is
/// what keeps assembly output deterministic.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyContext<'a> {
    pub dialect: &'a GlslDialect,
    pub attributes: VertexAttributes,
    pub light_count: usize,
    pub camera_present: bool,
    pub features: MaterialFeatures,
}

impl AssemblyContext<'_> {
    #[inline]
    #[must_use]
    pub fn has(&self, attr: VertexAttributes) -> bool {
        self.attributes.contains(attr)
    }

    #[inline]
    #[must_use]
    pub fn uses(&self, feature: MaterialFeatures) -> bool {
        self.features.contains(feature)
    }

    /// Vertex input qualifier.
    #[inline]
    #[must_use]
    pub fn vin(&self) -> &'static str {
        self.dialect.vertex_in
    }

    /// Vertex output qualifier.
    #[inline]
    #[must_use]
    pub fn vout(&self) -> &'static str {
        self.dialect.vertex_out
    }

    /// Fragment input qualifier.
    #[inline]
    #[must_use]
    pub fn fin(&self) -> &'static str {
        self.dialect.fragment_in
    }

    #[inline]
    #[must_use]
    pub fn texture_fn(&self) -> &'static str {
        self.dialect.texture_fn
    }
}
