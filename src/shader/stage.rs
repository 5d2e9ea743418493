//! Assembly stages

/// One of the fixed points where a capability contributes to a program.
///
/// The first five stages contribute GLSL source text. [`Stage::Prepare`]
/// contributes setup logic that runs once after the program links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    VertexDefine,
    VertexTransform,
    VertexShade,
    FragmentDefine,
    FragmentShade,
    Prepare,
}

impl Stage {
    /// Number of stages.
    pub const COUNT: usize = 6;

    /// Number of stages that produce source text.
    pub const SOURCE_COUNT: usize = 5;

    /// All stages in list order.
    pub const ALL: [Stage; Self::COUNT] = [
        Stage::VertexDefine,
        Stage::VertexTransform,
        Stage::VertexShade,
        Stage::FragmentDefine,
        Stage::FragmentShade,
        Stage::Prepare,
    ];

    /// Stages that produce source text.
    pub const SOURCE: [Stage; Self::SOURCE_COUNT] = [
        Stage::VertexDefine,
        Stage::VertexTransform,
        Stage::VertexShade,
        Stage::FragmentDefine,
        Stage::FragmentShade,
    ];

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    #[must_use]
    pub const fn is_source(self) -> bool {
        !matches!(self, Stage::Prepare)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Stage::VertexDefine => "VertexDefine",
            Stage::VertexTransform => "VertexTransform",
            Stage::VertexShade => "VertexShade",
            Stage::FragmentDefine => "FragmentDefine",
            Stage::FragmentShade => "FragmentShade",
            Stage::Prepare => "Prepare",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
