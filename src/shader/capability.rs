//! Capabilities
//!
//! A [`Capability`] is a named bundle of stage fragments. Installing it on a
//! shader class appends its name to every stage list of that class and copies
//! its fragments into the class method table.
//!
//! ```rust,ignore
//! let fog = Capability::new("Fog")
//!     .fragment_define(|_| "uniform vec4 fogColor;\n".to_owned())
//!     .fragment_shade(|_| "  rt0 = mix(rt0, fogColor, 0.5);\n".to_owned())
//!     .prepare(|binder| binder.bind_uniform("FOGCOLOR", "fogColor"));
//! ```

use std::fmt;
use std::sync::Arc;

use super::context::AssemblyContext;
use super::stage::Stage;
use crate::program::ProgramBinder;
use crate::utils::interner::{self, Symbol};

/// Produces GLSL source for one stage.
#[derive(Clone)]
pub struct SourceFragment(Arc<dyn Fn(&AssemblyContext<'_>) -> String + Send + Sync>);

impl SourceFragment {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&AssemblyContext<'_>) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    #[inline]
    #[must_use]
    pub fn emit(&self, ctx: &AssemblyContext<'_>) -> String {
        (self.0)(ctx)
    }
}

impl fmt::Debug for SourceFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SourceFragment(..)")
    }
}

/// Resolves attribute and uniform locations right after link.
#[derive(Clone)]
pub struct PrepareFragment(Arc<dyn Fn(&mut ProgramBinder<'_>) + Send + Sync>);

impl PrepareFragment {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut ProgramBinder<'_>) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn run(&self, binder: &mut ProgramBinder<'_>) {
        (self.0)(binder);
    }
}

impl fmt::Debug for PrepareFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrepareFragment(..)")
    }
}

/// The fragments of one capability or of a class base, indexed by stage.
#[derive(Debug, Clone, Default)]
pub struct StageFragments {
    pub(crate) sources: [Option<SourceFragment>; Stage::SOURCE_COUNT],
    pub(crate) prepare: Option<PrepareFragment>,
}

impl StageFragments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Source fragment for `stage`. Always `None` for [`Stage::Prepare`].
    #[must_use]
    pub fn source(&self, stage: Stage) -> Option<&SourceFragment> {
        if stage.is_source() {
            self.sources[stage.index()].as_ref()
        } else {
            None
        }
    }

    #[must_use]
    pub fn prepare(&self) -> Option<&PrepareFragment> {
        self.prepare.as_ref()
    }

    #[must_use]
    pub fn has(&self, stage: Stage) -> bool {
        match stage {
            Stage::Prepare => self.prepare.is_some(),
            _ => self.sources[stage.index()].is_some(),
        }
    }

    pub(crate) fn set_source(&mut self, stage: Stage, fragment: SourceFragment) {
        debug_assert!(stage.is_source());
        self.sources[stage.index()] = Some(fragment);
    }

    /// Copies every fragment present in `other` over this set.
    pub(crate) fn overlay(&mut self, other: &StageFragments) {
        for (slot, incoming) in self.sources.iter_mut().zip(&other.sources) {
            if let Some(f) = incoming {
                *slot = Some(f.clone());
            }
        }
        if let Some(p) = &other.prepare {
            self.prepare = Some(p.clone());
        }
    }
}

macro_rules! stage_builder {
    ($($(#[$doc:meta])* $method:ident => $stage:ident;)*) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub fn $method<F>(mut self, f: F) -> Self
            where
                F: Fn(&AssemblyContext<'_>) -> String + Send + Sync + 'static,
            {
                self.fragments.set_source(Stage::$stage, SourceFragment::new(f));
                self
            }
        )*
    };
}

/// A named, composable unit of shader source.
#[derive(Debug, Clone)]
pub struct Capability {
    name: Symbol,
    fragments: StageFragments,
}

impl Capability {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: interner::intern(name),
            fragments: StageFragments::new(),
        }
    }

    stage_builder! {
        /// Declarations before the vertex `main()`.
        vertex_define => VertexDefine;
        /// Position / varying setup inside the vertex `main()`.
        vertex_transform => VertexTransform;
        vertex_shade => VertexShade;
        /// Declarations before the fragment `main()`.
        fragment_define => FragmentDefine;
        fragment_shade => FragmentShade;
    }

    #[must_use]
    pub fn prepare<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut ProgramBinder<'_>) + Send + Sync + 'static,
    {
        self.fragments.prepare = Some(PrepareFragment::new(f));
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> Symbol {
        self.name
    }

    #[inline]
    #[must_use]
    pub fn name_str(&self) -> &'static str {
        interner::resolve(self.name)
    }

    #[inline]
    #[must_use]
    pub fn fragments(&self) -> &StageFragments {
        &self.fragments
    }
}

/// A shader class's own fragments, emitted before any capability fragment.
#[derive(Debug, Clone, Default)]
pub struct ClassBase {
    fragments: StageFragments,
}

impl ClassBase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    stage_builder! {
        vertex_define => VertexDefine;
        vertex_transform => VertexTransform;
        vertex_shade => VertexShade;
        fragment_define => FragmentDefine;
        fragment_shade => FragmentShade;
    }

    #[must_use]
    pub fn prepare<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut ProgramBinder<'_>) + Send + Sync + 'static,
    {
        self.fragments.prepare = Some(PrepareFragment::new(f));
        self
    }

    #[inline]
    #[must_use]
    pub fn fragments(&self) -> &StageFragments {
        &self.fragments
    }

    /// Base of a derived class: the parent's fragments with this base's
    /// fragments layered on top.
    #[must_use]
    pub(crate) fn inherit(parent: &ClassBase, own: &ClassBase) -> ClassBase {
        let mut fragments = parent.fragments.clone();
        fragments.overlay(&own.fragments);
        ClassBase { fragments }
    }
}
