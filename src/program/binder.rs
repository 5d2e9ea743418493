use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::semantics;
use super::{ProgramId, UniformLocation};
use crate::gpu::{GraphicsDevice, RawProgram, UniformValue};
use crate::shader::{AssemblyContext, VertexAttributes};
use crate::utils::interner::{self, Symbol};

/// Uniform semantics of one light slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightSlot {
    pub position: Symbol,
    pub color: Symbol,
}

/// Post-link setup handle passed to Prepare fragments.
///
/// Resolves uniform and attribute locations of a freshly linked program and
/// records them under semantic names.
pub struct ProgramBinder<'a> {
    device: &'a mut dyn GraphicsDevice,
    program: ProgramId,
    raw: RawProgram,
    ctx: AssemblyContext<'a>,
    pub(crate) uniforms: FxHashMap<Symbol, UniformLocation>,
    pub(crate) attributes: SmallVec<[(VertexAttributes, u32); 5]>,
    pub(crate) constants: SmallVec<[(Symbol, UniformValue); 4]>,
    pub(crate) light_slots: SmallVec<[LightSlot; 4]>,
}

impl<'a> ProgramBinder<'a> {
    pub(crate) fn new(
        device: &'a mut dyn GraphicsDevice,
        program: ProgramId,
        raw: RawProgram,
        ctx: AssemblyContext<'a>,
    ) -> Self {
        Self {
            device,
            program,
            raw,
            ctx,
            uniforms: FxHashMap::default(),
            attributes: SmallVec::new(),
            constants: SmallVec::new(),
            light_slots: SmallVec::new(),
        }
    }

    /// The inputs the program was assembled with.
    #[must_use]
    pub fn context(&self) -> &AssemblyContext<'a> {
        &self.ctx
    }

    /// Binds the GLSL uniform `glsl_name` under `semantic`. Returns false if
    /// the program does not declare it (or the driver optimized it out).
    pub fn bind_uniform(&mut self, semantic: &str, glsl_name: &str) -> bool {
        match self.device.uniform_location(self.raw, glsl_name) {
            Some(raw) => {
                self.uniforms
                    .insert(interner::intern(semantic), UniformLocation::new(raw, self.program));
                true
            }
            None => {
                log::trace!("uniform '{glsl_name}' not active, '{semantic}' left unbound");
                false
            }
        }
    }

    /// Resolves the vertex attribute location, if the geometry has it. The
    /// slot is enabled when streams are bound for a draw.
    pub fn bind_attribute(&mut self, attr: VertexAttributes) -> bool {
        if !self.ctx.has(attr) || self.attributes.iter().any(|(a, _)| *a == attr) {
            return false;
        }
        let Some(name) = attr.glsl_name() else {
            return false;
        };
        match self.device.attrib_location(self.raw, &name) {
            Some(location) => {
                self.attributes.push((attr, location));
                true
            }
            None => false,
        }
    }

    /// Registers a value written once per activation period, e.g. a sampler
    /// unit. Ignored if `semantic` is not bound.
    pub fn constant(&mut self, semantic: &str, value: UniformValue) {
        let sym = interner::intern(semantic);
        if self.uniforms.contains_key(&sym) {
            self.constants.push((sym, value));
        }
    }

    /// Binds `position_array[i]` / `color_array[i]` for every light slot of
    /// the assembly context. Slots missing either uniform are skipped.
    pub fn bind_light_slots(&mut self, position_array: &str, color_array: &str) {
        for i in 0..self.ctx.light_count {
            let position = semantics::light_position(i);
            let color = semantics::light_color(i);
            let has_position = self.bind_uniform(&position, &format!("{position_array}[{i}]"));
            let has_color = self.bind_uniform(&color, &format!("{color_array}[{i}]"));
            if has_position && has_color {
                self.light_slots.push(LightSlot {
                    position: interner::intern(&position),
                    color: interner::intern(&color),
                });
            }
        }
    }

    #[must_use]
    pub fn has_uniform(&self, semantic: &str) -> bool {
        interner::get(semantic).is_some_and(|s| self.uniforms.contains_key(&s))
    }
}
