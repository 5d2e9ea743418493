use crate::errors::Result;
use crate::gpu::UniformValue;
use crate::utils::interner::{self, Symbol};

use super::ProgramId;
use super::cache::UniformWrite;

/// Uniform upload surface of a program cache, object safe so materials can
/// write without knowing the device type.
pub trait UniformTarget {
    fn write_uniform(
        &mut self,
        program: ProgramId,
        semantic: Symbol,
        value: &UniformValue,
        force: bool,
    ) -> Result<UniformWrite>;

    fn has_uniform(&self, program: ProgramId, semantic: Symbol) -> bool;
}

/// Handed to [`RenderMaterial::set_uniforms`](crate::renderer::RenderMaterial::set_uniforms).
///
/// Writes are forced: material values can change between any two draws, and
/// the writer is only invoked when the material is dirty or its fingerprint
/// changed. A failed write is logged and skipped without affecting the rest.
pub struct UniformWriter<'a> {
    target: &'a mut dyn UniformTarget,
    program: ProgramId,
    failed: usize,
}

impl<'a> UniformWriter<'a> {
    pub fn new(target: &'a mut dyn UniformTarget, program: ProgramId) -> Self {
        Self {
            target,
            program,
            failed: 0,
        }
    }

    #[must_use]
    pub fn program(&self) -> ProgramId {
        self.program
    }

    /// Returns true if the value reached the GPU.
    pub fn set(&mut self, semantic: &str, value: impl Into<UniformValue>) -> bool {
        let Some(sym) = interner::get(semantic) else {
            return false;
        };
        match self.target.write_uniform(self.program, sym, &value.into(), true) {
            Ok(write) => write == UniformWrite::Written,
            Err(e) => {
                log::error!("uniform '{semantic}': {e}");
                self.failed += 1;
                false
            }
        }
    }

    #[must_use]
    pub fn has(&self, semantic: &str) -> bool {
        interner::get(semantic).is_some_and(|s| self.target.has_uniform(self.program, s))
    }

    /// Number of writes rejected so far.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }
}
