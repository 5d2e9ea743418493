use crate::gpu::RawUniform;

use super::ProgramId;

/// A live uniform location plus the bookkeeping that suppresses redundant
/// uploads.
///
/// `last_written` is the usage generation of the owning program at the last
/// non-forced write. Generations start at 1 on first activation, so a fresh
/// location (0) is always written once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformLocation {
    pub(crate) raw: RawUniform,
    pub(crate) program: ProgramId,
    pub(crate) last_written: u64,
}

impl UniformLocation {
    #[must_use]
    pub fn new(raw: RawUniform, program: ProgramId) -> Self {
        Self {
            raw,
            program,
            last_written: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn raw(&self) -> RawUniform {
        self.raw
    }

    #[inline]
    #[must_use]
    pub fn program(&self) -> ProgramId {
        self.program
    }

    #[inline]
    #[must_use]
    pub fn last_written(&self) -> u64 {
        self.last_written
    }

    /// Write if forced, or if nothing was written since the program last
    /// became active.
    #[inline]
    #[must_use]
    pub fn needs_write(&self, usage_generation: u64, force: bool) -> bool {
        force || self.last_written < usage_generation
    }

    #[inline]
    pub fn mark_written(&mut self, usage_generation: u64) {
        self.last_written = usage_generation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    #[test]
    fn suppression_rule() {
        let program = ProgramId::from(KeyData::from_ffi(1));
        let mut loc = UniformLocation::new(RawUniform(7), program);

        assert!(loc.needs_write(1, false));
        loc.mark_written(1);
        assert!(!loc.needs_write(1, false));
        assert!(loc.needs_write(1, true));
        assert!(loc.needs_write(2, false));
    }
}
