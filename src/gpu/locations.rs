//! Uniform location bookkeeping shared by the devices.
//!
//! Devices hand out [`RawUniform`] handles and keep the native location
//! behind them. Locations are cached per `(program, name)` so repeated
//! lookups return the same handle, and all of a program's entries go away
//! with [`remove_program`](UniformLocationTable::remove_program).

use rustc_hash::FxHashMap;

use super::{RawProgram, RawUniform};

#[derive(Debug)]
struct LocationEntry<L> {
    program: RawProgram,
    name: String,
    native: L,
}

/// Per-program uniform locations keyed by [`RawUniform`].
#[derive(Debug)]
pub struct UniformLocationTable<L> {
    by_name: FxHashMap<(RawProgram, String), RawUniform>,
    entries: FxHashMap<RawUniform, LocationEntry<L>>,
}

impl<L> Default for UniformLocationTable<L> {
    fn default() -> Self {
        Self {
            by_name: FxHashMap::default(),
            entries: FxHashMap::default(),
        }
    }
}

impl<L> UniformLocationTable<L> {
    #[must_use]
    pub fn lookup(&self, program: RawProgram, name: &str) -> Option<RawUniform> {
        self.by_name.get(&(program, name.to_owned())).copied()
    }

    pub fn insert(&mut self, id: RawUniform, program: RawProgram, name: &str, native: L) {
        self.by_name.insert((program, name.to_owned()), id);
        self.entries.insert(
            id,
            LocationEntry {
                program,
                name: name.to_owned(),
                native,
            },
        );
    }

    #[must_use]
    pub fn native(&self, id: RawUniform) -> Option<&L> {
        self.entries.get(&id).map(|e| &e.native)
    }

    /// Owning program and GLSL name of a location.
    #[must_use]
    pub fn describe(&self, id: RawUniform) -> Option<(RawProgram, &str)> {
        self.entries.get(&id).map(|e| (e.program, e.name.as_str()))
    }

    /// Drops every location of `program`. Returns how many were removed.
    pub fn remove_program(&mut self, program: RawProgram) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.program != program);
        self.by_name.retain(|(p, _), _| *p != program);
        before - self.entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
