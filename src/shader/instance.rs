//! Shader instances
//!
//! A [`ShaderInstance`] is one material's view of a shader class: a snapshot
//! of the class table plus the programs compiled from it, one per
//! (attribute set, light count, camera presence, material features)
//! combination.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use rustc_hash::FxHashMap;

use super::assembler::{AssembledSource, AssemblyInputs, ShaderAssembler};
use super::registry::{CapabilityRegistry, ShaderClassId, ShaderTable};
use crate::errors::Result;
use crate::gpu::GraphicsDevice;
use crate::program::{ProgramCache, ProgramId};

static NEXT_INSTANCE_ID: AtomicU32 = AtomicU32::new(1);

/// Inputs that select a compiled program variant.
pub type ProgramVariantKey = AssemblyInputs;

#[derive(Debug)]
pub struct ShaderInstance {
    id: u32,
    table: Arc<ShaderTable>,
    dirty: bool,
    /// `None` marks a variant that failed to build; it is not retried.
    variants: FxHashMap<ProgramVariantKey, Option<ProgramId>>,
}

impl ShaderInstance {
    pub fn new(registry: &CapabilityRegistry, class: ShaderClassId) -> Result<Self> {
        Ok(Self {
            id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
            table: registry.snapshot(class)?,
            dirty: true,
            variants: FxHashMap::default(),
        })
    }

    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[must_use]
    pub fn class(&self) -> ShaderClassId {
        self.table.class()
    }

    #[must_use]
    pub fn table(&self) -> &ShaderTable {
        &self.table
    }

    /// Set on creation and on refresh; cleared once uniform setup succeeds.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// True when the class was recomposed after this instance's snapshot.
    #[must_use]
    pub fn is_stale(&self, registry: &CapabilityRegistry) -> bool {
        registry
            .revision(self.class())
            .is_some_and(|r| r != self.table.revision())
    }

    /// Re-snapshots the class and drops every compiled variant.
    pub fn refresh<D: GraphicsDevice>(
        &mut self,
        registry: &CapabilityRegistry,
        cache: &mut ProgramCache<D>,
    ) -> Result<()> {
        let table = registry.snapshot(self.class())?;
        self.release_programs(cache);
        log::debug!(
            "Shader instance {} refreshed to '{}' revision {}",
            self.id,
            self.class().name(),
            table.revision()
        );
        self.table = table;
        self.dirty = true;
        Ok(())
    }

    #[must_use]
    pub fn assemble(&self, assembler: &ShaderAssembler, inputs: AssemblyInputs) -> AssembledSource {
        assembler.assemble(&self.table, inputs)
    }

    /// Program for `key`, building it on first request.
    ///
    /// Build failures are logged once and cached, so a broken variant stays
    /// non-renderable instead of recompiling every frame.
    pub fn ensure_program<D: GraphicsDevice>(
        &mut self,
        cache: &mut ProgramCache<D>,
        key: ProgramVariantKey,
    ) -> Option<ProgramId> {
        if let Some(cached) = self.variants.get(&key) {
            return *cached;
        }

        let assembler = ShaderAssembler::new(*cache.dialect());
        let source = self.assemble(&assembler, key);
        let program = match cache.build(&source, &self.table, key) {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!(
                    "'{}' variant {key:?} is not renderable: {e}",
                    self.class().name()
                );
                None
            }
        };
        self.variants.insert(key, program);
        program
    }

    /// Cached program for `key`, without building.
    #[must_use]
    pub fn program(&self, key: &ProgramVariantKey) -> Option<ProgramId> {
        self.variants.get(key).copied().flatten()
    }

    /// Releases every variant back to the cache.
    pub fn release_programs<D: GraphicsDevice>(&mut self, cache: &mut ProgramCache<D>) {
        for (_, program) in self.variants.drain() {
            if let Some(id) = program {
                cache.release(id);
            }
        }
    }
}
