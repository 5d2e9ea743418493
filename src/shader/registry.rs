//! Capability Registry
//!
//! Holds, per shader class, the ordered stage lists of capability names and
//! the method table those names resolve through.
//!
//! # Class-level state
//!
//! Composition configures a *type*: every [`ShaderInstance`](super::ShaderInstance)
//! of a class sees the same stage lists. Each mutation bumps the class
//! revision, and instances holding an older [`ShaderTable`] snapshot refresh
//! themselves (and drop their compiled variants) the next time they are
//! prepared.
//!
//! # Permissive operations
//!
//! Nothing here fails on a missing name. Registering twice is a no-op on the
//! lists, and [`swap`](CapabilityRegistry::swap) / [`remove`](CapabilityRegistry::remove)
//! of an absent name touch nothing. Both report how many lists they touched
//! and log a warning on zero so registration-order mistakes stay visible.
//!
//! Mutating a class while frames are being drawn is a contract violation.
//! The registry is owned by the renderer and borrowed mutably only during
//! setup, so the borrow checker rules it out.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::capability::{Capability, ClassBase, PrepareFragment, SourceFragment, StageFragments};
use super::stage::Stage;
use crate::errors::{MosaicError, Result};
use crate::utils::interner::{self, Symbol};

/// Identifier of a shader class (its interned name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderClassId(Symbol);

impl ShaderClassId {
    #[must_use]
    pub fn name(self) -> &'static str {
        interner::resolve(self.0)
    }

    /// Looks up the id of a class name without interning it.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        interner::get(name).map(Self)
    }
}

type StageList = SmallVec<[Symbol; 8]>;

/// Mutable per-class composition state.
#[derive(Debug, Clone)]
pub struct ShaderClassTable {
    parent: Option<ShaderClassId>,
    base: ClassBase,
    lists: [StageList; Stage::COUNT],
    methods: FxHashMap<Symbol, StageFragments>,
    revision: u64,
}

impl ShaderClassTable {
    fn root(base: ClassBase) -> Self {
        Self {
            parent: None,
            base,
            lists: Default::default(),
            methods: FxHashMap::default(),
            revision: 0,
        }
    }

    /// Capability names of one stage, in registration order.
    #[must_use]
    pub fn stage_list(&self, stage: Stage) -> &[Symbol] {
        &self.lists[stage.index()]
    }

    #[must_use]
    pub fn parent(&self) -> Option<ShaderClassId> {
        self.parent
    }

    #[must_use]
    pub fn base(&self) -> &ClassBase {
        &self.base
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn snapshot(&self, class: ShaderClassId) -> ShaderTable {
        let sources = std::array::from_fn(|i| {
            let stage = Stage::SOURCE[i];
            self.lists[stage.index()]
                .iter()
                .map(|name| {
                    let fragment = self.methods.get(name).and_then(|m| m.source(stage)).cloned();
                    (*name, fragment)
                })
                .collect()
        });
        let prepare = self.lists[Stage::Prepare.index()]
            .iter()
            .filter_map(|name| {
                self.methods
                    .get(name)
                    .and_then(StageFragments::prepare)
                    .map(|p| (*name, p.clone()))
            })
            .collect();

        ShaderTable {
            class,
            revision: self.revision,
            base: self.base.fragments().clone(),
            sources,
            prepare,
        }
    }
}

/// Resolved, immutable view of a class at one revision.
///
/// Instances hold this behind an `Arc`; assembly walks it without touching
/// the registry.
#[derive(Debug)]
pub struct ShaderTable {
    class: ShaderClassId,
    revision: u64,
    base: StageFragments,
    sources: [Vec<(Symbol, Option<SourceFragment>)>; Stage::SOURCE_COUNT],
    prepare: Vec<(Symbol, PrepareFragment)>,
}

impl ShaderTable {
    #[must_use]
    pub fn class(&self) -> ShaderClassId {
        self.class
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn base(&self) -> &StageFragments {
        &self.base
    }

    /// Capability fragments of a source stage in list order. Names without a
    /// fragment for this stage yield `None`.
    pub fn stage(&self, stage: Stage) -> impl Iterator<Item = (Symbol, Option<&SourceFragment>)> {
        let list = if stage.is_source() {
            self.sources[stage.index()].as_slice()
        } else {
            &[]
        };
        list.iter().map(|(name, f)| (*name, f.as_ref()))
    }

    /// Prepare fragments in list order.
    pub fn prepare(&self) -> impl Iterator<Item = &PrepareFragment> {
        self.prepare.iter().map(|(_, p)| p)
    }

    /// Capability names in the given stage, in order.
    #[must_use]
    pub fn names(&self, stage: Stage) -> Vec<&'static str> {
        match stage {
            Stage::Prepare => self.prepare.iter().map(|(n, _)| interner::resolve(*n)).collect(),
            _ => self.sources[stage.index()]
                .iter()
                .map(|(n, _)| interner::resolve(*n))
                .collect(),
        }
    }
}

/// Per-class capability tables.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    classes: FxHashMap<ShaderClassId, ShaderClassTable>,
}

impl CapabilityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines (or redefines) a root class with empty stage lists.
    pub fn define_class(&mut self, name: &str, base: ClassBase) -> ShaderClassId {
        let id = ShaderClassId(interner::intern(name));
        let revision = self.classes.get(&id).map_or(0, |t| t.revision + 1);
        let mut table = ShaderClassTable::root(base);
        table.revision = revision;
        self.classes.insert(id, table);
        log::debug!("Defined shader class '{name}'");
        id
    }

    /// Defines a class whose stage lists start as a copy of `parent`'s, so the
    /// parent's capabilities precede anything registered on the child.
    pub fn derive_class(
        &mut self,
        name: &str,
        parent: ShaderClassId,
        base: ClassBase,
    ) -> Result<ShaderClassId> {
        let parent_table = self
            .classes
            .get(&parent)
            .ok_or_else(|| MosaicError::UnknownShaderClass(parent.name().to_owned()))?;

        let id = ShaderClassId(interner::intern(name));
        let revision = self.classes.get(&id).map_or(0, |t| t.revision + 1);
        let table = ShaderClassTable {
            parent: Some(parent),
            base: ClassBase::inherit(&parent_table.base, &base),
            lists: parent_table.lists.clone(),
            methods: parent_table.methods.clone(),
            revision,
        };
        self.classes.insert(id, table);
        log::debug!("Derived shader class '{name}' from '{}'", parent.name());
        Ok(id)
    }

    #[must_use]
    pub fn class(&self, id: ShaderClassId) -> Option<&ShaderClassTable> {
        self.classes.get(&id)
    }

    #[must_use]
    pub fn class_by_name(&self, name: &str) -> Option<ShaderClassId> {
        ShaderClassId::lookup(name).filter(|id| self.classes.contains_key(id))
    }

    #[must_use]
    pub fn revision(&self, id: ShaderClassId) -> Option<u64> {
        self.classes.get(&id).map(|t| t.revision)
    }

    /// Appends `capability` to every stage list of `class` where it is not
    /// already present, then copies its fragments into the method table.
    pub fn register(&mut self, class: ShaderClassId, capability: &Capability) -> Result<()> {
        let table = self.table_mut(class)?;
        let name = capability.name();

        for list in &mut table.lists {
            if !list.contains(&name) {
                list.push(name);
            }
        }
        table
            .methods
            .entry(name)
            .or_default()
            .overlay(capability.fragments());
        table.revision += 1;

        log::debug!("Registered capability '{}' on '{}'", capability.name_str(), class.name());
        Ok(())
    }

    /// Replaces `old` with `new` at its existing position in every list that
    /// contains `old`, and installs `new`'s fragments.
    ///
    /// Returns the number of lists touched. If `new` is already present in a
    /// list, `old` is dropped from it instead so names stay unique.
    pub fn swap(
        &mut self,
        class: ShaderClassId,
        old: &Capability,
        new: &Capability,
    ) -> Result<usize> {
        let table = self.table_mut(class)?;
        let (old_name, new_name) = (old.name(), new.name());

        let mut touched = 0;
        for list in &mut table.lists {
            let Some(idx) = list.iter().position(|n| *n == old_name) else {
                continue;
            };
            if old_name != new_name && list.contains(&new_name) {
                list.remove(idx);
            } else {
                list[idx] = new_name;
            }
            touched += 1;
        }
        table
            .methods
            .entry(new_name)
            .or_default()
            .overlay(new.fragments());
        table.revision += 1;

        if touched == 0 {
            log::warn!(
                "swap: capability '{}' is not registered on '{}'",
                old.name_str(),
                class.name()
            );
        } else {
            log::debug!(
                "Swapped '{}' for '{}' on '{}' in {touched} stage lists",
                old.name_str(),
                new.name_str(),
                class.name()
            );
        }
        Ok(touched)
    }

    /// Deletes `capability` from every list that contains it. Its fragments
    /// stay in the method table but are no longer reachable.
    pub fn remove(&mut self, class: ShaderClassId, capability: &Capability) -> Result<usize> {
        let table = self.table_mut(class)?;
        let name = capability.name();

        let mut touched = 0;
        for list in &mut table.lists {
            if let Some(idx) = list.iter().position(|n| *n == name) {
                list.remove(idx);
                touched += 1;
            }
        }

        if touched == 0 {
            log::warn!(
                "remove: capability '{}' is not registered on '{}'",
                capability.name_str(),
                class.name()
            );
        } else {
            table.revision += 1;
        }
        Ok(touched)
    }

    /// Resolves the class into an immutable table for instance construction.
    pub fn snapshot(&self, class: ShaderClassId) -> Result<Arc<ShaderTable>> {
        self.classes
            .get(&class)
            .map(|t| Arc::new(t.snapshot(class)))
            .ok_or_else(|| MosaicError::UnknownShaderClass(class.name().to_owned()))
    }

    fn table_mut(&mut self, class: ShaderClassId) -> Result<&mut ShaderClassTable> {
        self.classes
            .get_mut(&class)
            .ok_or_else(|| MosaicError::UnknownShaderClass(class.name().to_owned()))
    }
}
