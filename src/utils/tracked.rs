//! Value-compared change tracking.
//!
//! [`Tracked`] pairs a value with a revision that only advances when an edit
//! leaves the value different from before. Material fingerprints are built
//! from these revisions, so writing the same parameters again does not force
//! a uniform re-upload.

use std::ops::{Deref, DerefMut};

#[derive(Debug, Clone, Default)]
pub struct Tracked<T> {
    value: T,
    revision: u64,
}

impl<T: PartialEq + Clone> Tracked<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self { value, revision: 0 }
    }

    #[must_use]
    pub fn get(&self) -> &T {
        &self.value
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replaces the value. Returns whether it changed.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.revision = self.revision.wrapping_add(1);
        true
    }

    /// Scoped mutable access, compared against a snapshot when dropped.
    pub fn edit(&mut self) -> Edit<'_, T> {
        let before = self.value.clone();
        Edit { tracked: self, before }
    }
}

/// Guard returned by [`Tracked::edit`].
pub struct Edit<'a, T: PartialEq + Clone> {
    tracked: &'a mut Tracked<T>,
    before: T,
}

impl<T: PartialEq + Clone> Deref for Edit<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.tracked.value
    }
}

impl<T: PartialEq + Clone> DerefMut for Edit<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.tracked.value
    }
}

impl<T: PartialEq + Clone> Drop for Edit<'_, T> {
    fn drop(&mut self) {
        if self.tracked.value != self.before {
            self.tracked.revision = self.tracked.revision.wrapping_add(1);
        }
    }
}
