//! Program Cache & Uniform-Write Suppressor
//!
//! - [`ProgramCache`]: compiles, dedupes, activates and releases programs
//! - [`UniformLocation`]: per-location generation bookkeeping
//! - [`ProgramBinder`]: handed to Prepare fragments after link
//! - [`UniformWriter`]: material-facing uniform upload handle

pub mod binder;
pub mod cache;
pub mod semantics;
pub mod uniform;
pub mod writer;

pub use binder::{LightSlot, ProgramBinder};
pub use cache::{CompiledProgram, ProgramCache, ProgramStats, UniformWrite};
pub use uniform::UniformLocation;
pub use writer::{UniformTarget, UniformWriter};

slotmap::new_key_type! {
    /// Handle of a linked program in the [`ProgramCache`].
    pub struct ProgramId;
}
