//! Utility Module
//!
//! - [`interner`]: String interning for capability, class and uniform names
//! - [`tracked`]: Value-compared revisions behind material fingerprints
//!
//! # String Interning
//!
//! Capability names are interned once at registration time. Stage lists then
//! hold [`Symbol`]s, which compare in O(1).
//!
//! ```rust,ignore
//! use mosaic::utils::interner;
//!
//! let a = interner::intern("Lambert");
//! let b = interner::intern("Lambert");
//! assert_eq!(a, b);
//! ```

pub mod interner;
pub mod tracked;

pub use tracked::{Edit, Tracked};
pub use interner::Symbol;
