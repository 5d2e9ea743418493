//! Global string interner
//!
//! Turns capability names, shader class names and uniform semantics into
//! compact integer [`Symbol`]s. Stage lists and uniform tables compare and
//! hash symbols instead of strings.

use std::sync::LazyLock;

use lasso::{Spur, ThreadedRodeo};

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::new);

/// Compact identifier for an interned string.
pub type Symbol = Spur;

/// Interns a string and returns its symbol.
///
/// Returns the existing symbol when the string is already interned.
#[inline]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Looks up the symbol of an already interned string without allocating.
#[inline]
#[must_use]
pub fn get(s: &str) -> Option<Symbol> {
    INTERNER.get(s)
}

/// Resolves a symbol back to its string.
#[inline]
#[must_use]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}

/// Pre-interns the uniform semantics every built-in capability binds, so the
/// first frame does not pay for them on the draw path.
pub fn preload_common_semantics() {
    use crate::program::semantics;

    for name in semantics::ALL {
        intern(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_resolve() {
        let s1 = intern("Decal");
        let s2 = intern("Decal");
        let s3 = intern("Lambert");

        assert_eq!(s1, s2);
        assert_ne!(s1, s3);

        assert_eq!(resolve(s1), "Decal");
        assert_eq!(resolve(s3), "Lambert");
    }

    #[test]
    fn test_get() {
        let _ = intern("existing_capability");

        assert!(get("existing_capability").is_some());
        assert!(get("never_interned_capability").is_none());
    }
}
