//! Foundation types for the Weft code model.
//!
//! This module provides fundamental types used throughout the engine:
//! - [`SymbolId`], [`TypeId`], [`DeclId`] - Arena identifiers
//! - [`Name`] - Interned name type
//! - [`Span`], [`Location`] - Source positions for diagnostics
//! - [`MemoCell`] - Thread-safe compute-once cells
//!
//! This module has NO dependencies on other weft modules.

mod ids;
mod memo;
mod span;

pub use ids::{DeclId, SymbolId, TypeId};
pub use memo::MemoCell;
pub use span::{Location, Span};

/// An interned name - cheap to clone, inline for short strings.
pub type Name = smol_str::SmolStr;

/// Join a containing qualified name with a member name.
///
/// Namespaces and members join with `.`; nested types join with `+`
/// (the reflection-name convention).
pub fn qualify(container: &str, member: &str, nested_type: bool) -> Name {
    if container.is_empty() {
        return Name::new(member);
    }
    let sep = if nested_type { '+' } else { '.' };
    Name::new(format!("{container}{sep}{member}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualify_namespace_member() {
        assert_eq!(qualify("Acme.Billing", "Invoice", false), "Acme.Billing.Invoice");
    }

    #[test]
    fn test_qualify_nested_type() {
        assert_eq!(qualify("Acme.Invoice", "Line", true), "Acme.Invoice+Line");
    }

    #[test]
    fn test_qualify_empty_container() {
        assert_eq!(qualify("", "Global", false), "Global");
    }
}
