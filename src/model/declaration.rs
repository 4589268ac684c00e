//! Declaration kinds, origins and arena nodes.
//!
//! A declaration is either backed by a host symbol or introduced by an
//! aspect. The origin is the snapshot-independent identity; the arena node
//! (one per origin per snapshot) carries the kind, the containment
//! back-reference and the lazily computed facts.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::base::{DeclId, MemoCell, SymbolId, TypeId};

use super::builders::BuiltDeclaration;

/// The kind of a declaration node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Compilation,
    Namespace,
    NamedType,
    Method,
    Constructor,
    Field,
    Property,
    Indexer,
    Event,
    Parameter,
    GenericParameter,
    Attribute,
}

impl DeclarationKind {
    pub fn display(&self) -> &'static str {
        match self {
            Self::Compilation => "compilation",
            Self::Namespace => "namespace",
            Self::NamedType => "type",
            Self::Method => "method",
            Self::Constructor => "constructor",
            Self::Field => "field",
            Self::Property => "property",
            Self::Indexer => "indexer",
            Self::Event => "event",
            Self::Parameter => "parameter",
            Self::GenericParameter => "generic parameter",
            Self::Attribute => "attribute",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

/// Snapshot-independent identity of a declaration.
///
/// Symbol-backed origins compare by symbol id; introduced origins compare by
/// the identity of their built descriptor.
#[derive(Clone, Debug)]
pub enum DeclarationOrigin {
    /// The compilation root.
    Compilation,
    /// A host symbol.
    Symbol(SymbolId),
    /// The return slot of a host method (no symbol of its own).
    SymbolReturn(SymbolId),
    /// An aspect-introduced declaration.
    Introduced(Arc<BuiltDeclaration>),
    /// A parameter of an introduced method or indexer.
    IntroducedParameter { owner: Arc<BuiltDeclaration>, index: u32 },
    /// The return slot of an introduced method.
    IntroducedReturn(Arc<BuiltDeclaration>),
}

impl DeclarationOrigin {
    pub fn is_introduced(&self) -> bool {
        matches!(
            self,
            Self::Introduced(_) | Self::IntroducedParameter { .. } | Self::IntroducedReturn(_)
        )
    }

    /// The backing symbol, for symbol-backed origins.
    pub fn symbol(&self) -> Option<SymbolId> {
        match self {
            Self::Symbol(sym) | Self::SymbolReturn(sym) => Some(*sym),
            _ => None,
        }
    }
}

impl PartialEq for DeclarationOrigin {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Compilation, Self::Compilation) => true,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::SymbolReturn(a), Self::SymbolReturn(b)) => a == b,
            (Self::Introduced(a), Self::Introduced(b)) => Arc::ptr_eq(a, b),
            (
                Self::IntroducedParameter { owner: a, index: i },
                Self::IntroducedParameter { owner: b, index: j },
            ) => Arc::ptr_eq(a, b) && i == j,
            (Self::IntroducedReturn(a), Self::IntroducedReturn(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for DeclarationOrigin {}

impl Hash for DeclarationOrigin {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Compilation => {}
            Self::Symbol(sym) | Self::SymbolReturn(sym) => sym.hash(state),
            Self::Introduced(built) | Self::IntroducedReturn(built) => {
                (Arc::as_ptr(built) as usize).hash(state);
            }
            Self::IntroducedParameter { owner, index } => {
                (Arc::as_ptr(owner) as usize).hash(state);
                index.hash(state);
            }
        }
    }
}

/// Lazily computed facts attached to a node. Each cell is computed at most
/// once per snapshot.
#[derive(Debug, Default)]
pub(crate) struct NodeMemos {
    /// All members of a named type (source and introduced), in order.
    pub members: MemoCell<Vec<DeclId>>,
    /// Nested types of a named type.
    pub nested: MemoCell<Vec<DeclId>>,
    /// Parameters of a method or indexer.
    pub parameters: MemoCell<Vec<DeclId>>,
    /// Generic parameters of a type or method.
    pub generic_params: MemoCell<Vec<DeclId>>,
    /// Transitively flattened implemented interfaces of a named type.
    pub interfaces: MemoCell<Vec<TypeId>>,
    /// One-level local functions of a method body.
    pub local_functions: MemoCell<Vec<DeclId>>,
}

/// One declaration node in a snapshot's arena.
#[derive(Debug)]
pub struct DeclarationNode {
    pub kind: DeclarationKind,
    pub origin: DeclarationOrigin,
    /// Containing declaration (weak back-reference, never owning).
    pub containing: Option<DeclId>,
    pub(crate) memos: NodeMemos,
}

impl DeclarationNode {
    pub fn new(kind: DeclarationKind, origin: DeclarationOrigin, containing: Option<DeclId>) -> Self {
        Self { kind, origin, containing, memos: NodeMemos::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_origin_equality() {
        let a = DeclarationOrigin::Symbol(SymbolId::new(3));
        let b = DeclarationOrigin::Symbol(SymbolId::new(3));
        let c = DeclarationOrigin::SymbolReturn(SymbolId::new(3));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(DeclarationKind::GenericParameter.to_string(), "generic parameter");
    }
}
