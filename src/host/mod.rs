//! Host-compiler facade.
//!
//! The host compiler's parser and binder are external collaborators: the code
//! model only ever consumes the semantic surface defined here — symbol
//! lookups, symbol equality, attribute data, declaring-syntax facts, implicit
//! conversion tests, generic construction and special-type lookup. The
//! in-memory [`HostCompilation`] stands in for a real host's semantic
//! snapshot; [`ProgramBuilder`] assembles one for tests and demos.

mod compilation;
mod constant;
mod program;
mod symbol;
mod types;

pub use compilation::HostCompilation;
pub use constant::ConstValue;
pub use program::ProgramBuilder;
pub use symbol::{
    Accessibility, AttributeData, EventSymbol, FieldSymbol, GenericParameterSymbol,
    HostMethodKind, MemberModifiers, MethodSymbol, NamespaceSymbol, ParameterSymbol,
    PropertySymbol, SymbolData, SymbolPayload, SyntaxInfo, TypeDefKind, TypeSymbol, Variance,
};
pub use types::{HostType, SpecialType};
