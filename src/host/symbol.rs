//! Host symbol records.
//!
//! One [`SymbolData`] per declaration the host knows about, with a payload
//! per symbol kind. Symbol equality is [`crate::base::SymbolId`] equality:
//! insensitive to superficial syntax, sensitive to distinct generic
//! instantiations (constructed types are interned as distinct symbols).

use crate::base::{Location, Name, SymbolId, TypeId};

use super::constant::ConstValue;
use super::types::SpecialType;

// ============================================================================
// MODIFIERS
// ============================================================================

/// Member accessibility.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Accessibility {
    Private,
    Protected,
    Internal,
    ProtectedInternal,
    #[default]
    Public,
}

impl Accessibility {
    pub fn display(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Protected => "protected",
            Self::Internal => "internal",
            Self::ProtectedInternal => "protected internal",
            Self::Public => "public",
        }
    }
}

/// Modifier flags shared by all member kinds.
///
/// `new` is intentionally absent: the host symbol model does not expose it,
/// so the code model derives it from declaring syntax (see [`SyntaxInfo`]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemberModifiers {
    pub accessibility: Accessibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_virtual: bool,
    pub is_sealed: bool,
    pub is_override: bool,
}

impl MemberModifiers {
    pub fn public_instance() -> Self {
        Self::default()
    }

    pub fn public_static() -> Self {
        Self { is_static: true, ..Self::default() }
    }
}

/// Generic parameter variance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Variance {
    #[default]
    Invariant,
    Covariant,
    Contravariant,
}

// ============================================================================
// METHOD KINDS
// ============================================================================

/// The host's method-kind enumeration, verbatim.
///
/// The code model maps these to its own kinds and rejects the tail entries
/// (anonymous functions onward), which have no clean model representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostMethodKind {
    Ordinary,
    Constructor,
    StaticConstructor,
    PropertyGet,
    PropertySet,
    EventAdd,
    EventRemove,
    UserOperator,
    Conversion,
    LocalFunction,
    Finalizer,
    AnonymousFunction,
    BuiltinOperator,
    DelegateInvoke,
    ReducedExtension,
    FunctionPointerSignature,
}

// ============================================================================
// SYNTAX FACTS
// ============================================================================

/// Facts only visible on a symbol's declaring syntax, not on the symbol.
#[derive(Clone, Debug, Default)]
pub struct SyntaxInfo {
    /// The `new` hiding modifier.
    pub has_new_modifier: bool,
    /// Local functions declared directly in a method body (one level only;
    /// nested local functions belong to their enclosing local function).
    pub local_functions: Vec<SymbolId>,
    /// Declaring location, when known.
    pub location: Option<Location>,
}

// ============================================================================
// ATTRIBUTE APPLICATIONS
// ============================================================================

/// One attribute application on a symbol.
#[derive(Clone, Debug)]
pub struct AttributeData {
    /// The attribute's type.
    pub attr_type: TypeId,
    /// The constructor used, when resolved.
    pub constructor: Option<SymbolId>,
    /// Positional constructor arguments.
    pub ctor_args: Vec<ConstValue>,
    /// Named arguments (property/field assignments), in source order.
    pub named_args: Vec<(Name, ConstValue)>,
    /// The application's source location.
    pub location: Option<Location>,
}

impl AttributeData {
    pub fn new(attr_type: TypeId) -> Self {
        Self {
            attr_type,
            constructor: None,
            ctor_args: Vec::new(),
            named_args: Vec::new(),
            location: None,
        }
    }

    pub fn named_arg(&self, name: &str) -> Option<&ConstValue> {
        self.named_args.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn with_constructor(mut self, constructor: SymbolId) -> Self {
        self.constructor = Some(constructor);
        self
    }

    pub fn with_arg(mut self, value: ConstValue) -> Self {
        self.ctor_args.push(value);
        self
    }

    pub fn with_named(mut self, name: impl Into<Name>, value: ConstValue) -> Self {
        self.named_args.push((name.into(), value));
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

// ============================================================================
// SYMBOL PAYLOADS
// ============================================================================

/// What kind of type definition a type symbol is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TypeDefKind {
    #[default]
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
}

#[derive(Clone, Debug, Default)]
pub struct NamespaceSymbol {
    /// Child namespaces and types, in declaration order.
    pub members: Vec<SymbolId>,
}

#[derive(Clone, Debug, Default)]
pub struct TypeSymbol {
    pub kind: TypeDefKind,
    pub accessibility: Accessibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_sealed: bool,
    /// Declared generic parameters (empty for non-generic types).
    pub type_params: Vec<SymbolId>,
    /// Bound generic arguments (empty for definitions; one per parameter for
    /// constructed types).
    pub type_args: Vec<TypeId>,
    /// The definition this constructed type was instantiated from.
    pub definition: Option<SymbolId>,
    pub base: Option<TypeId>,
    /// Directly implemented interfaces (not flattened).
    pub interfaces: Vec<TypeId>,
    /// Members in declaration order: methods, constructors, fields,
    /// properties, events.
    pub members: Vec<SymbolId>,
    /// Nested types in declaration order.
    pub nested: Vec<SymbolId>,
    /// Marks well-known types (void, object, string, ...).
    pub special: Option<SpecialType>,
}

#[derive(Clone, Debug)]
pub struct MethodSymbol {
    pub method_kind: HostMethodKind,
    pub modifiers: MemberModifiers,
    pub params: Vec<SymbolId>,
    pub return_type: TypeId,
    pub type_params: Vec<SymbolId>,
}

#[derive(Clone, Debug)]
pub struct FieldSymbol {
    pub ty: TypeId,
    pub modifiers: MemberModifiers,
}

#[derive(Clone, Debug)]
pub struct PropertySymbol {
    pub ty: TypeId,
    pub modifiers: MemberModifiers,
    pub is_indexer: bool,
    /// Indexer parameters; empty for ordinary properties.
    pub index_params: Vec<SymbolId>,
    pub getter: Option<SymbolId>,
    pub setter: Option<SymbolId>,
}

#[derive(Clone, Debug)]
pub struct EventSymbol {
    pub ty: TypeId,
    pub modifiers: MemberModifiers,
    pub adder: Option<SymbolId>,
    pub remover: Option<SymbolId>,
}

#[derive(Clone, Debug)]
pub struct ParameterSymbol {
    pub ty: TypeId,
    /// Zero-based position in the parameter list.
    pub index: u32,
    pub default: Option<ConstValue>,
}

#[derive(Clone, Debug)]
pub struct GenericParameterSymbol {
    /// Zero-based position in the generic parameter list.
    pub index: u32,
    pub variance: Variance,
    /// Type constraints, sourced from syntax when absent on the symbol.
    pub constraints: Vec<TypeId>,
}

/// Kind-specific symbol payload.
#[derive(Clone, Debug)]
pub enum SymbolPayload {
    Namespace(NamespaceSymbol),
    Type(TypeSymbol),
    Method(MethodSymbol),
    Field(FieldSymbol),
    Property(PropertySymbol),
    Event(EventSymbol),
    Parameter(ParameterSymbol),
    GenericParameter(GenericParameterSymbol),
}

/// One symbol record in the host arena.
#[derive(Clone, Debug)]
pub struct SymbolData {
    pub name: Name,
    pub containing: Option<SymbolId>,
    pub attributes: Vec<AttributeData>,
    pub syntax: Option<SyntaxInfo>,
    pub payload: SymbolPayload,
}

impl SymbolData {
    pub fn kind_name(&self) -> &'static str {
        match &self.payload {
            SymbolPayload::Namespace(_) => "namespace",
            SymbolPayload::Type(_) => "type",
            SymbolPayload::Method(_) => "method",
            SymbolPayload::Field(_) => "field",
            SymbolPayload::Property(_) => "property",
            SymbolPayload::Event(_) => "event",
            SymbolPayload::Parameter(_) => "parameter",
            SymbolPayload::GenericParameter(_) => "generic parameter",
        }
    }

    pub fn as_type(&self) -> Option<&TypeSymbol> {
        match &self.payload {
            SymbolPayload::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodSymbol> {
        match &self.payload {
            SymbolPayload::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_parameter(&self) -> Option<&ParameterSymbol> {
        match &self.payload {
            SymbolPayload::Parameter(p) => Some(p),
            _ => None,
        }
    }

    /// The `new` modifier, visible only on declaring syntax.
    pub fn has_new_modifier(&self) -> bool {
        self.syntax.as_ref().is_some_and(|s| s.has_new_modifier)
    }
}
