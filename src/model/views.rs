//! Typed declaration views.
//!
//! A view binds an arena node id to its snapshot and exposes the query API.
//! Views are cheap copies; equality is (snapshot, id), so two lookups of the
//! same symbol in one snapshot compare equal and views from different
//! snapshots never do. Every accessor dispatches on the node's origin, so
//! symbol-backed and introduced declarations answer the same questions.

use std::sync::Arc;

use crate::base::{DeclId, Location, Name};
use crate::host::{
    Accessibility, AttributeData, ConstValue, HostMethodKind, SymbolPayload, Variance,
};

use super::builders::BuiltDeclaration;
use super::compilation::{AttributeSource, CompilationModel};
use super::declaration::{DeclarationKind, DeclarationNode, DeclarationOrigin};
use super::error::ModelError;
use super::types::Type;

// ============================================================================
// COMMON VIEW PLUMBING
// ============================================================================

macro_rules! decl_ref {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name<'m> {
            pub(crate) model: &'m CompilationModel,
            pub(crate) id: DeclId,
        }

        impl<'m> $name<'m> {
            pub fn id(&self) -> DeclId {
                self.id
            }

            pub fn model(&self) -> &'m CompilationModel {
                self.model
            }

            pub(crate) fn node(&self) -> Arc<DeclarationNode> {
                self.model.node(self.id)
            }

            pub fn kind(&self) -> DeclarationKind {
                self.node().kind
            }

            pub fn origin(&self) -> DeclarationOrigin {
                self.node().origin.clone()
            }

            pub fn name(&self) -> Name {
                let node = self.node();
                self.model.origin_name(&node.origin)
            }

            /// Weak back-reference to the containing declaration.
            pub fn containing_declaration(&self) -> Option<Declaration<'m>> {
                self.node().containing.map(|id| self.model.declaration(id))
            }

            pub fn attributes(&self) -> Vec<AttributeRef<'m>> {
                self.model.attributes_on(self.id)
            }

            pub fn is_introduced(&self) -> bool {
                self.node().origin.is_introduced()
            }
        }

        impl PartialEq for $name<'_> {
            fn eq(&self, other: &Self) -> bool {
                std::ptr::eq(self.model, other.model) && self.id == other.id
            }
        }

        impl Eq for $name<'_> {}
    };
}

decl_ref!(
    /// The compilation root.
    CompilationRef
);
decl_ref!(
    /// A namespace.
    NamespaceRef
);
decl_ref!(
    /// A named type (class, struct, interface, enum, delegate).
    NamedTypeRef
);
decl_ref!(
    /// A method or constructor.
    MethodRef
);
decl_ref!(
    /// A field.
    FieldRef
);
decl_ref!(
    /// A property or indexer.
    PropertyRef
);
decl_ref!(
    /// An event.
    EventRef
);
decl_ref!(
    /// A parameter, including synthesized return parameters.
    ParameterRef
);
decl_ref!(
    /// A generic parameter of a type or method.
    GenericParameterRef
);

/// A declaration of any kind. Exhaustive: adding a kind is a compile error
/// at every dispatch site.
#[derive(Clone, Copy, Debug)]
pub enum Declaration<'m> {
    Compilation(CompilationRef<'m>),
    Namespace(NamespaceRef<'m>),
    NamedType(NamedTypeRef<'m>),
    /// Methods and constructors; `kind()` tells them apart.
    Method(MethodRef<'m>),
    Field(FieldRef<'m>),
    /// Properties and indexers; `kind()` tells them apart.
    Property(PropertyRef<'m>),
    Event(EventRef<'m>),
    Parameter(ParameterRef<'m>),
    GenericParameter(GenericParameterRef<'m>),
}

macro_rules! for_each_declaration {
    ($self:expr, $inner:ident => $body:expr) => {
        match $self {
            Declaration::Compilation($inner) => $body,
            Declaration::Namespace($inner) => $body,
            Declaration::NamedType($inner) => $body,
            Declaration::Method($inner) => $body,
            Declaration::Field($inner) => $body,
            Declaration::Property($inner) => $body,
            Declaration::Event($inner) => $body,
            Declaration::Parameter($inner) => $body,
            Declaration::GenericParameter($inner) => $body,
        }
    };
}

impl<'m> Declaration<'m> {
    pub fn id(&self) -> DeclId {
        for_each_declaration!(self, d => d.id())
    }

    pub fn kind(&self) -> DeclarationKind {
        for_each_declaration!(self, d => d.kind())
    }

    pub fn name(&self) -> Name {
        for_each_declaration!(self, d => d.name())
    }

    pub fn origin(&self) -> DeclarationOrigin {
        for_each_declaration!(self, d => d.origin())
    }

    pub fn containing_declaration(&self) -> Option<Declaration<'m>> {
        for_each_declaration!(self, d => d.containing_declaration())
    }

    pub fn attributes(&self) -> Vec<AttributeRef<'m>> {
        for_each_declaration!(self, d => d.attributes())
    }

    pub fn is_introduced(&self) -> bool {
        for_each_declaration!(self, d => d.is_introduced())
    }

    pub fn as_named_type(&self) -> Option<NamedTypeRef<'m>> {
        match self {
            Declaration::NamedType(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<MethodRef<'m>> {
        match self {
            Declaration::Method(m) => Some(*m),
            _ => None,
        }
    }
}

impl PartialEq for Declaration<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
            && std::ptr::eq(
                for_each_declaration!(self, d => d.model as *const CompilationModel),
                for_each_declaration!(other, d => d.model as *const CompilationModel),
            )
    }
}

impl Eq for Declaration<'_> {}

// ============================================================================
// MEMBER MODIFIER QUERIES (shared by method/field/property/event views)
// ============================================================================

macro_rules! member_modifiers {
    ($name:ident) => {
        impl<'m> $name<'m> {
            pub fn accessibility(&self) -> Accessibility {
                self.modifiers().accessibility
            }

            pub fn is_static(&self) -> bool {
                self.modifiers().is_static
            }

            pub fn is_abstract(&self) -> bool {
                self.modifiers().is_abstract
            }

            pub fn is_virtual(&self) -> bool {
                self.modifiers().is_virtual
            }

            pub fn is_sealed(&self) -> bool {
                self.modifiers().is_sealed
            }

            pub fn is_override(&self) -> bool {
                self.modifiers().is_override
            }

            /// The `new` hiding modifier, derived from declaring syntax
            /// because the host symbol model does not expose it.
            pub fn is_new(&self) -> bool {
                match self.node().origin {
                    DeclarationOrigin::Symbol(sym) => {
                        self.model.host().symbol(sym).has_new_modifier()
                    }
                    _ => false,
                }
            }

            fn modifiers(&self) -> crate::host::MemberModifiers {
                let node = self.node();
                self.model.origin_modifiers(&node.origin).unwrap_or_default()
            }

            /// The type this member is declared on.
            pub fn declaring_type(&self) -> Option<NamedTypeRef<'m>> {
                match self.containing_declaration()? {
                    Declaration::NamedType(t) => Some(t),
                    _ => None,
                }
            }
        }
    };
}

member_modifiers!(MethodRef);
member_modifiers!(FieldRef);
member_modifiers!(PropertyRef);
member_modifiers!(EventRef);

// ============================================================================
// COMPILATION AND NAMESPACE
// ============================================================================

impl<'m> CompilationRef<'m> {
    pub fn declared_types(&self) -> Vec<NamedTypeRef<'m>> {
        self.model.declared_types()
    }
}

impl<'m> NamespaceRef<'m> {
    pub fn qualified_name(&self) -> Name {
        match self.node().origin {
            DeclarationOrigin::Symbol(sym) => self.model.host().qualified_name(sym),
            _ => self.name(),
        }
    }

    /// Types declared directly in this namespace.
    pub fn types(&self) -> Vec<NamedTypeRef<'m>> {
        self.symbol_members(|payload| matches!(payload, SymbolPayload::Type(_)))
            .into_iter()
            .filter_map(|d| d.as_named_type())
            .collect()
    }

    /// Child namespaces.
    pub fn namespaces(&self) -> Vec<NamespaceRef<'m>> {
        self.symbol_members(|payload| matches!(payload, SymbolPayload::Namespace(_)))
            .into_iter()
            .filter_map(|d| match d {
                Declaration::Namespace(ns) => Some(ns),
                _ => None,
            })
            .collect()
    }

    fn symbol_members(&self, filter: impl Fn(&SymbolPayload) -> bool) -> Vec<Declaration<'m>> {
        let DeclarationOrigin::Symbol(sym) = self.node().origin.clone() else {
            return Vec::new();
        };
        let host = self.model.host();
        let data = host.symbol(sym);
        let SymbolPayload::Namespace(ns) = &data.payload else { return Vec::new() };
        ns.members
            .iter()
            .filter(|member| filter(&host.symbol(**member).payload))
            .map(|member| self.model.declaration_for_symbol(*member))
            .collect()
    }
}

// ============================================================================
// NAMED TYPES
// ============================================================================

impl<'m> NamedTypeRef<'m> {
    pub fn qualified_name(&self) -> Name {
        match self.node().origin {
            DeclarationOrigin::Symbol(sym) => self.model.host().qualified_name(sym),
            _ => self.name(),
        }
    }

    fn symbol(&self) -> Option<crate::base::SymbolId> {
        self.node().origin.symbol()
    }

    /// This type as a model type handle.
    pub fn as_type(&self) -> Type {
        let Some(sym) = self.symbol() else {
            // Named types are always symbol-backed: aspects introduce
            // members, not types.
            unreachable!("named type without a backing symbol")
        };
        self.model.wrap_type(self.model.host().named_type_id(sym))
    }

    /// All members, source and introduced, in declaration order with
    /// introductions appended in insertion order.
    pub fn members(&self) -> Vec<Declaration<'m>> {
        let node = self.node();
        let ids = node
            .memos
            .members
            .get_or_init(|| {
                let mut ids = Vec::new();
                if let DeclarationOrigin::Symbol(sym) = &node.origin {
                    let host = self.model.host();
                    let data = host.symbol(*sym);
                    if let SymbolPayload::Type(t) = &data.payload {
                        for member in &t.members {
                            ids.push(self.model.ensure_node(&DeclarationOrigin::Symbol(*member)));
                        }
                    }
                }
                for built in self.model.transformations_for(&node.origin) {
                    if built.kind() != DeclarationKind::Attribute {
                        ids.push(
                            self.model
                                .ensure_node(&DeclarationOrigin::Introduced(Arc::clone(built))),
                        );
                    }
                }
                ids
            })
            .clone();
        ids.into_iter().map(|id| self.model.declaration(id)).collect()
    }

    fn member_host_kind(&self, member: &Declaration<'m>) -> Option<HostMethodKind> {
        match member.origin() {
            DeclarationOrigin::Symbol(sym) => {
                self.model.host().symbol(sym).as_method().map(|m| m.method_kind)
            }
            _ => None,
        }
    }

    /// Ordinary methods: excludes constructors, accessors and local
    /// functions.
    pub fn methods(&self) -> Vec<MethodRef<'m>> {
        self.members()
            .into_iter()
            .filter(|m| m.kind() == DeclarationKind::Method)
            .filter(|m| {
                !matches!(
                    self.member_host_kind(m),
                    Some(
                        HostMethodKind::PropertyGet
                            | HostMethodKind::PropertySet
                            | HostMethodKind::EventAdd
                            | HostMethodKind::EventRemove
                    )
                )
            })
            .filter_map(|m| m.as_method())
            .collect()
    }

    /// Instance constructors.
    pub fn constructors(&self) -> Vec<MethodRef<'m>> {
        self.members()
            .into_iter()
            .filter(|m| m.kind() == DeclarationKind::Constructor)
            .filter(|m| self.member_host_kind(m) != Some(HostMethodKind::StaticConstructor))
            .filter_map(|m| m.as_method())
            .collect()
    }

    pub fn fields(&self) -> Vec<FieldRef<'m>> {
        self.members()
            .into_iter()
            .filter_map(|m| match m {
                Declaration::Field(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    pub fn properties(&self) -> Vec<PropertyRef<'m>> {
        self.members()
            .into_iter()
            .filter_map(|m| match m {
                Declaration::Property(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn events(&self) -> Vec<EventRef<'m>> {
        self.members()
            .into_iter()
            .filter_map(|m| match m {
                Declaration::Event(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    pub fn nested_types(&self) -> Vec<NamedTypeRef<'m>> {
        let node = self.node();
        let ids = node
            .memos
            .nested
            .get_or_init(|| {
                let DeclarationOrigin::Symbol(sym) = &node.origin else { return Vec::new() };
                let host = self.model.host();
                let data = host.symbol(*sym);
                let SymbolPayload::Type(t) = &data.payload else { return Vec::new() };
                t.nested
                    .iter()
                    .map(|nested| self.model.ensure_node(&DeclarationOrigin::Symbol(*nested)))
                    .collect()
            })
            .clone();
        ids.into_iter().map(|id| NamedTypeRef { model: self.model, id }).collect()
    }

    /// Find members by name across all member kinds.
    pub fn members_named(&self, name: &str) -> Vec<Declaration<'m>> {
        self.members().into_iter().filter(|m| m.name() == name).collect()
    }

    pub fn generic_parameters(&self) -> Vec<GenericParameterRef<'m>> {
        let node = self.node();
        let ids = node
            .memos
            .generic_params
            .get_or_init(|| {
                let DeclarationOrigin::Symbol(sym) = &node.origin else { return Vec::new() };
                let host = self.model.host();
                let data = host.symbol(*sym);
                let SymbolPayload::Type(t) = &data.payload else { return Vec::new() };
                t.type_params
                    .iter()
                    .map(|p| self.model.ensure_node(&DeclarationOrigin::Symbol(*p)))
                    .collect()
            })
            .clone();
        ids.into_iter().map(|id| GenericParameterRef { model: self.model, id }).collect()
    }

    /// Bound generic arguments; for an unbound definition, the parameters
    /// themselves as generic-parameter types.
    pub fn generic_arguments(&self) -> Vec<Type> {
        let Some(sym) = self.symbol() else { return Vec::new() };
        let host = self.model.host();
        let data = host.symbol(sym);
        let Some(type_sym) = data.as_type() else { return Vec::new() };
        if !type_sym.type_args.is_empty() {
            type_sym.type_args.iter().map(|a| self.model.wrap_type(*a)).collect()
        } else {
            type_sym
                .type_params
                .iter()
                .map(|p| {
                    self.model
                        .wrap_type(host.intern_type(crate::host::HostType::GenericParameter(*p)))
                })
                .collect()
        }
    }

    pub fn base_type(&self) -> Option<Type> {
        let sym = self.symbol()?;
        let base = self.model.host().symbol(sym).as_type()?.base?;
        Some(self.model.wrap_type(base))
    }

    /// Implemented interfaces, transitively flattened, memoized.
    pub fn implemented_interfaces(&self) -> Vec<Type> {
        let node = self.node();
        node.memos
            .interfaces
            .get_or_init(|| {
                let Some(sym) = node.origin.symbol() else { return Vec::new() };
                let host = self.model.host();
                host.all_interfaces(host.named_type_id(sym))
            })
            .iter()
            .map(|raw| self.model.wrap_type(*raw))
            .collect()
    }

    /// True while any generic argument is itself unbound.
    pub fn is_open_generic(&self) -> bool {
        let Some(sym) = self.symbol() else { return false };
        self.model.type_is_open(self.model.host().named_type_id(sym))
    }

    /// Whether the type can be constructed with `new T()`: a struct, a type
    /// with no declared instance constructor (the implicit default), or one
    /// with an accessible parameterless constructor.
    pub fn has_default_constructor(&self) -> bool {
        let Some(sym) = self.symbol() else { return false };
        let host = self.model.host();
        let data = host.symbol(sym);
        let Some(type_sym) = data.as_type() else { return false };
        if type_sym.kind == crate::host::TypeDefKind::Struct {
            return true;
        }
        if type_sym.kind != crate::host::TypeDefKind::Class || type_sym.is_abstract {
            return false;
        }
        let constructors = self.constructors();
        constructors.is_empty()
            || constructors.iter().any(|c| {
                c.parameters().is_empty() && c.accessibility() == Accessibility::Public
            })
    }

    /// Bind generic arguments via the host's instantiation rule. Never
    /// mutates the receiver; zero arguments on a non-generic type is an
    /// identity operation.
    pub fn with_generic_arguments(&self, args: &[Type]) -> Result<NamedTypeRef<'m>, ModelError> {
        let Some(sym) = self.symbol() else {
            return Err(ModelError::unsupported("named type without a backing symbol"));
        };
        let host = self.model.host();
        let is_generic = host
            .symbol(sym)
            .as_type()
            .map(|t| !t.type_params.is_empty() && t.type_args.is_empty())
            .unwrap_or(false);
        if args.is_empty() && !is_generic {
            return Ok(*self);
        }
        for arg in args {
            if matches!(host.host_type(arg.raw), crate::host::HostType::Ref { .. }) {
                return Err(ModelError::invalid_argument(
                    "by-ref types cannot be generic arguments",
                ));
            }
        }
        let raw_args: Vec<_> = args.iter().map(|a| a.raw).collect();
        let constructed = host.construct_generic(sym, &raw_args).ok_or_else(|| {
            ModelError::invalid_argument(format!(
                "cannot construct '{}' with {} type argument(s)",
                self.qualified_name(),
                args.len()
            ))
        })?;
        match host.host_type(constructed) {
            crate::host::HostType::Named(constructed_sym) => self.model.named_type(constructed_sym),
            _ => Err(ModelError::unsupported("generic construction produced a non-named type")),
        }
    }
}

// ============================================================================
// METHODS
// ============================================================================

/// Method kinds the model represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Default,
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
}

impl<'m> MethodRef<'m> {
    fn host_method(&self) -> Option<(crate::base::SymbolId, crate::host::MethodSymbol)> {
        let DeclarationOrigin::Symbol(sym) = self.node().origin else { return None };
        self.model.host().symbol(sym).as_method().map(|m| (sym, m.clone()))
    }

    fn built_method(&self) -> Option<(Arc<BuiltDeclaration>, crate::model::builders::BuiltMethod)> {
        let DeclarationOrigin::Introduced(built) = self.node().origin.clone() else { return None };
        let method = built.as_method()?.clone();
        Some((built, method))
    }

    /// The model method kind, mapped from the host's enumeration.
    ///
    /// Host kinds with no clean model representation (anonymous functions,
    /// builtin operators, delegate invoke, reduced extension methods,
    /// function-pointer signatures) are rejected as internal errors: user
    /// code can never reach them through the model's public surface.
    pub fn method_kind(&self) -> Result<MethodKind, ModelError> {
        let Some((_, method)) = self.host_method() else {
            return Ok(MethodKind::Default);
        };
        match method.method_kind {
            HostMethodKind::Ordinary => Ok(MethodKind::Default),
            HostMethodKind::Constructor => Ok(MethodKind::Constructor),
            HostMethodKind::StaticConstructor => Ok(MethodKind::StaticConstructor),
            HostMethodKind::PropertyGet => Ok(MethodKind::PropertyGet),
            HostMethodKind::PropertySet => Ok(MethodKind::PropertySet),
            HostMethodKind::EventAdd => Ok(MethodKind::EventAdd),
            HostMethodKind::EventRemove => Ok(MethodKind::EventRemove),
            HostMethodKind::UserOperator => Ok(MethodKind::UserOperator),
            HostMethodKind::Conversion => Ok(MethodKind::Conversion),
            HostMethodKind::LocalFunction => Ok(MethodKind::LocalFunction),
            HostMethodKind::Finalizer => Ok(MethodKind::Finalizer),
            unsupported @ (HostMethodKind::AnonymousFunction
            | HostMethodKind::BuiltinOperator
            | HostMethodKind::DelegateInvoke
            | HostMethodKind::ReducedExtension
            | HostMethodKind::FunctionPointerSignature) => Err(ModelError::unsupported(format!(
                "method kind {unsupported:?} has no code model representation"
            ))),
        }
    }

    pub fn return_type(&self) -> Type {
        if let Some((_, method)) = self.host_method() {
            return self.model.wrap_type(method.return_type);
        }
        if let Some((_, method)) = self.built_method() {
            return self.model.wrap_type(method.return_type);
        }
        self.model.dynamic_type()
    }

    pub fn returns_void(&self) -> bool {
        self.model.host().is_void(self.return_type().raw)
    }

    /// The synthesized return parameter; `None` for constructors.
    pub fn return_parameter(&self) -> Option<ParameterRef<'m>> {
        if self.kind() == DeclarationKind::Constructor {
            return None;
        }
        let origin = match self.node().origin.clone() {
            DeclarationOrigin::Symbol(sym) => DeclarationOrigin::SymbolReturn(sym),
            DeclarationOrigin::Introduced(built) => DeclarationOrigin::IntroducedReturn(built),
            _ => return None,
        };
        let id = self.model.ensure_node(&origin);
        Some(ParameterRef { model: self.model, id })
    }

    /// Ordered parameters.
    pub fn parameters(&self) -> Vec<ParameterRef<'m>> {
        let node = self.node();
        let ids = node
            .memos
            .parameters
            .get_or_init(|| match &node.origin {
                DeclarationOrigin::Symbol(sym) => {
                    let host = self.model.host();
                    match host.symbol(*sym).as_method() {
                        Some(method) => method
                            .params
                            .iter()
                            .map(|p| self.model.ensure_node(&DeclarationOrigin::Symbol(*p)))
                            .collect(),
                        None => Vec::new(),
                    }
                }
                DeclarationOrigin::Introduced(built) => match built.as_method() {
                    Some(method) => (0..method.params.len())
                        .map(|index| {
                            self.model.ensure_node(&DeclarationOrigin::IntroducedParameter {
                                owner: Arc::clone(built),
                                index: index as u32,
                            })
                        })
                        .collect(),
                    None => Vec::new(),
                },
                _ => Vec::new(),
            })
            .clone();
        ids.into_iter().map(|id| ParameterRef { model: self.model, id }).collect()
    }

    pub fn generic_parameters(&self) -> Vec<GenericParameterRef<'m>> {
        let node = self.node();
        let ids = node
            .memos
            .generic_params
            .get_or_init(|| {
                let DeclarationOrigin::Symbol(sym) = &node.origin else { return Vec::new() };
                match self.model.host().symbol(*sym).as_method() {
                    Some(method) => method
                        .type_params
                        .iter()
                        .map(|p| self.model.ensure_node(&DeclarationOrigin::Symbol(*p)))
                        .collect(),
                    None => Vec::new(),
                }
            })
            .clone();
        ids.into_iter().map(|id| GenericParameterRef { model: self.model, id }).collect()
    }

    /// Local functions discovered in the method body's declaring syntax.
    /// One level only: nested local functions belong to their enclosing
    /// local function.
    pub fn local_functions(&self) -> Vec<MethodRef<'m>> {
        let node = self.node();
        let ids = node
            .memos
            .local_functions
            .get_or_init(|| {
                let DeclarationOrigin::Symbol(sym) = &node.origin else { return Vec::new() };
                match self.model.host().declaring_syntax(*sym) {
                    Some(syntax) => syntax
                        .local_functions
                        .iter()
                        .map(|f| self.model.ensure_node(&DeclarationOrigin::Symbol(*f)))
                        .collect(),
                    None => Vec::new(),
                }
            })
            .clone();
        ids.into_iter().map(|id| MethodRef { model: self.model, id }).collect()
    }
}

// ============================================================================
// FIELDS, PROPERTIES, EVENTS
// ============================================================================

impl<'m> FieldRef<'m> {
    pub fn ty(&self) -> Type {
        match self.node().origin.clone() {
            DeclarationOrigin::Symbol(sym) => {
                match &self.model.host().symbol(sym).payload {
                    SymbolPayload::Field(f) => self.model.wrap_type(f.ty),
                    _ => self.model.dynamic_type(),
                }
            }
            DeclarationOrigin::Introduced(built) => match &*built {
                BuiltDeclaration::Field(f) => self.model.wrap_type(f.ty),
                _ => self.model.dynamic_type(),
            },
            _ => self.model.dynamic_type(),
        }
    }
}

impl<'m> PropertyRef<'m> {
    pub fn ty(&self) -> Type {
        match self.node().origin.clone() {
            DeclarationOrigin::Symbol(sym) => match &self.model.host().symbol(sym).payload {
                SymbolPayload::Property(p) => self.model.wrap_type(p.ty),
                _ => self.model.dynamic_type(),
            },
            DeclarationOrigin::Introduced(built) => match &*built {
                BuiltDeclaration::Property(p) => self.model.wrap_type(p.ty),
                _ => self.model.dynamic_type(),
            },
            _ => self.model.dynamic_type(),
        }
    }

    pub fn is_indexer(&self) -> bool {
        self.kind() == DeclarationKind::Indexer
    }

    /// The getter accessor method. Introduced properties have no accessor
    /// methods until the linker emits them; use [`Self::has_getter`].
    pub fn getter(&self) -> Option<MethodRef<'m>> {
        self.accessor(|p| p.getter)
    }

    /// The setter accessor method. See [`Self::getter`] for introduced
    /// properties.
    pub fn setter(&self) -> Option<MethodRef<'m>> {
        self.accessor(|p| p.setter)
    }

    pub fn has_getter(&self) -> bool {
        match self.node().origin.clone() {
            DeclarationOrigin::Introduced(built) => match &*built {
                BuiltDeclaration::Property(p) => p.has_getter,
                _ => false,
            },
            _ => self.getter().is_some(),
        }
    }

    pub fn has_setter(&self) -> bool {
        match self.node().origin.clone() {
            DeclarationOrigin::Introduced(built) => match &*built {
                BuiltDeclaration::Property(p) => p.has_setter,
                _ => false,
            },
            _ => self.setter().is_some(),
        }
    }

    fn accessor(
        &self,
        from_symbol: impl Fn(&crate::host::PropertySymbol) -> Option<crate::base::SymbolId>,
    ) -> Option<MethodRef<'m>> {
        let DeclarationOrigin::Symbol(sym) = self.node().origin else { return None };
        match &self.model.host().symbol(sym).payload {
            SymbolPayload::Property(p) => {
                let accessor = from_symbol(p)?;
                self.model.method(accessor).ok()
            }
            _ => None,
        }
    }

    pub fn index_parameters(&self) -> Vec<ParameterRef<'m>> {
        let node = self.node();
        let ids = node
            .memos
            .parameters
            .get_or_init(|| {
                let DeclarationOrigin::Symbol(sym) = &node.origin else { return Vec::new() };
                match &self.model.host().symbol(*sym).payload {
                    SymbolPayload::Property(p) => p
                        .index_params
                        .iter()
                        .map(|param| self.model.ensure_node(&DeclarationOrigin::Symbol(*param)))
                        .collect(),
                    _ => Vec::new(),
                }
            })
            .clone();
        ids.into_iter().map(|id| ParameterRef { model: self.model, id }).collect()
    }
}

impl<'m> EventRef<'m> {
    pub fn ty(&self) -> Type {
        match self.node().origin.clone() {
            DeclarationOrigin::Symbol(sym) => match &self.model.host().symbol(sym).payload {
                SymbolPayload::Event(e) => self.model.wrap_type(e.ty),
                _ => self.model.dynamic_type(),
            },
            DeclarationOrigin::Introduced(built) => match &*built {
                BuiltDeclaration::Event(e) => self.model.wrap_type(e.ty),
                _ => self.model.dynamic_type(),
            },
            _ => self.model.dynamic_type(),
        }
    }

    pub fn adder(&self) -> Option<MethodRef<'m>> {
        let DeclarationOrigin::Symbol(sym) = self.node().origin else { return None };
        match &self.model.host().symbol(sym).payload {
            SymbolPayload::Event(e) => self.model.method(e.adder?).ok(),
            _ => None,
        }
    }

    pub fn remover(&self) -> Option<MethodRef<'m>> {
        let DeclarationOrigin::Symbol(sym) = self.node().origin else { return None };
        match &self.model.host().symbol(sym).payload {
            SymbolPayload::Event(e) => self.model.method(e.remover?).ok(),
            _ => None,
        }
    }
}

// ============================================================================
// PARAMETERS AND GENERIC PARAMETERS
// ============================================================================

impl<'m> ParameterRef<'m> {
    /// Whether this is a synthesized return parameter.
    pub fn is_return_parameter(&self) -> bool {
        matches!(
            self.node().origin,
            DeclarationOrigin::SymbolReturn(_) | DeclarationOrigin::IntroducedReturn(_)
        )
    }

    pub fn ty(&self) -> Type {
        let host = self.model.host();
        match self.node().origin.clone() {
            DeclarationOrigin::Symbol(sym) => match &host.symbol(sym).payload {
                SymbolPayload::Parameter(p) => self.model.wrap_type(p.ty),
                _ => self.model.dynamic_type(),
            },
            DeclarationOrigin::SymbolReturn(method) => match host.symbol(method).as_method() {
                Some(m) => self.model.wrap_type(m.return_type),
                None => self.model.dynamic_type(),
            },
            DeclarationOrigin::IntroducedParameter { owner, index } => {
                match owner.as_method().and_then(|m| m.params.get(index as usize)) {
                    Some(p) => self.model.wrap_type(p.ty),
                    None => self.model.dynamic_type(),
                }
            }
            DeclarationOrigin::IntroducedReturn(owner) => match owner.as_method() {
                Some(m) => self.model.wrap_type(m.return_type),
                None => self.model.dynamic_type(),
            },
            _ => self.model.dynamic_type(),
        }
    }

    /// Zero-based position; `None` for return parameters.
    pub fn index(&self) -> Option<u32> {
        match self.node().origin.clone() {
            DeclarationOrigin::Symbol(sym) => {
                self.model.host().symbol(sym).as_parameter().map(|p| p.index)
            }
            DeclarationOrigin::IntroducedParameter { index, .. } => Some(index),
            _ => None,
        }
    }

    pub fn default_value(&self) -> Option<ConstValue> {
        match self.node().origin.clone() {
            DeclarationOrigin::Symbol(sym) => {
                self.model.host().symbol(sym).as_parameter().and_then(|p| p.default.clone())
            }
            DeclarationOrigin::IntroducedParameter { owner, index } => owner
                .as_method()
                .and_then(|m| m.params.get(index as usize))
                .and_then(|p| p.default.clone()),
            _ => None,
        }
    }

    pub fn has_default(&self) -> bool {
        self.default_value().is_some()
    }
}

impl<'m> GenericParameterRef<'m> {
    pub fn index(&self) -> u32 {
        let DeclarationOrigin::Symbol(sym) = self.node().origin else { return 0 };
        match &self.model.host().symbol(sym).payload {
            SymbolPayload::GenericParameter(gp) => gp.index,
            _ => 0,
        }
    }

    pub fn variance(&self) -> Variance {
        let DeclarationOrigin::Symbol(sym) = self.node().origin else {
            return Variance::Invariant;
        };
        match &self.model.host().symbol(sym).payload {
            SymbolPayload::GenericParameter(gp) => gp.variance,
            _ => Variance::Invariant,
        }
    }

    pub fn constraints(&self) -> Vec<Type> {
        let DeclarationOrigin::Symbol(sym) = self.node().origin else { return Vec::new() };
        match &self.model.host().symbol(sym).payload {
            SymbolPayload::GenericParameter(gp) => {
                gp.constraints.iter().map(|c| self.model.wrap_type(*c)).collect()
            }
            _ => Vec::new(),
        }
    }
}

// ============================================================================
// ATTRIBUTES
// ============================================================================

/// A translated attribute argument value.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(Name),
    Enum { ty: Type, value: i64 },
    Type(Type),
    Array(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Translate a host constant recursively: primitives and enums pass
    /// through, type constants become model types, arrays recurse.
    pub(crate) fn from_const(model: &CompilationModel, value: &ConstValue) -> Self {
        match value {
            ConstValue::Null => Self::Null,
            ConstValue::Bool(b) => Self::Bool(*b),
            ConstValue::Int(i) => Self::Int(*i),
            ConstValue::Double(d) => Self::Double(*d),
            ConstValue::Str(s) => Self::String(s.clone()),
            ConstValue::Enum { ty, value } => {
                Self::Enum { ty: model.wrap_type(*ty), value: *value }
            }
            ConstValue::Type(ty) => Self::Type(model.wrap_type(*ty)),
            ConstValue::Array(items) => {
                Self::Array(items.iter().map(|item| Self::from_const(model, item)).collect())
            }
        }
    }
}

/// One attribute application: a value view keyed by the decorated
/// declaration and the application's source.
#[derive(Clone)]
pub struct AttributeRef<'m> {
    pub(crate) model: &'m CompilationModel,
    pub(crate) owner: DeclId,
    pub(crate) source: AttributeSource,
}

impl<'m> AttributeRef<'m> {
    /// The declaration this attribute decorates.
    pub fn target(&self) -> Declaration<'m> {
        self.model.declaration(self.owner)
    }

    pub fn kind(&self) -> DeclarationKind {
        DeclarationKind::Attribute
    }

    /// The raw application data.
    pub fn data(&self) -> AttributeData {
        match &self.source {
            AttributeSource::Direct(index) => {
                let node = self.model.node(self.owner);
                let index = *index as usize;
                match &node.origin {
                    DeclarationOrigin::Symbol(sym) => {
                        self.model.host().symbol(*sym).attributes[index].clone()
                    }
                    DeclarationOrigin::Introduced(built) => built.attributes()[index].clone(),
                    DeclarationOrigin::IntroducedParameter { owner, index: param } => owner
                        .as_method()
                        .and_then(|m| m.params.get(*param as usize))
                        .map(|p| p.attributes[index].clone())
                        // The index came from this parameter's list.
                        .unwrap_or_else(|| {
                            unreachable!("introduced parameter attribute out of range")
                        }),
                    _ => unreachable!("attribute on a declaration without an attribute list"),
                }
            }
            AttributeSource::Introduced(built) => match &**built {
                BuiltDeclaration::Attribute(a) => a.data.clone(),
                _ => unreachable!("introduced attribute source is not an attribute"),
            },
        }
    }

    /// The attribute's type.
    pub fn attr_type(&self) -> Type {
        self.model.wrap_type(self.data().attr_type)
    }

    /// The constructor used by the application, when resolved.
    pub fn constructor(&self) -> Option<MethodRef<'m>> {
        self.model.method(self.data().constructor?).ok()
    }

    /// Positional constructor arguments, recursively translated.
    pub fn constructor_arguments(&self) -> Vec<AttributeValue> {
        self.data()
            .ctor_args
            .iter()
            .map(|v| AttributeValue::from_const(self.model, v))
            .collect()
    }

    /// Named arguments, recursively translated, in source order.
    pub fn named_arguments(&self) -> Vec<(Name, AttributeValue)> {
        self.data()
            .named_args
            .iter()
            .map(|(n, v)| (n.clone(), AttributeValue::from_const(self.model, v)))
            .collect()
    }

    pub fn location(&self) -> Option<Location> {
        self.data().location
    }
}

impl CompilationModel {
    /// Attributes on a declaration: its own list plus any introduced onto it.
    pub(crate) fn attributes_on(&self, id: DeclId) -> Vec<AttributeRef<'_>> {
        let node = self.node(id);
        let direct = match &node.origin {
            DeclarationOrigin::Symbol(sym) => self.host().symbol(*sym).attributes.len(),
            DeclarationOrigin::Introduced(built) => built.attributes().len(),
            DeclarationOrigin::IntroducedParameter { owner, index } => owner
                .as_method()
                .and_then(|m| m.params.get(*index as usize))
                .map(|p| p.attributes.len())
                .unwrap_or(0),
            _ => 0,
        };
        let mut out: Vec<AttributeRef<'_>> = (0..direct)
            .map(|i| AttributeRef {
                model: self,
                owner: id,
                source: AttributeSource::Direct(i as u32),
            })
            .collect();
        for built in self.transformations_for(&node.origin) {
            if matches!(&**built, BuiltDeclaration::Attribute(_)) {
                out.push(AttributeRef {
                    model: self,
                    owner: id,
                    source: AttributeSource::Introduced(Arc::clone(built)),
                });
            }
        }
        out
    }
}
