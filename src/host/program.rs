//! Fluent construction of a host compilation.
//!
//! [`ProgramBuilder`] assembles the symbol and type arenas the way a real
//! host's binder would have populated them. Used by tests and demos; the
//! builder pre-seeds the `System` namespace with the special types.

use rustc_hash::FxHashMap;

use crate::base::{Name, SymbolId, TypeId, qualify};

use super::compilation::HostCompilation;
use super::constant::ConstValue;
use super::symbol::{
    Accessibility, AttributeData, EventSymbol, FieldSymbol, GenericParameterSymbol,
    HostMethodKind, MemberModifiers, MethodSymbol, NamespaceSymbol, ParameterSymbol,
    PropertySymbol, SymbolData, SymbolPayload, SyntaxInfo, TypeDefKind, TypeSymbol,
};
use super::types::{HostType, SpecialType};

pub struct ProgramBuilder {
    symbols: Vec<SymbolData>,
    types: Vec<HostType>,
    type_intern: FxHashMap<HostType, TypeId>,
    by_qualified_name: FxHashMap<Name, SymbolId>,
    namespaces: FxHashMap<Name, SymbolId>,
    qnames: FxHashMap<SymbolId, Name>,
    special: FxHashMap<SpecialType, TypeId>,
    global: SymbolId,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            symbols: Vec::new(),
            types: Vec::new(),
            type_intern: FxHashMap::default(),
            by_qualified_name: FxHashMap::default(),
            namespaces: FxHashMap::default(),
            qnames: FxHashMap::default(),
            special: FxHashMap::default(),
            global: SymbolId::new(0),
        };
        builder.global = builder.alloc(SymbolData {
            name: Name::default(),
            containing: None,
            attributes: Vec::new(),
            syntax: None,
            payload: SymbolPayload::Namespace(NamespaceSymbol::default()),
        });
        builder.namespaces.insert(Name::default(), builder.global);
        builder.seed_special_types();
        builder
    }

    fn seed_special_types(&mut self) {
        let system = self.namespace("System");
        // Object first so the others can use it as their base.
        let object = self.type_def(system, "Object", TypeDefKind::Class);
        let object_ty = self.named_type(object);
        self.special.insert(SpecialType::Object, object_ty);

        for special in SpecialType::ALL {
            if special == SpecialType::Object {
                continue;
            }
            let kind = match special {
                SpecialType::String => TypeDefKind::Class,
                _ => TypeDefKind::Struct,
            };
            let name = special
                .qualified_name()
                .rsplit('.')
                .next()
                .unwrap_or(special.qualified_name());
            let sym = self.type_def(system, name, kind);
            if let SymbolPayload::Type(t) = &mut self.symbols[sym.index()].payload {
                t.special = Some(special);
            }
            let ty = self.named_type(sym);
            self.special.insert(special, ty);
        }
        if let SymbolPayload::Type(t) = &mut self.symbols[object.index()].payload {
            t.special = Some(SpecialType::Object);
            t.base = None;
        }
    }

    fn alloc(&mut self, data: SymbolData) -> SymbolId {
        let id = SymbolId::new(self.symbols.len());
        self.symbols.push(data);
        id
    }

    fn intern(&mut self, shape: HostType) -> TypeId {
        if let Some(existing) = self.type_intern.get(&shape) {
            return *existing;
        }
        let id = TypeId::new(self.types.len());
        self.types.push(shape);
        self.type_intern.insert(shape, id);
        id
    }

    fn qname_of(&self, sym: SymbolId) -> Name {
        self.qnames.get(&sym).cloned().unwrap_or_default()
    }

    // ========================================================================
    // NAMESPACES AND TYPES
    // ========================================================================

    /// Get or create a namespace chain like `Acme.Billing`.
    pub fn namespace(&mut self, qualified: &str) -> SymbolId {
        let mut current = self.global;
        let mut path = Name::default();
        for part in qualified.split('.').filter(|p| !p.is_empty()) {
            path = qualify(&path, part, false);
            current = if let Some(existing) = self.namespaces.get(&path).copied() {
                existing
            } else {
                let ns = self.alloc(SymbolData {
                    name: Name::new(part),
                    containing: Some(current),
                    attributes: Vec::new(),
                    syntax: None,
                    payload: SymbolPayload::Namespace(NamespaceSymbol::default()),
                });
                self.push_namespace_member(current, ns);
                self.namespaces.insert(path.clone(), ns);
                self.qnames.insert(ns, path.clone());
                ns
            };
        }
        current
    }

    fn push_namespace_member(&mut self, ns: SymbolId, member: SymbolId) {
        if let SymbolPayload::Namespace(n) = &mut self.symbols[ns.index()].payload {
            n.members.push(member);
        }
    }

    fn type_def(&mut self, container: SymbolId, name: &str, kind: TypeDefKind) -> SymbolId {
        let object = self.special.get(&SpecialType::Object).copied();
        let base = match kind {
            TypeDefKind::Interface => None,
            _ => object,
        };
        let nested = matches!(self.symbols[container.index()].payload, SymbolPayload::Type(_));
        let sym = self.alloc(SymbolData {
            name: Name::new(name),
            containing: Some(container),
            attributes: Vec::new(),
            syntax: None,
            payload: SymbolPayload::Type(TypeSymbol {
                kind,
                base,
                is_abstract: kind == TypeDefKind::Interface,
                ..TypeSymbol::default()
            }),
        });
        let qname = qualify(&self.qname_of(container), name, nested);
        self.by_qualified_name.insert(qname.clone(), sym);
        self.qnames.insert(sym, qname);
        match &mut self.symbols[container.index()].payload {
            SymbolPayload::Namespace(n) => n.members.push(sym),
            SymbolPayload::Type(t) => t.nested.push(sym),
            _ => {}
        }
        sym
    }

    pub fn class(&mut self, container: SymbolId, name: &str) -> SymbolId {
        self.type_def(container, name, TypeDefKind::Class)
    }

    pub fn interface(&mut self, container: SymbolId, name: &str) -> SymbolId {
        self.type_def(container, name, TypeDefKind::Interface)
    }

    pub fn struct_def(&mut self, container: SymbolId, name: &str) -> SymbolId {
        self.type_def(container, name, TypeDefKind::Struct)
    }

    pub fn enum_def(&mut self, container: SymbolId, name: &str) -> SymbolId {
        self.type_def(container, name, TypeDefKind::Enum)
    }

    pub fn set_base(&mut self, ty: SymbolId, base: TypeId) {
        if let SymbolPayload::Type(t) = &mut self.symbols[ty.index()].payload {
            t.base = Some(base);
        }
    }

    pub fn add_interface(&mut self, ty: SymbolId, iface: TypeId) {
        if let SymbolPayload::Type(t) = &mut self.symbols[ty.index()].payload {
            t.interfaces.push(iface);
        }
    }

    pub fn set_type_modifiers(&mut self, ty: SymbolId, is_static: bool, is_abstract: bool, is_sealed: bool) {
        if let SymbolPayload::Type(t) = &mut self.symbols[ty.index()].payload {
            t.is_static = is_static;
            t.is_abstract = is_abstract;
            t.is_sealed = is_sealed;
        }
    }

    // ========================================================================
    // MEMBERS
    // ========================================================================

    fn push_type_member(&mut self, owner: SymbolId, member: SymbolId) {
        if let SymbolPayload::Type(t) = &mut self.symbols[owner.index()].payload {
            t.members.push(member);
        }
    }

    pub fn method(&mut self, owner: SymbolId, name: &str, return_type: TypeId) -> SymbolId {
        self.method_of_kind(owner, name, return_type, HostMethodKind::Ordinary)
    }

    pub fn method_of_kind(
        &mut self,
        owner: SymbolId,
        name: &str,
        return_type: TypeId,
        method_kind: HostMethodKind,
    ) -> SymbolId {
        let sym = self.alloc(SymbolData {
            name: Name::new(name),
            containing: Some(owner),
            attributes: Vec::new(),
            syntax: None,
            payload: SymbolPayload::Method(MethodSymbol {
                method_kind,
                modifiers: MemberModifiers::public_instance(),
                params: Vec::new(),
                return_type,
                type_params: Vec::new(),
            }),
        });
        self.push_type_member(owner, sym);
        sym
    }

    pub fn constructor(&mut self, owner: SymbolId) -> SymbolId {
        let void = self.void_ty();
        self.method_of_kind(owner, ".ctor", void, HostMethodKind::Constructor)
    }

    pub fn static_constructor(&mut self, owner: SymbolId) -> SymbolId {
        let void = self.void_ty();
        let sym = self.method_of_kind(owner, ".cctor", void, HostMethodKind::StaticConstructor);
        self.set_static(sym, true);
        sym
    }

    /// Declare a local function inside a method body. Local functions live in
    /// syntax, not in the type's member list.
    pub fn local_function(&mut self, method: SymbolId, name: &str, return_type: TypeId) -> SymbolId {
        let sym = self.alloc(SymbolData {
            name: Name::new(name),
            containing: Some(method),
            attributes: Vec::new(),
            syntax: None,
            payload: SymbolPayload::Method(MethodSymbol {
                method_kind: HostMethodKind::LocalFunction,
                modifiers: MemberModifiers::public_instance(),
                params: Vec::new(),
                return_type,
                type_params: Vec::new(),
            }),
        });
        self.symbols[method.index()]
            .syntax
            .get_or_insert_with(SyntaxInfo::default)
            .local_functions
            .push(sym);
        sym
    }

    pub fn param(&mut self, method: SymbolId, name: &str, ty: TypeId) -> SymbolId {
        let index = match self.symbols[method.index()].payload {
            SymbolPayload::Method(ref m) => m.params.len() as u32,
            _ => 0,
        };
        let sym = self.alloc(SymbolData {
            name: Name::new(name),
            containing: Some(method),
            attributes: Vec::new(),
            syntax: None,
            payload: SymbolPayload::Parameter(ParameterSymbol { ty, index, default: None }),
        });
        if let SymbolPayload::Method(m) = &mut self.symbols[method.index()].payload {
            m.params.push(sym);
        }
        sym
    }

    pub fn param_with_default(
        &mut self,
        method: SymbolId,
        name: &str,
        ty: TypeId,
        default: ConstValue,
    ) -> SymbolId {
        let sym = self.param(method, name, ty);
        if let SymbolPayload::Parameter(p) = &mut self.symbols[sym.index()].payload {
            p.default = Some(default);
        }
        sym
    }

    /// Declare a generic parameter on a type or method.
    pub fn generic_param(&mut self, owner: SymbolId, name: &str) -> SymbolId {
        let index = match &self.symbols[owner.index()].payload {
            SymbolPayload::Type(t) => t.type_params.len() as u32,
            SymbolPayload::Method(m) => m.type_params.len() as u32,
            _ => 0,
        };
        let sym = self.alloc(SymbolData {
            name: Name::new(name),
            containing: Some(owner),
            attributes: Vec::new(),
            syntax: None,
            payload: SymbolPayload::GenericParameter(GenericParameterSymbol {
                index,
                variance: Default::default(),
                constraints: Vec::new(),
            }),
        });
        match &mut self.symbols[owner.index()].payload {
            SymbolPayload::Type(t) => t.type_params.push(sym),
            SymbolPayload::Method(m) => m.type_params.push(sym),
            _ => {}
        }
        sym
    }

    pub fn add_constraint(&mut self, generic_param: SymbolId, constraint: TypeId) {
        if let SymbolPayload::GenericParameter(gp) = &mut self.symbols[generic_param.index()].payload {
            gp.constraints.push(constraint);
        }
    }

    pub fn field(&mut self, owner: SymbolId, name: &str, ty: TypeId) -> SymbolId {
        let sym = self.alloc(SymbolData {
            name: Name::new(name),
            containing: Some(owner),
            attributes: Vec::new(),
            syntax: None,
            payload: SymbolPayload::Field(FieldSymbol {
                ty,
                modifiers: MemberModifiers::public_instance(),
            }),
        });
        self.push_type_member(owner, sym);
        sym
    }

    /// Declare a property with auto-created get/set accessor methods.
    pub fn property(&mut self, owner: SymbolId, name: &str, ty: TypeId) -> SymbolId {
        self.property_def(owner, name, ty, false)
    }

    /// Declare an indexer; add index parameters with [`Self::indexer_param`].
    pub fn indexer(&mut self, owner: SymbolId, ty: TypeId) -> SymbolId {
        self.property_def(owner, "this[]", ty, true)
    }

    fn property_def(&mut self, owner: SymbolId, name: &str, ty: TypeId, is_indexer: bool) -> SymbolId {
        let getter = self.method_of_kind(owner, &format!("get_{name}"), ty, HostMethodKind::PropertyGet);
        let void = self.void_ty();
        let setter = self.method_of_kind(owner, &format!("set_{name}"), void, HostMethodKind::PropertySet);
        let sym = self.alloc(SymbolData {
            name: Name::new(name),
            containing: Some(owner),
            attributes: Vec::new(),
            syntax: None,
            payload: SymbolPayload::Property(PropertySymbol {
                ty,
                modifiers: MemberModifiers::public_instance(),
                is_indexer,
                index_params: Vec::new(),
                getter: Some(getter),
                setter: Some(setter),
            }),
        });
        self.push_type_member(owner, sym);
        sym
    }

    pub fn indexer_param(&mut self, indexer: SymbolId, name: &str, ty: TypeId) -> SymbolId {
        let index = match &self.symbols[indexer.index()].payload {
            SymbolPayload::Property(p) => p.index_params.len() as u32,
            _ => 0,
        };
        let sym = self.alloc(SymbolData {
            name: Name::new(name),
            containing: Some(indexer),
            attributes: Vec::new(),
            syntax: None,
            payload: SymbolPayload::Parameter(ParameterSymbol { ty, index, default: None }),
        });
        if let SymbolPayload::Property(p) = &mut self.symbols[indexer.index()].payload {
            p.index_params.push(sym);
        }
        sym
    }

    pub fn event(&mut self, owner: SymbolId, name: &str, ty: TypeId) -> SymbolId {
        let void = self.void_ty();
        let adder = self.method_of_kind(owner, &format!("add_{name}"), void, HostMethodKind::EventAdd);
        let remover = self.method_of_kind(owner, &format!("remove_{name}"), void, HostMethodKind::EventRemove);
        let sym = self.alloc(SymbolData {
            name: Name::new(name),
            containing: Some(owner),
            attributes: Vec::new(),
            syntax: None,
            payload: SymbolPayload::Event(EventSymbol {
                ty,
                modifiers: MemberModifiers::public_instance(),
                adder: Some(adder),
                remover: Some(remover),
            }),
        });
        self.push_type_member(owner, sym);
        sym
    }

    // ========================================================================
    // MODIFIERS, SYNTAX AND ATTRIBUTES
    // ========================================================================

    fn modifiers_mut(&mut self, member: SymbolId) -> Option<&mut MemberModifiers> {
        match &mut self.symbols[member.index()].payload {
            SymbolPayload::Method(m) => Some(&mut m.modifiers),
            SymbolPayload::Field(f) => Some(&mut f.modifiers),
            SymbolPayload::Property(p) => Some(&mut p.modifiers),
            SymbolPayload::Event(e) => Some(&mut e.modifiers),
            _ => None,
        }
    }

    pub fn set_static(&mut self, member: SymbolId, value: bool) {
        if let Some(m) = self.modifiers_mut(member) {
            m.is_static = value;
        }
    }

    pub fn set_virtual(&mut self, member: SymbolId, value: bool) {
        if let Some(m) = self.modifiers_mut(member) {
            m.is_virtual = value;
        }
    }

    pub fn set_override(&mut self, member: SymbolId, value: bool) {
        if let Some(m) = self.modifiers_mut(member) {
            m.is_override = value;
        }
    }

    pub fn set_accessibility(&mut self, member: SymbolId, accessibility: Accessibility) {
        if let Some(m) = self.modifiers_mut(member) {
            m.accessibility = accessibility;
        }
    }

    /// Record the `new` hiding modifier on the member's declaring syntax.
    pub fn mark_new(&mut self, member: SymbolId) {
        self.symbols[member.index()]
            .syntax
            .get_or_insert_with(SyntaxInfo::default)
            .has_new_modifier = true;
    }

    pub fn set_location(&mut self, symbol: SymbolId, location: crate::base::Location) {
        self.symbols[symbol.index()]
            .syntax
            .get_or_insert_with(SyntaxInfo::default)
            .location = Some(location);
    }

    pub fn attribute(&mut self, target: SymbolId, data: AttributeData) {
        self.symbols[target.index()].attributes.push(data);
    }

    // ========================================================================
    // TYPES
    // ========================================================================

    pub fn named_type(&mut self, sym: SymbolId) -> TypeId {
        self.intern(HostType::Named(sym))
    }

    pub fn generic_param_type(&mut self, sym: SymbolId) -> TypeId {
        self.intern(HostType::GenericParameter(sym))
    }

    pub fn array_of(&mut self, element: TypeId, rank: u8) -> TypeId {
        self.intern(HostType::Array { element, rank })
    }

    pub fn pointer_to(&mut self, pointee: TypeId) -> TypeId {
        self.intern(HostType::Pointer { pointee })
    }

    pub fn ref_of(&mut self, referent: TypeId) -> TypeId {
        self.intern(HostType::Ref { referent })
    }

    pub fn dynamic_ty(&mut self) -> TypeId {
        self.intern(HostType::Dynamic)
    }

    fn special_ty(&self, special: SpecialType) -> TypeId {
        self.special[&special]
    }

    pub fn void_ty(&self) -> TypeId {
        self.special_ty(SpecialType::Void)
    }

    pub fn object_ty(&self) -> TypeId {
        self.special_ty(SpecialType::Object)
    }

    pub fn string_ty(&self) -> TypeId {
        self.special_ty(SpecialType::String)
    }

    pub fn bool_ty(&self) -> TypeId {
        self.special_ty(SpecialType::Boolean)
    }

    pub fn int_ty(&self) -> TypeId {
        self.special_ty(SpecialType::Int32)
    }

    pub fn long_ty(&self) -> TypeId {
        self.special_ty(SpecialType::Int64)
    }

    pub fn double_ty(&self) -> TypeId {
        self.special_ty(SpecialType::Double)
    }

    // ========================================================================
    // FINISH
    // ========================================================================

    /// Freeze the arenas into an immutable host compilation.
    pub fn finish(self) -> HostCompilation {
        let top_level: Vec<SymbolId> = self
            .symbols
            .iter()
            .enumerate()
            .filter_map(|(i, data)| {
                let id = SymbolId::new(i);
                let is_type = matches!(data.payload, SymbolPayload::Type(_));
                let in_namespace = data
                    .containing
                    .map(|c| matches!(self.symbols[c.index()].payload, SymbolPayload::Namespace(_)))
                    .unwrap_or(false);
                (is_type && in_namespace).then_some(id)
            })
            .collect();
        tracing::debug!(
            symbols = self.symbols.len(),
            types = self.types.len(),
            top_level = top_level.len(),
            "host compilation frozen"
        );
        HostCompilation::from_parts(
            self.symbols,
            self.types,
            self.type_intern,
            self.by_qualified_name,
            self.special,
            top_level,
        )
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_special_types() {
        let host = ProgramBuilder::new().finish();
        let object = host.find_type_by_qualified_name("System.Object");
        assert!(object.is_some());
        assert!(host.special_type(SpecialType::Void).is_some());
        assert!(host.is_void(host.special_type(SpecialType::Void).unwrap()));
    }

    #[test]
    fn test_qualified_names() {
        let mut p = ProgramBuilder::new();
        let ns = p.namespace("Acme.Billing");
        let invoice = p.class(ns, "Invoice");
        let line = p.class(invoice, "Line");
        let host = p.finish();
        assert_eq!(host.qualified_name(invoice), "Acme.Billing.Invoice");
        assert_eq!(host.qualified_name(line), "Acme.Billing.Invoice+Line");
        assert_eq!(host.find_type_by_qualified_name("Acme.Billing.Invoice+Line"), Some(line));
    }

    #[test]
    fn test_construct_generic_interns() {
        let mut p = ProgramBuilder::new();
        let ns = p.namespace("Acme");
        let list = p.class(ns, "List");
        p.generic_param(list, "T");
        let int_ty = p.int_ty();
        let host = p.finish();

        let a = host.construct_generic(list, &[int_ty]).unwrap();
        let b = host.construct_generic(list, &[int_ty]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_construct_generic_arity_mismatch() {
        let mut p = ProgramBuilder::new();
        let ns = p.namespace("Acme");
        let list = p.class(ns, "List");
        p.generic_param(list, "T");
        let int_ty = p.int_ty();
        let string_ty = p.string_ty();
        let host = p.finish();

        assert!(host.construct_generic(list, &[int_ty, string_ty]).is_none());
        assert!(host.construct_generic(list, &[]).is_none());
    }

    #[test]
    fn test_implicit_conversion_base_chain() {
        let mut p = ProgramBuilder::new();
        let ns = p.namespace("Acme");
        let base = p.class(ns, "Animal");
        let base_ty = p.named_type(base);
        let derived = p.class(ns, "Dog");
        p.set_base(derived, base_ty);
        let derived_ty = p.named_type(derived);
        let object_ty = p.object_ty();
        let host = p.finish();

        assert!(host.is_implicitly_convertible(derived_ty, base_ty));
        assert!(host.is_implicitly_convertible(derived_ty, object_ty));
        assert!(!host.is_implicitly_convertible(base_ty, derived_ty));
    }

    #[test]
    fn test_implicit_conversion_interfaces() {
        let mut p = ProgramBuilder::new();
        let ns = p.namespace("Acme");
        let disposable = p.interface(ns, "IDisposable");
        let disposable_ty = p.named_type(disposable);
        let resource = p.class(ns, "Resource");
        p.add_interface(resource, disposable_ty);
        let resource_ty = p.named_type(resource);
        let host = p.finish();

        assert!(host.is_implicitly_convertible(resource_ty, disposable_ty));
    }
}
