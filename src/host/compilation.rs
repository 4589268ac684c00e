//! The host semantic snapshot.
//!
//! [`HostCompilation`] owns the symbol and type arenas and answers the
//! semantic queries the code model consumes: lookup by qualified name,
//! implicit conversion, generic construction, special-type lookup and
//! declaring-syntax facts. Generic construction interns new constructed-type
//! symbols on demand, so the arenas sit behind locks; published snapshots are
//! otherwise immutable.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::base::{Name, SymbolId, TypeId};

use super::symbol::{SymbolData, SymbolPayload, SyntaxInfo, TypeSymbol};
use super::types::{HostType, SpecialType};

pub struct HostCompilation {
    symbols: RwLock<Vec<Arc<SymbolData>>>,
    types: RwLock<Vec<HostType>>,
    type_intern: RwLock<FxHashMap<HostType, TypeId>>,
    /// Interned constructed generics: (definition, args) → constructed symbol.
    constructed: RwLock<FxHashMap<(SymbolId, Vec<TypeId>), SymbolId>>,
    by_qualified_name: FxHashMap<Name, SymbolId>,
    special: FxHashMap<SpecialType, TypeId>,
    /// Types directly contained in namespaces, in declaration discovery order.
    top_level: Vec<SymbolId>,
}

impl HostCompilation {
    pub(super) fn from_parts(
        symbols: Vec<SymbolData>,
        types: Vec<HostType>,
        type_intern: FxHashMap<HostType, TypeId>,
        by_qualified_name: FxHashMap<Name, SymbolId>,
        special: FxHashMap<SpecialType, TypeId>,
        top_level: Vec<SymbolId>,
    ) -> Self {
        Self {
            symbols: RwLock::new(symbols.into_iter().map(Arc::new).collect()),
            types: RwLock::new(types),
            type_intern: RwLock::new(type_intern),
            constructed: RwLock::new(FxHashMap::default()),
            by_qualified_name,
            special,
            top_level,
        }
    }

    // ========================================================================
    // SYMBOL ACCESS
    // ========================================================================

    /// Get a symbol record. The id must come from this compilation.
    pub fn symbol(&self, id: SymbolId) -> Arc<SymbolData> {
        Arc::clone(&self.symbols.read()[id.index()])
    }

    /// Get a symbol record, or `None` for a foreign id.
    pub fn get_symbol(&self, id: SymbolId) -> Option<Arc<SymbolData>> {
        self.symbols.read().get(id.index()).cloned()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.read().len()
    }

    /// The fully qualified name of a namespace, type or member symbol.
    ///
    /// Namespaces and members join with `.`; nested types join with `+`.
    pub fn qualified_name(&self, id: SymbolId) -> Name {
        let data = self.symbol(id);
        let Some(container) = data.containing else {
            return data.name.clone();
        };
        let container_data = self.symbol(container);
        let container_name = self.qualified_name(container);
        if container_name.is_empty() {
            return data.name.clone();
        }
        let nested = matches!(container_data.payload, SymbolPayload::Type(_))
            && matches!(data.payload, SymbolPayload::Type(_));
        crate::base::qualify(&container_name, &data.name, nested)
    }

    /// Resolve a type by its registered qualified name.
    pub fn find_type_by_qualified_name(&self, name: &str) -> Option<SymbolId> {
        let found = self.by_qualified_name.get(name).copied();
        tracing::trace!(name, found = found.is_some(), "host type lookup");
        found
    }

    /// Declaring-syntax facts for a symbol, when the host has them.
    pub fn declaring_syntax(&self, id: SymbolId) -> Option<SyntaxInfo> {
        self.symbol(id).syntax.clone()
    }

    /// Types directly contained in namespaces, in discovery order.
    pub fn top_level_types(&self) -> &[SymbolId] {
        &self.top_level
    }

    // ========================================================================
    // TYPE ACCESS
    // ========================================================================

    /// Get the shape of an interned type.
    pub fn host_type(&self, id: TypeId) -> HostType {
        self.types.read()[id.index()]
    }

    /// Intern a type shape, returning the canonical id.
    pub fn intern_type(&self, shape: HostType) -> TypeId {
        if let Some(existing) = self.type_intern.read().get(&shape) {
            return *existing;
        }
        let mut intern = self.type_intern.write();
        if let Some(existing) = intern.get(&shape) {
            return *existing;
        }
        let mut types = self.types.write();
        let id = TypeId::new(types.len());
        types.push(shape);
        intern.insert(shape, id);
        id
    }

    /// The interned `Named` type for a type symbol.
    pub fn named_type_id(&self, symbol: SymbolId) -> TypeId {
        self.intern_type(HostType::Named(symbol))
    }

    pub fn dynamic_type(&self) -> TypeId {
        self.intern_type(HostType::Dynamic)
    }

    pub fn special_type(&self, special: SpecialType) -> Option<TypeId> {
        self.special.get(&special).copied()
    }

    pub fn is_void(&self, ty: TypeId) -> bool {
        self.special_type(SpecialType::Void) == Some(ty)
    }

    /// Render a type for messages and generated syntax.
    pub fn display_type(&self, ty: TypeId) -> String {
        match self.host_type(ty) {
            HostType::Named(sym) => {
                let data = self.symbol(sym);
                if let Some(type_sym) = data.as_type() {
                    if let Some(special) = type_sym.special {
                        return special.keyword().to_string();
                    }
                    if !type_sym.type_args.is_empty() {
                        let args: Vec<String> =
                            type_sym.type_args.iter().map(|a| self.display_type(*a)).collect();
                        return format!("{}<{}>", self.qualified_name(sym), args.join(", "));
                    }
                }
                self.qualified_name(sym).to_string()
            }
            HostType::Array { element, rank } => {
                let commas = ",".repeat(rank.saturating_sub(1) as usize);
                format!("{}[{}]", self.display_type(element), commas)
            }
            HostType::Pointer { pointee } => format!("{}*", self.display_type(pointee)),
            HostType::GenericParameter(sym) => self.symbol(sym).name.to_string(),
            HostType::Dynamic => "dynamic".to_string(),
            HostType::Ref { referent } => format!("ref {}", self.display_type(referent)),
        }
    }

    // ========================================================================
    // SEMANTIC QUERIES
    // ========================================================================

    /// The host's generic instantiation rule.
    ///
    /// Returns `None` when `definition` is not an open generic definition,
    /// when the arity does not match, or when any argument slot is unresolved
    /// — a partially-invalid type is never constructed.
    pub fn construct_generic(&self, definition: SymbolId, args: &[TypeId]) -> Option<TypeId> {
        let def_data = self.symbol(definition);
        let def_type = def_data.as_type()?;
        if def_type.type_params.is_empty() || !def_type.type_args.is_empty() {
            return None;
        }
        if def_type.type_params.len() != args.len() {
            return None;
        }

        let key = (definition, args.to_vec());
        if let Some(existing) = self.constructed.read().get(&key) {
            return Some(self.named_type_id(*existing));
        }

        let mut constructed = self.constructed.write();
        if let Some(existing) = constructed.get(&key) {
            return Some(self.named_type_id(*existing));
        }

        let instantiated = SymbolData {
            name: def_data.name.clone(),
            containing: def_data.containing,
            attributes: def_data.attributes.clone(),
            syntax: def_data.syntax.clone(),
            payload: SymbolPayload::Type(TypeSymbol {
                type_args: args.to_vec(),
                definition: Some(definition),
                ..def_type.clone()
            }),
        };
        let id = {
            let mut symbols = self.symbols.write();
            let id = SymbolId::new(symbols.len());
            symbols.push(Arc::new(instantiated));
            id
        };
        constructed.insert(key, id);
        tracing::trace!(definition = %definition, constructed = %id, "interned constructed generic");
        Some(self.named_type_id(id))
    }

    /// Implicit-convertibility test.
    pub fn is_implicitly_convertible(&self, from: TypeId, to: TypeId) -> bool {
        if from == to {
            return true;
        }
        let object = self.special_type(SpecialType::Object);
        match (self.host_type(from), self.host_type(to)) {
            (HostType::Dynamic, _) | (_, HostType::Dynamic) => true,
            (HostType::Ref { .. }, _) | (_, HostType::Ref { .. }) => false,
            (HostType::Named(_), HostType::Named(_)) => {
                if Some(to) == object {
                    return true;
                }
                self.base_chain(from).contains(&to) || self.all_interfaces(from).contains(&to)
            }
            (HostType::Array { element: e1, rank: r1 }, HostType::Array { element: e2, rank: r2 }) => {
                r1 == r2 && self.is_implicitly_convertible(e1, e2)
            }
            (HostType::Array { .. }, HostType::Named(_)) => Some(to) == object,
            (HostType::GenericParameter(sym), _) => {
                if Some(to) == object {
                    return true;
                }
                match &self.symbol(sym).payload {
                    SymbolPayload::GenericParameter(gp) => gp
                        .constraints
                        .iter()
                        .any(|c| *c == to || self.is_implicitly_convertible(*c, to)),
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// The base-type chain of a named type, nearest first.
    pub fn base_chain(&self, ty: TypeId) -> Vec<TypeId> {
        let mut chain = Vec::new();
        let mut current = ty;
        while let HostType::Named(sym) = self.host_type(current) {
            let Some(base) = self.symbol(sym).as_type().and_then(|t| t.base) else {
                break;
            };
            if chain.contains(&base) {
                break;
            }
            chain.push(base);
            current = base;
        }
        chain
    }

    /// All interfaces of a type, transitively flattened, in stable order.
    pub fn all_interfaces(&self, ty: TypeId) -> Vec<TypeId> {
        let mut out = Vec::new();
        let mut work = vec![ty];
        let mut seen = vec![ty];
        while let Some(current) = work.pop() {
            let HostType::Named(sym) = self.host_type(current) else { continue };
            let Some(type_sym) = self.symbol(sym).as_type().cloned() else { continue };
            for iface in type_sym.interfaces.iter().chain(type_sym.base.iter()) {
                if !seen.contains(iface) {
                    seen.push(*iface);
                    if matches!(self.type_def_kind(*iface), Some(k) if k == super::TypeDefKind::Interface)
                    {
                        out.push(*iface);
                    }
                    work.push(*iface);
                }
            }
        }
        out
    }

    fn type_def_kind(&self, ty: TypeId) -> Option<super::TypeDefKind> {
        match self.host_type(ty) {
            HostType::Named(sym) => self.symbol(sym).as_type().map(|t| t.kind),
            _ => None,
        }
    }
}
