//! The compilation snapshot.
//!
//! [`CompilationModel`] is the aggregate root: the symbol-backed declaration
//! tree (materialized lazily through the factory), the transformation index
//! (introduced declarations by containing declaration) and the attribute
//! index (attribute type → every application in the program).
//!
//! Snapshots are immutable once published. A fresh snapshot walks the
//! declared-type tree once; an incremental snapshot clones the prototype's
//! indices and unions in a batch of transformations by walking only the
//! newly introduced subtrees.

use std::sync::Arc;

use indexmap::IndexMap;
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::base::{DeclId, MemoCell, Name, SymbolId, TypeId};
use crate::host::{HostCompilation, HostMethodKind, HostType, MemberModifiers, SymbolPayload};

use super::builders::BuiltDeclaration;
use super::declaration::{DeclarationKind, DeclarationNode, DeclarationOrigin};
use super::error::ModelError;
use super::factory::DeclarationFactory;
use super::views::{
    AttributeRef, Declaration, EventRef, FieldRef, GenericParameterRef, MethodRef, NamedTypeRef,
    NamespaceRef, ParameterRef, PropertyRef,
};

/// Defensive recursion guard for tree walks. Well-formed symbol graphs never
/// come close; deeply nested generics are the only realistic way near it.
pub(crate) const MAX_WALK_DEPTH: usize = 256;

/// Where an indexed attribute application lives.
#[derive(Clone, Debug)]
pub enum AttributeSource {
    /// The n-th attribute in the owner's own attribute list.
    Direct(u32),
    /// An attribute introduced onto the owner by an aspect.
    Introduced(Arc<BuiltDeclaration>),
}

/// One entry of the attribute index: an application of some attribute type.
#[derive(Clone, Debug)]
pub struct AttributeItem {
    /// The decorated declaration.
    pub owner: DeclarationOrigin,
    pub source: AttributeSource,
}

pub struct CompilationModel {
    host: Arc<HostCompilation>,
    /// 0 for a fresh snapshot; +1 per incremental derivation.
    generation: u32,
    pub(crate) factory: DeclarationFactory,
    /// Introduced declarations by containing declaration, insertion-ordered
    /// and duplicate-preserving per key.
    transformations: IndexMap<DeclarationOrigin, Vec<Arc<BuiltDeclaration>>>,
    /// Attribute type symbol → every application, in discovery order.
    attribute_index: IndexMap<SymbolId, Vec<AttributeItem>>,
    cancel: CancellationToken,
    declared_types: MemoCell<Vec<DeclId>>,
}

impl std::fmt::Debug for CompilationModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilationModel")
            .field("generation", &self.generation)
            .field("transformed_keys", &self.transformations.len())
            .field("attribute_types", &self.attribute_index.len())
            .finish_non_exhaustive()
    }
}

impl CompilationModel {
    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Build a fresh snapshot from a host semantic snapshot.
    pub fn fresh(host: Arc<HostCompilation>) -> Result<Self, ModelError> {
        Self::fresh_with_cancel(host, CancellationToken::new())
    }

    /// Build a fresh snapshot, checking `cancel` once per declaration walked.
    pub fn fresh_with_cancel(
        host: Arc<HostCompilation>,
        cancel: CancellationToken,
    ) -> Result<Self, ModelError> {
        let attribute_index = build_fresh_attribute_index(&host, &cancel)?;
        tracing::debug!(
            attribute_types = attribute_index.len(),
            "fresh compilation model built"
        );
        Ok(Self {
            host,
            generation: 0,
            factory: DeclarationFactory::new(),
            transformations: IndexMap::new(),
            attribute_index,
            cancel,
            declared_types: MemoCell::new(),
        })
    }

    /// Derive an incremental snapshot by unioning a batch of introduced
    /// declarations into this snapshot's indices.
    ///
    /// The prototype is never mutated: its indices are cloned, the new batch
    /// is appended, and only the introduced subtrees are walked for
    /// attributes. Cost is proportional to the batch, not the program.
    pub fn with_transformations(
        &self,
        batch: Vec<Arc<BuiltDeclaration>>,
    ) -> Result<CompilationModel, ModelError> {
        let mut transformations = self.transformations.clone();
        let mut attribute_index = self.attribute_index.clone();

        for built in batch {
            if self.cancel.is_cancelled() {
                return Err(ModelError::Cancelled);
            }
            index_introduced_attributes(&self.host, &built, &mut attribute_index);
            transformations.entry(built.target().clone()).or_default().push(built);
        }

        tracing::debug!(
            generation = self.generation + 1,
            transformed_keys = transformations.len(),
            "incremental compilation model derived"
        );
        Ok(Self {
            host: Arc::clone(&self.host),
            generation: self.generation + 1,
            factory: DeclarationFactory::new(),
            transformations,
            attribute_index,
            cancel: self.cancel.clone(),
            declared_types: MemoCell::new(),
        })
    }

    pub fn host(&self) -> &Arc<HostCompilation> {
        &self.host
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    // ========================================================================
    // NODE MATERIALIZATION
    // ========================================================================

    pub(crate) fn node(&self, id: DeclId) -> Arc<DeclarationNode> {
        self.factory.node(id)
    }

    /// Materialize (or look up) the arena node for an origin. Containing
    /// declarations materialize first, so containment back-references are
    /// always valid ids.
    pub(crate) fn ensure_node(&self, origin: &DeclarationOrigin) -> DeclId {
        if let Some(existing) = self.factory.lookup(origin) {
            return existing;
        }
        let kind = self.kind_of_origin(origin);
        let containing = self.containing_of_origin(origin);
        self.factory
            .get_or_create(origin, || DeclarationNode::new(kind, origin.clone(), containing))
    }

    fn kind_of_origin(&self, origin: &DeclarationOrigin) -> DeclarationKind {
        match origin {
            DeclarationOrigin::Compilation => DeclarationKind::Compilation,
            DeclarationOrigin::Symbol(sym) => match &self.host.symbol(*sym).payload {
                SymbolPayload::Namespace(_) => DeclarationKind::Namespace,
                SymbolPayload::Type(_) => DeclarationKind::NamedType,
                SymbolPayload::Method(m) => match m.method_kind {
                    HostMethodKind::Constructor | HostMethodKind::StaticConstructor => {
                        DeclarationKind::Constructor
                    }
                    _ => DeclarationKind::Method,
                },
                SymbolPayload::Field(_) => DeclarationKind::Field,
                SymbolPayload::Property(p) => {
                    if p.is_indexer {
                        DeclarationKind::Indexer
                    } else {
                        DeclarationKind::Property
                    }
                }
                SymbolPayload::Event(_) => DeclarationKind::Event,
                SymbolPayload::Parameter(_) => DeclarationKind::Parameter,
                SymbolPayload::GenericParameter(_) => DeclarationKind::GenericParameter,
            },
            DeclarationOrigin::SymbolReturn(_)
            | DeclarationOrigin::IntroducedParameter { .. }
            | DeclarationOrigin::IntroducedReturn(_) => DeclarationKind::Parameter,
            DeclarationOrigin::Introduced(built) => built.kind(),
        }
    }

    fn containing_of_origin(&self, origin: &DeclarationOrigin) -> Option<DeclId> {
        match origin {
            DeclarationOrigin::Compilation => None,
            DeclarationOrigin::Symbol(sym) => match self.host.symbol(*sym).containing {
                Some(containing) => Some(self.ensure_node(&DeclarationOrigin::Symbol(containing))),
                None => Some(self.ensure_node(&DeclarationOrigin::Compilation)),
            },
            DeclarationOrigin::SymbolReturn(method) => {
                Some(self.ensure_node(&DeclarationOrigin::Symbol(*method)))
            }
            DeclarationOrigin::Introduced(built) => Some(self.ensure_node(built.target())),
            DeclarationOrigin::IntroducedParameter { owner, .. } => {
                Some(self.ensure_node(&DeclarationOrigin::Introduced(Arc::clone(owner))))
            }
            DeclarationOrigin::IntroducedReturn(owner) => {
                Some(self.ensure_node(&DeclarationOrigin::Introduced(Arc::clone(owner))))
            }
        }
    }

    // ========================================================================
    // LOOKUPS
    // ========================================================================

    /// The compilation root declaration.
    pub fn compilation(&self) -> Declaration<'_> {
        let id = self.ensure_node(&DeclarationOrigin::Compilation);
        self.declaration(id)
    }

    /// Wrap an arena node as a typed declaration view.
    pub fn declaration(&self, id: DeclId) -> Declaration<'_> {
        let node = self.node(id);
        match node.kind {
            DeclarationKind::Compilation => {
                Declaration::Compilation(super::views::CompilationRef { model: self, id })
            }
            DeclarationKind::Namespace => Declaration::Namespace(NamespaceRef { model: self, id }),
            DeclarationKind::NamedType => Declaration::NamedType(NamedTypeRef { model: self, id }),
            DeclarationKind::Method | DeclarationKind::Constructor => {
                Declaration::Method(MethodRef { model: self, id })
            }
            DeclarationKind::Field => Declaration::Field(FieldRef { model: self, id }),
            DeclarationKind::Property | DeclarationKind::Indexer => {
                Declaration::Property(PropertyRef { model: self, id })
            }
            DeclarationKind::Event => Declaration::Event(EventRef { model: self, id }),
            DeclarationKind::Parameter => Declaration::Parameter(ParameterRef { model: self, id }),
            DeclarationKind::GenericParameter => {
                Declaration::GenericParameter(GenericParameterRef { model: self, id })
            }
            // Attribute applications are value views, never arena nodes.
            DeclarationKind::Attribute => {
                unreachable!("attribute applications are not arena declarations")
            }
        }
    }

    /// Wrap a host symbol as a typed declaration view.
    pub fn declaration_for_symbol(&self, symbol: SymbolId) -> Declaration<'_> {
        let id = self.ensure_node(&DeclarationOrigin::Symbol(symbol));
        self.declaration(id)
    }

    fn typed_lookup<'m, T>(
        &'m self,
        symbol: SymbolId,
        expected: &'static str,
        extract: impl FnOnce(Declaration<'m>) -> Option<T>,
    ) -> Result<T, ModelError> {
        let declaration = self.declaration_for_symbol(symbol);
        let kind = declaration.kind();
        extract(declaration).ok_or_else(|| {
            ModelError::unsupported(format!("expected a {expected} symbol, found {kind}"))
        })
    }

    pub fn named_type(&self, symbol: SymbolId) -> Result<NamedTypeRef<'_>, ModelError> {
        self.typed_lookup(symbol, "type", |d| match d {
            Declaration::NamedType(t) => Some(t),
            _ => None,
        })
    }

    pub fn namespace(&self, symbol: SymbolId) -> Result<NamespaceRef<'_>, ModelError> {
        self.typed_lookup(symbol, "namespace", |d| match d {
            Declaration::Namespace(n) => Some(n),
            _ => None,
        })
    }

    pub fn method(&self, symbol: SymbolId) -> Result<MethodRef<'_>, ModelError> {
        self.typed_lookup(symbol, "method", |d| match d {
            Declaration::Method(m) => Some(m),
            _ => None,
        })
    }

    pub fn field(&self, symbol: SymbolId) -> Result<FieldRef<'_>, ModelError> {
        self.typed_lookup(symbol, "field", |d| match d {
            Declaration::Field(f) => Some(f),
            _ => None,
        })
    }

    pub fn property(&self, symbol: SymbolId) -> Result<PropertyRef<'_>, ModelError> {
        self.typed_lookup(symbol, "property", |d| match d {
            Declaration::Property(p) => Some(p),
            _ => None,
        })
    }

    pub fn event(&self, symbol: SymbolId) -> Result<EventRef<'_>, ModelError> {
        self.typed_lookup(symbol, "event", |d| match d {
            Declaration::Event(e) => Some(e),
            _ => None,
        })
    }

    pub fn parameter(&self, symbol: SymbolId) -> Result<ParameterRef<'_>, ModelError> {
        self.typed_lookup(symbol, "parameter", |d| match d {
            Declaration::Parameter(p) => Some(p),
            _ => None,
        })
    }

    pub fn generic_parameter(&self, symbol: SymbolId) -> Result<GenericParameterRef<'_>, ModelError> {
        self.typed_lookup(symbol, "generic parameter", |d| match d {
            Declaration::GenericParameter(g) => Some(g),
            _ => None,
        })
    }

    /// Types declared directly in namespaces, in discovery order.
    pub fn declared_types(&self) -> Vec<NamedTypeRef<'_>> {
        let ids = self
            .declared_types
            .get_or_init(|| {
                self.host
                    .top_level_types()
                    .iter()
                    .map(|sym| self.ensure_node(&DeclarationOrigin::Symbol(*sym)))
                    .collect()
            })
            .clone();
        ids.into_iter().map(|id| NamedTypeRef { model: self, id }).collect()
    }

    // ========================================================================
    // INDICES
    // ========================================================================

    /// Introduced declarations attached to a containing declaration, in
    /// insertion order.
    pub fn transformations_for(&self, origin: &DeclarationOrigin) -> &[Arc<BuiltDeclaration>] {
        self.transformations.get(origin).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All transformations of this snapshot, grouped by containing
    /// declaration, in insertion order.
    pub fn all_transformations(
        &self,
    ) -> impl Iterator<Item = (&DeclarationOrigin, &[Arc<BuiltDeclaration>])> {
        self.transformations.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Raw index entries for an attribute type.
    pub fn attribute_items_for_type(&self, attr_type: SymbolId) -> &[AttributeItem] {
        self.attribute_index.get(&attr_type).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every application of an attribute type anywhere in the program,
    /// in discovery order.
    pub fn attributes_of_type(&self, attr_type: SymbolId) -> Vec<AttributeRef<'_>> {
        self.attribute_items_for_type(attr_type)
            .iter()
            .map(|item| AttributeRef {
                model: self,
                owner: self.ensure_node(&item.owner),
                source: item.source.clone(),
            })
            .collect()
    }

    /// Number of distinct attribute types in the index. Diagnostic aid.
    pub fn attribute_index_len(&self) -> usize {
        self.attribute_index.len()
    }

    // ========================================================================
    // TRAVERSAL
    // ========================================================================

    /// All declarations contained in `root`, recursively, in discovery order.
    ///
    /// Total (never fails on shape) and terminating: containment is acyclic
    /// in a well-formed symbol graph, with a depth guard against pathological
    /// input. Checks cancellation once per declaration visited.
    pub fn contained_elements<'m>(
        &'m self,
        root: Declaration<'m>,
    ) -> Result<Vec<Declaration<'m>>, ModelError> {
        let mut out = Vec::new();
        self.expand_into(root, 0, &mut out)?;
        Ok(out)
    }

    fn expand_into<'m>(
        &'m self,
        declaration: Declaration<'m>,
        depth: usize,
        out: &mut Vec<Declaration<'m>>,
    ) -> Result<(), ModelError> {
        if self.cancel.is_cancelled() {
            return Err(ModelError::Cancelled);
        }
        if depth > MAX_WALK_DEPTH {
            return Ok(());
        }
        let children: Vec<Declaration<'m>> = match declaration {
            Declaration::Compilation(c) => {
                c.declared_types().into_iter().map(Declaration::NamedType).collect()
            }
            Declaration::Namespace(ns) => {
                ns.types().into_iter().map(Declaration::NamedType).collect()
            }
            Declaration::NamedType(ty) => {
                let mut children: Vec<Declaration<'m>> =
                    ty.nested_types().into_iter().map(Declaration::NamedType).collect();
                children.extend(ty.members());
                children.extend(ty.generic_parameters().into_iter().map(Declaration::GenericParameter));
                children
            }
            Declaration::Method(method) => {
                let mut children: Vec<Declaration<'m>> =
                    method.local_functions().into_iter().map(Declaration::Method).collect();
                children.extend(method.parameters().into_iter().map(Declaration::Parameter));
                children
                    .extend(method.generic_parameters().into_iter().map(Declaration::GenericParameter));
                children.extend(method.return_parameter().map(Declaration::Parameter));
                children
            }
            Declaration::Property(property) => {
                property.index_parameters().into_iter().map(Declaration::Parameter).collect()
            }
            _ => Vec::new(),
        };
        for child in children {
            out.push(child);
            self.expand_into(child, depth + 1, out)?;
        }
        Ok(())
    }

    // ========================================================================
    // SHARED ORIGIN QUERIES (used by the typed views)
    // ========================================================================

    pub(crate) fn origin_name(&self, origin: &DeclarationOrigin) -> Name {
        match origin {
            DeclarationOrigin::Compilation => Name::new_static("<compilation>"),
            DeclarationOrigin::Symbol(sym) => self.host.symbol(*sym).name.clone(),
            DeclarationOrigin::SymbolReturn(_) | DeclarationOrigin::IntroducedReturn(_) => {
                Name::new_static("<return>")
            }
            DeclarationOrigin::Introduced(built) => built.name(),
            DeclarationOrigin::IntroducedParameter { owner, index } => owner
                .as_method()
                .and_then(|m| m.params.get(*index as usize))
                .map(|p| p.name.clone())
                .unwrap_or_default(),
        }
    }

    /// Member modifiers for an origin; `None` for non-member declarations.
    pub(crate) fn origin_modifiers(&self, origin: &DeclarationOrigin) -> Option<MemberModifiers> {
        match origin {
            DeclarationOrigin::Symbol(sym) => match &self.host.symbol(*sym).payload {
                SymbolPayload::Method(m) => Some(m.modifiers),
                SymbolPayload::Field(f) => Some(f.modifiers),
                SymbolPayload::Property(p) => Some(p.modifiers),
                SymbolPayload::Event(e) => Some(e.modifiers),
                SymbolPayload::Type(t) => Some(MemberModifiers {
                    accessibility: t.accessibility,
                    is_static: t.is_static,
                    is_abstract: t.is_abstract,
                    is_sealed: t.is_sealed,
                    ..MemberModifiers::default()
                }),
                _ => None,
            },
            DeclarationOrigin::Introduced(built) => built.modifiers().copied(),
            _ => None,
        }
    }

    /// Whether a type (by host id) still contains unbound generic parameters.
    pub(crate) fn type_is_open(&self, ty: TypeId) -> bool {
        match self.host.host_type(ty) {
            HostType::GenericParameter(_) => true,
            HostType::Array { element, .. } => self.type_is_open(element),
            HostType::Pointer { pointee } => self.type_is_open(pointee),
            HostType::Ref { referent } => self.type_is_open(referent),
            HostType::Dynamic => false,
            HostType::Named(sym) => {
                let data = self.host.symbol(sym);
                let Some(type_sym) = data.as_type() else { return false };
                if type_sym.type_args.is_empty() {
                    !type_sym.type_params.is_empty()
                } else {
                    type_sym.type_args.iter().any(|arg| self.type_is_open(*arg))
                }
            }
        }
    }
}

// ============================================================================
// FRESH WALK
// ============================================================================

fn build_fresh_attribute_index(
    host: &Arc<HostCompilation>,
    cancel: &CancellationToken,
) -> Result<IndexMap<SymbolId, Vec<AttributeItem>>, ModelError> {
    // One parallel task per top-level type; the ordered sequential merge keeps
    // index iteration order equal to declaration discovery order.
    let per_type: Vec<Vec<(SymbolId, AttributeItem)>> = host
        .top_level_types()
        .par_iter()
        .map(|root| collect_symbol_attributes(host, *root, cancel))
        .collect::<Result<_, _>>()?;

    let mut index: IndexMap<SymbolId, Vec<AttributeItem>> = IndexMap::new();
    for items in per_type {
        for (attr_type, item) in items {
            index.entry(attr_type).or_default().push(item);
        }
    }
    Ok(index)
}

fn collect_symbol_attributes(
    host: &HostCompilation,
    root: SymbolId,
    cancel: &CancellationToken,
) -> Result<Vec<(SymbolId, AttributeItem)>, ModelError> {
    let mut out = Vec::new();
    visit_symbol_tree(host, root, cancel, 0, &mut |symbol| {
        let data = host.symbol(symbol);
        for (index, attr) in data.attributes.iter().enumerate() {
            if let HostType::Named(attr_type) = host.host_type(attr.attr_type) {
                out.push((
                    attr_type,
                    AttributeItem {
                        owner: DeclarationOrigin::Symbol(symbol),
                        source: AttributeSource::Direct(index as u32),
                    },
                ));
            }
        }
    })?;
    Ok(out)
}

fn visit_symbol_tree(
    host: &HostCompilation,
    symbol: SymbolId,
    cancel: &CancellationToken,
    depth: usize,
    visit: &mut dyn FnMut(SymbolId),
) -> Result<(), ModelError> {
    if cancel.is_cancelled() {
        return Err(ModelError::Cancelled);
    }
    if depth > MAX_WALK_DEPTH {
        return Ok(());
    }
    visit(symbol);
    for child in symbol_children(host, symbol) {
        visit_symbol_tree(host, child, cancel, depth + 1, visit)?;
    }
    Ok(())
}

/// Kind-specific children for the symbol-level walk. Property accessors are
/// reached through the type's member list, not through the property.
fn symbol_children(host: &HostCompilation, symbol: SymbolId) -> Vec<SymbolId> {
    let data = host.symbol(symbol);
    match &data.payload {
        SymbolPayload::Namespace(ns) => ns.members.clone(),
        SymbolPayload::Type(t) => {
            let mut children = t.type_params.clone();
            children.extend(&t.nested);
            children.extend(&t.members);
            children
        }
        SymbolPayload::Method(m) => {
            let mut children = m.type_params.clone();
            children.extend(&m.params);
            if let Some(syntax) = &data.syntax {
                children.extend(&syntax.local_functions);
            }
            children
        }
        SymbolPayload::Property(p) => p.index_params.clone(),
        _ => Vec::new(),
    }
}

/// Walk only an introduced declaration's own subtree for attributes.
fn index_introduced_attributes(
    host: &HostCompilation,
    built: &Arc<BuiltDeclaration>,
    index: &mut IndexMap<SymbolId, Vec<AttributeItem>>,
) {
    let mut push = |attr_type: TypeId, item: AttributeItem| {
        if let HostType::Named(attr_sym) = host.host_type(attr_type) {
            index.entry(attr_sym).or_default().push(item);
        }
    };

    if let BuiltDeclaration::Attribute(introduced) = &**built {
        // An introduced declaration that is itself an attribute: indexed
        // against the declaration it decorates.
        push(
            introduced.data.attr_type,
            AttributeItem {
                owner: introduced.target.clone(),
                source: AttributeSource::Introduced(Arc::clone(built)),
            },
        );
        return;
    }

    for (i, attr) in built.attributes().iter().enumerate() {
        push(
            attr.attr_type,
            AttributeItem {
                owner: DeclarationOrigin::Introduced(Arc::clone(built)),
                source: AttributeSource::Direct(i as u32),
            },
        );
    }
    if let Some(method) = built.as_method() {
        for (param_index, param) in method.params.iter().enumerate() {
            for (i, attr) in param.attributes.iter().enumerate() {
                push(
                    attr.attr_type,
                    AttributeItem {
                        owner: DeclarationOrigin::IntroducedParameter {
                            owner: Arc::clone(built),
                            index: param_index as u32,
                        },
                        source: AttributeSource::Direct(i as u32),
                    },
                );
            }
        }
    }
}
