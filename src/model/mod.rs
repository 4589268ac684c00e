//! # Code Model
//!
//! An immutable, symbol-backed object graph mirroring the host compiler's
//! semantic graph, with caching, incremental extension (introduced
//! declarations layered onto a base snapshot) and uniform dispatch across
//! source and introduced declaration variants.
//!
//! ## Key Types
//!
//! - [`CompilationModel`] — the aggregate root: one immutable snapshot
//! - [`Declaration`] and the typed views ([`MethodRef`], [`NamedTypeRef`], …)
//! - [`Type`] / [`TypeShape`] — model types over the host's interned types
//! - Builders ([`MethodBuilder`], [`PropertyBuilder`], …) and
//!   [`BuiltDeclaration`] — aspect-introduced declarations
//! - [`AdvisedTarget`] — the template-time facade over a target declaration

mod advised;
mod builders;
mod compilation;
mod declaration;
mod error;
mod factory;
mod types;
mod views;

pub use advised::{
    AdvisedKind, AdvisedTarget, AspectReferenceOrder, AspectReferenceSpec, Invokers,
};
pub use builders::{
    AttributeIntroductionBuilder, BuiltAttribute, BuiltDeclaration, BuiltEvent, BuiltField,
    BuiltMethod, BuiltParameter, BuiltProperty, EventBuilder, FieldBuilder, MethodBuilder,
    PropertyBuilder,
};
pub use compilation::{AttributeItem, AttributeSource, CompilationModel};
pub use declaration::{DeclarationKind, DeclarationNode, DeclarationOrigin};
pub use error::ModelError;
pub use types::{ReflectionType, Type, TypeShape};
pub use views::{
    AttributeRef, AttributeValue, CompilationRef, Declaration, EventRef, FieldRef,
    GenericParameterRef, MethodKind, MethodRef, NamedTypeRef, NamespaceRef, ParameterRef,
    PropertyRef,
};
