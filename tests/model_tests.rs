//! Code model integration tests: factory identity, snapshot lifecycle,
//! attribute indexing, type construction and traversal.

mod helpers;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use weft::host::{HostMethodKind, ProgramBuilder};
use weft::model::{
    CompilationModel, Declaration, DeclarationKind, FieldBuilder, ModelError, PropertyBuilder,
    ReflectionType, TypeShape,
};

use helpers::{billing_fixture, fresh_model};

// ============================================================================
// IDENTITY
// ============================================================================

#[test]
fn same_symbol_same_instance_within_snapshot() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let first = model.method(fixture.add_method).unwrap();
    let second = model.method(fixture.add_method).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.id(), second.id());
}

#[test]
fn same_symbol_distinct_instances_across_snapshots() {
    let fixture = billing_fixture();
    let base = fresh_model(&fixture);
    let derived = base.with_transformations(Vec::new()).unwrap();

    let in_base = base.method(fixture.add_method).unwrap();
    let in_derived = derived.method(fixture.add_method).unwrap();
    // Identity is snapshot-scoped.
    assert_ne!(in_base, in_derived);
    assert_eq!(in_base.name(), in_derived.name());
}

#[test]
fn kind_mismatch_is_an_internal_error() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);
    let err = model.named_type(fixture.add_method).unwrap_err();
    assert!(matches!(err, ModelError::Unsupported(_)));
    assert!(!err.is_user_error());
}

// ============================================================================
// SNAPSHOT LIFECYCLE
// ============================================================================

#[test]
fn snapshot_isolation_on_derive() {
    let fixture = billing_fixture();
    let base = fresh_model(&fixture);

    let log_applications_before = base.attributes_of_type(fixture.log_attr).len();
    let transformations_before = base.all_transformations().count();

    let invoice = base.named_type(fixture.invoice).unwrap();
    let int_ty = base.type_by_reflection_name("System.Int32").unwrap();
    let property =
        PropertyBuilder::new("CacheAspect", invoice.origin(), "CachedAt", int_ty.raw()).finalize();
    let derived = base.with_transformations(vec![property]).unwrap();

    // The prototype's indices are untouched.
    assert_eq!(base.attributes_of_type(fixture.log_attr).len(), log_applications_before);
    assert_eq!(base.all_transformations().count(), transformations_before);
    assert_eq!(base.generation(), 0);
    assert_eq!(derived.generation(), 1);

    // The derived snapshot sees the introduction.
    let derived_invoice = derived.named_type(fixture.invoice).unwrap();
    assert!(derived_invoice.properties().iter().any(|p| p.name() == "CachedAt"));
    let base_invoice = base.named_type(fixture.invoice).unwrap();
    assert!(!base_invoice.properties().iter().any(|p| p.name() == "CachedAt"));
}

#[test]
fn incremental_snapshots_chain() {
    let fixture = billing_fixture();
    let base = fresh_model(&fixture);
    let invoice = base.named_type(fixture.invoice).unwrap();
    let int_ty = base.type_by_reflection_name("System.Int32").unwrap();

    let first = FieldBuilder::new("A", invoice.origin(), "x1", int_ty.raw()).finalize();
    let second = FieldBuilder::new("A", invoice.origin(), "x2", int_ty.raw()).finalize();

    let step1 = base.with_transformations(vec![first]).unwrap();
    let step2 = step1.with_transformations(vec![second]).unwrap();
    assert_eq!(step2.generation(), 2);

    let fields: Vec<_> = step2
        .named_type(fixture.invoice)
        .unwrap()
        .fields()
        .iter()
        .map(|f| f.name())
        .collect();
    assert!(fields.contains(&"x1".into()));
    assert!(fields.contains(&"x2".into()));
    // Insertion order is preserved per key.
    let x1 = fields.iter().position(|f| f == "x1").unwrap();
    let x2 = fields.iter().position(|f| f == "x2").unwrap();
    assert!(x1 < x2);
}

#[test]
fn cancellation_stops_fresh_walk() {
    let fixture = billing_fixture();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = CompilationModel::fresh_with_cancel(Arc::clone(&fixture.host), cancel).unwrap_err();
    assert!(matches!(err, ModelError::Cancelled));
}

// ============================================================================
// ATTRIBUTE INDEX
// ============================================================================

#[test]
fn attribute_index_is_complete_and_exact() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let applications = model.attributes_of_type(fixture.log_attr);
    let targets: Vec<_> = applications.iter().map(|a| a.target().name()).collect();
    assert_eq!(targets, vec!["Add", "Validate"]);

    // No entry points at a declaration without the attribute.
    assert!(model.attributes_of_type(fixture.introduce_attr).is_empty());
}

#[test]
fn attribute_arguments_translate_recursively() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let applications = model.attributes_of_type(fixture.log_attr);
    let on_add = &applications[0];
    let named = on_add.named_arguments();
    assert_eq!(named.len(), 1);
    assert_eq!(named[0].0, "Level");
    assert_eq!(named[0].1, weft::model::AttributeValue::Int(2));
    assert!(on_add.location().is_some());
}

#[test]
fn declaration_attributes_match_index() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let add = model.method(fixture.add_method).unwrap();
    assert_eq!(add.attributes().len(), 1);
    let total = model.method(fixture.total_method).unwrap();
    assert!(total.attributes().is_empty());
}

// ============================================================================
// TYPES
// ============================================================================

#[test]
fn generic_round_trip() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let list = model.named_type(fixture.list).unwrap();
    assert!(list.is_open_generic());

    let int_ty = model.type_by_reflection_name("System.Int32").unwrap();
    let constructed = list.with_generic_arguments(&[int_ty]).unwrap();
    assert_eq!(constructed.generic_arguments(), vec![int_ty]);
    assert!(!constructed.is_open_generic());
    // The receiver is untouched.
    assert!(list.generic_arguments() != vec![int_ty]);
}

#[test]
fn zero_arguments_on_non_generic_is_identity() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let invoice = model.named_type(fixture.invoice).unwrap();
    let same = invoice.with_generic_arguments(&[]).unwrap();
    assert_eq!(invoice, same);
}

#[test]
fn arity_mismatch_fails() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let list = model.named_type(fixture.list).unwrap();
    let int_ty = model.type_by_reflection_name("System.Int32").unwrap();
    let err = list.with_generic_arguments(&[int_ty, int_ty]).unwrap_err();
    assert!(err.is_user_error());
}

#[test]
fn unknown_reflection_name_carries_the_literal_name() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let err = model.type_by_reflection_name("NoSuchNamespace.NoSuchType").unwrap_err();
    assert_eq!(err.requested_name(), Some("NoSuchNamespace.NoSuchType"));
    assert!(err.is_user_error());
}

#[test]
fn reflection_names_decompose_recursively() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let ty = model
        .type_by_reflection_name("Acme.Collections.List`1[[System.Int32]][]")
        .unwrap();
    let TypeShape::Array { element, rank } = model.type_shape(ty).unwrap() else {
        panic!("expected array");
    };
    assert_eq!(rank, 1);
    let TypeShape::Named(named) = model.type_shape(element).unwrap() else {
        panic!("expected named element");
    };
    assert_eq!(named.name(), "List");
    assert!(!named.is_open_generic());
}

#[test]
fn unresolved_generic_argument_propagates_failure() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let err = model
        .type_by_reflection_name("Acme.Collections.List`1[[No.Such.Arg]]")
        .unwrap_err();
    assert_eq!(err.requested_name(), Some("No.Such.Arg"));
}

#[test]
fn assembly_qualified_names_fail_as_not_implemented() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let err = model.type_by_reflection_name("System.Int32, mscorlib").unwrap_err();
    // Distinguishable from both user errors and internal invariants.
    assert!(matches!(err, ModelError::NotImplemented(_)));
    assert!(!err.is_user_error());
}

#[test]
fn by_ref_reflection_types_fail_fast() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let err = model
        .type_by_reflection_type(&ReflectionType::ByRef(Box::new(ReflectionType::Named(
            "System.Int32".into(),
        ))))
        .unwrap_err();
    assert!(matches!(err, ModelError::InvalidArgument(_)));
}

#[test]
fn implemented_interfaces_flatten() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let audited = model.named_type(fixture.audited).unwrap();
    let interfaces = audited.implemented_interfaces();
    assert_eq!(interfaces.len(), 1);
    let TypeShape::Named(iface) = model.type_shape(interfaces[0]).unwrap() else {
        panic!("expected named interface");
    };
    assert_eq!(iface.name(), "IAudit");

    let base = audited.base_type().unwrap();
    let TypeShape::Named(base) = model.type_shape(base).unwrap() else {
        panic!("expected named base");
    };
    assert_eq!(base.name(), "Invoice");
}

#[test]
fn convertibility_follows_the_host() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let audited = model.named_type(fixture.audited).unwrap().as_type();
    let invoice = model.named_type(fixture.invoice).unwrap().as_type();
    assert!(model.is_convertible(audited, invoice));
    assert!(!model.is_convertible(invoice, audited));
}

// ============================================================================
// METHODS
// ============================================================================

#[test]
fn method_shape() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let add = model.method(fixture.add_method).unwrap();
    assert_eq!(add.kind(), DeclarationKind::Method);
    assert_eq!(add.parameters().len(), 1);
    assert_eq!(add.parameters()[0].name(), "amount");
    assert_eq!(add.parameters()[0].index(), Some(0));
    assert!(add.returns_void());
    let ret = add.return_parameter().unwrap();
    assert!(ret.is_return_parameter());

    let ctor = model.method(fixture.ctor).unwrap();
    assert_eq!(ctor.kind(), DeclarationKind::Constructor);
    assert!(ctor.return_parameter().is_none());
}

#[test]
fn local_functions_are_discovered_one_level() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let total = model.method(fixture.total_method).unwrap();
    let locals = total.local_functions();
    assert_eq!(locals.len(), 1);
    assert_eq!(locals[0].name(), "Round");
}

#[test]
fn unsupported_method_kinds_are_rejected() {
    let mut p = ProgramBuilder::new();
    let ns = p.namespace("Acme");
    let cls = p.class(ns, "Widget");
    let void_ty = p.void_ty();
    let lambda = p.method_of_kind(cls, "<lambda>", void_ty, HostMethodKind::AnonymousFunction);
    let model = CompilationModel::fresh(Arc::new(p.finish())).unwrap();

    let err = model.method(lambda).unwrap().method_kind().unwrap_err();
    assert!(matches!(err, ModelError::Unsupported(_)));
}

#[test]
fn is_new_comes_from_syntax() {
    let mut p = ProgramBuilder::new();
    let ns = p.namespace("Acme");
    let base = p.class(ns, "Base");
    let base_ty = p.named_type(base);
    let derived = p.class(ns, "Derived");
    p.set_base(derived, base_ty);
    let void_ty = p.void_ty();
    p.method(base, "Run", void_ty);
    let hiding = p.method(derived, "Run", void_ty);
    p.mark_new(hiding);
    let model = CompilationModel::fresh(Arc::new(p.finish())).unwrap();

    assert!(model.method(hiding).unwrap().is_new());
}

// ============================================================================
// TRAVERSAL
// ============================================================================

#[test]
fn contained_elements_cover_the_tree() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let root = model.compilation();
    let elements = model.contained_elements(root).unwrap();

    let names: Vec<_> = elements.iter().map(|d| d.name()).collect();
    assert!(names.contains(&"Invoice".into()));
    assert!(names.contains(&"Add".into()));
    assert!(names.contains(&"amount".into()));
    assert!(names.contains(&"Round".into()));
    // Return parameters participate in traversal.
    assert!(elements.iter().any(|d| {
        matches!(d, Declaration::Parameter(p) if p.is_return_parameter())
    }));
    // No declaration appears as its own descendant: the walk terminated and
    // every element is unique by id.
    let mut ids: Vec<_> = elements.iter().map(|d| d.id()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), elements.len());
}

#[test]
fn members_include_introductions_for_uniform_traversal() {
    let fixture = billing_fixture();
    let base = fresh_model(&fixture);
    let invoice = base.named_type(fixture.invoice).unwrap();
    let int_ty = base.type_by_reflection_name("System.Int32").unwrap();

    let built = FieldBuilder::new("CacheAspect", invoice.origin(), "version", int_ty.raw()).finalize();
    let derived = base.with_transformations(vec![built]).unwrap();

    let derived_invoice = derived.named_type(fixture.invoice).unwrap();
    let introduced: Vec<_> =
        derived_invoice.members().into_iter().filter(|m| m.is_introduced()).collect();
    assert_eq!(introduced.len(), 1);
    assert_eq!(introduced[0].name(), "version");

    // The introduced member is reachable through the generic traversal too.
    let elements = derived.contained_elements(derived.compilation()).unwrap();
    assert!(elements.iter().any(|d| d.name() == "version" && d.is_introduced()));
}
