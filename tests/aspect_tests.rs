//! Aspect integration tests: attribute-driven discovery, introduction
//! advice strategies and the advice application step.

mod helpers;

use std::sync::Arc;

use weft::base::Name;
use weft::diagnostics::DiagnosticSink;
use weft::host::{AttributeData, ConstValue};
use weft::model::{
    AttributeIntroductionBuilder, DeclarationOrigin, FieldBuilder, MethodBuilder, PropertyBuilder,
};
use weft::aspect::{
    IntroduceAdvice, OverrideStrategy, apply_introductions, aspect_instances, default_materializer,
};
use weft::template::AspectClass;

use helpers::{billing_fixture, fresh_model};

// ============================================================================
// DISCOVERY
// ============================================================================

#[test]
fn instances_enumerate_in_discovery_order() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);
    let class = Arc::new(AspectClass::new("LogAspect"));
    let mut sink = DiagnosticSink::for_target("LogAspect");

    let instances =
        aspect_instances(&model, fixture.log_attr, &class, &default_materializer, &mut sink);

    assert!(sink.is_empty());
    assert_eq!(instances.len(), 2);
    assert_eq!(instances[0].1.name(), "Add");
    assert_eq!(instances[1].1.name(), "Validate");
    // Named arguments materialize into the instance state.
    assert_eq!(instances[0].0.state.get("Level"), Some(&ConstValue::Int(2)));
    assert!(instances[1].0.state.is_empty());
    assert!(instances[0].0.location.is_some());
}

#[test]
fn failing_construction_becomes_a_diagnostic_and_skips_one_application() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);
    let class = Arc::new(AspectClass::new("LogAspect"));
    let mut sink = DiagnosticSink::for_target("LogAspect");

    // The constructor rejects the application that carries a Level argument.
    let materializer = |attr: &weft::model::AttributeRef<'_>| {
        if attr.data().named_arg("Level").is_some() {
            Err("Level is out of range".to_string())
        } else {
            default_materializer(attr)
        }
    };
    let instances = aspect_instances(&model, fixture.log_attr, &class, &materializer, &mut sink);

    // The failing application is skipped; the other survives.
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].1.name(), "Validate");
    assert!(sink.has_errors());
    let diagnostic = &sink.diagnostics()[0];
    assert_eq!(diagnostic.code.as_deref(), Some("WFT0202"));
    assert!(diagnostic.location.is_some());
    assert!(diagnostic.message.contains("Level is out of range"));
}

// ============================================================================
// INTRODUCTION STRATEGIES
// ============================================================================

#[test]
fn introduce_fail_on_existing_member_reports_and_introduces_nothing() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);
    let invoice = model.named_type(fixture.invoice).unwrap();
    let string_ty = model.type_by_reflection_name("System.String").unwrap();

    // Invoice already declares a property named Number.
    let built =
        PropertyBuilder::new("AuditAspect", invoice.origin(), "Number", string_ty.raw()).finalize();
    let advice = IntroduceAdvice::new("AuditAspect", built).when_exists(OverrideStrategy::Fail);

    let result = apply_introductions(&model, vec![advice]).unwrap();
    assert_eq!(result.introduced, 0);
    assert_eq!(result.diagnostics.len(), 1);
    let diagnostic = &result.diagnostics[0];
    assert_eq!(diagnostic.code.as_deref(), Some("WFT0201"));
    // The diagnostic names both the aspect and the existing member.
    assert!(diagnostic.message.contains("AuditAspect"));
    assert!(diagnostic.message.contains("Number"));
    assert!(diagnostic.message.contains("Acme.Billing.Invoice"));

    // No duplicate member was introduced.
    let after = result.model.named_type(fixture.invoice).unwrap();
    let numbers = after.members_named("Number");
    assert_eq!(numbers.len(), 1);
}

#[test]
fn introduce_ignore_skips_silently() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);
    let invoice = model.named_type(fixture.invoice).unwrap();
    let string_ty = model.type_by_reflection_name("System.String").unwrap();

    let built =
        PropertyBuilder::new("AuditAspect", invoice.origin(), "Number", string_ty.raw()).finalize();
    let advice = IntroduceAdvice::new("AuditAspect", built).when_exists(OverrideStrategy::Ignore);

    let result = apply_introductions(&model, vec![advice]).unwrap();
    assert_eq!(result.introduced, 0);
    assert!(result.diagnostics.is_empty());
}

#[test]
fn introduce_new_member_lands_in_the_next_snapshot() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);
    let invoice = model.named_type(fixture.invoice).unwrap();
    let string_ty = model.type_by_reflection_name("System.String").unwrap();

    let mut builder =
        MethodBuilder::new("AuditAspect", invoice.origin(), "AuditTrail", string_ty.raw());
    builder.add_parameter("reason", string_ty.raw());
    let advice = IntroduceAdvice::new("AuditAspect", builder.finalize());

    let result = apply_introductions(&model, vec![advice]).unwrap();
    assert_eq!(result.introduced, 1);
    assert!(result.diagnostics.is_empty());

    let after = result.model.named_type(fixture.invoice).unwrap();
    let introduced = after
        .methods()
        .into_iter()
        .find(|m| m.name() == "AuditTrail")
        .expect("introduced method visible");
    assert!(introduced.is_introduced());
    assert_eq!(introduced.parameters().len(), 1);
    assert_eq!(introduced.parameters()[0].name(), "reason");

    // The prototype snapshot still has no such member.
    assert!(model
        .named_type(fixture.invoice)
        .unwrap()
        .methods()
        .iter()
        .all(|m| m.name() != "AuditTrail"));
}

#[test]
fn duplicate_introduction_within_one_batch_fails_deterministically() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);
    let invoice = model.named_type(fixture.invoice).unwrap();
    let int_ty = model.type_by_reflection_name("System.Int32").unwrap();

    let first = FieldBuilder::new("FirstAspect", invoice.origin(), "marker", int_ty.raw()).finalize();
    let second =
        FieldBuilder::new("SecondAspect", invoice.origin(), "marker", int_ty.raw()).finalize();

    let result = apply_introductions(
        &model,
        vec![
            IntroduceAdvice::new("FirstAspect", first),
            IntroduceAdvice::new("SecondAspect", second).when_exists(OverrideStrategy::Fail),
        ],
    )
    .unwrap();

    // First wins, second reports the conflict against the pending name.
    assert_eq!(result.introduced, 1);
    assert_eq!(result.diagnostics.len(), 1);
    assert!(result.diagnostics[0].message.contains("SecondAspect"));
    assert!(result.diagnostics[0].related[0].message.contains("FirstAspect"));
}

#[test]
fn override_strategy_records_the_transformation() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);
    let invoice = model.named_type(fixture.invoice).unwrap();
    let string_ty = model.type_by_reflection_name("System.String").unwrap();

    let built =
        PropertyBuilder::new("AuditAspect", invoice.origin(), "Number", string_ty.raw()).finalize();
    let advice =
        IntroduceAdvice::new("AuditAspect", built).when_exists(OverrideStrategy::Override);

    let result = apply_introductions(&model, vec![advice]).unwrap();
    assert_eq!(result.introduced, 1);
    assert!(result.diagnostics.is_empty());
    // Both the source member and the override transformation are visible;
    // the linking pass merges them downstream.
    let after = result.model.named_type(fixture.invoice).unwrap();
    assert_eq!(after.members_named("Number").len(), 2);
}

// ============================================================================
// INTRODUCED ATTRIBUTES
// ============================================================================

#[test]
fn introduced_attribute_joins_the_index_and_the_declaration() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);
    let host = model.host();
    let log_attr_ty = host.named_type_id(fixture.log_attr);

    // Introduce [Log] onto Total(), which has no attributes in source.
    let built = AttributeIntroductionBuilder::new(
        "LogAspect",
        DeclarationOrigin::Symbol(fixture.total_method),
        AttributeData::new(log_attr_ty).with_named("Level", ConstValue::Int(9)),
    )
    .finalize();

    let derived = model
        .with_transformations(vec![built])
        .unwrap();

    // Index: three applications now, discovery order then insertion order.
    let applications = derived.attributes_of_type(fixture.log_attr);
    assert_eq!(applications.len(), 3);
    assert_eq!(applications[2].target().name(), "Total");

    // Declaration view: Total() now reports the introduced attribute.
    let total = derived.method(fixture.total_method).unwrap();
    let attrs = total.attributes();
    assert_eq!(attrs.len(), 1);
    assert_eq!(
        attrs[0].named_arguments()[0],
        (Name::new("Level"), weft::model::AttributeValue::Int(9))
    );

    // The prototype's index is unchanged.
    assert_eq!(model.attributes_of_type(fixture.log_attr).len(), 2);
}
