//! Template expansion integration tests: the staticity matrix, parameter
//! binding, virtual dispatch, the compile-time/run-time duality and
//! generic substitution.

mod helpers;

use std::sync::Arc;

use rstest::rstest;

use weft::base::Name;
use weft::host::ConstValue;
use weft::model::{AdvisedTarget, CompilationModel};
use weft::template::{
    AspectClass, BinaryOp, ExpandError, MetaApi, RtExpr, RtStmt, RtType, Staticity, SwitchLabel,
    TemplateDeclaration, TemplateExpander, TemplateExpr, TemplateSignature, TemplateStmt,
    TemplateSwitchArm, TemplateTypeRef, TemplateValue, TypeArgValue, render_stmts,
};

use helpers::{BillingFixture, billing_fixture, fresh_model};

fn ct(i: i64) -> TemplateValue {
    TemplateValue::CompileTime(ConstValue::Int(i))
}

fn target_for<'m>(
    fixture: &BillingFixture,
    model: &'m CompilationModel,
    is_static: bool,
) -> AdvisedTarget {
    let symbol = if is_static { fixture.validate_method } else { fixture.add_method };
    AdvisedTarget::for_method(&model.method(symbol).unwrap())
}

fn expander_with<'m>(
    model: &'m CompilationModel,
    meta: MetaApi,
    templates: Vec<TemplateDeclaration>,
) -> TemplateExpander<'m> {
    let mut class = AspectClass::new("TestAspect");
    for template in templates {
        class = class.with_template(template);
    }
    TemplateExpander::new(model, meta, Arc::new(class))
}

fn this_template() -> TemplateDeclaration {
    // `this.Number;`
    TemplateDeclaration::new(
        "UseThis",
        TemplateSignature::new(),
        vec![TemplateStmt::Expr(TemplateExpr::member(TemplateExpr::This, "Number"))],
    )
}

// ============================================================================
// STATICITY MATRIX (3 modes × 2 target kinds)
// ============================================================================

#[rstest]
#[case(Staticity::ForcedInstance, false, true)]
#[case(Staticity::ForcedInstance, true, true)]
#[case(Staticity::ForcedStatic, false, false)]
#[case(Staticity::ForcedStatic, true, false)]
#[case(Staticity::ContextDependent, false, true)]
#[case(Staticity::ContextDependent, true, false)]
fn staticity_matrix(
    #[case] staticity: Staticity,
    #[case] target_is_static: bool,
    #[case] should_resolve: bool,
) {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);
    let meta = MetaApi::new(target_for(&fixture, &model, target_is_static), "TestAspect")
        .with_staticity(staticity);
    let expander = expander_with(&model, meta, vec![this_template()]);

    let result = expander.expand("UseThis", Vec::new(), Vec::new());
    if should_resolve {
        let stmts = result.unwrap();
        assert!(matches!(
            &stmts[0],
            RtStmt::Expr(RtExpr::Member { receiver: Some(receiver), .. })
                if matches!(&**receiver, RtExpr::This { .. })
        ));
    } else {
        let failure = result.unwrap_err();
        assert_eq!(failure.error, ExpandError::ThisInStaticContext);
        assert_eq!(failure.error.code(), "WFT0001");
        assert_eq!(failure.template, "UseThis");
    }
}

// ============================================================================
// PARAMETER BINDING (end-to-end scenario: CalledTemplate(int i, [CompileTime] int j = -2))
// ============================================================================

fn called_template() -> TemplateDeclaration {
    TemplateDeclaration::new(
        "CalledTemplate",
        TemplateSignature::new()
            .param("i")
            .compile_time_param_with_default("j", ConstValue::Int(-2)),
        vec![TemplateStmt::Return(Some(TemplateExpr::binary(
            BinaryOp::Add,
            TemplateExpr::name("i"),
            TemplateExpr::name("j"),
        )))],
    )
}

#[test]
fn positional_call_applies_compile_time_default() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);
    let meta = MetaApi::new(target_for(&fixture, &model, false), "TestAspect");
    let expander = expander_with(&model, meta, vec![called_template()]);

    // i = 1, j defaults to -2; both compile-time, so the addition folds.
    let stmts = expander.expand("CalledTemplate", vec![ct(1)], Vec::new()).unwrap();
    assert_eq!(stmts, vec![RtStmt::Return(Some(RtExpr::Literal(ConstValue::Int(-1))))]);
}

#[test]
fn dynamic_bag_without_required_argument_fails() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);
    let meta = MetaApi::new(target_for(&fixture, &model, false), "TestAspect");
    let expander = expander_with(&model, meta, vec![called_template()]);

    let failure =
        expander.invoke_template("CalledTemplate", vec![(Name::new("j"), ct(5))]).unwrap_err();
    assert_eq!(failure.error, ExpandError::MissingArgument { name: Name::new("i") });
    assert_eq!(failure.error.code(), "WFT0002");
    let diagnostic = failure.to_diagnostic();
    assert!(diagnostic.to_string().contains("missing required template argument 'i'"));
}

#[test]
fn runtime_argument_keeps_the_operation_at_run_time() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);
    let meta = MetaApi::new(target_for(&fixture, &model, false), "TestAspect");
    let expander = expander_with(&model, meta, vec![called_template()]);

    let stmts = expander
        .expand(
            "CalledTemplate",
            vec![TemplateValue::Runtime(RtExpr::ident("amount"))],
            Vec::new(),
        )
        .unwrap();
    // i is run-time, j compile-time: the sum lowers with j quoted.
    assert_eq!(
        stmts,
        vec![RtStmt::Return(Some(RtExpr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(RtExpr::ident("amount")),
            rhs: Box::new(RtExpr::Literal(ConstValue::Int(-2))),
        }))]
    );
}

// ============================================================================
// VIRTUAL SUB-TEMPLATE DISPATCH
// ============================================================================

fn returning(name: &str, value: &str) -> TemplateDeclaration {
    TemplateDeclaration::new(
        name,
        TemplateSignature::new(),
        vec![TemplateStmt::Return(Some(TemplateExpr::str(value)))],
    )
}

#[test]
fn most_derived_override_is_expanded() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let base = Arc::new(
        AspectClass::new("BaseAspect").with_template(returning("Decorate", "base").virtual_()),
    );
    let derived = Arc::new(
        AspectClass::new("DerivedAspect")
            .with_base(Arc::clone(&base))
            .with_template(returning("Decorate", "derived").override_()),
    );

    let meta = MetaApi::new(target_for(&fixture, &model, false), "DerivedAspect");
    let expander = TemplateExpander::new(&model, meta, derived);
    let stmts = expander.expand("Decorate", Vec::new(), Vec::new()).unwrap();
    assert_eq!(stmts, vec![RtStmt::Return(Some(RtExpr::Literal(ConstValue::string("derived"))))]);

    // Expanding through the base class alone still sees the base body.
    let meta = MetaApi::new(target_for(&fixture, &model, false), "BaseAspect");
    let expander = TemplateExpander::new(&model, meta, base);
    let stmts = expander.expand("Decorate", Vec::new(), Vec::new()).unwrap();
    assert_eq!(stmts, vec![RtStmt::Return(Some(RtExpr::Literal(ConstValue::string("base"))))]);
}

#[test]
fn sub_template_statements_splice_inline() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let prologue = TemplateDeclaration::new(
        "Prologue",
        TemplateSignature::new().compile_time_param("message"),
        vec![TemplateStmt::Expr(TemplateExpr::call(
            TemplateExpr::runtime_ident("Log"),
            vec![TemplateExpr::name("message")],
        ))],
    );
    let outer = TemplateDeclaration::new(
        "Outer",
        TemplateSignature::new(),
        vec![
            TemplateStmt::ExpandTemplate {
                name: Name::new("Prologue"),
                type_args: Vec::new(),
                args: vec![weft::template::TemplateArg::Positional(TemplateExpr::str("enter"))],
            },
            TemplateStmt::MetaReturn(Some(TemplateExpr::Proceed)),
        ],
    );

    let meta = MetaApi::new(target_for(&fixture, &model, false), "TestAspect");
    let expander = expander_with(&model, meta, vec![prologue, outer]);
    let stmts = expander.expand("Outer", Vec::new(), Vec::new()).unwrap();

    // Prologue's statement spliced first, then the void-target proceed; the
    // trailing bare return normalized away.
    assert_eq!(stmts.len(), 2);
    assert!(matches!(&stmts[0], RtStmt::Expr(RtExpr::Invocation { .. })));
    assert!(matches!(&stmts[1], RtStmt::Expr(RtExpr::Invocation { .. })));
    let rendered = render_stmts(&stmts);
    assert!(rendered.starts_with("Log(\"enter\");\n"));
}

#[test]
fn unknown_template_is_a_user_error() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);
    let meta = MetaApi::new(target_for(&fixture, &model, false), "TestAspect");
    let expander = expander_with(&model, meta, vec![]);

    let failure = expander.expand("Nope", Vec::new(), Vec::new()).unwrap_err();
    assert_eq!(
        failure.error,
        ExpandError::UnknownTemplate { name: Name::new("Nope"), aspect: Name::new("TestAspect") }
    );
}

// ============================================================================
// COMPILE-TIME / RUN-TIME DUALITY
// ============================================================================

#[test]
fn compile_time_condition_selects_its_branch() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let template = TemplateDeclaration::new(
        "Guard",
        TemplateSignature::new().compile_time_param("enabled"),
        vec![TemplateStmt::If {
            cond: TemplateExpr::name("enabled"),
            then_branch: vec![TemplateStmt::Expr(TemplateExpr::call(
                TemplateExpr::runtime_ident("Audit"),
                vec![],
            ))],
            else_branch: Some(vec![TemplateStmt::Expr(TemplateExpr::call(
                TemplateExpr::runtime_ident("Skip"),
                vec![],
            ))]),
        }],
    );
    let meta = MetaApi::new(target_for(&fixture, &model, false), "TestAspect");
    let expander = expander_with(&model, meta, vec![template]);

    let stmts = expander
        .expand("Guard", vec![TemplateValue::CompileTime(ConstValue::Bool(true))], Vec::new())
        .unwrap();
    // The condition disappeared; only the selected branch remains.
    assert_eq!(stmts.len(), 1);
    let rendered = render_stmts(&stmts);
    assert!(rendered.contains("Audit()"));
    assert!(!rendered.contains("Skip"));
}

#[test]
fn runtime_condition_expands_both_branches() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let template = TemplateDeclaration::new(
        "Guard",
        TemplateSignature::new().param("enabled"),
        vec![TemplateStmt::If {
            cond: TemplateExpr::name("enabled"),
            then_branch: vec![TemplateStmt::Expr(TemplateExpr::call(
                TemplateExpr::runtime_ident("Audit"),
                vec![],
            ))],
            else_branch: None,
        }],
    );
    let meta = MetaApi::new(target_for(&fixture, &model, false), "TestAspect");
    let expander = expander_with(&model, meta, vec![template]);

    let stmts = expander
        .expand("Guard", vec![TemplateValue::Runtime(RtExpr::ident("flag"))], Vec::new())
        .unwrap();
    assert!(matches!(&stmts[0], RtStmt::If { .. }));
}

#[test]
fn compile_time_switch_selects_an_arm() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let arm = |value: i64, ident: &str| TemplateSwitchArm {
        label: SwitchLabel::Const(ConstValue::Int(value)),
        body: vec![TemplateStmt::Expr(TemplateExpr::call(
            TemplateExpr::runtime_ident(ident),
            vec![],
        ))],
    };
    let template = TemplateDeclaration::new(
        "Pick",
        TemplateSignature::new().compile_time_param("level"),
        vec![TemplateStmt::Switch {
            scrutinee: TemplateExpr::name("level"),
            arms: vec![
                arm(1, "Low"),
                arm(2, "High"),
                TemplateSwitchArm {
                    label: SwitchLabel::Default,
                    body: vec![TemplateStmt::Expr(TemplateExpr::call(
                        TemplateExpr::runtime_ident("Unknown"),
                        vec![],
                    ))],
                },
            ],
            exhaustive: true,
        }],
    );
    let meta = MetaApi::new(target_for(&fixture, &model, false), "TestAspect");
    let expander = expander_with(&model, meta, vec![template]);

    let stmts = expander.expand("Pick", vec![ct(2)], Vec::new()).unwrap();
    let rendered = render_stmts(&stmts);
    assert!(rendered.contains("High()"));
    assert!(!rendered.contains("Low"));
    assert!(!rendered.contains("Unknown"));
}

#[test]
fn interpolated_strings_fold_constant_holes() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let template = TemplateDeclaration::new(
        "Message",
        TemplateSignature::new(),
        vec![TemplateStmt::Expr(TemplateExpr::call(
            TemplateExpr::runtime_ident("Log"),
            vec![TemplateExpr::Interpolated(vec![
                weft::template::TemplateInterpolatedPart::Text("entering ".into()),
                weft::template::TemplateInterpolatedPart::Expr(TemplateExpr::TargetName),
                weft::template::TemplateInterpolatedPart::Text(" with ".into()),
                weft::template::TemplateInterpolatedPart::Expr(TemplateExpr::runtime_ident(
                    "amount",
                )),
            ])],
        ))],
    );
    let meta = MetaApi::new(target_for(&fixture, &model, false), "TestAspect");
    let expander = expander_with(&model, meta, vec![template]);

    let stmts = expander.expand("Message", Vec::new(), Vec::new()).unwrap();
    let rendered = render_stmts(&stmts);
    // The target name folded into the literal text; the run-time hole stayed.
    assert_eq!(rendered, "Log($\"entering Add with {amount}\");\n");
}

#[test]
fn proceed_and_meta_return_on_a_value_target() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let template = TemplateDeclaration::new(
        "Around",
        TemplateSignature::new(),
        vec![
            TemplateStmt::Local {
                name: Name::new("result"),
                compile_time: false,
                init: TemplateExpr::Proceed,
            },
            TemplateStmt::MetaReturn(Some(TemplateExpr::name("result"))),
        ],
    );
    // Total() returns double: meta.Return introduces a value return.
    let target = AdvisedTarget::for_method(&model.method(fixture.total_method).unwrap());
    let meta = MetaApi::new(target, "TestAspect");
    let expander = expander_with(&model, meta, vec![template]);

    let stmts = expander.expand("Around", Vec::new(), Vec::new()).unwrap();
    assert_eq!(stmts.len(), 2);
    assert!(matches!(&stmts[0], RtStmt::Local { name, .. } if name == "result"));
    assert_eq!(stmts[1], RtStmt::Return(Some(RtExpr::ident("result"))));
}

#[test]
fn meta_return_on_a_void_target_is_a_bare_return() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let template = TemplateDeclaration::new(
        "Around",
        TemplateSignature::new(),
        vec![TemplateStmt::MetaReturn(Some(TemplateExpr::Proceed))],
    );
    // Add() is void: the proceed value becomes an effect statement and the
    // return is bare — which then normalizes away as a trailing artifact.
    let meta = MetaApi::new(target_for(&fixture, &model, false), "TestAspect");
    let expander = expander_with(&model, meta, vec![template]);

    let stmts = expander.expand("Around", Vec::new(), Vec::new()).unwrap();
    assert_eq!(stmts.len(), 1);
    assert!(matches!(&stmts[0], RtStmt::Expr(RtExpr::Invocation { .. })));
}

// ============================================================================
// GENERIC SUBSTITUTION
// ============================================================================

#[test]
fn compile_time_type_parameter_substitutes() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let template = TemplateDeclaration::new(
        "MakeDefault",
        TemplateSignature::new().compile_time_type_param("T"),
        vec![TemplateStmt::Return(Some(TemplateExpr::DefaultOf(TemplateTypeRef::Param(
            Name::new("T"),
        ))))],
    );
    let target = AdvisedTarget::for_method(&model.method(fixture.total_method).unwrap());
    let meta = MetaApi::new(target, "TestAspect");
    let expander = expander_with(&model, meta, vec![template]);

    let int_ty = model.type_by_reflection_name("System.Int32").unwrap();
    let stmts = expander
        .expand_generic("MakeDefault", vec![TypeArgValue::CompileTime(int_ty)], vec![], vec![])
        .unwrap();
    assert_eq!(stmts, vec![RtStmt::Return(Some(RtExpr::DefaultOf(RtType::named("int"))))]);
}

#[test]
fn runtime_type_parameter_stays_in_generated_syntax() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let template = TemplateDeclaration::new(
        "Convert",
        TemplateSignature::new().type_param("T"),
        vec![TemplateStmt::Return(Some(TemplateExpr::Call {
            callee: Box::new(TemplateExpr::member(
                TemplateExpr::runtime_ident("Converter"),
                "To",
            )),
            type_args: vec![TemplateTypeRef::Param(Name::new("T"))],
            args: vec![weft::template::TemplateArg::Positional(TemplateExpr::runtime_ident(
                "value",
            ))],
        }))],
    );
    let target = AdvisedTarget::for_method(&model.method(fixture.total_method).unwrap());
    let meta = MetaApi::new(target, "TestAspect");
    let expander = expander_with(&model, meta, vec![template]);

    let stmts = expander
        .expand_generic(
            "Convert",
            vec![TypeArgValue::Runtime(RtType::Param(Name::new("T")))],
            vec![],
            vec![],
        )
        .unwrap();
    let RtStmt::Return(Some(RtExpr::Invocation { type_args, .. })) = &stmts[0] else {
        panic!("expected invocation return");
    };
    assert_eq!(type_args, &vec![RtType::Param(Name::new("T"))]);
}

#[test]
fn compile_time_type_parameter_rejects_runtime_argument() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let template = TemplateDeclaration::new(
        "MakeDefault",
        TemplateSignature::new().compile_time_type_param("T"),
        vec![TemplateStmt::Return(Some(TemplateExpr::DefaultOf(TemplateTypeRef::Param(
            Name::new("T"),
        ))))],
    );
    let target = AdvisedTarget::for_method(&model.method(fixture.total_method).unwrap());
    let meta = MetaApi::new(target, "TestAspect");
    let expander = expander_with(&model, meta, vec![template]);

    let failure = expander
        .expand_generic(
            "MakeDefault",
            vec![TypeArgValue::Runtime(RtType::Param(Name::new("T")))],
            vec![],
            vec![],
        )
        .unwrap_err();
    assert!(matches!(failure.error, ExpandError::TypeMismatch(_)));
}

// ============================================================================
// EXPRESSION-POSITION SUB-TEMPLATES
// ============================================================================

#[test]
fn expression_sub_template_yields_its_return() {
    let fixture = billing_fixture();
    let model = fresh_model(&fixture);

    let inner = TemplateDeclaration::new(
        "Wrap",
        TemplateSignature::new().compile_time_param("prefix"),
        vec![TemplateStmt::Return(Some(TemplateExpr::binary(
            BinaryOp::Add,
            TemplateExpr::name("prefix"),
            TemplateExpr::str("!"),
        )))],
    );
    let outer = TemplateDeclaration::new(
        "Outer",
        TemplateSignature::new(),
        vec![TemplateStmt::Return(Some(TemplateExpr::CallTemplate {
            name: Name::new("Wrap"),
            type_args: Vec::new(),
            args: vec![weft::template::TemplateArg::Positional(TemplateExpr::str("hi"))],
        }))],
    );

    let target = AdvisedTarget::for_method(&model.method(fixture.total_method).unwrap());
    let meta = MetaApi::new(target, "TestAspect");
    let expander = expander_with(&model, meta, vec![inner, outer]);

    let stmts = expander.expand("Outer", Vec::new(), Vec::new()).unwrap();
    assert_eq!(stmts, vec![RtStmt::Return(Some(RtExpr::Literal(ConstValue::string("hi!"))))]);
}
