//! The template expansion interpreter.
//!
//! Walks a template body and evaluates compile-time-typed expressions
//! immediately while lowering run-time-typed expressions to generated
//! syntax. Compile-time conditions select their branch during expansion;
//! run-time conditions expand both branches into generated control flow.
//! Sub-template calls dispatch through the aspect hierarchy's resolution
//! table and splice their expansion inline.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::base::Name;
use crate::model::{CompilationModel, Type};

use super::ast::{
    TemplateArg, TemplateDeclaration, TemplateExpr, TemplateInterpolatedPart, TemplateStmt,
    TemplateTypeRef,
};
use super::binding::{BoundArguments, bind_argument_bag, bind_arguments};
use super::dispatch::{AspectClass, TemplateResolutionTable};
use super::error::{ExpandError, ExpandFailure};
use super::meta::MetaApi;
use super::normalize::normalize_returns;
use super::syntax::{InterpolatedPart, RtExpr, RtStmt, RtSwitchArm, RtType, SwitchLabel};
use super::value::{TemplateValue, const_eq, const_truth, eval_binary, eval_unary};

/// Sub-template call depth limit.
const MAX_TEMPLATE_DEPTH: usize = 64;

/// A type argument at a template call site.
#[derive(Clone, Debug)]
pub enum TypeArgValue {
    /// Bound immediately; `typeof(T)` substitutes the concrete type.
    CompileTime(Type),
    /// Becomes part of the generated type-argument list.
    Runtime(RtType),
}

/// Lexically scoped expansion environment.
#[derive(Default)]
struct Env {
    values: Vec<FxHashMap<Name, TemplateValue>>,
    types: Vec<FxHashMap<Name, TypeArgValue>>,
}

impl Env {
    fn new() -> Self {
        Self { values: vec![FxHashMap::default()], types: vec![FxHashMap::default()] }
    }

    fn push(&mut self) {
        self.values.push(FxHashMap::default());
        self.types.push(FxHashMap::default());
    }

    fn pop(&mut self) {
        self.values.pop();
        self.types.pop();
    }

    fn bind(&mut self, name: Name, value: TemplateValue) {
        if let Some(scope) = self.values.last_mut() {
            scope.insert(name, value);
        }
    }

    fn bind_type(&mut self, name: Name, value: TypeArgValue) {
        if let Some(scope) = self.types.last_mut() {
            scope.insert(name, value);
        }
    }

    fn lookup(&self, name: &str) -> Option<&TemplateValue> {
        self.values.iter().rev().find_map(|scope| scope.get(name))
    }

    fn lookup_type(&self, name: &str) -> Option<&TypeArgValue> {
        self.types.iter().rev().find_map(|scope| scope.get(name))
    }
}

/// Internal propagation: a plain error gets the current template's frame
/// attached at the call boundary; an already-framed failure passes through
/// so nested calls keep the innermost frame.
enum Interrupt {
    Error(ExpandError),
    Failure(ExpandFailure),
}

impl From<ExpandError> for Interrupt {
    fn from(error: ExpandError) -> Self {
        Self::Error(error)
    }
}

impl From<ExpandFailure> for Interrupt {
    fn from(failure: ExpandFailure) -> Self {
        Self::Failure(failure)
    }
}

/// Expands templates of one aspect class against one target.
pub struct TemplateExpander<'m> {
    model: &'m CompilationModel,
    meta: MetaApi,
    aspect: Arc<AspectClass>,
    table: TemplateResolutionTable,
}

impl<'m> TemplateExpander<'m> {
    pub fn new(model: &'m CompilationModel, meta: MetaApi, aspect: Arc<AspectClass>) -> Self {
        let table = TemplateResolutionTable::build(&aspect);
        Self { model, meta, aspect, table }
    }

    pub fn meta(&self) -> &MetaApi {
        &self.meta
    }

    pub fn aspect(&self) -> &Arc<AspectClass> {
        &self.aspect
    }

    // ========================================================================
    // ENTRY POINTS
    // ========================================================================

    /// Expand a template with positional and named arguments.
    pub fn expand(
        &self,
        name: &str,
        positional: Vec<TemplateValue>,
        named: Vec<(Name, TemplateValue)>,
    ) -> Result<Vec<RtStmt>, ExpandFailure> {
        let stmts = self.expand_call(name, Vec::new(), positional, named, 0)?;
        Ok(normalize_returns(stmts))
    }

    /// Expand a generic template with explicit type arguments.
    pub fn expand_generic(
        &self,
        name: &str,
        type_args: Vec<TypeArgValue>,
        positional: Vec<TemplateValue>,
        named: Vec<(Name, TemplateValue)>,
    ) -> Result<Vec<RtStmt>, ExpandFailure> {
        let stmts = self.expand_call(name, type_args, positional, named, 0)?;
        Ok(normalize_returns(stmts))
    }

    /// `meta.InvokeTemplate(name, args)`: dynamic invocation with an
    /// anonymous argument bag.
    pub fn invoke_template(
        &self,
        name: &str,
        bag: Vec<(Name, TemplateValue)>,
    ) -> Result<Vec<RtStmt>, ExpandFailure> {
        let template = self.resolve_template(name)?;
        let frame = self.frame_for(&template);
        let bound = bind_argument_bag(&template.signature, bag).map_err(&frame)?;
        let stmts = self.expand_resolved(&template, bound, Vec::new(), 0)?;
        Ok(normalize_returns(stmts))
    }

    // ========================================================================
    // CALL MACHINERY
    // ========================================================================

    fn resolve_template(&self, name: &str) -> Result<Arc<TemplateDeclaration>, ExpandFailure> {
        self.table.resolve(name).cloned().ok_or_else(|| {
            ExpandFailure::new(
                ExpandError::UnknownTemplate {
                    name: Name::new(name),
                    aspect: self.aspect.name.clone(),
                },
                name,
                None,
            )
        })
    }

    fn frame_for(&self, template: &TemplateDeclaration) -> impl Fn(ExpandError) -> ExpandFailure {
        let name = template.name.clone();
        let location = template.location.clone();
        move |error| ExpandFailure::new(error, name.clone(), location.clone())
    }

    fn expand_call(
        &self,
        name: &str,
        type_args: Vec<TypeArgValue>,
        positional: Vec<TemplateValue>,
        named: Vec<(Name, TemplateValue)>,
        depth: usize,
    ) -> Result<Vec<RtStmt>, ExpandFailure> {
        if depth > MAX_TEMPLATE_DEPTH {
            return Err(ExpandFailure::new(ExpandError::RecursionLimit, name, None));
        }
        let template = self.resolve_template(name)?;
        tracing::debug!(template = %template.name, aspect = %self.aspect.name, "expanding template");
        let frame = self.frame_for(&template);
        let bound = bind_arguments(&template.signature, positional, named).map_err(&frame)?;
        self.expand_resolved(&template, bound, type_args, depth)
    }

    fn expand_resolved(
        &self,
        template: &Arc<TemplateDeclaration>,
        bound: BoundArguments,
        type_args: Vec<TypeArgValue>,
        depth: usize,
    ) -> Result<Vec<RtStmt>, ExpandFailure> {
        let frame = self.frame_for(template);

        let mut env = Env::new();
        for (name, value) in bound.into_values() {
            env.bind(name, value);
        }

        let type_params = &template.signature.type_params;
        if type_args.len() != type_params.len() {
            return Err(frame(ExpandError::GenericArityMismatch {
                name: template.name.clone(),
                expected: type_params.len(),
                actual: type_args.len(),
            }));
        }
        for (param, arg) in type_params.iter().zip(type_args) {
            if param.is_compile_time && !matches!(arg, TypeArgValue::CompileTime(_)) {
                return Err(frame(ExpandError::type_mismatch(format!(
                    "compile-time type parameter '{}' requires a compile-time type argument",
                    param.name
                ))));
            }
            env.bind_type(param.name.clone(), arg);
        }

        let mut out = Vec::new();
        match self.expand_stmts(&template.body, &mut env, depth, &mut out) {
            Ok(()) => Ok(out),
            Err(Interrupt::Error(error)) => Err(frame(error)),
            Err(Interrupt::Failure(failure)) => Err(failure),
        }
    }

    // ========================================================================
    // STATEMENTS
    // ========================================================================

    fn expand_stmts(
        &self,
        stmts: &[TemplateStmt],
        env: &mut Env,
        depth: usize,
        out: &mut Vec<RtStmt>,
    ) -> Result<(), Interrupt> {
        for stmt in stmts {
            self.expand_stmt(stmt, env, depth, out)?;
        }
        Ok(())
    }

    fn expand_scoped(
        &self,
        stmts: &[TemplateStmt],
        env: &mut Env,
        depth: usize,
        out: &mut Vec<RtStmt>,
    ) -> Result<(), Interrupt> {
        env.push();
        let result = self.expand_stmts(stmts, env, depth, out);
        env.pop();
        result
    }

    fn expand_branch(
        &self,
        stmts: &[TemplateStmt],
        env: &mut Env,
        depth: usize,
    ) -> Result<Vec<RtStmt>, Interrupt> {
        let mut out = Vec::new();
        self.expand_scoped(stmts, env, depth, &mut out)?;
        Ok(out)
    }

    fn expand_stmt(
        &self,
        stmt: &TemplateStmt,
        env: &mut Env,
        depth: usize,
        out: &mut Vec<RtStmt>,
    ) -> Result<(), Interrupt> {
        match stmt {
            TemplateStmt::Expr(expr) => match self.expand_expr(expr, env, depth)? {
                TemplateValue::Runtime(expr) => out.push(RtStmt::Expr(expr)),
                TemplateValue::CompileTime(value) => {
                    tracing::trace!(%value, "compile-time expression evaluated");
                }
            },
            TemplateStmt::Local { name, compile_time, init } => {
                let value = self.expand_expr(init, env, depth)?;
                if *compile_time {
                    let TemplateValue::CompileTime(constant) = value else {
                        return Err(ExpandError::type_mismatch(format!(
                            "compile-time local '{name}' requires a compile-time initializer"
                        ))
                        .into());
                    };
                    env.bind(name.clone(), TemplateValue::CompileTime(constant));
                } else {
                    out.push(RtStmt::Local {
                        name: name.clone(),
                        ty: None,
                        init: Some(value.into_expr(self.model)),
                    });
                    env.bind(name.clone(), TemplateValue::Runtime(RtExpr::Ident(name.clone())));
                }
            }
            TemplateStmt::Return(expr) => {
                let expr = match expr {
                    Some(expr) => Some(self.expand_expr(expr, env, depth)?.into_expr(self.model)),
                    None => None,
                };
                out.push(RtStmt::Return(expr));
            }
            TemplateStmt::MetaReturn(expr) => self.expand_meta_return(expr.as_ref(), env, depth, out)?,
            TemplateStmt::If { cond, then_branch, else_branch } => {
                match self.expand_expr(cond, env, depth)? {
                    TemplateValue::CompileTime(value) => {
                        // Compile-time condition: select the branch now.
                        if const_truth(&value)? {
                            self.expand_scoped(then_branch, env, depth, out)?;
                        } else if let Some(else_branch) = else_branch {
                            self.expand_scoped(else_branch, env, depth, out)?;
                        }
                    }
                    TemplateValue::Runtime(cond) => {
                        let then_branch = self.expand_branch(then_branch, env, depth)?;
                        let else_branch = match else_branch {
                            Some(stmts) => Some(self.expand_branch(stmts, env, depth)?),
                            None => None,
                        };
                        out.push(RtStmt::If { cond, then_branch, else_branch });
                    }
                }
            }
            TemplateStmt::Switch { scrutinee, arms, exhaustive } => {
                match self.expand_expr(scrutinee, env, depth)? {
                    TemplateValue::CompileTime(value) => {
                        let selected = arms
                            .iter()
                            .find(|arm| {
                                matches!(&arm.label, SwitchLabel::Const(label) if const_eq(label, &value))
                            })
                            .or_else(|| {
                                arms.iter().find(|arm| arm.label == SwitchLabel::Default)
                            });
                        if let Some(arm) = selected {
                            self.expand_scoped(&arm.body, env, depth, out)?;
                        }
                    }
                    TemplateValue::Runtime(scrutinee) => {
                        let mut rt_arms = Vec::with_capacity(arms.len());
                        for arm in arms {
                            rt_arms.push(RtSwitchArm {
                                label: arm.label.clone(),
                                body: self.expand_branch(&arm.body, env, depth)?,
                            });
                        }
                        out.push(RtStmt::Switch {
                            scrutinee,
                            arms: rt_arms,
                            exhaustive: *exhaustive,
                        });
                    }
                }
            }
            TemplateStmt::Block(stmts) => {
                let inner = self.expand_branch(stmts, env, depth)?;
                out.push(RtStmt::Block(inner));
            }
            TemplateStmt::ExpandTemplate { name, type_args, args } => {
                let (positional, named) = self.eval_args(args, env, depth)?;
                let type_args = self.resolve_type_args(type_args, env)?;
                let stmts = self.expand_call(name, type_args, positional, named, depth + 1)?;
                out.extend(stmts);
            }
        }
        Ok(())
    }

    /// `meta.Return`: a value return on non-void targets, a bare return on
    /// void targets (evaluating the value for its run-time effects first).
    fn expand_meta_return(
        &self,
        expr: Option<&TemplateExpr>,
        env: &mut Env,
        depth: usize,
        out: &mut Vec<RtStmt>,
    ) -> Result<(), Interrupt> {
        if self.meta.target.returns_void {
            if let Some(expr) = expr {
                if let TemplateValue::Runtime(effect) = self.expand_expr(expr, env, depth)? {
                    out.push(RtStmt::Expr(effect));
                }
            }
            out.push(RtStmt::Return(None));
            return Ok(());
        }
        let expr = match expr {
            Some(expr) => Some(self.expand_expr(expr, env, depth)?.into_expr(self.model)),
            None => None,
        };
        out.push(RtStmt::Return(expr));
        Ok(())
    }

    // ========================================================================
    // EXPRESSIONS
    // ========================================================================

    fn expand_expr(
        &self,
        expr: &TemplateExpr,
        env: &mut Env,
        depth: usize,
    ) -> Result<TemplateValue, Interrupt> {
        match expr {
            TemplateExpr::Const(value) => Ok(TemplateValue::CompileTime(value.clone())),
            TemplateExpr::Name(name) => match env.lookup(name) {
                Some(value) => Ok(value.clone()),
                None => Err(ExpandError::UnknownIdentifier { name: name.clone() }.into()),
            },
            TemplateExpr::RuntimeIdent(name) => {
                Ok(TemplateValue::Runtime(RtExpr::Ident(name.clone())))
            }
            TemplateExpr::This => Ok(TemplateValue::Runtime(self.meta.this_expr()?)),
            TemplateExpr::Base => Ok(TemplateValue::Runtime(self.meta.base_expr()?)),
            TemplateExpr::Proceed => Ok(TemplateValue::Runtime(self.meta.proceed_expr())),
            TemplateExpr::TargetName => Ok(TemplateValue::CompileTime(
                crate::host::ConstValue::Str(self.meta.target.name.clone()),
            )),
            TemplateExpr::Tag(name) => match self.meta.tag(name) {
                Some(value) => Ok(TemplateValue::CompileTime(value.clone())),
                None => Err(ExpandError::UnknownIdentifier { name: name.clone() }.into()),
            },
            TemplateExpr::Member { receiver, name } => {
                match self.expand_expr(receiver, env, depth)? {
                    TemplateValue::CompileTime(value) => {
                        Ok(TemplateValue::CompileTime(const_member(&value, name)?))
                    }
                    TemplateValue::Runtime(receiver) => Ok(TemplateValue::Runtime(
                        RtExpr::member(Some(receiver), name.clone()),
                    )),
                }
            }
            TemplateExpr::Call { callee, type_args, args } => {
                let callee = match self.expand_expr(callee, env, depth)? {
                    TemplateValue::Runtime(expr) => expr,
                    TemplateValue::CompileTime(value) => {
                        return Err(ExpandError::type_mismatch(format!(
                            "cannot invoke a compile-time {} value",
                            value.kind_name()
                        ))
                        .into());
                    }
                };
                let (positional, named) = self.eval_args(args, env, depth)?;
                // Run-time calls are positional; named argument order is
                // preserved as written.
                let mut rt_args: Vec<RtExpr> =
                    positional.into_iter().map(|v| v.into_expr(self.model)).collect();
                rt_args.extend(named.into_iter().map(|(_, v)| v.into_expr(self.model)));
                let type_args = self
                    .resolve_type_args(type_args, env)?
                    .into_iter()
                    .map(|arg| self.type_arg_to_syntax(arg))
                    .collect();
                Ok(TemplateValue::Runtime(RtExpr::Invocation {
                    callee: Box::new(callee),
                    type_args,
                    args: rt_args,
                    aspect_ref: None,
                }))
            }
            TemplateExpr::CallTemplate { name, type_args, args } => {
                let (positional, named) = self.eval_args(args, env, depth)?;
                let type_args = self.resolve_type_args(type_args, env)?;
                let stmts = self.expand_call(name, type_args, positional, named, depth + 1)?;
                match stmts.as_slice() {
                    [RtStmt::Return(Some(expr))] => Ok(TemplateValue::Runtime(expr.clone())),
                    _ => Err(ExpandError::NotAnExpression { name: name.clone() }.into()),
                }
            }
            TemplateExpr::Binary { op, lhs, rhs } => {
                let lhs = self.expand_expr(lhs, env, depth)?;
                let rhs = self.expand_expr(rhs, env, depth)?;
                match (lhs, rhs) {
                    (TemplateValue::CompileTime(a), TemplateValue::CompileTime(b)) => {
                        Ok(TemplateValue::CompileTime(eval_binary(*op, &a, &b)?))
                    }
                    (lhs, rhs) => Ok(TemplateValue::Runtime(RtExpr::Binary {
                        op: *op,
                        lhs: Box::new(lhs.into_expr(self.model)),
                        rhs: Box::new(rhs.into_expr(self.model)),
                    })),
                }
            }
            TemplateExpr::Unary { op, operand } => {
                match self.expand_expr(operand, env, depth)? {
                    TemplateValue::CompileTime(value) => {
                        Ok(TemplateValue::CompileTime(eval_unary(*op, &value)?))
                    }
                    TemplateValue::Runtime(operand) => Ok(TemplateValue::Runtime(RtExpr::Unary {
                        op: *op,
                        operand: Box::new(operand),
                    })),
                }
            }
            TemplateExpr::Interpolated(parts) => self.expand_interpolated(parts, env, depth),
            TemplateExpr::ArrayInit { element, items } => {
                let element = self.resolve_type_ref(element, env)?;
                let items = items
                    .iter()
                    .map(|item| {
                        self.expand_expr(item, env, depth).map(|v| v.into_expr(self.model))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(TemplateValue::Runtime(RtExpr::ArrayCreation { element, items }))
            }
            TemplateExpr::TypeOf(ty) => {
                Ok(TemplateValue::Runtime(RtExpr::TypeOf(self.resolve_type_ref(ty, env)?)))
            }
            TemplateExpr::DefaultOf(ty) => {
                Ok(TemplateValue::Runtime(RtExpr::DefaultOf(self.resolve_type_ref(ty, env)?)))
            }
            TemplateExpr::New { ty, args } => {
                let ty = self.resolve_type_ref(ty, env)?;
                let args = args
                    .iter()
                    .map(|arg| self.expand_expr(arg, env, depth).map(|v| v.into_expr(self.model)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(TemplateValue::Runtime(RtExpr::ObjectCreation { ty, args }))
            }
        }
    }

    fn expand_interpolated(
        &self,
        parts: &[TemplateInterpolatedPart],
        env: &mut Env,
        depth: usize,
    ) -> Result<TemplateValue, Interrupt> {
        let mut rt_parts: Vec<InterpolatedPart> = Vec::with_capacity(parts.len());
        let mut all_const = true;
        for part in parts {
            match part {
                TemplateInterpolatedPart::Text(text) => {
                    push_text(&mut rt_parts, text);
                }
                TemplateInterpolatedPart::Expr(expr) => {
                    match self.expand_expr(expr, env, depth)? {
                        // Constant holes fold into the surrounding text.
                        TemplateValue::CompileTime(value) => {
                            push_text(&mut rt_parts, &value.to_string());
                        }
                        TemplateValue::Runtime(expr) => {
                            all_const = false;
                            rt_parts.push(InterpolatedPart::Expr(expr));
                        }
                    }
                }
            }
        }
        if all_const {
            let text: String = rt_parts
                .iter()
                .map(|part| match part {
                    InterpolatedPart::Text(text) => text.as_str(),
                    InterpolatedPart::Expr(_) => "",
                })
                .collect();
            return Ok(TemplateValue::CompileTime(crate::host::ConstValue::string(text)));
        }
        Ok(TemplateValue::Runtime(RtExpr::Interpolated { parts: rt_parts }))
    }

    // ========================================================================
    // ARGUMENTS AND TYPE REFERENCES
    // ========================================================================

    fn eval_args(
        &self,
        args: &[TemplateArg],
        env: &mut Env,
        depth: usize,
    ) -> Result<(Vec<TemplateValue>, Vec<(Name, TemplateValue)>), Interrupt> {
        let mut positional = Vec::new();
        let mut named = Vec::new();
        for arg in args {
            match arg {
                TemplateArg::Positional(expr) => {
                    positional.push(self.expand_expr(expr, env, depth)?);
                }
                TemplateArg::Named(name, expr) => {
                    named.push((name.clone(), self.expand_expr(expr, env, depth)?));
                }
            }
        }
        Ok((positional, named))
    }

    fn resolve_type_args(
        &self,
        type_args: &[TemplateTypeRef],
        env: &Env,
    ) -> Result<Vec<TypeArgValue>, Interrupt> {
        type_args
            .iter()
            .map(|arg| match arg {
                TemplateTypeRef::Model(ty) => Ok(TypeArgValue::CompileTime(*ty)),
                TemplateTypeRef::Named(name) => {
                    Ok(TypeArgValue::Runtime(RtType::named(name.clone())))
                }
                TemplateTypeRef::Param(name) => match env.lookup_type(name) {
                    Some(binding) => Ok(binding.clone()),
                    None => Err(ExpandError::UnknownIdentifier { name: name.clone() }.into()),
                },
            })
            .collect()
    }

    /// Resolve a template type reference into target syntax. Compile-time
    /// type parameters substitute their bound concrete type; run-time ones
    /// stay as named parameters in the output.
    fn resolve_type_ref(
        &self,
        type_ref: &TemplateTypeRef,
        env: &Env,
    ) -> Result<RtType, Interrupt> {
        match type_ref {
            TemplateTypeRef::Model(ty) => Ok(RtType::from_model(self.model, *ty)),
            TemplateTypeRef::Named(name) => Ok(RtType::named(name.clone())),
            TemplateTypeRef::Param(name) => match env.lookup_type(name) {
                Some(TypeArgValue::CompileTime(ty)) => Ok(RtType::from_model(self.model, *ty)),
                Some(TypeArgValue::Runtime(ty)) => Ok(ty.clone()),
                None => Err(ExpandError::UnknownIdentifier { name: name.clone() }.into()),
            },
        }
    }

    fn type_arg_to_syntax(&self, arg: TypeArgValue) -> RtType {
        match arg {
            TypeArgValue::CompileTime(ty) => RtType::from_model(self.model, ty),
            TypeArgValue::Runtime(ty) => ty,
        }
    }
}

/// Compile-time member access on constants. Only the members with an obvious
/// constant meaning are supported.
fn const_member(
    value: &crate::host::ConstValue,
    name: &str,
) -> Result<crate::host::ConstValue, ExpandError> {
    use crate::host::ConstValue;
    match (value, name) {
        (ConstValue::Str(s), "Length") => Ok(ConstValue::Int(s.len() as i64)),
        (ConstValue::Array(items), "Length") => Ok(ConstValue::Int(items.len() as i64)),
        _ => Err(ExpandError::type_mismatch(format!(
            "member '{name}' is not available on a compile-time {} value",
            value.kind_name()
        ))),
    }
}

fn push_text(parts: &mut Vec<InterpolatedPart>, text: &str) {
    if let Some(InterpolatedPart::Text(last)) = parts.last_mut() {
        last.push_str(text);
    } else {
        parts.push(InterpolatedPart::Text(text.to_string()));
    }
}
