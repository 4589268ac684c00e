//! The template body representation.
//!
//! A template is ordinary code marked for expansion: its statements mix
//! compile-time and run-time semantics, resolved per expression during
//! expansion. Signatures mix run-time parameters and compile-time-tagged
//! parameters, each optionally defaulted.

use crate::base::{Location, Name};
use crate::host::ConstValue;
use crate::model::Type;

use super::syntax::{BinaryOp, SwitchLabel, UnaryOp};

// ============================================================================
// SIGNATURES
// ============================================================================

#[derive(Clone, Debug)]
pub struct TemplateParam {
    pub name: Name,
    /// Marked `[CompileTime]`: bound to a constant during expansion.
    pub is_compile_time: bool,
    pub default: Option<ConstValue>,
}

#[derive(Clone, Debug)]
pub struct TemplateTypeParam {
    pub name: Name,
    /// Compile-time type parameters bind immediately; run-time ones become
    /// part of the generated type-argument list.
    pub is_compile_time: bool,
}

#[derive(Clone, Debug, Default)]
pub struct TemplateSignature {
    pub params: Vec<TemplateParam>,
    pub type_params: Vec<TemplateTypeParam>,
}

impl TemplateSignature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: impl Into<Name>) -> Self {
        self.params.push(TemplateParam { name: name.into(), is_compile_time: false, default: None });
        self
    }

    pub fn param_with_default(mut self, name: impl Into<Name>, default: ConstValue) -> Self {
        self.params.push(TemplateParam {
            name: name.into(),
            is_compile_time: false,
            default: Some(default),
        });
        self
    }

    pub fn compile_time_param(mut self, name: impl Into<Name>) -> Self {
        self.params.push(TemplateParam { name: name.into(), is_compile_time: true, default: None });
        self
    }

    pub fn compile_time_param_with_default(
        mut self,
        name: impl Into<Name>,
        default: ConstValue,
    ) -> Self {
        self.params.push(TemplateParam {
            name: name.into(),
            is_compile_time: true,
            default: Some(default),
        });
        self
    }

    pub fn type_param(mut self, name: impl Into<Name>) -> Self {
        self.type_params.push(TemplateTypeParam { name: name.into(), is_compile_time: false });
        self
    }

    pub fn compile_time_type_param(mut self, name: impl Into<Name>) -> Self {
        self.type_params.push(TemplateTypeParam { name: name.into(), is_compile_time: true });
        self
    }

    pub fn find_param(&self, name: &str) -> Option<&TemplateParam> {
        self.params.iter().find(|p| p.name == name)
    }
}

// ============================================================================
// DECLARATIONS
// ============================================================================

/// A template method: a name, a signature and a body, with virtual/override
/// flags resolved by the per-hierarchy resolution table.
#[derive(Clone, Debug)]
pub struct TemplateDeclaration {
    pub name: Name,
    pub signature: TemplateSignature,
    pub body: Vec<TemplateStmt>,
    pub is_virtual: bool,
    pub is_override: bool,
    pub location: Option<Location>,
}

impl TemplateDeclaration {
    pub fn new(name: impl Into<Name>, signature: TemplateSignature, body: Vec<TemplateStmt>) -> Self {
        Self {
            name: name.into(),
            signature,
            body,
            is_virtual: false,
            is_override: false,
            location: None,
        }
    }

    pub fn virtual_(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    pub fn override_(mut self) -> Self {
        self.is_override = true;
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

// ============================================================================
// TYPE REFERENCES
// ============================================================================

/// A type written in a template body.
#[derive(Clone, Debug)]
pub enum TemplateTypeRef {
    /// A concrete model type, bound at compile time.
    Model(Type),
    /// A template type parameter, resolved against the expansion
    /// environment (substituted if compile-time, kept if run-time).
    Param(Name),
    /// A type name written literally for the generated program.
    Named(Name),
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[derive(Clone, Debug)]
pub enum TemplateArg {
    Positional(TemplateExpr),
    Named(Name, TemplateExpr),
}

#[derive(Clone, Debug)]
pub enum TemplateInterpolatedPart {
    Text(String),
    Expr(TemplateExpr),
}

#[derive(Clone, Debug)]
pub enum TemplateExpr {
    /// A constant literal.
    Const(ConstValue),
    /// Reference to a template parameter or local.
    Name(Name),
    /// A name that belongs to the generated run-time program.
    RuntimeIdent(Name),
    /// `meta.This` — the advised target's instance receiver.
    This,
    /// `meta.Base` — the previous implementation's receiver.
    Base,
    /// `meta.Proceed()` — invoke the underlying implementation.
    Proceed,
    /// `meta.Target.Name` — the target declaration's name, as a constant.
    TargetName,
    /// A value from the caller-provided tag bag.
    Tag(Name),
    Member {
        receiver: Box<TemplateExpr>,
        name: Name,
    },
    Call {
        callee: Box<TemplateExpr>,
        type_args: Vec<TemplateTypeRef>,
        args: Vec<TemplateArg>,
    },
    /// A call to another template, dispatched virtually through the aspect
    /// class hierarchy and expanded inline.
    CallTemplate {
        name: Name,
        type_args: Vec<TemplateTypeRef>,
        args: Vec<TemplateArg>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<TemplateExpr>,
        rhs: Box<TemplateExpr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<TemplateExpr>,
    },
    Interpolated(Vec<TemplateInterpolatedPart>),
    ArrayInit {
        element: TemplateTypeRef,
        items: Vec<TemplateExpr>,
    },
    TypeOf(TemplateTypeRef),
    DefaultOf(TemplateTypeRef),
    New {
        ty: TemplateTypeRef,
        args: Vec<TemplateExpr>,
    },
}

impl TemplateExpr {
    pub fn name(name: impl Into<Name>) -> Self {
        Self::Name(name.into())
    }

    pub fn runtime_ident(name: impl Into<Name>) -> Self {
        Self::RuntimeIdent(name.into())
    }

    pub fn int(value: i64) -> Self {
        Self::Const(ConstValue::Int(value))
    }

    pub fn str(value: &str) -> Self {
        Self::Const(ConstValue::string(value))
    }

    pub fn member(receiver: TemplateExpr, name: impl Into<Name>) -> Self {
        Self::Member { receiver: Box::new(receiver), name: name.into() }
    }

    pub fn call(callee: TemplateExpr, args: Vec<TemplateExpr>) -> Self {
        Self::Call {
            callee: Box::new(callee),
            type_args: Vec::new(),
            args: args.into_iter().map(TemplateArg::Positional).collect(),
        }
    }

    pub fn binary(op: BinaryOp, lhs: TemplateExpr, rhs: TemplateExpr) -> Self {
        Self::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }
}

// ============================================================================
// STATEMENTS
// ============================================================================

#[derive(Clone, Debug)]
pub struct TemplateSwitchArm {
    pub label: SwitchLabel,
    pub body: Vec<TemplateStmt>,
}

#[derive(Clone, Debug)]
pub enum TemplateStmt {
    Expr(TemplateExpr),
    /// A local binding. Compile-time locals bind into the expansion
    /// environment; run-time locals emit a local declaration.
    Local {
        name: Name,
        compile_time: bool,
        init: TemplateExpr,
    },
    /// A native `return` written in the template body.
    Return(Option<TemplateExpr>),
    /// `meta.Return(...)`: lowers to a value return or a bare return
    /// depending on the target's void-ness.
    MetaReturn(Option<TemplateExpr>),
    If {
        cond: TemplateExpr,
        then_branch: Vec<TemplateStmt>,
        else_branch: Option<Vec<TemplateStmt>>,
    },
    Switch {
        scrutinee: TemplateExpr,
        arms: Vec<TemplateSwitchArm>,
        exhaustive: bool,
    },
    Block(Vec<TemplateStmt>),
    /// A statement-position sub-template call, spliced inline.
    ExpandTemplate {
        name: Name,
        type_args: Vec<TemplateTypeRef>,
        args: Vec<TemplateArg>,
    },
}
