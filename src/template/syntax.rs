//! Generated run-time syntax.
//!
//! Expanding a template produces a tree of [`RtStmt`]s: the code that should
//! run at run time. Invocations and `this` receivers carry optional
//! [`AspectReferenceSpec`] annotations for the linking pass; the annotations
//! have no textual form in the rendered output.

use std::fmt::Write as _;

use crate::base::Name;
use crate::host::{ConstValue, HostType};
use crate::model::{AspectReferenceSpec, CompilationModel, Type};

// ============================================================================
// TYPES
// ============================================================================

/// A type as written in generated syntax.
#[derive(Clone, Debug, PartialEq)]
pub enum RtType {
    Named { name: Name, type_args: Vec<RtType> },
    Array { element: Box<RtType>, rank: u8 },
    Pointer(Box<RtType>),
    Dynamic,
    /// A run-time generic parameter of the expanded declaration.
    Param(Name),
}

impl RtType {
    pub fn named(name: impl Into<Name>) -> Self {
        Self::Named { name: name.into(), type_args: Vec::new() }
    }

    /// Lower a model type to target syntax. Special types render as their
    /// language keyword; generic parameters keep their name.
    pub fn from_model(model: &CompilationModel, ty: Type) -> Self {
        let host = model.host();
        match host.host_type(ty.raw()) {
            HostType::Named(sym) => {
                let data = host.symbol(sym);
                if let Some(type_sym) = data.as_type() {
                    if let Some(special) = type_sym.special {
                        return Self::named(special.keyword());
                    }
                    let type_args = type_sym
                        .type_args
                        .iter()
                        .map(|arg| Self::from_model(model, model.wrap_type(*arg)))
                        .collect();
                    return Self::Named { name: host.qualified_name(sym), type_args };
                }
                Self::named(host.qualified_name(sym))
            }
            HostType::Array { element, rank } => Self::Array {
                element: Box::new(Self::from_model(model, model.wrap_type(element))),
                rank,
            },
            HostType::Pointer { pointee } => {
                Self::Pointer(Box::new(Self::from_model(model, model.wrap_type(pointee))))
            }
            HostType::GenericParameter(sym) => Self::Param(host.symbol(sym).name.clone()),
            HostType::Dynamic => Self::Dynamic,
            // Rejected upstream by the type factory; render something legible
            // if one ever leaks into diagnostics.
            HostType::Ref { referent } => {
                Self::named(host.display_type(referent))
            }
        }
    }

    pub fn render(&self) -> String {
        match self {
            Self::Named { name, type_args } => {
                if type_args.is_empty() {
                    name.to_string()
                } else {
                    let args: Vec<String> = type_args.iter().map(Self::render).collect();
                    format!("{name}<{}>", args.join(", "))
                }
            }
            Self::Array { element, rank } => {
                let commas = ",".repeat(rank.saturating_sub(1) as usize);
                format!("{}[{}]", element.render(), commas)
            }
            Self::Pointer(pointee) => format!("{}*", pointee.render()),
            Self::Dynamic => "dynamic".to_string(),
            Self::Param(name) => name.to_string(),
        }
    }
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Neg => "-",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum InterpolatedPart {
    Text(String),
    Expr(RtExpr),
}

/// A generated run-time expression.
#[derive(Clone, Debug, PartialEq)]
pub enum RtExpr {
    Ident(Name),
    Literal(ConstValue),
    This {
        aspect_ref: Option<AspectReferenceSpec>,
    },
    Member {
        receiver: Option<Box<RtExpr>>,
        name: Name,
    },
    Invocation {
        callee: Box<RtExpr>,
        type_args: Vec<RtType>,
        args: Vec<RtExpr>,
        aspect_ref: Option<AspectReferenceSpec>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<RtExpr>,
        rhs: Box<RtExpr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<RtExpr>,
    },
    ObjectCreation {
        ty: RtType,
        args: Vec<RtExpr>,
    },
    ArrayCreation {
        element: RtType,
        items: Vec<RtExpr>,
    },
    Interpolated {
        parts: Vec<InterpolatedPart>,
    },
    TypeOf(RtType),
    DefaultOf(RtType),
    Cast {
        ty: RtType,
        expr: Box<RtExpr>,
    },
}

impl RtExpr {
    pub fn ident(name: impl Into<Name>) -> Self {
        Self::Ident(name.into())
    }

    pub fn member(receiver: Option<RtExpr>, name: impl Into<Name>) -> Self {
        Self::Member { receiver: receiver.map(Box::new), name: name.into() }
    }
}

// ============================================================================
// STATEMENTS
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum SwitchLabel {
    Const(ConstValue),
    Default,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RtSwitchArm {
    pub label: SwitchLabel,
    pub body: Vec<RtStmt>,
}

/// A generated run-time statement.
#[derive(Clone, Debug, PartialEq)]
pub enum RtStmt {
    Expr(RtExpr),
    Local {
        name: Name,
        ty: Option<RtType>,
        init: Option<RtExpr>,
    },
    Return(Option<RtExpr>),
    If {
        cond: RtExpr,
        then_branch: Vec<RtStmt>,
        else_branch: Option<Vec<RtStmt>>,
    },
    Switch {
        scrutinee: RtExpr,
        arms: Vec<RtSwitchArm>,
        /// Whether the arms cover every possible value (a `default` arm or a
        /// complete enum match). Drives return normalization.
        exhaustive: bool,
    },
    Block(Vec<RtStmt>),
}

// ============================================================================
// RENDERER
// ============================================================================

/// Render generated statements as target-language source text.
pub fn render_stmts(stmts: &[RtStmt]) -> String {
    let mut out = String::new();
    for stmt in stmts {
        render_stmt(stmt, 0, &mut out);
    }
    out
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("    ");
    }
}

fn render_stmt(stmt: &RtStmt, depth: usize, out: &mut String) {
    match stmt {
        RtStmt::Expr(expr) => {
            indent(depth, out);
            let _ = writeln!(out, "{};", render_expr(expr));
        }
        RtStmt::Local { name, ty, init } => {
            indent(depth, out);
            let ty = ty.as_ref().map(RtType::render).unwrap_or_else(|| "var".to_string());
            match init {
                Some(init) => {
                    let _ = writeln!(out, "{ty} {name} = {};", render_expr(init));
                }
                None => {
                    let _ = writeln!(out, "{ty} {name};");
                }
            }
        }
        RtStmt::Return(None) => {
            indent(depth, out);
            out.push_str("return;\n");
        }
        RtStmt::Return(Some(expr)) => {
            indent(depth, out);
            let _ = writeln!(out, "return {};", render_expr(expr));
        }
        RtStmt::If { cond, then_branch, else_branch } => {
            indent(depth, out);
            let _ = writeln!(out, "if ({})", render_expr(cond));
            render_block(then_branch, depth, out);
            if let Some(else_branch) = else_branch {
                indent(depth, out);
                out.push_str("else\n");
                render_block(else_branch, depth, out);
            }
        }
        RtStmt::Switch { scrutinee, arms, .. } => {
            indent(depth, out);
            let _ = writeln!(out, "switch ({})", render_expr(scrutinee));
            indent(depth, out);
            out.push_str("{\n");
            for arm in arms {
                indent(depth + 1, out);
                match &arm.label {
                    SwitchLabel::Const(value) => {
                        let _ = writeln!(out, "case {}:", render_literal(value));
                    }
                    SwitchLabel::Default => out.push_str("default:\n"),
                }
                for stmt in &arm.body {
                    render_stmt(stmt, depth + 2, out);
                }
                indent(depth + 2, out);
                out.push_str("break;\n");
            }
            indent(depth, out);
            out.push_str("}\n");
        }
        RtStmt::Block(stmts) => render_block(stmts, depth, out),
    }
}

fn render_block(stmts: &[RtStmt], depth: usize, out: &mut String) {
    indent(depth, out);
    out.push_str("{\n");
    for stmt in stmts {
        render_stmt(stmt, depth + 1, out);
    }
    indent(depth, out);
    out.push_str("}\n");
}

fn render_literal(value: &ConstValue) -> String {
    match value {
        ConstValue::Null => "null".to_string(),
        ConstValue::Bool(b) => b.to_string(),
        ConstValue::Int(i) => i.to_string(),
        ConstValue::Double(d) => {
            if d.fract() == 0.0 && d.is_finite() {
                format!("{d:.1}")
            } else {
                d.to_string()
            }
        }
        ConstValue::Str(s) => format!("{:?}", s.as_str()),
        ConstValue::Enum { value, .. } => value.to_string(),
        ConstValue::Type(_) => "typeof(?)".to_string(),
        ConstValue::Array(items) => {
            let rendered: Vec<String> = items.iter().map(render_literal).collect();
            format!("{{ {} }}", rendered.join(", "))
        }
    }
}

pub fn render_expr(expr: &RtExpr) -> String {
    match expr {
        RtExpr::Ident(name) => name.to_string(),
        RtExpr::Literal(value) => render_literal(value),
        RtExpr::This { .. } => "this".to_string(),
        RtExpr::Member { receiver, name } => match receiver {
            Some(receiver) => format!("{}.{name}", render_expr(receiver)),
            None => name.to_string(),
        },
        RtExpr::Invocation { callee, type_args, args, .. } => {
            let rendered_args: Vec<String> = args.iter().map(render_expr).collect();
            let generics = if type_args.is_empty() {
                String::new()
            } else {
                let rendered: Vec<String> = type_args.iter().map(RtType::render).collect();
                format!("<{}>", rendered.join(", "))
            };
            format!("{}{generics}({})", render_expr(callee), rendered_args.join(", "))
        }
        RtExpr::Binary { op, lhs, rhs } => {
            format!("{} {} {}", render_expr(lhs), op.symbol(), render_expr(rhs))
        }
        RtExpr::Unary { op, operand } => format!("{}{}", op.symbol(), render_expr(operand)),
        RtExpr::ObjectCreation { ty, args } => {
            let rendered: Vec<String> = args.iter().map(render_expr).collect();
            format!("new {}({})", ty.render(), rendered.join(", "))
        }
        RtExpr::ArrayCreation { element, items } => {
            let rendered: Vec<String> = items.iter().map(render_expr).collect();
            format!("new {}[] {{ {} }}", element.render(), rendered.join(", "))
        }
        RtExpr::Interpolated { parts } => {
            let mut body = String::new();
            for part in parts {
                match part {
                    InterpolatedPart::Text(text) => body.push_str(text),
                    InterpolatedPart::Expr(expr) => {
                        let _ = write!(body, "{{{}}}", render_expr(expr));
                    }
                }
            }
            format!("$\"{body}\"")
        }
        RtExpr::TypeOf(ty) => format!("typeof({})", ty.render()),
        RtExpr::DefaultOf(ty) => format!("default({})", ty.render()),
        RtExpr::Cast { ty, expr } => format!("({}){}", ty.render(), render_expr(expr)),
    }
}
