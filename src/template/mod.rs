//! # Template Expansion
//!
//! A tree-rewriting interpreter over template bodies. Compile-time-typed
//! expressions evaluate immediately; run-time-typed expressions lower to
//! generated syntax — the dynamic/static duality made first-class by
//! [`TemplateValue`].
//!
//! ## Key Types
//!
//! - [`TemplateDeclaration`] — a template's name, signature and body
//! - [`TemplateExpander`] — expands templates for one aspect application
//! - [`MetaApi`] — the expansion context (`this`/`base`, proceed, tags)
//! - [`AspectClass`] / [`TemplateResolutionTable`] — virtual sub-template
//!   dispatch
//! - [`RtStmt`] / [`RtExpr`] — the generated run-time syntax

mod ast;
mod binding;
mod dispatch;
mod error;
mod expand;
mod meta;
mod normalize;
mod syntax;
mod value;

pub use ast::{
    TemplateArg, TemplateDeclaration, TemplateExpr, TemplateInterpolatedPart, TemplateParam,
    TemplateSignature, TemplateStmt, TemplateSwitchArm, TemplateTypeParam, TemplateTypeRef,
};
pub use binding::{BoundArguments, bind_argument_bag, bind_arguments};
pub use dispatch::{AspectClass, TemplateResolutionTable};
pub use error::{ExpandError, ExpandFailure};
pub use expand::{TemplateExpander, TypeArgValue};
pub use meta::{MetaApi, Staticity};
pub use normalize::normalize_returns;
pub use syntax::{
    BinaryOp, InterpolatedPart, RtExpr, RtStmt, RtSwitchArm, RtType, SwitchLabel, UnaryOp,
    render_expr, render_stmts,
};
pub use value::{TemplateValue, quote_const};
