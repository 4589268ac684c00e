//! The compile-time/run-time duality, as a first-class type.
//!
//! Every template expression evaluates to a [`TemplateValue`]: either a
//! constant known now, or a syntax fragment representing the code that will
//! compute it at run time. An operation with only compile-time operands is
//! evaluated immediately; one with any run-time operand lowers to syntax,
//! quoting the compile-time operands as literals.

use crate::host::{ConstValue, HostType};
use crate::model::CompilationModel;

use super::error::ExpandError;
use super::syntax::{BinaryOp, RtExpr, RtType, UnaryOp};

/// Either a compile-time constant or a run-time syntax fragment.
#[derive(Clone, Debug, PartialEq)]
pub enum TemplateValue {
    CompileTime(ConstValue),
    Runtime(RtExpr),
}

impl TemplateValue {
    pub fn is_compile_time(&self) -> bool {
        matches!(self, Self::CompileTime(_))
    }

    pub fn as_const(&self) -> Option<&ConstValue> {
        match self {
            Self::CompileTime(value) => Some(value),
            Self::Runtime(_) => None,
        }
    }

    /// Lower to syntax: run-time values pass through, compile-time values
    /// are quoted as literals.
    pub fn into_expr(self, model: &CompilationModel) -> RtExpr {
        match self {
            Self::Runtime(expr) => expr,
            Self::CompileTime(value) => quote_const(model, &value),
        }
    }
}

/// Quote a constant into run-time syntax.
pub fn quote_const(model: &CompilationModel, value: &ConstValue) -> RtExpr {
    match value {
        ConstValue::Null
        | ConstValue::Bool(_)
        | ConstValue::Int(_)
        | ConstValue::Double(_)
        | ConstValue::Str(_) => RtExpr::Literal(value.clone()),
        ConstValue::Enum { ty, value } => RtExpr::Cast {
            ty: RtType::from_model(model, model.wrap_type(*ty)),
            expr: Box::new(RtExpr::Literal(ConstValue::Int(*value))),
        },
        ConstValue::Type(ty) => RtExpr::TypeOf(RtType::from_model(model, model.wrap_type(*ty))),
        ConstValue::Array(items) => RtExpr::ArrayCreation {
            element: infer_array_element(model, items),
            items: items.iter().map(|item| quote_const(model, item)).collect(),
        },
    }
}

fn infer_array_element(model: &CompilationModel, items: &[ConstValue]) -> RtType {
    let mut kinds = items.iter().map(ConstValue::kind_name);
    let first = kinds.next();
    let uniform = first.is_some_and(|f| kinds.all(|k| k == f));
    if !uniform {
        return RtType::named("object");
    }
    match items.first() {
        Some(ConstValue::Int(_)) => RtType::named("int"),
        Some(ConstValue::Bool(_)) => RtType::named("bool"),
        Some(ConstValue::Double(_)) => RtType::named("double"),
        Some(ConstValue::Str(_)) => RtType::named("string"),
        // typeof(T) values are System.Type instances.
        Some(ConstValue::Type(_)) => RtType::named("System.Type"),
        Some(ConstValue::Enum { ty, .. }) => {
            if let HostType::Named(_) = model.host().host_type(*ty) {
                RtType::from_model(model, model.wrap_type(*ty))
            } else {
                RtType::named("object")
            }
        }
        _ => RtType::named("object"),
    }
}

// ============================================================================
// CONSTANT EVALUATION
// ============================================================================

/// Whether a compile-time condition holds. Only booleans are conditions.
pub fn const_truth(value: &ConstValue) -> Result<bool, ExpandError> {
    value.as_bool().ok_or_else(|| {
        ExpandError::type_mismatch(format!("expected a bool condition, got {}", value.kind_name()))
    })
}

/// Evaluate a binary operation over two compile-time constants.
pub fn eval_binary(
    op: BinaryOp,
    lhs: &ConstValue,
    rhs: &ConstValue,
) -> Result<ConstValue, ExpandError> {
    use ConstValue::*;

    let mismatch = || {
        ExpandError::type_mismatch(format!(
            "operator '{}' cannot be applied to {} and {}",
            op.symbol(),
            lhs.kind_name(),
            rhs.kind_name()
        ))
    };

    match op {
        BinaryOp::Add => match (lhs, rhs) {
            (Int(a), Int(b)) => Ok(Int(a.wrapping_add(*b))),
            (Double(a), Double(b)) => Ok(Double(a + b)),
            (Int(a), Double(b)) => Ok(Double(*a as f64 + b)),
            (Double(a), Int(b)) => Ok(Double(a + *b as f64)),
            // String concatenation when either side is a string.
            (Str(a), b) => Ok(ConstValue::string(format!("{a}{b}"))),
            (a, Str(b)) => Ok(ConstValue::string(format!("{a}{b}"))),
            _ => Err(mismatch()),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            match (lhs, rhs) {
                (Int(a), Int(b)) => {
                    if matches!(op, BinaryOp::Div | BinaryOp::Rem) && *b == 0 {
                        return Err(ExpandError::type_mismatch("division by zero"));
                    }
                    Ok(Int(match op {
                        BinaryOp::Sub => a.wrapping_sub(*b),
                        BinaryOp::Mul => a.wrapping_mul(*b),
                        BinaryOp::Div => a / b,
                        _ => a % b,
                    }))
                }
                (Double(a), Double(b)) => Ok(Double(apply_f64(op, *a, *b))),
                (Int(a), Double(b)) => Ok(Double(apply_f64(op, *a as f64, *b))),
                (Double(a), Int(b)) => Ok(Double(apply_f64(op, *a, *b as f64))),
                _ => Err(mismatch()),
            }
        }
        BinaryOp::Eq => Ok(Bool(const_eq(lhs, rhs))),
        BinaryOp::Ne => Ok(Bool(!const_eq(lhs, rhs))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (lhs, rhs) {
                (Int(a), Int(b)) => a.partial_cmp(b),
                (Double(a), Double(b)) => a.partial_cmp(b),
                (Int(a), Double(b)) => (*a as f64).partial_cmp(b),
                (Double(a), Int(b)) => a.partial_cmp(&(*b as f64)),
                (Str(a), Str(b)) => a.partial_cmp(b),
                _ => None,
            }
            .ok_or_else(mismatch)?;
            Ok(Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
        BinaryOp::And | BinaryOp::Or => match (lhs, rhs) {
            (Bool(a), Bool(b)) => Ok(Bool(if op == BinaryOp::And { *a && *b } else { *a || *b })),
            _ => Err(mismatch()),
        },
    }
}

fn apply_f64(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => a % b,
    }
}

pub(crate) fn const_eq(lhs: &ConstValue, rhs: &ConstValue) -> bool {
    use ConstValue::*;
    match (lhs, rhs) {
        (Int(a), Double(b)) | (Double(b), Int(a)) => *a as f64 == *b,
        (Enum { value: a, .. }, Int(b)) | (Int(b), Enum { value: a, .. }) => a == b,
        _ => lhs == rhs,
    }
}

/// Evaluate a unary operation over a compile-time constant.
pub fn eval_unary(op: UnaryOp, operand: &ConstValue) -> Result<ConstValue, ExpandError> {
    use ConstValue::*;
    match (op, operand) {
        (UnaryOp::Not, Bool(b)) => Ok(Bool(!b)),
        (UnaryOp::Neg, Int(i)) => Ok(Int(-i)),
        (UnaryOp::Neg, Double(d)) => Ok(Double(-d)),
        _ => Err(ExpandError::type_mismatch(format!(
            "operator '{}' cannot be applied to {}",
            op.symbol(),
            operand.kind_name()
        ))),
    }
}
