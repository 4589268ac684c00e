//! Typed constant values.
//!
//! Constants appear in attribute arguments, parameter defaults and
//! compile-time template evaluation. `Type` constants reference the host's
//! interned type arena; arrays nest recursively.

use std::fmt;

use crate::base::{Name, TypeId};

/// A typed constant value.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(Name),
    /// An enum member: the enum type plus its underlying value.
    Enum { ty: TypeId, value: i64 },
    /// A `typeof`-style type constant.
    Type(TypeId),
    /// An ordered constant array.
    Array(Vec<ConstValue>),
}

impl ConstValue {
    pub fn string(value: impl Into<Name>) -> Self {
        Self::Str(value.into())
    }

    /// A short label for the value's shape, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Double(_) => "double",
            Self::Str(_) => "string",
            Self::Enum { .. } => "enum",
            Self::Type(_) => "type",
            Self::Array(_) => "array",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Enum { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<TypeId> {
        match self {
            Self::Type(ty) => Some(*ty),
            _ => None,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Enum { value, .. } => write!(f, "{value}"),
            Self::Type(ty) => write!(f, "{ty}"),
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}
