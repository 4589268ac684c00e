//! Error types for code-model operations.

use thiserror::Error;

use crate::base::Location;
use crate::diagnostics::{Diagnostic, codes};

/// Errors that can occur while building or querying the code model.
///
/// `TypeResolution` and `InvalidArgument` are user-code errors and convert
/// to diagnostics; `Unsupported` is an assertion-style internal invariant
/// violation and must never be silently swallowed; `NotImplemented` marks
/// explicitly unsupported corners, distinguishable from both.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A type name supplied by user code does not exist in the compilation.
    #[error("type '{name}' could not be resolved in the compilation")]
    TypeResolution { name: String },

    /// An invalid argument reached the type factory (e.g. a by-ref type).
    #[error("invalid type argument: {0}")]
    InvalidArgument(String),

    /// A symbol shape the model has no representation for.
    #[error("unsupported symbol shape: {0}")]
    Unsupported(String),

    /// A corner the model deliberately does not implement yet.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// The walk was cancelled by the host.
    #[error("model construction was cancelled")]
    Cancelled,
}

impl ModelError {
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// The requested name of a failed type resolution.
    pub fn requested_name(&self) -> Option<&str> {
        match self {
            Self::TypeResolution { name } => Some(name),
            _ => None,
        }
    }

    /// Whether this error is a user-code error (reportable as a diagnostic)
    /// rather than an internal invariant violation.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::TypeResolution { .. } | Self::InvalidArgument(_))
    }

    /// Render a user-code error as a diagnostic. Internal errors keep their
    /// message but carry no stable code, so tooling can tell them apart.
    pub fn to_diagnostic(&self, location: Option<Location>) -> Diagnostic {
        let diagnostic = Diagnostic::error(self.to_string()).with_optional_location(location);
        match self {
            Self::TypeResolution { .. } => diagnostic.with_code(codes::TYPE_NOT_FOUND),
            Self::InvalidArgument(_) => diagnostic.with_code(codes::INVALID_TYPE_ARGUMENT),
            _ => diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_resolution_carries_name() {
        let err = ModelError::TypeResolution { name: "NoSuchNamespace.NoSuchType".into() };
        assert_eq!(err.requested_name(), Some("NoSuchNamespace.NoSuchType"));
        assert!(err.is_user_error());
        assert!(err.to_string().contains("NoSuchNamespace.NoSuchType"));
    }

    #[test]
    fn test_taxonomy_is_distinguishable() {
        assert!(!ModelError::unsupported("anonymous function").is_user_error());
        assert!(!ModelError::NotImplemented("reference validation").is_user_error());
        assert!(ModelError::invalid_argument("ref type").is_user_error());
    }
}
