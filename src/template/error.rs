//! Template expansion errors.
//!
//! Every expansion failure is a user-code error: it becomes a diagnostic
//! with a stable code and the declaring location of the innermost template
//! frame, so nested sub-template calls still point somewhere useful.

use thiserror::Error;

use crate::base::{Location, Name};
use crate::diagnostics::{Diagnostic, codes};

/// What went wrong during expansion.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ExpandError {
    #[error("cannot use 'this' in a static context")]
    ThisInStaticContext,

    #[error("missing required template argument '{name}'")]
    MissingArgument { name: Name },

    #[error("unknown template argument '{name}'")]
    UnknownArgument { name: Name },

    #[error("template argument '{name}' is bound more than once")]
    DuplicateArgument { name: Name },

    #[error("expected at most {expected} positional argument(s), got {actual}")]
    TooManyArguments { expected: usize, actual: usize },

    #[error("no template named '{name}' in aspect '{aspect}'")]
    UnknownTemplate { name: Name, aspect: Name },

    #[error("unknown identifier '{name}'")]
    UnknownIdentifier { name: Name },

    #[error("generic template '{name}' expects {expected} type argument(s), got {actual}")]
    GenericArityMismatch { name: Name, expected: usize, actual: usize },

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("sub-template '{name}' used as an expression must expand to a single return")]
    NotAnExpression { name: Name },

    #[error("template recursion limit exceeded")]
    RecursionLimit,
}

impl ExpandError {
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch(message.into())
    }

    /// The stable diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ThisInStaticContext => codes::THIS_IN_STATIC_CONTEXT,
            Self::MissingArgument { .. } => codes::MISSING_ARGUMENT,
            Self::UnknownArgument { .. } | Self::DuplicateArgument { .. } => {
                codes::UNKNOWN_ARGUMENT
            }
            Self::UnknownTemplate { .. } => codes::UNKNOWN_TEMPLATE,
            _ => codes::EXPANSION_FAILED,
        }
    }
}

/// An expansion error with its innermost template frame attached.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{error} (while expanding template '{template}')")]
pub struct ExpandFailure {
    pub error: ExpandError,
    /// The template whose body was being expanded when the error occurred.
    pub template: Name,
    /// The template's declaring location, when known.
    pub location: Option<Location>,
}

impl ExpandFailure {
    pub fn new(error: ExpandError, template: impl Into<Name>, location: Option<Location>) -> Self {
        Self { error, template: template.into(), location }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string())
            .with_code(self.error.code())
            .with_optional_location(self.location.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_keeps_innermost_frame() {
        let failure = ExpandFailure::new(
            ExpandError::MissingArgument { name: Name::new("i") },
            "CalledTemplate",
            None,
        );
        assert!(failure.to_string().contains("CalledTemplate"));
        assert!(failure.to_string().contains("missing required template argument 'i'"));
    }

    #[test]
    fn test_codes() {
        assert_eq!(ExpandError::ThisInStaticContext.code(), "WFT0001");
        assert_eq!(ExpandError::MissingArgument { name: Name::new("x") }.code(), "WFT0002");
        assert_eq!(
            ExpandError::UnknownTemplate { name: Name::new("T"), aspect: Name::new("A") }.code(),
            "WFT0005"
        );
    }
}
