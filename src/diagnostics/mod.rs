//! Diagnostics — user-facing error reporting.
//!
//! User-code errors (bad template code, bad aspect configuration, invalid
//! type names) become diagnostics with a location and a stable code, never
//! an unhandled crash. Diagnostics accumulate per target so one failing
//! aspect application does not abort unrelated ones.

use std::fmt;
use std::sync::Arc;

use crate::base::{Location, Name};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

/// Stable diagnostic codes.
///
/// The numeric ranges group by subsystem: 00xx template expansion,
/// 01xx code model, 02xx aspects.
pub mod codes {
    /// `this`/`base` referenced from a static context.
    pub const THIS_IN_STATIC_CONTEXT: &str = "WFT0001";
    /// A required template argument was not supplied.
    pub const MISSING_ARGUMENT: &str = "WFT0002";
    /// An argument name does not match any template parameter.
    pub const UNKNOWN_ARGUMENT: &str = "WFT0003";
    /// The same template parameter was bound more than once.
    pub const DUPLICATE_ARGUMENT: &str = "WFT0004";
    /// No template with the requested name exists in the aspect hierarchy.
    pub const UNKNOWN_TEMPLATE: &str = "WFT0005";
    /// A template expression could not be expanded.
    pub const EXPANSION_FAILED: &str = "WFT0006";
    /// A type name could not be resolved in the compilation.
    pub const TYPE_NOT_FOUND: &str = "WFT0101";
    /// An invalid argument reached the type factory.
    pub const INVALID_TYPE_ARGUMENT: &str = "WFT0102";
    /// An introduced member collides with an existing member.
    pub const MEMBER_ALREADY_EXISTS: &str = "WFT0201";
    /// Constructing the aspect attribute instance failed.
    pub const ASPECT_CONSTRUCTION_FAILED: &str = "WFT0202";
}

/// A diagnostic message with optional location and code.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Stable code such as "WFT0001".
    pub code: Option<Arc<str>>,
    pub message: Arc<str>,
    pub location: Option<Location>,
    /// Optional related locations (e.g. the conflicting member).
    pub related: Vec<RelatedInfo>,
}

/// Related information for a diagnostic.
#[derive(Clone, Debug)]
pub struct RelatedInfo {
    pub location: Option<Location>,
    pub message: Arc<str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<Arc<str>>) -> Self {
        Self {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            location: None,
            related: Vec::new(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<Arc<str>>) -> Self {
        Self {
            severity: Severity::Warning,
            code: None,
            message: message.into(),
            location: None,
            related: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(Arc::from(code));
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_optional_location(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }

    pub fn with_related(mut self, location: Option<Location>, message: impl Into<Arc<str>>) -> Self {
        self.related.push(RelatedInfo { location, message: message.into() });
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = &self.code {
            write!(f, "[{code}] ")?;
        }
        write!(f, "{}", self.message)?;
        if let Some(location) = &self.location {
            write!(f, " ({location})")?;
        }
        Ok(())
    }
}

// ============================================================================
// SINK
// ============================================================================

/// Accumulates diagnostics for one target declaration.
///
/// A sink never aborts: callers push diagnostics and continue with the next
/// aspect application or declaration.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    /// The declaration the diagnostics are scoped to.
    target: Name,
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn for_target(target: impl Into<Name>) -> Self {
        Self { target: target.into(), diagnostics: Vec::new() }
    }

    pub fn target(&self) -> &Name {
        &self.target
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(target = %self.target, %diagnostic, "diagnostic reported");
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
