//! # weft-base
//!
//! Core library for the Weft compile-time code model and aspect template
//! expansion engine.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! aspect      → aspect discovery, introduction advice, pipeline step
//!   ↓
//! template    → template expansion: dual values, meta-API, syntax output
//!   ↓
//! model       → code model: declarations, types, factory, snapshots
//!   ↓
//! host        → host-compiler facade: symbol arena, oracle queries
//!   ↓
//! diagnostics → severity, stable codes, locations, per-target sinks
//!   ↓
//! base        → primitives (arena ids, names, spans, memo cells)
//! ```

// ============================================================================
// MODULES (dependency order: base → diagnostics → host → model → template → aspect)
// ============================================================================

/// Foundation types: arena ids, Name, Span, MemoCell
pub mod base;

/// Diagnostics: severity, stable codes, locations, per-target sinks
pub mod diagnostics;

/// Host-compiler facade: symbol arena, type interning, oracle queries
pub mod host;

/// Code model: declarations, types, factory cache, compilation snapshots
pub mod model;

/// Template expansion: dual values, meta-API, binding, dispatch, syntax
pub mod template;

/// Aspects: attribute-driven discovery, introduction advice, pipeline step
pub mod aspect;

// Re-export foundation types
pub use base::{DeclId, Location, MemoCell, Name, Span, SymbolId, TypeId};

// Re-export the aggregate roots
pub use host::HostCompilation;
pub use model::{CompilationModel, ModelError};
pub use template::{ExpandError, TemplateValue};
