//! # Aspects
//!
//! Attribute-driven aspect discovery and introduction advice. Discovery
//! looks an aspect's marker attribute up in the compilation's attribute
//! index (O(1) per type) and materializes one aspect instance per
//! application; introduction advice validates builders against existing
//! members and folds the surviving transformations into the next
//! incremental snapshot. A failing application becomes a diagnostic and
//! never aborts the others.

mod discovery;
mod instance;
mod introduce;
mod pipeline;

pub use discovery::{AttributeMaterializer, aspect_instances, default_materializer};
pub use instance::AspectInstance;
pub use introduce::{AdviceOutcome, IntroduceAdvice, OverrideStrategy};
pub use pipeline::{AdviceResult, apply_introductions};
