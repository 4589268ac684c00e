//! The advice application step.
//!
//! Executes a batch of introductions against one snapshot and derives the
//! next incremental snapshot from the survivors. Failures accumulate as
//! diagnostics; one failing application never aborts the rest of the batch.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::model::{CompilationModel, ModelError};

use super::introduce::{AdviceOutcome, IntroduceAdvice, PendingNames, execute_introduce};

/// The result of applying one advice batch.
pub struct AdviceResult {
    /// The derived incremental snapshot.
    pub model: CompilationModel,
    /// Diagnostics from failed applications, in batch order.
    pub diagnostics: Vec<Diagnostic>,
    /// How many introductions were recorded.
    pub introduced: usize,
}

/// Apply a batch of introductions, producing the next snapshot.
///
/// The prototype snapshot is never mutated; even an all-failed batch yields
/// a fresh (empty-delta) snapshot so the pipeline's step structure stays
/// uniform.
pub fn apply_introductions(
    model: &CompilationModel,
    advice: Vec<IntroduceAdvice>,
) -> Result<AdviceResult, ModelError> {
    let mut pending = PendingNames::default();
    let mut diagnostics = Vec::new();
    let mut batch = Vec::new();

    for item in advice {
        let mut sink = DiagnosticSink::for_target(item.declaration.name());
        match execute_introduce(model, &item, &mut pending, &mut sink) {
            AdviceOutcome::Introduced => batch.push(item.declaration),
            AdviceOutcome::Ignored | AdviceOutcome::Failed => {}
        }
        diagnostics.extend(sink.into_vec());
    }

    let introduced = batch.len();
    tracing::debug!(introduced, failed_or_ignored = diagnostics.len(), "advice batch applied");
    let next = model.with_transformations(batch)?;
    Ok(AdviceResult { model: next, diagnostics, introduced })
}
