//! Attribute-driven aspect discovery.
//!
//! `aspect_instances` enumerates every declaration carrying an aspect's
//! marker attribute, pairing each with a materialized instance of the
//! attribute. Materialization runs user code (the attribute constructor) via
//! an external-loader stand-in; when it fails, the failure surfaces as a
//! diagnostic at the attribute's location and that one application is
//! skipped.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::base::{Name, SymbolId};
use crate::diagnostics::{Diagnostic, DiagnosticSink, codes};
use crate::host::ConstValue;
use crate::model::{AttributeRef, CompilationModel, Declaration};
use crate::template::AspectClass;

use super::instance::AspectInstance;

/// Constructs the run-time state of an attribute application, standing in
/// for the compile-time assembly loader/deserializer.
pub type AttributeMaterializer<'a> =
    dyn Fn(&AttributeRef<'_>) -> Result<FxHashMap<Name, ConstValue>, String> + 'a;

/// The default materializer: the attribute's named arguments become the
/// instance state verbatim.
pub fn default_materializer(
    attribute: &AttributeRef<'_>,
) -> Result<FxHashMap<Name, ConstValue>, String> {
    Ok(attribute.data().named_args.into_iter().collect())
}

/// Enumerate `(aspect instance, target declaration)` pairs for an aspect
/// marker attribute type, in declaration discovery order.
pub fn aspect_instances<'m>(
    model: &'m CompilationModel,
    aspect_attr_type: SymbolId,
    class: &Arc<AspectClass>,
    materialize: &AttributeMaterializer<'_>,
    sink: &mut DiagnosticSink,
) -> Vec<(AspectInstance, Declaration<'m>)> {
    let mut out = Vec::new();
    for attribute in model.attributes_of_type(aspect_attr_type) {
        let target = attribute.target();
        match materialize(&attribute) {
            Ok(state) => {
                tracing::debug!(
                    aspect = %class.name,
                    target = %target.name(),
                    "aspect instance materialized"
                );
                out.push((
                    AspectInstance {
                        class: Arc::clone(class),
                        location: attribute.location(),
                        state,
                    },
                    target,
                ));
            }
            Err(message) => {
                // User-code constructor failure: report and continue with
                // the remaining applications.
                sink.push(
                    Diagnostic::error(format!(
                        "failed to construct aspect '{}' on '{}': {message}",
                        class.name,
                        target.name()
                    ))
                    .with_code(codes::ASPECT_CONSTRUCTION_FAILED)
                    .with_optional_location(attribute.location()),
                );
            }
        }
    }
    out
}
