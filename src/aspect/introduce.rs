//! Introduction advice.
//!
//! An introduction attaches a finalized builder product to a target type,
//! guarded by an [`OverrideStrategy`] that decides what happens when the
//! type already declares a member with the same name.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::base::{Location, Name};
use crate::diagnostics::{Diagnostic, DiagnosticSink, codes};
use crate::model::{
    BuiltDeclaration, CompilationModel, DeclarationKind, DeclarationOrigin,
};

/// What to do when the target already declares a same-named member.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverrideStrategy {
    /// Report an error and introduce nothing.
    #[default]
    Fail,
    /// Keep the existing member, introduce nothing, no diagnostic.
    Ignore,
    /// Introduce as an override of the existing member.
    Override,
    /// Introduce alongside, hiding the existing member (`new` semantics).
    New,
}

/// One introduction to execute.
#[derive(Clone, Debug)]
pub struct IntroduceAdvice {
    pub aspect: Name,
    pub declaration: Arc<BuiltDeclaration>,
    pub when_exists: OverrideStrategy,
    /// The aspect application's location, for diagnostics.
    pub location: Option<Location>,
}

impl IntroduceAdvice {
    pub fn new(aspect: impl Into<Name>, declaration: Arc<BuiltDeclaration>) -> Self {
        Self {
            aspect: aspect.into(),
            declaration,
            when_exists: OverrideStrategy::default(),
            location: None,
        }
    }

    pub fn when_exists(mut self, strategy: OverrideStrategy) -> Self {
        self.when_exists = strategy;
        self
    }

    pub fn at(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }
}

/// The outcome of executing one introduction.
#[derive(Clone, Debug, PartialEq)]
pub enum AdviceOutcome {
    /// Recorded as a transformation for the next snapshot.
    Introduced,
    /// Skipped silently per `OverrideStrategy::Ignore`.
    Ignored,
    /// Rejected with a diagnostic.
    Failed,
}

/// Names already claimed by earlier introductions in the same batch.
pub(crate) type PendingNames = FxHashMap<(DeclarationOrigin, Name), Name>;

/// Execute one introduction against the current snapshot plus the names
/// already introduced by this batch.
pub(crate) fn execute_introduce(
    model: &CompilationModel,
    advice: &IntroduceAdvice,
    pending: &mut PendingNames,
    sink: &mut DiagnosticSink,
) -> AdviceOutcome {
    let built = &advice.declaration;
    // Attribute introductions carry no member name to collide on.
    if built.kind() == DeclarationKind::Attribute {
        return AdviceOutcome::Introduced;
    }

    let target = built.target().clone();
    let name = built.name();
    let existing = existing_member(model, &target, &name)
        .or_else(|| pending.get(&(target.clone(), name.clone())).cloned().map(Existing::Pending));

    if let Some(existing) = existing {
        match advice.when_exists {
            OverrideStrategy::Fail => {
                let target_name = target_display(model, &target);
                sink.push(
                    Diagnostic::error(format!(
                        "aspect '{}' cannot introduce {} '{}' into type '{}': the type already \
                         defines a member named '{}'",
                        advice.aspect,
                        built.kind(),
                        name,
                        target_name,
                        name
                    ))
                    .with_code(codes::MEMBER_ALREADY_EXISTS)
                    .with_optional_location(advice.location.clone())
                    .with_related(None, existing.describe(&name)),
                );
                return AdviceOutcome::Failed;
            }
            OverrideStrategy::Ignore => {
                tracing::debug!(aspect = %advice.aspect, member = %name, "introduction ignored, member exists");
                return AdviceOutcome::Ignored;
            }
            OverrideStrategy::Override | OverrideStrategy::New => {
                // Recorded as a transformation; the linking pass merges the
                // override chain or emits the hiding member.
            }
        }
    }

    pending.insert((target, name), advice.aspect.clone());
    AdviceOutcome::Introduced
}

enum Existing {
    Declared(DeclarationKind),
    Pending(Name),
}

impl Existing {
    fn describe(&self, member: &Name) -> String {
        match self {
            Existing::Declared(kind) => format!("the existing member is a {kind} named '{member}'"),
            Existing::Pending(aspect) => {
                format!("'{member}' was already introduced by aspect '{aspect}'")
            }
        }
    }
}

fn existing_member(
    model: &CompilationModel,
    target: &DeclarationOrigin,
    name: &Name,
) -> Option<Existing> {
    let DeclarationOrigin::Symbol(sym) = target else { return None };
    let ty = model.named_type(*sym).ok()?;
    ty.members_named(name.as_str()).first().map(|member| Existing::Declared(member.kind()))
}

fn target_display(model: &CompilationModel, target: &DeclarationOrigin) -> Name {
    match target {
        DeclarationOrigin::Symbol(sym) => model.host().qualified_name(*sym),
        _ => Name::new_static("<introduced>"),
    }
}
