//! The meta-API context carried through expansion.
//!
//! One [`MetaApi`] per aspect application: the advised target, the aspect's
//! identity, the caller-provided tag bag and the staticity mode. `this` and
//! `base` resolve through a three-outcome state machine; every receiver they
//! produce carries an aspect-reference annotation for the linking pass.

use rustc_hash::FxHashMap;

use crate::base::Name;
use crate::host::ConstValue;
use crate::model::{AdvisedTarget, AspectReferenceOrder, AspectReferenceSpec};

use super::error::ExpandError;
use super::syntax::RtExpr;

/// Whether the expansion context forces or forbids an instance receiver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Staticity {
    /// `this` never resolves, regardless of the target's modifiers.
    ForcedStatic,
    /// `this` always resolves, regardless of the target's modifiers.
    ForcedInstance,
    /// `this` resolves iff the target member is non-static.
    ContextDependent,
}

/// Expansion-time context for one aspect application.
#[derive(Clone, Debug)]
pub struct MetaApi {
    pub target: AdvisedTarget,
    pub aspect_name: Name,
    pub staticity: Staticity,
    /// Tag/state bag passed by the calling aspect.
    pub tags: FxHashMap<Name, ConstValue>,
}

impl MetaApi {
    pub fn new(target: AdvisedTarget, aspect_name: impl Into<Name>) -> Self {
        Self {
            target,
            aspect_name: aspect_name.into(),
            staticity: Staticity::ContextDependent,
            tags: FxHashMap::default(),
        }
    }

    pub fn with_staticity(mut self, staticity: Staticity) -> Self {
        self.staticity = staticity;
        self
    }

    pub fn with_tag(mut self, name: impl Into<Name>, value: ConstValue) -> Self {
        self.tags.insert(name.into(), value);
        self
    }

    pub fn tag(&self, name: &str) -> Option<&ConstValue> {
        self.tags.get(name)
    }

    /// `meta.This`: the final-ordered instance receiver.
    pub fn this_expr(&self) -> Result<RtExpr, ExpandError> {
        self.receiver(AspectReferenceOrder::Final)
    }

    /// `meta.Base`: the base-ordered instance receiver.
    pub fn base_expr(&self) -> Result<RtExpr, ExpandError> {
        self.receiver(AspectReferenceOrder::Base)
    }

    /// The three-outcome staticity state machine.
    fn receiver(&self, order: AspectReferenceOrder) -> Result<RtExpr, ExpandError> {
        let resolvable = match self.staticity {
            Staticity::ForcedInstance => true,
            Staticity::ForcedStatic => false,
            Staticity::ContextDependent => !self.target.is_static,
        };
        tracing::trace!(
            ?order,
            staticity = ?self.staticity,
            target_static = self.target.is_static,
            resolvable,
            "receiver resolution"
        );
        if !resolvable {
            return Err(ExpandError::ThisInStaticContext);
        }
        Ok(RtExpr::This { aspect_ref: Some(self.reference(order)) })
    }

    /// `meta.Proceed()`: invoke the underlying implementation, base-ordered,
    /// forwarding the target's parameters.
    pub fn proceed_expr(&self) -> RtExpr {
        let receiver = if self.target.is_static {
            None
        } else {
            Some(RtExpr::This { aspect_ref: None })
        };
        RtExpr::Invocation {
            callee: Box::new(RtExpr::member(receiver, self.target.name.clone())),
            type_args: Vec::new(),
            args: self.target.param_names.iter().map(|p| RtExpr::Ident(p.clone())).collect(),
            aspect_ref: Some(self.reference(AspectReferenceOrder::Base)),
        }
    }

    fn reference(&self, order: AspectReferenceOrder) -> AspectReferenceSpec {
        AspectReferenceSpec { order, aspect: self.aspect_name.clone() }
    }
}
