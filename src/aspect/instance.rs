//! A materialized aspect instance.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::base::{Location, Name};
use crate::host::ConstValue;
use crate::model::AdvisedTarget;
use crate::template::{AspectClass, MetaApi};

/// One application of an aspect: the aspect class plus the state
/// materialized from the marker attribute's arguments.
#[derive(Clone, Debug)]
pub struct AspectInstance {
    pub class: Arc<AspectClass>,
    /// Where the marker attribute was applied.
    pub location: Option<Location>,
    /// State deserialized from the attribute (named arguments and any
    /// loader-provided values).
    pub state: FxHashMap<Name, ConstValue>,
}

impl AspectInstance {
    pub fn new(class: Arc<AspectClass>) -> Self {
        Self { class, location: None, state: FxHashMap::default() }
    }

    pub fn name(&self) -> &Name {
        &self.class.name
    }

    /// Build the expansion context for a target, seeding the tag bag with
    /// this instance's state.
    pub fn meta_for(&self, target: AdvisedTarget) -> MetaApi {
        let mut meta = MetaApi::new(target, self.class.name.clone());
        meta.tags = self.state.clone();
        meta
    }
}
