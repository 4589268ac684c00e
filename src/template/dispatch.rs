//! Virtual sub-template dispatch.
//!
//! Aspect classes form a single-inheritance hierarchy whose templates may be
//! virtual and overridden. The resolution table is built once per
//! most-derived class with ordinary override-resolution rules: walk the
//! chain root-first and let each class's templates replace its bases'. A
//! template call then resolves through the table — single dispatch at the
//! compile-time representation level, with no host-language virtual calls.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::base::Name;

use super::ast::TemplateDeclaration;

/// An aspect class: a name, an optional base class and its declared
/// templates.
#[derive(Clone, Debug)]
pub struct AspectClass {
    pub name: Name,
    pub base: Option<Arc<AspectClass>>,
    pub templates: Vec<Arc<TemplateDeclaration>>,
}

impl AspectClass {
    pub fn new(name: impl Into<Name>) -> Self {
        Self { name: name.into(), base: None, templates: Vec::new() }
    }

    pub fn with_base(mut self, base: Arc<AspectClass>) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_template(mut self, template: TemplateDeclaration) -> Self {
        self.templates.push(Arc::new(template));
        self
    }
}

/// The inheritance chain of an aspect class, root first.
fn inheritance_chain(most_derived: &Arc<AspectClass>) -> Vec<Arc<AspectClass>> {
    let mut chain = Vec::new();
    let mut current = Some(Arc::clone(most_derived));
    while let Some(class) = current {
        current = class.base.clone();
        chain.push(class);
    }
    chain.reverse();
    chain
}

/// Template name → most-derived override, for one most-derived aspect class.
#[derive(Debug, Default)]
pub struct TemplateResolutionTable {
    map: IndexMap<Name, Arc<TemplateDeclaration>>,
}

impl TemplateResolutionTable {
    /// Build the table with standard override-resolution rules.
    pub fn build(most_derived: &Arc<AspectClass>) -> Self {
        let mut map: IndexMap<Name, Arc<TemplateDeclaration>> = IndexMap::new();
        for class in inheritance_chain(most_derived) {
            for template in &class.templates {
                if let Some(previous) = map.get(&template.name) {
                    if !template.is_override && previous.is_virtual {
                        // Hiding without `override`: the derived template
                        // still wins for calls through this class.
                        tracing::debug!(
                            template = %template.name,
                            class = %class.name,
                            "template hides a virtual base template without overriding it"
                        );
                    }
                } else if template.is_override {
                    tracing::debug!(
                        template = %template.name,
                        class = %class.name,
                        "override without a base template"
                    );
                }
                map.insert(template.name.clone(), Arc::clone(template));
            }
        }
        tracing::trace!(aspect = %most_derived.name, templates = map.len(), "resolution table built");
        Self { map }
    }

    /// Resolve a template name to its most-derived declaration.
    pub fn resolve(&self, name: &str) -> Option<&Arc<TemplateDeclaration>> {
        self.map.get(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
