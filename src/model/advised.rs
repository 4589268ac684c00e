//! Advised declaration facades.
//!
//! An [`AdvisedTarget`] is the read-only view of a declaration handed to
//! template-expansion code. It resolves the facts the meta-API needs up
//! front (name, staticity, void-ness) and carries the invoker mechanism:
//! every generated call is tagged with an [`AspectReferenceSpec`] so the
//! later linking pass knows whether to reach the current aspect's override
//! (`Final`) or the next implementation in the override chain (`Base`).

use crate::base::Name;

use super::declaration::{DeclarationKind, DeclarationOrigin};
use super::views::{EventRef, FieldRef, MethodRef, NamedTypeRef, ParameterRef, PropertyRef};

/// Which implementation a generated reference should bind to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AspectReferenceOrder {
    /// The implementation before the current aspect's advice.
    Base,
    /// The final implementation, including the current aspect's override.
    Final,
}

/// Annotation attached to generated syntax for the linking pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AspectReferenceSpec {
    pub order: AspectReferenceOrder,
    /// The aspect the reference originates from.
    pub aspect: Name,
}

/// The kind of declaration a template targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvisedKind {
    Method,
    Constructor,
    FieldOrProperty,
    Event,
    Parameter,
    Type,
}

/// Read-only facade over the declaration a template is being applied to.
#[derive(Clone, Debug)]
pub struct AdvisedTarget {
    pub underlying: DeclarationOrigin,
    pub kind: AdvisedKind,
    pub name: Name,
    pub is_static: bool,
    /// Whether `meta.Return(value)` should lower to a bare return.
    pub returns_void: bool,
    pub declaring_type: Option<Name>,
    /// Parameter names, for forwarding in `meta.Proceed()`.
    pub param_names: Vec<Name>,
}

impl AdvisedTarget {
    pub fn for_method(method: &MethodRef<'_>) -> Self {
        let kind = if method.kind() == DeclarationKind::Constructor {
            AdvisedKind::Constructor
        } else {
            AdvisedKind::Method
        };
        Self {
            underlying: method.origin(),
            kind,
            name: method.name(),
            is_static: method.is_static(),
            returns_void: kind == AdvisedKind::Constructor || method.returns_void(),
            declaring_type: method.declaring_type().map(|t| t.qualified_name()),
            param_names: method.parameters().iter().map(|p| p.name()).collect(),
        }
    }

    pub fn for_field(field: &FieldRef<'_>) -> Self {
        Self {
            underlying: field.origin(),
            kind: AdvisedKind::FieldOrProperty,
            name: field.name(),
            is_static: field.is_static(),
            returns_void: false,
            declaring_type: field.declaring_type().map(|t| t.qualified_name()),
            param_names: Vec::new(),
        }
    }

    pub fn for_property(property: &PropertyRef<'_>) -> Self {
        Self {
            underlying: property.origin(),
            kind: AdvisedKind::FieldOrProperty,
            name: property.name(),
            is_static: property.is_static(),
            returns_void: false,
            declaring_type: property.declaring_type().map(|t| t.qualified_name()),
            param_names: Vec::new(),
        }
    }

    pub fn for_event(event: &EventRef<'_>) -> Self {
        Self {
            underlying: event.origin(),
            kind: AdvisedKind::Event,
            name: event.name(),
            is_static: event.is_static(),
            returns_void: true,
            declaring_type: event.declaring_type().map(|t| t.qualified_name()),
            param_names: Vec::new(),
        }
    }

    pub fn for_parameter(parameter: &ParameterRef<'_>) -> Self {
        Self {
            underlying: parameter.origin(),
            kind: AdvisedKind::Parameter,
            name: parameter.name(),
            is_static: false,
            returns_void: false,
            declaring_type: None,
            param_names: Vec::new(),
        }
    }

    pub fn for_type(ty: &NamedTypeRef<'_>) -> Self {
        Self {
            underlying: ty.origin(),
            kind: AdvisedKind::Type,
            name: ty.name(),
            is_static: false,
            returns_void: false,
            declaring_type: Some(ty.qualified_name()),
            param_names: Vec::new(),
        }
    }

    /// The invoker mechanism for this target, on behalf of `aspect`.
    pub fn invokers(&self, aspect: impl Into<Name>) -> Invokers {
        Invokers { aspect: aspect.into() }
    }
}

/// Produces the reference specifications for calling the original versus the
/// overridden implementation of the advised declaration.
#[derive(Clone, Debug)]
pub struct Invokers {
    aspect: Name,
}

impl Invokers {
    /// Reference the implementation before this aspect's advice.
    pub fn base(&self) -> AspectReferenceSpec {
        AspectReferenceSpec { order: AspectReferenceOrder::Base, aspect: self.aspect.clone() }
    }

    /// Reference the final implementation.
    pub fn final_(&self) -> AspectReferenceSpec {
        AspectReferenceSpec { order: AspectReferenceOrder::Final, aspect: self.aspect.clone() }
    }
}
