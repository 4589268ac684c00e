//! Builders and built declarations.
//!
//! A builder is a mutable, aspect-authored descriptor for a member that does
//! not exist in source. It owns its attribute list, parameter list and
//! accessor descriptors exclusively until `finalize`, which consumes the
//! builder and yields an immutable [`BuiltDeclaration`] answering the same
//! queries as a symbol-backed node.

use std::sync::Arc;

use crate::base::{Name, TypeId};
use crate::host::{AttributeData, ConstValue, MemberModifiers};

use super::declaration::{DeclarationKind, DeclarationOrigin};

// ============================================================================
// BUILT DECLARATIONS
// ============================================================================

/// A finalized parameter descriptor.
#[derive(Clone, Debug)]
pub struct BuiltParameter {
    pub name: Name,
    pub ty: TypeId,
    pub default: Option<ConstValue>,
    pub attributes: Vec<AttributeData>,
}

#[derive(Clone, Debug)]
pub struct BuiltMethod {
    pub name: Name,
    pub target: DeclarationOrigin,
    pub modifiers: MemberModifiers,
    pub return_type: TypeId,
    pub params: Vec<BuiltParameter>,
    pub type_params: Vec<Name>,
    pub attributes: Vec<AttributeData>,
    pub aspect: Name,
}

#[derive(Clone, Debug)]
pub struct BuiltProperty {
    pub name: Name,
    pub target: DeclarationOrigin,
    pub modifiers: MemberModifiers,
    pub ty: TypeId,
    pub has_getter: bool,
    pub has_setter: bool,
    pub initializer: Option<ConstValue>,
    pub attributes: Vec<AttributeData>,
    pub aspect: Name,
}

#[derive(Clone, Debug)]
pub struct BuiltField {
    pub name: Name,
    pub target: DeclarationOrigin,
    pub modifiers: MemberModifiers,
    pub ty: TypeId,
    pub initializer: Option<ConstValue>,
    pub attributes: Vec<AttributeData>,
    pub aspect: Name,
}

#[derive(Clone, Debug)]
pub struct BuiltEvent {
    pub name: Name,
    pub target: DeclarationOrigin,
    pub modifiers: MemberModifiers,
    pub ty: TypeId,
    pub attributes: Vec<AttributeData>,
    pub aspect: Name,
}

/// An attribute introduced onto an existing declaration.
#[derive(Clone, Debug)]
pub struct BuiltAttribute {
    pub target: DeclarationOrigin,
    pub data: AttributeData,
    pub aspect: Name,
}

/// An immutable introduced declaration.
#[derive(Clone, Debug)]
pub enum BuiltDeclaration {
    Method(BuiltMethod),
    Property(BuiltProperty),
    Field(BuiltField),
    Event(BuiltEvent),
    Attribute(BuiltAttribute),
}

impl BuiltDeclaration {
    pub fn kind(&self) -> DeclarationKind {
        match self {
            Self::Method(_) => DeclarationKind::Method,
            Self::Property(_) => DeclarationKind::Property,
            Self::Field(_) => DeclarationKind::Field,
            Self::Event(_) => DeclarationKind::Event,
            Self::Attribute(_) => DeclarationKind::Attribute,
        }
    }

    pub fn name(&self) -> Name {
        match self {
            Self::Method(m) => m.name.clone(),
            Self::Property(p) => p.name.clone(),
            Self::Field(f) => f.name.clone(),
            Self::Event(e) => e.name.clone(),
            Self::Attribute(_) => Name::new_static("<attribute>"),
        }
    }

    /// The declaration this transformation attaches to.
    pub fn target(&self) -> &DeclarationOrigin {
        match self {
            Self::Method(m) => &m.target,
            Self::Property(p) => &p.target,
            Self::Field(f) => &f.target,
            Self::Event(e) => &e.target,
            Self::Attribute(a) => &a.target,
        }
    }

    /// The aspect that introduced this declaration.
    pub fn aspect(&self) -> &Name {
        match self {
            Self::Method(m) => &m.aspect,
            Self::Property(p) => &p.aspect,
            Self::Field(f) => &f.aspect,
            Self::Event(e) => &e.aspect,
            Self::Attribute(a) => &a.aspect,
        }
    }

    pub fn attributes(&self) -> &[AttributeData] {
        match self {
            Self::Method(m) => &m.attributes,
            Self::Property(p) => &p.attributes,
            Self::Field(f) => &f.attributes,
            Self::Event(e) => &e.attributes,
            Self::Attribute(_) => &[],
        }
    }

    pub fn modifiers(&self) -> Option<&MemberModifiers> {
        match self {
            Self::Method(m) => Some(&m.modifiers),
            Self::Property(p) => Some(&p.modifiers),
            Self::Field(f) => Some(&f.modifiers),
            Self::Event(e) => Some(&e.modifiers),
            Self::Attribute(_) => None,
        }
    }

    pub fn as_method(&self) -> Option<&BuiltMethod> {
        match self {
            Self::Method(m) => Some(m),
            _ => None,
        }
    }
}

// ============================================================================
// BUILDERS
// ============================================================================

/// Mutable descriptor for an introduced method.
#[derive(Debug)]
pub struct MethodBuilder {
    name: Name,
    target: DeclarationOrigin,
    modifiers: MemberModifiers,
    return_type: TypeId,
    params: Vec<BuiltParameter>,
    type_params: Vec<Name>,
    attributes: Vec<AttributeData>,
    aspect: Name,
}

impl MethodBuilder {
    pub fn new(
        aspect: impl Into<Name>,
        target: DeclarationOrigin,
        name: impl Into<Name>,
        return_type: TypeId,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            modifiers: MemberModifiers::public_instance(),
            return_type,
            params: Vec::new(),
            type_params: Vec::new(),
            attributes: Vec::new(),
            aspect: aspect.into(),
        }
    }

    pub fn add_parameter(&mut self, name: impl Into<Name>, ty: TypeId) -> &mut Self {
        self.params.push(BuiltParameter {
            name: name.into(),
            ty,
            default: None,
            attributes: Vec::new(),
        });
        self
    }

    pub fn add_parameter_with_default(
        &mut self,
        name: impl Into<Name>,
        ty: TypeId,
        default: ConstValue,
    ) -> &mut Self {
        self.params.push(BuiltParameter {
            name: name.into(),
            ty,
            default: Some(default),
            attributes: Vec::new(),
        });
        self
    }

    pub fn add_parameter_attribute(&mut self, index: usize, data: AttributeData) -> &mut Self {
        if let Some(param) = self.params.get_mut(index) {
            param.attributes.push(data);
        }
        self
    }

    pub fn add_type_parameter(&mut self, name: impl Into<Name>) -> &mut Self {
        self.type_params.push(name.into());
        self
    }

    pub fn add_attribute(&mut self, data: AttributeData) -> &mut Self {
        self.attributes.push(data);
        self
    }

    pub fn modifiers_mut(&mut self) -> &mut MemberModifiers {
        &mut self.modifiers
    }

    pub fn set_static(&mut self, value: bool) -> &mut Self {
        self.modifiers.is_static = value;
        self
    }

    pub fn finalize(self) -> Arc<BuiltDeclaration> {
        Arc::new(BuiltDeclaration::Method(BuiltMethod {
            name: self.name,
            target: self.target,
            modifiers: self.modifiers,
            return_type: self.return_type,
            params: self.params,
            type_params: self.type_params,
            attributes: self.attributes,
            aspect: self.aspect,
        }))
    }
}

/// Mutable descriptor for an introduced property.
#[derive(Debug)]
pub struct PropertyBuilder {
    name: Name,
    target: DeclarationOrigin,
    modifiers: MemberModifiers,
    ty: TypeId,
    has_getter: bool,
    has_setter: bool,
    initializer: Option<ConstValue>,
    attributes: Vec<AttributeData>,
    aspect: Name,
}

impl PropertyBuilder {
    pub fn new(
        aspect: impl Into<Name>,
        target: DeclarationOrigin,
        name: impl Into<Name>,
        ty: TypeId,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            modifiers: MemberModifiers::public_instance(),
            ty,
            has_getter: true,
            has_setter: true,
            initializer: None,
            attributes: Vec::new(),
            aspect: aspect.into(),
        }
    }

    pub fn getter_only(&mut self) -> &mut Self {
        self.has_getter = true;
        self.has_setter = false;
        self
    }

    pub fn with_initializer(&mut self, value: ConstValue) -> &mut Self {
        self.initializer = Some(value);
        self
    }

    pub fn add_attribute(&mut self, data: AttributeData) -> &mut Self {
        self.attributes.push(data);
        self
    }

    pub fn modifiers_mut(&mut self) -> &mut MemberModifiers {
        &mut self.modifiers
    }

    pub fn set_static(&mut self, value: bool) -> &mut Self {
        self.modifiers.is_static = value;
        self
    }

    pub fn finalize(self) -> Arc<BuiltDeclaration> {
        Arc::new(BuiltDeclaration::Property(BuiltProperty {
            name: self.name,
            target: self.target,
            modifiers: self.modifiers,
            ty: self.ty,
            has_getter: self.has_getter,
            has_setter: self.has_setter,
            initializer: self.initializer,
            attributes: self.attributes,
            aspect: self.aspect,
        }))
    }
}

/// Mutable descriptor for an introduced field.
#[derive(Debug)]
pub struct FieldBuilder {
    name: Name,
    target: DeclarationOrigin,
    modifiers: MemberModifiers,
    ty: TypeId,
    initializer: Option<ConstValue>,
    attributes: Vec<AttributeData>,
    aspect: Name,
}

impl FieldBuilder {
    pub fn new(
        aspect: impl Into<Name>,
        target: DeclarationOrigin,
        name: impl Into<Name>,
        ty: TypeId,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            modifiers: MemberModifiers::public_instance(),
            ty,
            initializer: None,
            attributes: Vec::new(),
            aspect: aspect.into(),
        }
    }

    pub fn with_initializer(&mut self, value: ConstValue) -> &mut Self {
        self.initializer = Some(value);
        self
    }

    pub fn add_attribute(&mut self, data: AttributeData) -> &mut Self {
        self.attributes.push(data);
        self
    }

    pub fn modifiers_mut(&mut self) -> &mut MemberModifiers {
        &mut self.modifiers
    }

    pub fn finalize(self) -> Arc<BuiltDeclaration> {
        Arc::new(BuiltDeclaration::Field(BuiltField {
            name: self.name,
            target: self.target,
            modifiers: self.modifiers,
            ty: self.ty,
            initializer: self.initializer,
            attributes: self.attributes,
            aspect: self.aspect,
        }))
    }
}

/// Mutable descriptor for an introduced event.
#[derive(Debug)]
pub struct EventBuilder {
    name: Name,
    target: DeclarationOrigin,
    modifiers: MemberModifiers,
    ty: TypeId,
    attributes: Vec<AttributeData>,
    aspect: Name,
}

impl EventBuilder {
    pub fn new(
        aspect: impl Into<Name>,
        target: DeclarationOrigin,
        name: impl Into<Name>,
        ty: TypeId,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            modifiers: MemberModifiers::public_instance(),
            ty,
            attributes: Vec::new(),
            aspect: aspect.into(),
        }
    }

    pub fn add_attribute(&mut self, data: AttributeData) -> &mut Self {
        self.attributes.push(data);
        self
    }

    pub fn finalize(self) -> Arc<BuiltDeclaration> {
        Arc::new(BuiltDeclaration::Event(BuiltEvent {
            name: self.name,
            target: self.target,
            modifiers: self.modifiers,
            ty: self.ty,
            attributes: self.attributes,
            aspect: self.aspect,
        }))
    }
}

/// Builder for introducing an attribute onto an existing declaration.
#[derive(Debug)]
pub struct AttributeIntroductionBuilder {
    target: DeclarationOrigin,
    data: AttributeData,
    aspect: Name,
}

impl AttributeIntroductionBuilder {
    pub fn new(aspect: impl Into<Name>, target: DeclarationOrigin, data: AttributeData) -> Self {
        Self { target, data, aspect: aspect.into() }
    }

    pub fn finalize(self) -> Arc<BuiltDeclaration> {
        Arc::new(BuiltDeclaration::Attribute(BuiltAttribute {
            target: self.target,
            data: self.data,
            aspect: self.aspect,
        }))
    }
}
