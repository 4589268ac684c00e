//! Model types and the type factory.
//!
//! A model [`Type`] is a copyable handle over an interned host type;
//! [`TypeShape`] is its exhaustive classification. The factory operations
//! construct arrays and pointers, resolve reflection names and decompose
//! reflection type trees. By-ref types are rejected at this boundary.

use crate::base::TypeId;
use crate::host::{HostType, SpecialType};

use super::compilation::CompilationModel;
use super::error::ModelError;
use super::views::{GenericParameterRef, NamedTypeRef};

/// A handle to an interned type, valid for the host compilation's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Type {
    pub(crate) raw: TypeId,
}

impl Type {
    pub fn raw(&self) -> TypeId {
        self.raw
    }
}

/// Exhaustive classification of a model type.
#[derive(Clone, Copy, Debug)]
pub enum TypeShape<'m> {
    Named(NamedTypeRef<'m>),
    Array { element: Type, rank: u8 },
    Pointer { pointee: Type },
    GenericParameter(GenericParameterRef<'m>),
    Dynamic,
}

/// A reflection type tree, mirroring what a runtime `Type` object decomposes
/// into: names, constructed generics, arrays, pointers and by-ref wrappers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReflectionType {
    Named(String),
    Generic { definition: String, args: Vec<ReflectionType> },
    Array { element: Box<ReflectionType>, rank: u8 },
    Pointer(Box<ReflectionType>),
    ByRef(Box<ReflectionType>),
}

impl CompilationModel {
    pub(crate) fn wrap_type(&self, raw: TypeId) -> Type {
        Type { raw }
    }

    /// Classify a type. Fails on by-ref shapes, which the model cannot
    /// represent.
    pub fn type_shape(&self, ty: Type) -> Result<TypeShape<'_>, ModelError> {
        match self.host().host_type(ty.raw) {
            HostType::Named(sym) => Ok(TypeShape::Named(self.named_type(sym)?)),
            HostType::Array { element, rank } => {
                Ok(TypeShape::Array { element: self.wrap_type(element), rank })
            }
            HostType::Pointer { pointee } => {
                Ok(TypeShape::Pointer { pointee: self.wrap_type(pointee) })
            }
            HostType::GenericParameter(sym) => {
                Ok(TypeShape::GenericParameter(self.generic_parameter(sym)?))
            }
            HostType::Dynamic => Ok(TypeShape::Dynamic),
            HostType::Ref { .. } => Err(ModelError::invalid_argument(
                "by-ref types cannot be represented in the code model",
            )),
        }
    }

    // ========================================================================
    // FACTORY OPERATIONS
    // ========================================================================

    pub fn make_array_type(&self, element: Type, rank: u8) -> Result<Type, ModelError> {
        if rank == 0 {
            return Err(ModelError::invalid_argument("array rank must be at least 1"));
        }
        self.reject_ref(element)?;
        Ok(self.wrap_type(self.host().intern_type(HostType::Array { element: element.raw, rank })))
    }

    pub fn make_pointer_type(&self, pointee: Type) -> Result<Type, ModelError> {
        self.reject_ref(pointee)?;
        Ok(self.wrap_type(self.host().intern_type(HostType::Pointer { pointee: pointee.raw })))
    }

    pub fn dynamic_type(&self) -> Type {
        self.wrap_type(self.host().dynamic_type())
    }

    pub fn special_type(&self, special: SpecialType) -> Option<Type> {
        self.host().special_type(special).map(|raw| self.wrap_type(raw))
    }

    /// Implicit-convertibility query, delegated to the host.
    pub fn is_convertible(&self, left: Type, right: Type) -> bool {
        self.host().is_implicitly_convertible(left.raw, right.raw)
    }

    pub fn display_type(&self, ty: Type) -> String {
        self.host().display_type(ty.raw)
    }

    fn reject_ref(&self, ty: Type) -> Result<(), ModelError> {
        if matches!(self.host().host_type(ty.raw), HostType::Ref { .. }) {
            return Err(ModelError::invalid_argument(
                "by-ref types cannot be represented in the code model",
            ));
        }
        Ok(())
    }

    // ========================================================================
    // REFLECTION NAMES
    // ========================================================================

    /// Resolve a reflection name such as `Acme.List`1[[System.Int32]][]`.
    ///
    /// Unknown names fail with [`ModelError::TypeResolution`] carrying the
    /// literal requested name — a user-code error, not an internal one.
    pub fn type_by_reflection_name(&self, name: &str) -> Result<Type, ModelError> {
        let raw = self.parse_reflection_name(name.trim())?;
        tracing::trace!(name, resolved = %raw, "reflection name resolved");
        Ok(self.wrap_type(raw))
    }

    fn parse_reflection_name(&self, input: &str) -> Result<TypeId, ModelError> {
        let unresolved = || ModelError::TypeResolution { name: input.to_string() };
        if input.is_empty() {
            return Err(unresolved());
        }
        if has_top_level_comma(input) {
            // "Type, Assembly" forms need assembly identity resolution.
            return Err(ModelError::NotImplemented("assembly-qualified reflection names"));
        }

        let (base, mut rest) = if let Some(tick) = input.find('`') {
            let base_name = &input[..tick];
            let after = &input[tick + 1..];
            let digits_end =
                after.find(|c: char| !c.is_ascii_digit()).unwrap_or(after.len());
            let arity: usize = after[..digits_end].parse().map_err(|_| unresolved())?;
            let block = &after[digits_end..];
            let (inner, remaining) = split_bracket_block(block).ok_or_else(unresolved)?;
            let arg_names = split_generic_args(inner).ok_or_else(unresolved)?;
            if arg_names.len() != arity {
                return Err(unresolved());
            }
            let definition = self
                .host()
                .find_type_by_qualified_name(base_name)
                .ok_or_else(unresolved)?;
            // A failing argument propagates its own requested name.
            let args: Vec<TypeId> = arg_names
                .iter()
                .map(|arg| self.parse_reflection_name(arg.trim()))
                .collect::<Result<_, _>>()?;
            let constructed =
                self.host().construct_generic(definition, &args).ok_or_else(unresolved)?;
            (constructed, remaining)
        } else {
            let base_end = input.find(['[', '*']).unwrap_or(input.len());
            let base_name = &input[..base_end];
            let symbol = self
                .host()
                .find_type_by_qualified_name(base_name)
                .ok_or_else(unresolved)?;
            (self.host().named_type_id(symbol), &input[base_end..])
        };

        let mut ty = base;
        while !rest.is_empty() {
            if let Some(stripped) = rest.strip_prefix('*') {
                ty = self.host().intern_type(HostType::Pointer { pointee: ty });
                rest = stripped;
            } else if rest.starts_with('[') {
                let close = rest.find(']').ok_or_else(unresolved)?;
                let inner = &rest[1..close];
                if !inner.chars().all(|c| c == ',') {
                    return Err(unresolved());
                }
                let rank = inner.len() as u8 + 1;
                ty = self.host().intern_type(HostType::Array { element: ty, rank });
                rest = &rest[close + 1..];
            } else {
                return Err(unresolved());
            }
        }
        Ok(ty)
    }

    // ========================================================================
    // REFLECTION TYPE TREES
    // ========================================================================

    /// Resolve a reflection type tree, recursively decomposing arrays,
    /// pointers and constructed generics into model type operations.
    ///
    /// By-ref wrappers fail fast: they cannot be represented, and silently
    /// degrading them would change signatures.
    pub fn type_by_reflection_type(&self, reflection: &ReflectionType) -> Result<Type, ModelError> {
        match reflection {
            ReflectionType::Named(name) => {
                let symbol = self
                    .host()
                    .find_type_by_qualified_name(name)
                    .ok_or_else(|| ModelError::TypeResolution { name: name.clone() })?;
                Ok(self.wrap_type(self.host().named_type_id(symbol)))
            }
            ReflectionType::Generic { definition, args } => {
                let def_symbol = self
                    .host()
                    .find_type_by_qualified_name(definition)
                    .ok_or_else(|| ModelError::TypeResolution { name: definition.clone() })?;
                // Any unresolved argument propagates failure; a partially
                // bound type is never constructed.
                let resolved: Vec<TypeId> = args
                    .iter()
                    .map(|arg| self.type_by_reflection_type(arg).map(|t| t.raw))
                    .collect::<Result<_, _>>()?;
                let constructed =
                    self.host().construct_generic(def_symbol, &resolved).ok_or_else(|| {
                        ModelError::invalid_argument(format!(
                            "cannot construct '{definition}' with {} type argument(s)",
                            resolved.len()
                        ))
                    })?;
                Ok(self.wrap_type(constructed))
            }
            ReflectionType::Array { element, rank } => {
                let element = self.type_by_reflection_type(element)?;
                self.make_array_type(element, *rank)
            }
            ReflectionType::Pointer(pointee) => {
                let pointee = self.type_by_reflection_type(pointee)?;
                self.make_pointer_type(pointee)
            }
            ReflectionType::ByRef(_) => Err(ModelError::invalid_argument(
                "by-ref types cannot be represented in the code model",
            )),
        }
    }
}

/// Whether a reflection name carries an assembly qualifier (a comma outside
/// any bracket block).
fn has_top_level_comma(s: &str) -> bool {
    let mut depth = 0usize;
    for c in s.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

/// Split a `[...]` block (bracket-balanced) into its inner text and the rest.
fn split_bracket_block(s: &str) -> Option<(&str, &str)> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'[') {
        return None;
    }
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'[' => depth += 1,
            b']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some((&s[1..i], &s[i + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Split `[A],[B],...` into the bracketed argument names.
fn split_generic_args(inner: &str) -> Option<Vec<&str>> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    for (i, c) in inner.char_indices() {
        match c {
            '[' => {
                if depth == 0 {
                    start = Some(i + 1);
                }
                depth += 1;
            }
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    out.push(&inner[start?..i]);
                    start = None;
                }
            }
            ',' if depth == 0 => {}
            c if depth == 0 && !c.is_whitespace() => return None,
            _ => {}
        }
    }
    (depth == 0).then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_comma_detection() {
        assert!(has_top_level_comma("System.Int32, mscorlib"));
        assert!(!has_top_level_comma("G`1[[A],[B]]"));
        assert!(!has_top_level_comma("System.Int32[,]"));
    }

    #[test]
    fn test_split_bracket_block() {
        let (inner, rest) = split_bracket_block("[[A],[B]][]").unwrap();
        assert_eq!(inner, "[A],[B]");
        assert_eq!(rest, "[]");
    }

    #[test]
    fn test_split_generic_args() {
        assert_eq!(split_generic_args("[A],[B]").unwrap(), vec!["A", "B"]);
        assert_eq!(
            split_generic_args("[G`1[[X]]],[B]").unwrap(),
            vec!["G`1[[X]]", "B"]
        );
        assert!(split_generic_args("[A],junk").is_none());
    }
}
