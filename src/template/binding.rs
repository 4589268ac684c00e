//! Template parameter binding.
//!
//! Binds positional and named arguments (including anonymous argument bags
//! from dynamic invocation) against a template signature, applying defaults
//! for unspecified optional parameters. Missing required arguments are
//! user errors, never crashes.

use rustc_hash::FxHashMap;

use crate::base::Name;

use super::ast::TemplateSignature;
use super::error::ExpandError;
use super::value::TemplateValue;

/// The result of binding a call's arguments against a signature.
#[derive(Clone, Debug, Default)]
pub struct BoundArguments {
    values: FxHashMap<Name, TemplateValue>,
}

impl BoundArguments {
    pub fn get(&self, name: &str) -> Option<&TemplateValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &TemplateValue)> {
        self.values.iter()
    }

    pub fn into_values(self) -> FxHashMap<Name, TemplateValue> {
        self.values
    }
}

/// Bind positional then named arguments, then apply defaults.
///
/// Rules: positional arguments bind in declaration order; named arguments
/// bind by name (unknown names and duplicates are errors); every remaining
/// parameter takes its default, compile-time or run-time alike; a parameter
/// with neither binding nor default is a missing required argument.
pub fn bind_arguments(
    signature: &TemplateSignature,
    positional: Vec<TemplateValue>,
    named: Vec<(Name, TemplateValue)>,
) -> Result<BoundArguments, ExpandError> {
    if positional.len() > signature.params.len() {
        return Err(ExpandError::TooManyArguments {
            expected: signature.params.len(),
            actual: positional.len(),
        });
    }

    let mut values: FxHashMap<Name, TemplateValue> = FxHashMap::default();
    for (param, value) in signature.params.iter().zip(positional) {
        values.insert(param.name.clone(), value);
    }

    for (name, value) in named {
        if signature.find_param(name.as_str()).is_none() {
            return Err(ExpandError::UnknownArgument { name });
        }
        if values.insert(name.clone(), value).is_some() {
            return Err(ExpandError::DuplicateArgument { name });
        }
    }

    for param in &signature.params {
        if values.contains_key(&param.name) {
            continue;
        }
        match &param.default {
            Some(default) => {
                tracing::trace!(param = %param.name, "applying parameter default");
                values.insert(param.name.clone(), TemplateValue::CompileTime(default.clone()));
            }
            None => {
                return Err(ExpandError::MissingArgument { name: param.name.clone() });
            }
        }
    }

    Ok(BoundArguments { values })
}

/// Bind an anonymous property-bag of `name → value` pairs (the dynamic
/// invocation API). Defaults still apply to anything the bag omits.
pub fn bind_argument_bag(
    signature: &TemplateSignature,
    bag: Vec<(Name, TemplateValue)>,
) -> Result<BoundArguments, ExpandError> {
    bind_arguments(signature, Vec::new(), bag)
}
