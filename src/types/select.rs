//! Select types
//!
//! A select's choices are non-owning handles, in declaration order. The
//! compatibility queries recurse through nested selects; each one keeps the
//! chain of selects it is inside and fails on re-entry.

use super::{FactoryHook, PrimitiveType, RuntimeValue};
use crate::config::RegistryConfig;
use crate::dictionary::{Dictionary, TypeId};
use crate::error::{DictionaryError, Result};
use crate::registry::RefRegistry;

/// Select-specific data
#[derive(Debug, Default)]
pub struct SelectBody {
    choices: RefRegistry<TypeId>,
    pub factory: Option<FactoryHook>,
}

impl SelectBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RegistryConfig) -> Self {
        Self {
            choices: RefRegistry::new(options.initial_capacity, options.index_policy),
            factory: None,
        }
    }

    pub fn with_factory(mut self, factory: FactoryHook) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Builder shorthand for [`SelectBody::add_choice`]
    pub fn with_choice(self, choice: TypeId) -> Self {
        self.choices.append(choice);
        self
    }

    pub fn add_choice(&self, choice: TypeId) -> usize {
        self.choices.append(choice)
    }

    pub fn choices(&self) -> &RefRegistry<TypeId> {
        &self.choices
    }

    /// Build an empty select value holder through the factory hook
    pub fn create_select(&self) -> Option<RuntimeValue> {
        self.factory.as_ref().map(FactoryHook::create)
    }
}

impl Dictionary {
    /// `Some(choice)` when a value of `other` may be held by `this`, where
    /// `choice` is the top-level alternative that admits it.
    ///
    /// For a non-select this is [`Dictionary::is_a`].
    pub fn can_be(&self, this: TypeId, other: TypeId) -> Result<Option<TypeId>> {
        self.can_be_within(this, other, &mut Vec::new())
    }

    fn can_be_within(&self, this: TypeId, other: TypeId, path: &mut Vec<TypeId>) -> Result<Option<TypeId>> {
        let td = self.require(this)?;
        let Some(select) = td.as_select() else {
            return self.is_a(this, other);
        };
        if this == other {
            return Ok(Some(other));
        }
        enter(path, this, td.name())?;
        for choice in select.choices().snapshot() {
            if self.can_be_within(choice, other, path)?.is_some() {
                path.pop();
                return Ok(Some(choice));
            }
        }
        path.pop();
        Ok(None)
    }

    /// Name-based [`Dictionary::can_be`]: the select's own name, or any
    /// name a choice can be
    pub fn can_be_named(&self, this: TypeId, name: &str) -> Result<Option<TypeId>> {
        self.can_be_named_within(this, name, &mut Vec::new())
    }

    fn can_be_named_within(&self, this: TypeId, name: &str, path: &mut Vec<TypeId>) -> Result<Option<TypeId>> {
        let td = self.require(this)?;
        let Some(select) = td.as_select() else {
            return self.is_a_named(this, name);
        };
        if td.our_name(name) {
            return Ok(Some(this));
        }
        enter(path, this, td.name())?;
        for choice in select.choices().snapshot() {
            if self.can_be_named_within(choice, name, path)?.is_some() {
                path.pop();
                return Ok(Some(choice));
            }
        }
        path.pop();
        Ok(None)
    }

    /// Whether `name`, a type tag just read from instance data, may select
    /// one of `this`'s choices when seen from `schema`.
    ///
    /// Nested selects are searched, except those reached through an alias:
    /// a value of such a select must be tagged with the alias's own name, so
    /// only that name is compared.
    pub fn can_be_set(&self, this: TypeId, name: &str, schema: Option<&str>) -> Result<Option<TypeId>> {
        self.can_be_set_within(this, name, schema, &mut Vec::new())
    }

    fn can_be_set_within(
        &self,
        this: TypeId,
        name: &str,
        schema: Option<&str>,
        path: &mut Vec<TypeId>,
    ) -> Result<Option<TypeId>> {
        let td = self.require(this)?;
        let Some(select) = td.as_select() else {
            return Ok(td.curr_name(name, schema).then_some(this));
        };
        enter(path, this, td.name())?;
        for choice in select.choices().snapshot() {
            let choice_td = self.require(choice)?;
            let matched = if choice_td.primitive_type() == PrimitiveType::Reference
                && self.non_ref_type(choice)? == PrimitiveType::Select
            {
                choice_td.curr_name(name, schema)
            } else {
                self.can_be_set_within(choice, name, schema, path)?.is_some()
            };
            if matched {
                path.pop();
                return Ok(Some(choice));
            }
        }
        path.pop();
        Ok(None)
    }
}

fn enter(path: &mut Vec<TypeId>, select: TypeId, name: &str) -> Result<()> {
    if path.contains(&select) {
        return Err(DictionaryError::CyclicTypeGraph { name: name.to_string() });
    }
    path.push(select);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeDescriptor;

    fn named(dict: &Dictionary, name: &str) -> TypeId {
        let string = dict.builtin(PrimitiveType::String).unwrap();
        dict.add_unnamed_type(
            None,
            TypeDescriptor::defined(name, PrimitiveType::String, "STRING").unwrap().with_referent(string),
        )
    }

    fn select(dict: &Dictionary, name: &str, choices: &[TypeId]) -> TypeId {
        let body = SelectBody::new();
        for choice in choices {
            body.add_choice(*choice);
        }
        dict.add_unnamed_type(None, TypeDescriptor::select(name, "SELECT", body))
    }

    #[test]
    fn test_can_be_recurses_into_nested_selects() {
        let dict = Dictionary::new();
        let label = named(&dict, "label");
        let text = named(&dict, "text");
        let inner = select(&dict, "inner", &[text]);
        let outer = select(&dict, "outer", &[label, inner]);

        assert_eq!(dict.can_be(outer, outer).unwrap(), Some(outer));
        assert_eq!(dict.can_be(outer, label).unwrap(), Some(label));
        assert_eq!(dict.can_be(outer, text).unwrap(), Some(inner));
        assert_eq!(dict.can_be(inner, label).unwrap(), None);
    }

    #[test]
    fn test_can_be_named() {
        let dict = Dictionary::new();
        let label = named(&dict, "label");
        let outer = select(&dict, "outer", &[label]);

        assert_eq!(dict.can_be_named(outer, "OUTER").unwrap(), Some(outer));
        assert_eq!(dict.can_be_named(outer, "Label").unwrap(), Some(label));
        assert_eq!(dict.can_be_named(outer, "missing").unwrap(), None);
    }

    #[test]
    fn test_can_be_set_searches_plain_nested_select() {
        let dict = Dictionary::new();
        let text = named(&dict, "text");
        let inner = select(&dict, "inner", &[text]);
        let outer = select(&dict, "outer", &[inner]);

        assert_eq!(dict.can_be_set(outer, "text", None).unwrap(), Some(inner));
        // The nested select's own name is not a tag
        assert_eq!(dict.can_be_set(outer, "inner", None).unwrap(), None);
    }

    #[test]
    fn test_select_cycle_is_detected() {
        let dict = Dictionary::new();
        let a = select(&dict, "a", &[]);
        let b = select(&dict, "b", &[a]);
        dict.get(a).unwrap().as_select().unwrap().add_choice(b);
        let missing = named(&dict, "missing");

        assert!(matches!(dict.can_be(a, missing), Err(DictionaryError::CyclicTypeGraph { .. })));
        assert!(matches!(
            dict.can_be_set(a, "missing", None),
            Err(DictionaryError::CyclicTypeGraph { .. })
        ));
    }
}
