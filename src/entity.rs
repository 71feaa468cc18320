//! Entity descriptors
//!
//! The entity-specific part of a descriptor: supertypes (multiple
//! inheritance), attributes and UNIQUE rules. Inheritance queries live on
//! [`Dictionary`] because supertypes are arena handles.

use std::sync::Arc;

use tracing::trace;

use crate::attribute::AttrDescriptor;
use crate::config::RegistryConfig;
use crate::dictionary::{Dictionary, EntityId};
use crate::error::{DictionaryError, Result};
use crate::registry::{OwningRegistry, RefRegistry};
use crate::rules::{RuleSet, UniquenessRule};
use crate::types::{FactoryHook, Logical, RuntimeValue};

/// Entity-specific data
#[derive(Debug)]
pub struct EntityBody {
    abstract_entity: Logical,
    ext_mapping: Logical,
    supertype_statement: Option<String>,
    supertypes: RefRegistry<EntityId>,
    explicit_attrs: OwningRegistry<AttrDescriptor>,
    inverse_attrs: OwningRegistry<AttrDescriptor>,
    uniqueness_rules: RuleSet<UniquenessRule>,
    factory: Option<FactoryHook>,
}

impl Default for EntityBody {
    fn default() -> Self {
        Self::with_options(RegistryConfig::default())
    }
}

impl EntityBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RegistryConfig) -> Self {
        let (capacity, policy) = (options.initial_capacity, options.index_policy);
        Self {
            abstract_entity: Logical::Unknown,
            ext_mapping: Logical::Unknown,
            supertype_statement: None,
            supertypes: RefRegistry::new(capacity, policy),
            explicit_attrs: OwningRegistry::new(capacity, policy),
            inverse_attrs: OwningRegistry::new(capacity, policy),
            uniqueness_rules: RuleSet::new(options),
            factory: None,
        }
    }

    /// Move the supertype, attribute and UNIQUE registries to `options`
    pub fn apply_options(&self, options: RegistryConfig) {
        self.supertypes.apply_options(options);
        self.explicit_attrs.apply_options(options);
        self.inverse_attrs.apply_options(options);
        self.uniqueness_rules.apply_options(options);
    }

    pub fn with_abstract(mut self, abstract_entity: impl Into<Logical>) -> Self {
        self.abstract_entity = abstract_entity.into();
        self
    }

    pub fn with_ext_mapping(mut self, ext_mapping: impl Into<Logical>) -> Self {
        self.ext_mapping = ext_mapping.into();
        self
    }

    /// Raw supertype constraint, e.g. `ABSTRACT SUPERTYPE OF (ONEOF (a, b))`
    pub fn with_supertype_statement(mut self, statement: impl Into<String>) -> Self {
        self.supertype_statement = Some(statement.into());
        self
    }

    pub fn with_factory(mut self, factory: FactoryHook) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn is_abstract(&self) -> Logical {
        self.abstract_entity
    }

    pub fn ext_mapping(&self) -> Logical {
        self.ext_mapping
    }

    pub fn supertype_statement(&self) -> Option<&str> {
        self.supertype_statement.as_deref()
    }

    pub fn supertypes(&self) -> &RefRegistry<EntityId> {
        &self.supertypes
    }

    pub fn add_supertype(&self, supertype: EntityId) -> usize {
        self.supertypes.append(supertype)
    }

    /// Explicit and derived attributes, in declaration order
    pub fn explicit_attrs(&self) -> &OwningRegistry<AttrDescriptor> {
        &self.explicit_attrs
    }

    pub fn inverse_attrs(&self) -> &OwningRegistry<AttrDescriptor> {
        &self.inverse_attrs
    }

    /// Route an attribute to the explicit or inverse list by its kind
    pub fn add_attribute(&self, attr: AttrDescriptor) -> Arc<AttrDescriptor> {
        if attr.is_inverse() {
            self.inverse_attrs.append(attr)
        } else {
            self.explicit_attrs.append(attr)
        }
    }

    pub fn uniqueness_rules(&self) -> &RuleSet<UniquenessRule> {
        &self.uniqueness_rules
    }

    pub fn factory(&self) -> Option<&FactoryHook> {
        self.factory.as_ref()
    }

    /// Build a runtime instance through the factory hook
    pub fn create_instance(&self) -> Option<RuntimeValue> {
        self.factory.as_ref().map(FactoryHook::create)
    }
}

impl Dictionary {
    /// Attach an attribute to `entity`, recording the entity as its owner
    pub fn add_attribute(&self, entity: EntityId, attr: AttrDescriptor) -> Result<Arc<AttrDescriptor>> {
        let td = self.require_entity(entity)?;
        let body = td.as_entity().ok_or_else(|| DictionaryError::KindMismatch {
            name: td.name().to_string(),
            expected: "an entity",
        })?;
        Ok(body.add_attribute(attr.with_owner(entity)))
    }

    /// Depth-first search of the supertype graph, in supertype insertion order.
    ///
    /// Each entity's supertype list is read atomically, but no lock spans the
    /// whole traversal.
    pub fn entity_is_a(&self, this: EntityId, other: EntityId) -> Result<Option<EntityId>> {
        self.entity_is_a_within(this, other, &mut Vec::new())
    }

    fn entity_is_a_within(&self, this: EntityId, other: EntityId, path: &mut Vec<EntityId>) -> Result<Option<EntityId>> {
        if this == other {
            return Ok(Some(other));
        }
        let td = self.require_entity(this)?;
        if path.contains(&this) {
            return Err(DictionaryError::CyclicTypeGraph {
                name: td.name().to_string(),
            });
        }
        let Some(body) = td.as_entity() else { return Ok(None) };
        path.push(this);
        for supertype in body.supertypes().snapshot() {
            trace!(entity = td.name(), supertype = %supertype, "searching supertype");
            if let Some(found) = self.entity_is_a_within(supertype, other, path)? {
                path.pop();
                return Ok(Some(found));
            }
        }
        path.pop();
        Ok(None)
    }

    /// Supertype names joined by `&`, then the entity's own name
    pub fn qualified_name(&self, entity: EntityId) -> Result<String> {
        let td = self.require_entity(entity)?;
        let mut parts = Vec::new();
        if let Some(body) = td.as_entity() {
            for supertype in body.supertypes().snapshot() {
                parts.push(self.require(supertype.as_type())?.name().to_string());
            }
        }
        parts.push(td.name().to_string());
        Ok(parts.join("&"))
    }
}
