//! Schemas and their USE / REFERENCE interfaces

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::RegistryConfig;
use crate::dictionary::{Dictionary, EntityId, SchemaId, TypeId};
use crate::error::Result;
use crate::registry::{OwningRegistry, RefRegistry};
use crate::rules::{GlobalRule, RuleSet};

/// Which clause an interface belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceKind {
    Use,
    Reference,
}

impl InterfaceKind {
    pub fn keyword(self) -> &'static str {
        match self {
            InterfaceKind::Use => "USE",
            InterfaceKind::Reference => "REFERENCE",
        }
    }
}

/// One imported identifier, optionally renamed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplicitItem {
    original: String,
    renamed: Option<String>,
}

impl ExplicitItem {
    pub fn new(original: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            renamed: None,
        }
    }

    /// `original AS renamed`; an empty rename is no rename
    pub fn renamed(original: impl Into<String>, renamed: impl Into<String>) -> Self {
        let renamed = renamed.into();
        Self {
            original: original.into(),
            renamed: (!renamed.is_empty()).then_some(renamed),
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn new_name(&self) -> Option<&str> {
        self.renamed.as_deref()
    }
}

/// A single USE FROM or REFERENCE FROM clause
#[derive(Debug)]
pub struct InterfaceSpec {
    current_schema: String,
    foreign_schema: String,
    items: OwningRegistry<ExplicitItem>,
    all_objects: bool,
}

impl InterfaceSpec {
    pub fn new(current_schema: impl Into<String>, foreign_schema: impl Into<String>) -> Self {
        Self {
            current_schema: current_schema.into(),
            foreign_schema: foreign_schema.into(),
            items: OwningRegistry::default(),
            all_objects: false,
        }
    }

    /// Blanket import of everything in the foreign schema
    pub fn all_objects(current_schema: impl Into<String>, foreign_schema: impl Into<String>) -> Self {
        let mut interface = Self::new(current_schema, foreign_schema);
        interface.all_objects = true;
        interface
    }

    pub fn with_item(self, item: ExplicitItem) -> Self {
        self.items.append(item);
        self
    }

    pub fn current_schema(&self) -> &str {
        &self.current_schema
    }

    pub fn foreign_schema(&self) -> &str {
        &self.foreign_schema
    }

    pub fn explicit_items(&self) -> &OwningRegistry<ExplicitItem> {
        &self.items
    }

    pub fn imports_all(&self) -> bool {
        self.all_objects
    }

    pub fn apply_options(&self, options: RegistryConfig) {
        self.items.apply_options(options);
    }
}

impl Clone for InterfaceSpec {
    fn clone(&self) -> Self {
        let items = OwningRegistry::new(self.items.capacity(), self.items.policy());
        for item in self.items.snapshot() {
            items.append(ExplicitItem::clone(&item));
        }
        Self {
            current_schema: self.current_schema.clone(),
            foreign_schema: self.foreign_schema.clone(),
            items,
            all_objects: self.all_objects,
        }
    }
}

/// Top-level EXPRESS namespace
#[derive(Debug)]
pub struct Schema {
    name: String,
    types: RefRegistry<TypeId>,
    entities: RefRegistry<EntityId>,
    use_interfaces: OwningRegistry<InterfaceSpec>,
    ref_interfaces: OwningRegistry<InterfaceSpec>,
    global_rules: RuleSet<GlobalRule>,
    functions: Mutex<Vec<String>>,
    procedures: Mutex<Vec<String>>,
    options: RegistryConfig,
}

impl Schema {
    pub(crate) fn new(name: impl Into<String>, options: RegistryConfig) -> Self {
        let (capacity, policy) = (options.initial_capacity, options.index_policy);
        Self {
            name: name.into(),
            types: RefRegistry::new(capacity, policy),
            entities: RefRegistry::new(capacity, policy),
            use_interfaces: OwningRegistry::new(capacity, policy),
            ref_interfaces: OwningRegistry::new(capacity, policy),
            global_rules: RuleSet::new(options),
            functions: Mutex::new(Vec::new()),
            procedures: Mutex::new(Vec::new()),
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared non-entity types, in declaration order
    pub fn types(&self) -> &RefRegistry<TypeId> {
        &self.types
    }

    pub fn entities(&self) -> &RefRegistry<EntityId> {
        &self.entities
    }

    pub fn interfaces(&self, kind: InterfaceKind) -> &OwningRegistry<InterfaceSpec> {
        match kind {
            InterfaceKind::Use => &self.use_interfaces,
            InterfaceKind::Reference => &self.ref_interfaces,
        }
    }

    /// Adopt `interface`; its item list takes this schema's registry options
    pub fn add_interface(&self, kind: InterfaceKind, interface: InterfaceSpec) -> Arc<InterfaceSpec> {
        interface.apply_options(self.options);
        self.interfaces(kind).append(interface)
    }

    /// Global rules; the set is created on first insert
    pub fn global_rules(&self) -> &RuleSet<GlobalRule> {
        &self.global_rules
    }

    /// Append the raw text of a FUNCTION declaration
    pub fn add_function(&self, text: impl Into<String>) {
        self.functions.lock().push(text.into());
    }

    pub fn add_procedure(&self, text: impl Into<String>) {
        self.procedures.lock().push(text.into());
    }

    pub fn functions(&self) -> Vec<String> {
        self.functions.lock().clone()
    }

    pub fn procedures(&self) -> Vec<String> {
        self.procedures.lock().clone()
    }
}

impl Dictionary {
    /// Add a global rule to `schema`, recording the schema as its parent
    pub fn add_global_rule(&self, schema: SchemaId, rule: GlobalRule) -> Result<Arc<GlobalRule>> {
        let owner = self.require_schema(schema)?;
        rule.apply_options(self.config().registry);
        Ok(owner.global_rules().push(rule.with_parent(schema)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_clone_is_deep() {
        let interface = InterfaceSpec::new("importer", "geometry").with_item(ExplicitItem::renamed("point", "pt"));
        let copy = interface.clone();
        copy.explicit_items().append(ExplicitItem::new("line"));

        assert_eq!(interface.explicit_items().count(), 1);
        assert_eq!(copy.explicit_items().count(), 2);
        let original = interface.explicit_items().get(0).unwrap();
        let copied = copy.explicit_items().get(0).unwrap();
        assert!(!Arc::ptr_eq(&original, &copied));
        assert_eq!(*original, *copied);
    }

    #[test]
    fn test_empty_rename_is_no_rename() {
        assert_eq!(ExplicitItem::renamed("point", "").new_name(), None);
        assert_eq!(ExplicitItem::renamed("point", "pt").new_name(), Some("pt"));
    }

    #[test]
    fn test_global_rules_are_lazy_and_parented() {
        let dict = Dictionary::new();
        let id = dict.add_schema("s");
        let schema = dict.schema(id).unwrap();
        assert!(schema.global_rules().get().is_none());

        let rule = dict
            .add_global_rule(id, GlobalRule::new("r", "RULE r FOR (a);\nEND_RULE;", RegistryConfig::default()))
            .unwrap();
        assert_eq!(rule.parent_schema(), Some(id));
        assert_eq!(schema.global_rules().count(), 1);
    }
}
