//! Rule containers
//!
//! WHERE, UNIQUE and global rules are stored as opaque text with a label and
//! an optional comment. The expression language itself is never parsed.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::config::RegistryConfig;
use crate::dictionary::{EntityId, SchemaId};
use crate::registry::{OwningRegistry, RefRegistry};

/// Label and comment shared by every rule kind
pub trait RuleText {
    /// Rule text as declared, e.g. `WR1: SELF.x > 0;`. Empty for
    /// comment-only rules.
    fn label(&self) -> &str;

    fn comment(&self) -> &str;
}

// =============================================================================
// Rule Set
// =============================================================================

/// Owned rule collection allocated on first insert.
///
/// Initialization happens under the set's own lock, so concurrent first
/// inserts create exactly one registry.
pub struct RuleSet<T> {
    slot: Mutex<RuleSlot<T>>,
}

struct RuleSlot<T> {
    rules: Option<Arc<OwningRegistry<T>>>,
    options: RegistryConfig,
}

impl<T> RuleSet<T> {
    pub fn new(options: RegistryConfig) -> Self {
        Self {
            slot: Mutex::new(RuleSlot { rules: None, options }),
        }
    }

    /// The registry, if any rule was ever added
    pub fn get(&self) -> Option<Arc<OwningRegistry<T>>> {
        self.slot.lock().rules.clone()
    }

    pub fn get_or_init(&self) -> Arc<OwningRegistry<T>> {
        let mut slot = self.slot.lock();
        let options = slot.options;
        Arc::clone(
            slot.rules
                .get_or_insert_with(|| Arc::new(OwningRegistry::new(options.initial_capacity, options.index_policy))),
        )
    }

    /// Options for the registry created on first insert; an existing
    /// registry switches over in place
    pub fn apply_options(&self, options: RegistryConfig) {
        let mut slot = self.slot.lock();
        slot.options = options;
        if let Some(rules) = &slot.rules {
            rules.apply_options(options);
        }
    }

    pub fn push(&self, rule: T) -> Arc<T> {
        self.get_or_init().append(rule)
    }

    /// Install `rules` in place of the current set.
    ///
    /// Replacing a non-empty set is allowed but logged; the previous set
    /// is returned and dropped by the caller.
    pub fn replace(&self, rules: OwningRegistry<T>) -> Option<Arc<OwningRegistry<T>>> {
        let previous = self.slot.lock().rules.replace(Arc::new(rules));
        if let Some(discarded) = &previous {
            if !discarded.is_empty() {
                warn!(discarded = discarded.count(), "overwriting non-empty rule set");
            }
        }
        previous
    }

    pub fn count(&self) -> usize {
        self.get().map_or(0, |rules| rules.count())
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.get().map(|rules| rules.snapshot()).unwrap_or_default()
    }
}

impl<T> fmt::Debug for RuleSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("initialized", &self.slot.lock().rules.is_some())
            .field("count", &self.count())
            .finish()
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Domain rule attached to a type or entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhereRule {
    label: String,
    comment: String,
}

impl WhereRule {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            comment: String::new(),
        }
    }

    /// Rule carrying only a comment
    pub fn comment_only(comment: impl Into<String>) -> Self {
        Self {
            label: String::new(),
            comment: comment.into(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

impl RuleText for WhereRule {
    fn label(&self) -> &str {
        &self.label
    }

    fn comment(&self) -> &str {
        &self.comment
    }
}

/// UNIQUE rule of an entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniquenessRule {
    label: String,
    comment: String,
    parent_entity: Option<EntityId>,
}

impl UniquenessRule {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn comment_only(comment: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            ..Self::default()
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_parent(mut self, entity: EntityId) -> Self {
        self.parent_entity = Some(entity);
        self
    }

    /// Entity the rule belongs to; for diagnostics only
    pub fn parent_entity(&self) -> Option<EntityId> {
        self.parent_entity
    }
}

impl RuleText for UniquenessRule {
    fn label(&self) -> &str {
        &self.label
    }

    fn comment(&self) -> &str {
        &self.comment
    }
}

/// Schema-level RULE declaration
pub struct GlobalRule {
    name: String,
    comment: String,
    rule_text: String,
    parent_schema: Option<SchemaId>,
    entities: Mutex<Arc<RefRegistry<EntityId>>>,
    where_rules: RuleSet<WhereRule>,
}

impl GlobalRule {
    /// `rule_text` is the complete `RULE ... END_RULE;` source
    pub fn new(name: impl Into<String>, rule_text: impl Into<String>, options: RegistryConfig) -> Self {
        Self {
            name: name.into(),
            comment: String::new(),
            rule_text: rule_text.into(),
            parent_schema: None,
            entities: Mutex::new(Arc::new(RefRegistry::new(
                options.initial_capacity,
                options.index_policy,
            ))),
            where_rules: RuleSet::new(options),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_parent(mut self, schema: SchemaId) -> Self {
        self.parent_schema = Some(schema);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rule_text(&self) -> &str {
        &self.rule_text
    }

    pub fn parent_schema(&self) -> Option<SchemaId> {
        self.parent_schema
    }

    /// Entities the rule constrains
    pub fn entities(&self) -> Arc<RefRegistry<EntityId>> {
        Arc::clone(&self.entities.lock())
    }

    /// Replace the constrained entity set, warning when a non-empty one is
    /// discarded. Returns the previous set.
    pub fn set_entities(&self, entities: RefRegistry<EntityId>) -> Arc<RefRegistry<EntityId>> {
        let previous = std::mem::replace(&mut *self.entities.lock(), Arc::new(entities));
        if !previous.is_empty() {
            warn!(rule = %self.name, discarded = previous.count(), "overwriting non-empty entity set");
        }
        previous
    }

    pub fn where_rules(&self) -> &RuleSet<WhereRule> {
        &self.where_rules
    }

    /// Replace the WHERE rules, warning when a non-empty set is discarded.
    /// Returns the previous set.
    pub fn set_where_rules(&self, rules: OwningRegistry<WhereRule>) -> Option<Arc<OwningRegistry<WhereRule>>> {
        self.where_rules.replace(rules)
    }

    pub fn apply_options(&self, options: RegistryConfig) {
        self.entities.lock().apply_options(options);
        self.where_rules.apply_options(options);
    }
}

impl RuleText for GlobalRule {
    fn label(&self) -> &str {
        &self.name
    }

    fn comment(&self) -> &str {
        &self.comment
    }
}

impl fmt::Debug for GlobalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalRule")
            .field("name", &self.name)
            .field("parent_schema", &self.parent_schema)
            .field("entities", &self.entities.lock().snapshot())
            .field("where_rules", &self.where_rules)
            .finish()
    }
}
