//! Type Descriptors
//!
//! Every named thing in a schema's type system is a [`TypeDescriptor`]:
//! built-in primitives, defined types, enumerations, selects, aggregates and
//! entities. Shared fields live on the descriptor itself; variant-specific
//! fields live in [`DescriptorBody`].
//!
//! Descriptors link to each other through arena handles ([`TypeId`]), never
//! through ownership. The `referent` link means:
//! - for a defined type, the type it aliases
//! - for an aggregate, its element type
//! - for an entity, nothing

pub mod aggregate;
pub mod resolve;
pub mod select;

pub use aggregate::{AggrBody, AggregateKind, Bound};
pub use select::SelectBody;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::codegen::names::to_lower;
use crate::config::RegistryConfig;
use crate::dictionary::{SchemaId, TypeId};
use crate::entity::EntityBody;
use crate::error::{DictionaryError, Result};
use crate::rules::{RuleSet, WhereRule};

// =============================================================================
// Primitive Type
// =============================================================================

/// Fundamental kind tag of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    Integer,
    Real,
    Number,
    String,
    Binary,
    Boolean,
    Logical,
    Entity,
    Enumeration,
    Select,
    Aggregate,
    Array,
    Bag,
    Set,
    List,
    /// Defined type that renames another named type
    Reference,
    Generic,
    Unknown,
}

impl PrimitiveType {
    /// Built-in kinds the dictionary seeds a terminal descriptor for
    pub const BUILTINS: [PrimitiveType; 8] = [
        PrimitiveType::Integer,
        PrimitiveType::Real,
        PrimitiveType::Number,
        PrimitiveType::String,
        PrimitiveType::Binary,
        PrimitiveType::Boolean,
        PrimitiveType::Logical,
        PrimitiveType::Generic,
    ];

    pub fn is_aggregate(self) -> bool {
        matches!(
            self,
            PrimitiveType::Aggregate
                | PrimitiveType::Array
                | PrimitiveType::Bag
                | PrimitiveType::Set
                | PrimitiveType::List
        )
    }

    /// Kinds that need their own descriptor body
    pub fn has_own_body(self) -> bool {
        self.is_aggregate()
            || matches!(self, PrimitiveType::Entity | PrimitiveType::Enumeration | PrimitiveType::Select)
    }

    /// EXPRESS keyword naming a built-in kind
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            PrimitiveType::Integer => Some("INTEGER"),
            PrimitiveType::Real => Some("REAL"),
            PrimitiveType::Number => Some("NUMBER"),
            PrimitiveType::String => Some("STRING"),
            PrimitiveType::Binary => Some("BINARY"),
            PrimitiveType::Boolean => Some("BOOLEAN"),
            PrimitiveType::Logical => Some("LOGICAL"),
            PrimitiveType::Generic => Some("GENERIC"),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// =============================================================================
// Logical
// =============================================================================

/// Three-valued EXPRESS logical
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Logical {
    False,
    True,
    #[default]
    Unknown,
}

impl Logical {
    pub fn is_true(self) -> bool {
        self == Logical::True
    }
}

impl From<bool> for Logical {
    fn from(value: bool) -> Self {
        if value {
            Logical::True
        } else {
            Logical::False
        }
    }
}

// =============================================================================
// Factory Hook
// =============================================================================

/// Runtime object produced by a factory hook
pub type RuntimeValue = Box<dyn Any + Send>;

/// Optional constructor for the runtime value a descriptor describes.
///
/// The runtime value types themselves live outside this crate.
#[derive(Clone)]
pub struct FactoryHook(Arc<dyn Fn() -> RuntimeValue + Send + Sync>);

impl FactoryHook {
    pub fn new(f: impl Fn() -> RuntimeValue + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn create(&self) -> RuntimeValue {
        (self.0)()
    }
}

impl fmt::Debug for FactoryHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FactoryHook(..)")
    }
}

// =============================================================================
// Schema Rename
// =============================================================================

/// Name a descriptor goes by inside a schema that imports it with renaming
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRename {
    pub schema: String,
    pub name: String,
}

// =============================================================================
// Descriptor Body
// =============================================================================

/// Enumeration-specific data; literals stay in the description text
#[derive(Debug, Clone, Default)]
pub struct EnumBody {
    pub factory: Option<FactoryHook>,
}

impl EnumBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_factory(mut self, factory: FactoryHook) -> Self {
        self.factory = Some(factory);
        self
    }
}

/// Variant-specific part of a descriptor
#[derive(Debug)]
pub enum DescriptorBody {
    /// Built-in primitive, or a defined type. A defined type naming another
    /// named type carries [`PrimitiveType::Reference`].
    Simple(PrimitiveType),
    Enumeration(EnumBody),
    Select(SelectBody),
    Aggregate(AggrBody),
    Entity(EntityBody),
}

// =============================================================================
// Type Descriptor
// =============================================================================

/// A node of the dictionary's type graph
#[derive(Debug)]
pub struct TypeDescriptor {
    name: String,
    description: String,
    pub(crate) origin_schema: Option<SchemaId>,
    referent: Mutex<Option<TypeId>>,
    alt_names: Mutex<Vec<SchemaRename>>,
    where_rules: RuleSet<WhereRule>,
    body: DescriptorBody,
}

impl TypeDescriptor {
    fn with_body(name: impl Into<String>, description: impl Into<String>, body: DescriptorBody) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            origin_schema: None,
            referent: Mutex::new(None),
            alt_names: Mutex::new(Vec::new()),
            where_rules: RuleSet::new(RegistryConfig::default()),
            body,
        }
    }

    /// Defined type over a simple kind or [`PrimitiveType::Reference`].
    ///
    /// Kinds with their own body (entity, enumeration, select, aggregates)
    /// are rejected; use their dedicated constructors.
    pub fn defined(name: impl Into<String>, kind: PrimitiveType, description: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if kind.has_own_body() {
            return Err(DictionaryError::KindMismatch {
                name,
                expected: "a simple or reference kind",
            });
        }
        Ok(Self::with_body(name, description, DescriptorBody::Simple(kind)))
    }

    /// Terminal descriptor for a built-in kind
    pub(crate) fn builtin(kind: PrimitiveType, keyword: &str) -> Self {
        Self::with_body(keyword, keyword, DescriptorBody::Simple(kind))
    }

    /// Enumeration; `description` carries the literal list, e.g.
    /// `ENUMERATION OF (RED, GREEN)`
    pub fn enumeration(name: impl Into<String>, description: impl Into<String>, body: EnumBody) -> Self {
        Self::with_body(name, description, DescriptorBody::Enumeration(body))
    }

    pub fn select(name: impl Into<String>, description: impl Into<String>, body: SelectBody) -> Self {
        Self::with_body(name, description, DescriptorBody::Select(body))
    }

    /// Aggregate; its element type is the referent
    pub fn aggregate(name: impl Into<String>, description: impl Into<String>, body: AggrBody) -> Self {
        Self::with_body(name, description, DescriptorBody::Aggregate(body))
    }

    /// Entity; the description is the entity name
    pub fn entity(name: impl Into<String>, body: EntityBody) -> Self {
        let name = name.into();
        Self::with_body(name.clone(), name, DescriptorBody::Entity(body))
    }

    pub fn with_referent(self, referent: TypeId) -> Self {
        *self.referent.lock() = Some(referent);
        self
    }

    /// Use `options` for this descriptor's WHERE rule set and the
    /// registries of its body
    pub fn with_registry_options(self, options: RegistryConfig) -> Self {
        self.apply_registry_options(options);
        self
    }

    /// Switch every registry this descriptor owns over to `options`,
    /// keeping their contents
    pub fn apply_registry_options(&self, options: RegistryConfig) {
        self.where_rules.apply_options(options);
        match &self.body {
            DescriptorBody::Entity(entity) => entity.apply_options(options),
            DescriptorBody::Select(select) => select.choices().apply_options(options),
            DescriptorBody::Simple(_) | DescriptorBody::Enumeration(_) | DescriptorBody::Aggregate(_) => {}
        }
    }

    // ---- accessors ----

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unnamed descriptors (inline aggregates) have an empty name
    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn origin_schema(&self) -> Option<SchemaId> {
        self.origin_schema
    }

    pub fn body(&self) -> &DescriptorBody {
        &self.body
    }

    pub fn referent(&self) -> Option<TypeId> {
        *self.referent.lock()
    }

    /// Wire (or unwire) the referent link after construction
    pub fn set_referent(&self, referent: Option<TypeId>) {
        *self.referent.lock() = referent;
    }

    pub fn where_rules(&self) -> &RuleSet<WhereRule> {
        &self.where_rules
    }

    /// Fundamental kind; the literal tag, not resolved through aliases
    pub fn primitive_type(&self) -> PrimitiveType {
        match &self.body {
            DescriptorBody::Simple(kind) => *kind,
            DescriptorBody::Enumeration(_) => PrimitiveType::Enumeration,
            DescriptorBody::Select(_) => PrimitiveType::Select,
            DescriptorBody::Aggregate(aggr) => aggr.kind.primitive_type(),
            DescriptorBody::Entity(_) => PrimitiveType::Entity,
        }
    }

    pub fn as_entity(&self) -> Option<&EntityBody> {
        match &self.body {
            DescriptorBody::Entity(body) => Some(body),
            _ => None,
        }
    }

    pub fn as_select(&self) -> Option<&SelectBody> {
        match &self.body {
            DescriptorBody::Select(body) => Some(body),
            _ => None,
        }
    }

    pub fn as_aggregate(&self) -> Option<&AggrBody> {
        match &self.body {
            DescriptorBody::Aggregate(body) => Some(body),
            _ => None,
        }
    }

    pub fn as_enumeration(&self) -> Option<&EnumBody> {
        match &self.body {
            DescriptorBody::Enumeration(body) => Some(body),
            _ => None,
        }
    }

    pub fn factory(&self) -> Option<&FactoryHook> {
        match &self.body {
            DescriptorBody::Simple(_) => None,
            DescriptorBody::Enumeration(body) => body.factory.as_ref(),
            DescriptorBody::Select(body) => body.factory.as_ref(),
            DescriptorBody::Aggregate(body) => body.factory.as_ref(),
            DescriptorBody::Entity(body) => body.factory(),
        }
    }

    /// Build a runtime value through the factory hook, if there is one
    pub fn create_value(&self) -> Option<RuntimeValue> {
        self.factory().map(FactoryHook::create)
    }

    /// Literals of an enumeration, lowercased, in declaration order
    pub fn enumeration_literals(&self) -> Vec<String> {
        if self.as_enumeration().is_none() {
            return Vec::new();
        }
        let desc = self.description.as_str();
        let inner = match (desc.find('('), desc.rfind(')')) {
            (Some(open), Some(close)) if open < close => &desc[open + 1..close],
            (Some(open), _) => &desc[open + 1..],
            _ => desc,
        };
        inner
            .split(',')
            .map(|lit| to_lower(lit.trim()))
            .filter(|lit| !lit.is_empty())
            .collect()
    }

    // ---- naming ----

    /// Register the name this descriptor goes by inside `schema`
    pub fn add_alt_name(&self, schema: impl Into<String>, name: impl Into<String>) {
        let schema = schema.into();
        let name = name.into();
        let mut alt_names = self.alt_names.lock();
        if let Some(existing) = alt_names.iter_mut().find(|r| r.schema.eq_ignore_ascii_case(&schema)) {
            existing.name = name;
        } else {
            alt_names.push(SchemaRename { schema, name });
        }
    }

    pub fn alt_names(&self) -> Vec<SchemaRename> {
        self.alt_names.lock().clone()
    }

    /// Name as seen from `schema`: its rename there, else the own name
    pub fn name_in(&self, schema: Option<&str>) -> String {
        if let Some(schema) = schema {
            if let Some(rename) = self
                .alt_names
                .lock()
                .iter()
                .find(|r| r.schema.eq_ignore_ascii_case(schema))
            {
                return rename.name.clone();
            }
        }
        self.name.clone()
    }

    /// `other` is the own name (case-insensitive)
    pub fn our_name(&self, other: &str) -> bool {
        self.is_named() && self.name.eq_ignore_ascii_case(other)
    }

    /// `other` is one of the alternate names
    pub fn alt_name(&self, other: &str) -> bool {
        self.alt_names.lock().iter().any(|r| r.name.eq_ignore_ascii_case(other))
    }

    /// `other` is any name this descriptor may go by
    pub fn poss_name(&self, other: &str) -> bool {
        self.our_name(other) || self.alt_name(other)
    }

    /// `other` is the name this descriptor goes by in `schema`.
    ///
    /// Without a schema every possible name is accepted. With a schema that
    /// renames it, only the rename is accepted.
    pub fn curr_name(&self, other: &str, schema: Option<&str>) -> bool {
        match schema.filter(|s| !s.is_empty()) {
            None => self.poss_name(other),
            Some(schema) => {
                let rename = self
                    .alt_names
                    .lock()
                    .iter()
                    .find(|r| r.schema.eq_ignore_ascii_case(schema))
                    .map(|r| r.name.clone());
                match rename {
                    Some(rename) => rename.eq_ignore_ascii_case(other),
                    None => self.our_name(other),
                }
            }
        }
    }

    /// Right-hand side used when this descriptor is an attribute's domain:
    /// the lowercased name, or the description for unnamed descriptors
    pub fn attr_type_name(&self, schema: Option<&str>) -> String {
        if self.is_named() {
            to_lower(&self.name_in(schema))
        } else {
            self.description.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defined_rejects_kinds_with_bodies() {
        for kind in [PrimitiveType::Entity, PrimitiveType::Select, PrimitiveType::Enumeration, PrimitiveType::Set] {
            let err = TypeDescriptor::defined("bad", kind, "bad").unwrap_err();
            assert!(matches!(err, DictionaryError::KindMismatch { .. }));
        }
        assert!(TypeDescriptor::defined("alias", PrimitiveType::Reference, "other").is_ok());
    }

    #[test]
    fn test_primitive_type_for_bodies() {
        let count = TypeDescriptor::defined("count", PrimitiveType::Integer, "INTEGER").unwrap();
        assert_eq!(count.primitive_type(), PrimitiveType::Integer);

        let colour = TypeDescriptor::enumeration("colour", "ENUMERATION OF (RED, GREEN)", EnumBody::new());
        assert_eq!(colour.primitive_type(), PrimitiveType::Enumeration);

        let points = TypeDescriptor::aggregate("points", "LIST [1:?] OF point", AggrBody::new(AggregateKind::List));
        assert_eq!(points.primitive_type(), PrimitiveType::List);
        assert!(points.primitive_type().is_aggregate());
    }

    #[test]
    fn test_enumeration_literals() {
        let colour = TypeDescriptor::enumeration("colour", "ENUMERATION OF (RED, Green ,blue)", EnumBody::new());
        assert_eq!(colour.enumeration_literals(), vec!["red", "green", "blue"]);
    }

    #[test]
    fn test_curr_name_with_and_without_schema() {
        let td = TypeDescriptor::defined("Length", PrimitiveType::Real, "REAL").unwrap();
        td.add_alt_name("importer", "distance");

        assert!(td.curr_name("LENGTH", None));
        assert!(td.curr_name("distance", None));

        assert!(td.curr_name("Distance", Some("IMPORTER")));
        assert!(!td.curr_name("length", Some("importer")));

        assert!(td.curr_name("length", Some("other_schema")));
        assert!(!td.curr_name("distance", Some("other_schema")));
    }

    #[test]
    fn test_attr_type_name() {
        let named = TypeDescriptor::defined("Count", PrimitiveType::Integer, "INTEGER").unwrap();
        assert_eq!(named.attr_type_name(None), "count");

        let unnamed = TypeDescriptor::aggregate("", "SET [1:?] OF point", AggrBody::new(AggregateKind::Set));
        assert_eq!(unnamed.attr_type_name(None), "SET [1:?] OF point");
    }

    #[test]
    fn test_factory_hook() {
        let body = EnumBody::new().with_factory(FactoryHook::new(|| Box::new(42u32)));
        let td = TypeDescriptor::enumeration("e", "ENUMERATION OF (A)", body);
        let value = td.create_value().unwrap();
        assert_eq!(value.downcast_ref::<u32>(), Some(&42));

        let plain = TypeDescriptor::defined("label", PrimitiveType::String, "STRING").unwrap();
        assert!(plain.create_value().is_none());
    }
}
