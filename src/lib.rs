//! EXPRESS Data Dictionary
//!
//! An in-memory, queryable model of EXPRESS (ISO 10303) schemas: entities,
//! types, attributes and rules. The dictionary resolves type relationships
//! and re-emits the model as canonical EXPRESS source.
//!
//! ## Features
//!
//! - **Arena Model**: Descriptors live in a [`Dictionary`] and refer to each other by handle
//! - **Typed Ownership**: Owning and non-owning registries are distinct types
//! - **Resolution**: Alias unwrapping, aggregate elements, inheritance, select compatibility
//! - **Cycle Detection**: Walks fail with an error instead of looping
//! - **Canonical Text**: Byte-stable EXPRESS regeneration
//!
//! ## Architecture
//!
//! ```text
//! Dictionary
//! ├── types: [TypeDescriptor]          (arena, addressed by TypeId / EntityId)
//! │   ├── Simple / Enumeration / Select / Aggregate / Entity
//! │   ├── where_rules: RuleSet<WhereRule>
//! │   └── Entity: supertypes, attributes, uniqueness rules
//! └── schemas: [Schema]                (arena, addressed by SchemaId)
//!     ├── types, entities              (RefRegistry)
//!     ├── USE / REFERENCE              (OwningRegistry<InterfaceSpec>)
//!     └── global rules, functions, procedures
//! ```
//!
//! ## Example
//!
//! ```
//! use express_dictionary::{AttrDescriptor, Dictionary, EntityBody, PrimitiveType, TypeDescriptor};
//!
//! let dict = Dictionary::new();
//! let schema = dict.add_schema("Geometry");
//! let integer = dict.builtin(PrimitiveType::Integer).unwrap();
//! let count = dict
//!     .insert_type(schema, TypeDescriptor::defined("count", PrimitiveType::Integer, "INTEGER").unwrap().with_referent(integer))
//!     .unwrap();
//! let point = dict.insert_entity(schema, TypeDescriptor::entity("Point", EntityBody::new())).unwrap();
//! dict.add_attribute(point, AttrDescriptor::explicit("x", count).optional(true)).unwrap();
//!
//! assert_eq!(
//!     dict.generate_entity(point).unwrap(),
//!     "ENTITY point;\n    x : OPTIONAL count;\nEND_ENTITY;\n"
//! );
//! ```

pub mod attribute;
pub mod codegen;
pub mod config;
pub mod dictionary;
pub mod entity;
pub mod error;
pub mod graph;
pub mod registry;
pub mod rules;
pub mod schema;
pub mod types;

pub use attribute::{AttrDescriptor, AttrKind};
pub use codegen::{generate_schema, GeneratedOutput};
pub use config::{DictionaryConfig, GenerationConfig, RegistryConfig};
pub use dictionary::{Dictionary, EntityId, SchemaId, TypeId};
pub use entity::EntityBody;
pub use error::{DictionaryError, Result};
pub use graph::{EdgeKind, ReferenceGraph, TypeCycle};
pub use registry::{Handle, IndexPolicy, InstanceRegistry, OwningRegistry, RefRegistry};
pub use rules::{GlobalRule, RuleSet, RuleText, UniquenessRule, WhereRule};
pub use schema::{ExplicitItem, InterfaceKind, InterfaceSpec, Schema};
pub use types::{
    AggrBody, AggregateKind, Bound, DescriptorBody, EnumBody, FactoryHook, Logical, PrimitiveType, RuntimeValue,
    SchemaRename, SelectBody, TypeDescriptor,
};
