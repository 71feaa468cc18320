//! Dictionary Arena
//!
//! The [`Dictionary`] owns every descriptor and schema. Everything else
//! refers to them through plain handles:
//! - [`TypeId`] for any type descriptor (entities included)
//! - [`EntityId`] for a descriptor known to be an entity
//! - [`SchemaId`] for a schema
//!
//! The arena is append-only, so a handle issued by a dictionary stays valid
//! for the dictionary's lifetime. Arena locks are only held long enough to
//! clone an `Arc` in or out; they are never held across calls into
//! descriptor registries.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DictionaryConfig;
use crate::error::{DictionaryError, Result};
use crate::registry::Handle;
use crate::rules::UniquenessRule;
use crate::schema::{InterfaceKind, Schema};
use crate::types::{PrimitiveType, TypeDescriptor};

// =============================================================================
// Handles
// =============================================================================

/// Handle to a type descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub(crate) u32);

/// Handle to a type descriptor whose body is an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub(crate) TypeId);

/// Handle to a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaId(pub(crate) u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EntityId {
    pub fn as_type(self) -> TypeId {
        self.0
    }
}

impl SchemaId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<EntityId> for TypeId {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0 .0)
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema#{}", self.0)
    }
}

impl Handle for TypeId {}
impl Handle for EntityId {}
impl Handle for SchemaId {}

// =============================================================================
// Dictionary
// =============================================================================

/// Arena of every schema and descriptor known to the process
pub struct Dictionary {
    types: RwLock<Vec<Arc<TypeDescriptor>>>,
    schemas: RwLock<Vec<Arc<Schema>>>,
    builtins: Vec<(PrimitiveType, TypeId)>,
    config: DictionaryConfig,
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Dictionary {
    pub fn new() -> Self {
        Self::with_config(DictionaryConfig::default())
    }

    /// Create a dictionary with the built-in primitive descriptors seeded
    pub fn with_config(config: DictionaryConfig) -> Self {
        let mut types = Vec::new();
        let mut builtins = Vec::new();
        for kind in PrimitiveType::BUILTINS {
            let keyword = kind.keyword().unwrap_or("UNKNOWN");
            let id = TypeId(types.len() as u32);
            types.push(Arc::new(
                TypeDescriptor::builtin(kind, keyword).with_registry_options(config.registry),
            ));
            builtins.push((kind, id));
        }
        Self {
            types: RwLock::new(types),
            schemas: RwLock::new(Vec::new()),
            builtins,
            config,
        }
    }

    pub fn config(&self) -> &DictionaryConfig {
        &self.config
    }

    /// Built-in terminal descriptor for a primitive kind
    pub fn builtin(&self, kind: PrimitiveType) -> Option<TypeId> {
        self.builtins.iter().find(|(k, _)| *k == kind).map(|(_, id)| *id)
    }

    // ---- schemas ----

    /// Create an empty schema
    pub fn add_schema(&self, name: impl Into<String>) -> SchemaId {
        let schema = Schema::new(name, self.config.registry);
        let mut schemas = self.schemas.write();
        let id = SchemaId(schemas.len() as u32);
        schemas.push(Arc::new(schema));
        id
    }

    pub fn schema(&self, id: SchemaId) -> Option<Arc<Schema>> {
        self.schemas.read().get(id.index()).cloned()
    }

    pub fn require_schema(&self, id: SchemaId) -> Result<Arc<Schema>> {
        self.schema(id).ok_or_else(|| DictionaryError::UnknownSchema(id.to_string()))
    }

    /// Look a schema up by name (case-insensitive)
    pub fn schema_by_name(&self, name: &str) -> Option<SchemaId> {
        self.schemas
            .read()
            .iter()
            .position(|s| s.name().eq_ignore_ascii_case(name))
            .map(|i| SchemaId(i as u32))
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.read().len()
    }

    pub fn schema_ids(&self) -> Vec<SchemaId> {
        (0..self.schema_count() as u32).map(SchemaId).collect()
    }

    // ---- descriptors ----

    fn push_type(&self, mut td: TypeDescriptor, schema: Option<SchemaId>) -> TypeId {
        td.origin_schema = schema;
        td.apply_registry_options(self.config.registry);
        let mut types = self.types.write();
        let id = TypeId(types.len() as u32);
        types.push(Arc::new(td));
        id
    }

    /// Add a non-entity type declared by `schema`
    pub fn insert_type(&self, schema: SchemaId, td: TypeDescriptor) -> Result<TypeId> {
        if td.as_entity().is_some() {
            return Err(DictionaryError::KindMismatch {
                name: td.name().to_string(),
                expected: "a non-entity type",
            });
        }
        let owner = self.require_schema(schema)?;
        let id = self.push_type(td, Some(schema));
        owner.types().append(id);
        Ok(id)
    }

    /// Add an entity declared by `schema`
    pub fn insert_entity(&self, schema: SchemaId, td: TypeDescriptor) -> Result<EntityId> {
        if td.as_entity().is_none() {
            return Err(DictionaryError::KindMismatch {
                name: td.name().to_string(),
                expected: "an entity",
            });
        }
        let owner = self.require_schema(schema)?;
        let id = EntityId(self.push_type(td, Some(schema)));
        owner.entities().append(id);
        Ok(id)
    }

    /// Add a descriptor that is not listed among any schema's declarations,
    /// such as an inline aggregate used as an attribute domain
    pub fn add_unnamed_type(&self, schema: Option<SchemaId>, td: TypeDescriptor) -> TypeId {
        self.push_type(td, schema)
    }

    pub fn get(&self, id: TypeId) -> Option<Arc<TypeDescriptor>> {
        self.types.read().get(id.index()).cloned()
    }

    pub fn require(&self, id: TypeId) -> Result<Arc<TypeDescriptor>> {
        self.get(id).ok_or(DictionaryError::UnknownType(id))
    }

    /// Descriptor for an entity handle
    pub fn entity(&self, id: EntityId) -> Option<Arc<TypeDescriptor>> {
        self.get(id.as_type()).filter(|td| td.as_entity().is_some())
    }

    pub fn require_entity(&self, id: EntityId) -> Result<Arc<TypeDescriptor>> {
        let td = self.require(id.as_type())?;
        if td.as_entity().is_none() {
            return Err(DictionaryError::KindMismatch {
                name: td.name().to_string(),
                expected: "an entity",
            });
        }
        Ok(td)
    }

    /// Narrow a type handle to an entity handle
    pub fn as_entity_id(&self, id: TypeId) -> Option<EntityId> {
        self.get(id).filter(|td| td.as_entity().is_some()).map(|_| EntityId(id))
    }

    pub fn type_count(&self) -> usize {
        self.types.read().len()
    }

    pub fn type_ids(&self) -> Vec<TypeId> {
        (0..self.type_count() as u32).map(TypeId).collect()
    }

    /// The descriptor behind `td`'s referent; dangling links read as unset
    pub(crate) fn follow(&self, td: &TypeDescriptor) -> Option<(TypeId, Arc<TypeDescriptor>)> {
        let next = td.referent()?;
        match self.get(next) {
            Some(found) => Some((next, found)),
            None => {
                debug!(from = td.name(), to = %next, "dangling referent treated as unset");
                None
            }
        }
    }

    /// Find a type or entity declared in `schema` by name (case-insensitive)
    pub fn find_type(&self, schema: SchemaId, name: &str) -> Option<TypeId> {
        let owner = self.schema(schema)?;
        let by_name = |id: TypeId| self.get(id).is_some_and(|td| td.our_name(name));
        owner
            .types()
            .snapshot()
            .into_iter()
            .find(|id| by_name(*id))
            .or_else(|| {
                owner
                    .entities()
                    .snapshot()
                    .into_iter()
                    .map(EntityId::as_type)
                    .find(|id| by_name(*id))
            })
    }

    // ---- builder helpers ----

    /// Append a uniqueness rule to an entity, wiring its parent back-reference
    pub fn add_uniqueness_rule(&self, entity: EntityId, rule: UniquenessRule) -> Result<()> {
        let td = self.require_entity(entity)?;
        if let Some(body) = td.as_entity() {
            body.uniqueness_rules().push(rule.with_parent(entity));
        }
        Ok(())
    }

    /// Record USE/REFERENCE renames of `schema` as alternate names on the
    /// foreign descriptors they rename. Returns how many names were recorded.
    ///
    /// Interfaces naming a schema this dictionary does not hold are skipped.
    pub fn register_interface_renames(&self, schema: SchemaId) -> Result<usize> {
        let importer = self.require_schema(schema)?;
        let mut recorded = 0;
        for kind in [InterfaceKind::Use, InterfaceKind::Reference] {
            for interface in importer.interfaces(kind).snapshot() {
                let Some(foreign) = self.schema_by_name(interface.foreign_schema()) else {
                    debug!(schema = importer.name(), foreign = interface.foreign_schema(), "foreign schema not loaded");
                    continue;
                };
                for item in interface.explicit_items().snapshot() {
                    let Some(renamed) = item.new_name() else { continue };
                    if let Some(target) = self.find_type(foreign, item.original()).and_then(|id| self.get(id)) {
                        target.add_alt_name(importer.name(), renamed);
                        recorded += 1;
                    }
                }
            }
        }
        Ok(recorded)
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dictionary")
            .field("types", &self.type_count())
            .field("schemas", &self.schema_count())
            .finish()
    }
}
