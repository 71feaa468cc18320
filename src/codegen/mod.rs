//! Canonical Text Generation
//!
//! Serializes a schema, and everything it declares, back to EXPRESS.
//!
//! Layout of a generated schema:
//! - optional `(* Generating: <Name> *)` banner
//! - `SCHEMA <name>;`
//! - USE / REFERENCE clauses
//! - TYPE declarations, then ENTITY declarations, in declaration order
//! - raw global rules, functions and procedures
//! - `END_SCHEMA;`

pub mod express;
pub mod names;

use tracing::debug;

use crate::dictionary::{Dictionary, EntityId, SchemaId, TypeId};
use crate::error::{DictionaryError, Result};
use names::to_lower;

/// Generated schema text plus a summary of what went into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedOutput {
    pub text: String,
    pub type_count: usize,
    pub entity_count: usize,
    pub rule_count: usize,
}

/// Render `schema` as EXPRESS source
pub fn generate_schema(dict: &Dictionary, schema: SchemaId) -> Result<GeneratedOutput> {
    let owner = dict.require_schema(schema)?;
    let name = owner.name();
    let mut output = String::new();

    if dict.config().generation.header_comment {
        output.push_str(&format!("\n(* Generating: {} *)\n", name));
    }
    output.push_str(&format!("\nSCHEMA {};\n", to_lower(name)));
    express::emit_interfaces(&mut output, &owner);

    output.push_str("\n(* ////////////// TYPE Definitions *)\n");
    let type_count = owner.types().with_items(|types| -> Result<usize> {
        let mut count = 0;
        for id in types {
            let td = dict.require(*id)?;
            output.push('\n');
            express::emit_type(&mut output, &td);
            count += 1;
        }
        Ok(count)
    })?;

    output.push_str("\n(* ////////////// ENTITY Definitions *)\n");
    let entity_count = owner.entities().with_items(|entities| -> Result<usize> {
        let mut count = 0;
        for id in entities {
            let td = dict.require_entity(*id)?;
            output.push('\n');
            express::emit_entity(&mut output, dict, &td, Some(name))?;
            count += 1;
        }
        Ok(count)
    })?;

    let rule_count = express::emit_algorithms(&mut output, &owner);
    output.push_str("\nEND_SCHEMA;\n");

    debug!(schema = name, type_count, entity_count, rule_count, "generated schema text");
    Ok(GeneratedOutput {
        text: output,
        type_count,
        entity_count,
        rule_count,
    })
}

impl Dictionary {
    /// EXPRESS source of `schema`
    pub fn generate_express(&self, schema: SchemaId) -> Result<String> {
        generate_schema(self, schema).map(|generated| generated.text)
    }

    /// TYPE declaration of a non-entity descriptor
    pub fn generate_type(&self, id: TypeId) -> Result<String> {
        let td = self.require(id)?;
        if td.as_entity().is_some() {
            return Err(DictionaryError::KindMismatch {
                name: td.name().to_string(),
                expected: "a non-entity type",
            });
        }
        let mut output = String::new();
        express::emit_type(&mut output, &td);
        Ok(output)
    }

    /// ENTITY declaration, with attribute domains named as in the entity's
    /// own schema
    pub fn generate_entity(&self, id: EntityId) -> Result<String> {
        let td = self.require_entity(id)?;
        let schema = td.origin_schema().and_then(|s| self.schema(s));
        let mut output = String::new();
        express::emit_entity(&mut output, self, &td, schema.as_ref().map(|s| s.name()))?;
        Ok(output)
    }
}
