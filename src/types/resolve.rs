//! Type resolution
//!
//! Walks over the referent links of the arena: alias unwrapping, base type
//! lookup, aggregate element resolution, membership tests and the long-form
//! type string.
//!
//! Every walk is bounded by the number of descriptors in the arena. A chain
//! longer than that must revisit a node, and is reported as
//! [`DictionaryError::CyclicTypeGraph`].

use std::sync::Arc;

use tracing::trace;

use super::{DescriptorBody, PrimitiveType, TypeDescriptor};
use crate::dictionary::{Dictionary, TypeId};
use crate::error::{DictionaryError, Result};

fn cyclic(td: &TypeDescriptor) -> DictionaryError {
    DictionaryError::CyclicTypeGraph {
        name: td.name().to_string(),
    }
}

/// Kind a resolved descriptor stands for. A reference whose chain ended
/// without reaching a concrete type is unknown.
fn fundamental(td: &TypeDescriptor) -> PrimitiveType {
    match td.primitive_type() {
        PrimitiveType::Reference => PrimitiveType::Unknown,
        kind => kind,
    }
}

impl Dictionary {
    /// Follow alias links while the current node is a reference.
    ///
    /// Returns `id` itself when it has no referent or is not an alias.
    pub fn non_ref_type_descriptor(&self, id: TypeId) -> Result<TypeId> {
        let (found, _) = self.non_ref_descriptor(id)?;
        Ok(found)
    }

    fn non_ref_descriptor(&self, id: TypeId) -> Result<(TypeId, Arc<TypeDescriptor>)> {
        let mut current = (id, self.require(id)?);
        for _ in 0..=self.type_count() {
            if current.1.primitive_type() != PrimitiveType::Reference {
                return Ok(current);
            }
            match self.follow(&current.1) {
                Some(next) => {
                    trace!(from = current.1.name(), to = next.1.name(), "unwrapping alias");
                    current = next;
                }
                None => return Ok(current),
            }
        }
        Err(cyclic(&current.1))
    }

    /// Fundamental kind once aliases are collapsed
    pub fn non_ref_type(&self, id: TypeId) -> Result<PrimitiveType> {
        let (_, td) = self.non_ref_descriptor(id)?;
        Ok(fundamental(&td))
    }

    /// Last descriptor of the referent chain, whatever its kind
    pub fn base_type_descriptor(&self, id: TypeId) -> Result<TypeId> {
        let (found, _) = self.base_descriptor(id)?;
        Ok(found)
    }

    fn base_descriptor(&self, id: TypeId) -> Result<(TypeId, Arc<TypeDescriptor>)> {
        let mut current = (id, self.require(id)?);
        for _ in 0..=self.type_count() {
            match self.follow(&current.1) {
                Some(next) => current = next,
                None => return Ok(current),
            }
        }
        Err(cyclic(&current.1))
    }

    /// Kind of the ultimate primitive, e.g. Integer for
    /// `TYPE count_set = SET OF ref_count;`
    pub fn base_type(&self, id: TypeId) -> Result<PrimitiveType> {
        let (_, td) = self.base_descriptor(id)?;
        Ok(fundamental(&td))
    }

    pub fn is_aggregate_type(&self, id: TypeId) -> Result<bool> {
        Ok(self.non_ref_type(id)?.is_aggregate())
    }

    /// Element type of an aggregate, itself unwrapped through aliases.
    ///
    /// `None` when `id` is not an aggregate or has no element type wired.
    pub fn aggregate_element_type_descriptor(&self, id: TypeId) -> Result<Option<TypeId>> {
        let (_, aggr) = self.non_ref_descriptor(id)?;
        if !fundamental(&aggr).is_aggregate() {
            return Ok(None);
        }
        match self.follow(&aggr) {
            Some((element, _)) => self.non_ref_type_descriptor(element).map(Some),
            None => Ok(None),
        }
    }

    /// Literal kind of the aggregate's element descriptor
    pub fn aggregate_element_type(&self, id: TypeId) -> Result<PrimitiveType> {
        match self.aggregate_element_type_descriptor(id)? {
            Some(element) => Ok(self.require(element)?.primitive_type()),
            None => Ok(PrimitiveType::Unknown),
        }
    }

    /// Membership test; `Some(other)` when `this` is (or inherits from) `other`.
    ///
    /// Entities search their supertype graph. Every other kind only matches
    /// itself.
    pub fn is_a(&self, this: TypeId, other: TypeId) -> Result<Option<TypeId>> {
        let td = self.require(this)?;
        match td.body() {
            DescriptorBody::Entity(_) => {
                let target = self.non_ref_type_descriptor(other)?;
                match (self.as_entity_id(this), self.as_entity_id(target)) {
                    (Some(this), Some(target)) => {
                        Ok(self.entity_is_a(this, target)?.map(|found| found.as_type()))
                    }
                    _ => Ok(None),
                }
            }
            _ => Ok((this == other).then_some(other)),
        }
    }

    /// Name-based membership: the own name, else anything the referent is
    pub fn is_a_named(&self, this: TypeId, name: &str) -> Result<Option<TypeId>> {
        let mut current = (this, self.require(this)?);
        for _ in 0..=self.type_count() {
            if !current.1.is_named() {
                return Ok(None);
            }
            if current.1.our_name(name) {
                return Ok(Some(current.0));
            }
            match self.follow(&current.1) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Err(cyclic(&current.1))
    }

    /// Long-form human description of a type, recursing through aliases
    /// and aggregate element types
    pub fn type_string(&self, id: TypeId) -> Result<String> {
        self.type_string_bounded(id, self.type_count())
    }

    fn type_string_bounded(&self, id: TypeId, budget: usize) -> Result<String> {
        let td = self.require(id)?;
        let nested = |s: &mut String| -> Result<()> {
            if let Some((next, _)) = self.follow(&td) {
                if budget == 0 {
                    return Err(cyclic(&td));
                }
                s.push_str(" -- ");
                s.push_str(&self.type_string_bounded(next, budget - 1)?);
            }
            Ok(())
        };
        let header = |s: &mut String| {
            if td.referent().is_some() {
                s.push_str("TYPE ");
                s.push_str(td.name());
                s.push_str(" = ");
            }
        };

        let mut s = String::new();
        match td.primitive_type() {
            PrimitiveType::Reference => {
                if td.is_named() {
                    s.push_str("TYPE ");
                    s.push_str(td.name());
                    s.push_str(" = ");
                }
                s.push_str(td.description());
                nested(&mut s)?;
            }
            kind @ (PrimitiveType::Integer
            | PrimitiveType::Real
            | PrimitiveType::Number
            | PrimitiveType::String
            | PrimitiveType::Binary) => {
                header(&mut s);
                s.push_str(match kind {
                    PrimitiveType::Integer => "Integer",
                    PrimitiveType::Real => "Real",
                    PrimitiveType::Number => "Number",
                    PrimitiveType::String => "String",
                    _ => "Binary",
                });
            }
            PrimitiveType::Boolean => {
                header(&mut s);
                s.push_str("Boolean: F, T");
            }
            PrimitiveType::Logical => {
                header(&mut s);
                s.push_str("Logical: F, T, U");
            }
            PrimitiveType::Enumeration => {
                s.push_str("Enumeration: ");
                if td.is_named() {
                    s.push_str("TYPE ");
                    s.push_str(td.name());
                    s.push_str(" = ");
                }
                s.push_str(td.description());
            }
            PrimitiveType::Entity => {
                s.push_str("Entity: ");
                s.push_str(td.name());
            }
            PrimitiveType::Aggregate
            | PrimitiveType::Array
            | PrimitiveType::Bag
            | PrimitiveType::Set
            | PrimitiveType::List => {
                s.push_str(td.description());
                nested(&mut s)?;
            }
            PrimitiveType::Select => s.push_str(td.description()),
            PrimitiveType::Generic | PrimitiveType::Unknown => s.push_str("Unknown"),
        }
        Ok(s)
    }
}
