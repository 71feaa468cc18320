//! Attribute descriptors
//!
//! An entity's explicit, derived and inverse attributes. Each one points at
//! its domain type by handle; resolution goes through the [`Dictionary`].

use std::sync::Arc;

use crate::dictionary::{Dictionary, EntityId, TypeId};
use crate::error::Result;
use crate::types::{Logical, PrimitiveType, TypeDescriptor};

/// Which kind of attribute this is, with the kind-specific data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrKind {
    Explicit,
    /// `initializer` is the raw expression after `:=`
    Derived { initializer: Option<String> },
    /// `inverted_attr` names the attribute on the related entity
    Inverse { inverted_attr: String },
}

#[derive(Debug, Clone)]
pub struct AttrDescriptor {
    name: String,
    optional: Logical,
    domain: Option<TypeId>,
    owner: Option<EntityId>,
    kind: AttrKind,
}

impl AttrDescriptor {
    pub fn explicit(name: impl Into<String>, domain: TypeId) -> Self {
        Self::with_kind(name, Some(domain), AttrKind::Explicit)
    }

    pub fn derived(name: impl Into<String>, domain: TypeId, initializer: Option<String>) -> Self {
        Self::with_kind(name, Some(domain), AttrKind::Derived { initializer })
    }

    pub fn inverse(name: impl Into<String>, domain: TypeId, inverted_attr: impl Into<String>) -> Self {
        Self::with_kind(
            name,
            Some(domain),
            AttrKind::Inverse {
                inverted_attr: inverted_attr.into(),
            },
        )
    }

    /// Attribute with no domain wired yet
    pub fn with_kind(name: impl Into<String>, domain: Option<TypeId>, kind: AttrKind) -> Self {
        Self {
            name: name.into(),
            optional: Logical::False,
            domain,
            owner: None,
            kind,
        }
    }

    pub fn optional(mut self, optional: impl Into<Logical>) -> Self {
        self.optional = optional.into();
        self
    }

    pub(crate) fn with_owner(mut self, owner: EntityId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_optional(&self) -> Logical {
        self.optional
    }

    pub fn domain(&self) -> Option<TypeId> {
        self.domain
    }

    /// Entity that declares this attribute
    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    pub fn kind(&self) -> &AttrKind {
        &self.kind
    }

    pub fn is_derived(&self) -> bool {
        matches!(self.kind, AttrKind::Derived { .. })
    }

    pub fn is_inverse(&self) -> bool {
        matches!(self.kind, AttrKind::Inverse { .. })
    }

    pub fn inverted_attr(&self) -> Option<&str> {
        match &self.kind {
            AttrKind::Inverse { inverted_attr } => Some(inverted_attr),
            _ => None,
        }
    }

    pub fn initializer(&self) -> Option<&str> {
        match &self.kind {
            AttrKind::Derived { initializer } => initializer.as_deref(),
            _ => None,
        }
    }

    // ---- resolution through the domain ----

    fn domain_descriptor(&self, dict: &Dictionary) -> Result<Option<Arc<TypeDescriptor>>> {
        self.domain.map(|id| dict.require(id)).transpose()
    }

    /// Kind of the domain with aliases collapsed
    pub fn non_ref_type(&self, dict: &Dictionary) -> Result<PrimitiveType> {
        match self.domain {
            Some(id) => dict.non_ref_type(id),
            None => Ok(PrimitiveType::Unknown),
        }
    }

    pub fn base_type(&self, dict: &Dictionary) -> Result<PrimitiveType> {
        match self.domain {
            Some(id) => dict.base_type(id),
            None => Ok(PrimitiveType::Unknown),
        }
    }

    pub fn is_aggregate(&self, dict: &Dictionary) -> Result<bool> {
        Ok(self.non_ref_type(dict)?.is_aggregate())
    }

    pub fn aggregate_element_type_descriptor(&self, dict: &Dictionary) -> Result<Option<TypeId>> {
        match self.domain {
            Some(id) => dict.aggregate_element_type_descriptor(id),
            None => Ok(None),
        }
    }

    /// Domain name as written in an attribute declaration inside `schema`
    pub fn attr_type_name(&self, dict: &Dictionary, schema: Option<&str>) -> Result<String> {
        Ok(self
            .domain_descriptor(dict)?
            .map(|td| td.attr_type_name(schema))
            .unwrap_or_default())
    }

    /// Long-form domain description; derived attributes are prefixed with `DERIVE  `
    pub fn expanded_type_name(&self, dict: &Dictionary) -> Result<String> {
        let domain = match self.domain {
            Some(id) => dict.type_string(id)?,
            None => String::new(),
        };
        if self.is_derived() {
            Ok(format!("DERIVE  {}", domain))
        } else {
            Ok(domain)
        }
    }
}
