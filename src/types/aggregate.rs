//! Aggregate type bodies (ARRAY, BAG, SET, LIST)

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{FactoryHook, Logical, PrimitiveType};

/// Which aggregation an aggregate descriptor declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    /// Generic `AGGREGATE OF`
    Aggregate,
    Array,
    Bag,
    Set,
    List,
}

impl AggregateKind {
    pub fn primitive_type(self) -> PrimitiveType {
        match self {
            AggregateKind::Aggregate => PrimitiveType::Aggregate,
            AggregateKind::Array => PrimitiveType::Array,
            AggregateKind::Bag => PrimitiveType::Bag,
            AggregateKind::Set => PrimitiveType::Set,
            AggregateKind::List => PrimitiveType::List,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            AggregateKind::Aggregate => "AGGREGATE",
            AggregateKind::Array => "ARRAY",
            AggregateKind::Bag => "BAG",
            AggregateKind::Set => "SET",
            AggregateKind::List => "LIST",
        }
    }
}

/// One aggregate bound; `-1` in the legacy encoding means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bound {
    Fixed(i64),
    Unbounded,
}

impl Bound {
    /// Decode the legacy signed form
    pub fn from_raw(raw: i64) -> Self {
        if raw == -1 {
            Bound::Unbounded
        } else {
            Bound::Fixed(raw)
        }
    }

    pub fn to_raw(self) -> i64 {
        match self {
            Bound::Fixed(n) => n,
            Bound::Unbounded => -1,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Fixed(n) => write!(f, "{}", n),
            Bound::Unbounded => f.write_str("?"),
        }
    }
}

/// Aggregate-specific data. The element type is the descriptor's referent.
#[derive(Debug, Clone)]
pub struct AggrBody {
    pub kind: AggregateKind,
    pub lower: Bound,
    pub upper: Bound,
    pub unique_elements: Logical,
    pub factory: Option<FactoryHook>,
}

impl AggrBody {
    pub fn new(kind: AggregateKind) -> Self {
        Self {
            kind,
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
            unique_elements: Logical::Unknown,
            factory: None,
        }
    }

    pub fn with_bounds(mut self, lower: i64, upper: i64) -> Self {
        self.lower = Bound::from_raw(lower);
        self.upper = Bound::from_raw(upper);
        self
    }

    pub fn with_unique_elements(mut self, unique: Logical) -> Self {
        self.unique_elements = unique;
        self
    }

    pub fn with_factory(mut self, factory: FactoryHook) -> Self {
        self.factory = Some(factory);
        self
    }

    /// `[lower:upper]`, or `None` when both ends are unbounded
    pub fn bounds_text(&self) -> Option<String> {
        match (self.lower, self.upper) {
            (Bound::Unbounded, Bound::Unbounded) => None,
            (lower, upper) => Some(format!("[{}:{}]", lower, upper)),
        }
    }

    /// Build an empty aggregate container through the factory hook
    pub fn create_aggregate(&self) -> Option<super::RuntimeValue> {
        self.factory.as_ref().map(FactoryHook::create)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_roundtrip_legacy_encoding() {
        let body = AggrBody::new(AggregateKind::Set).with_bounds(1, -1);
        assert_eq!(body.lower, Bound::Fixed(1));
        assert_eq!(body.upper, Bound::Unbounded);
        assert_eq!(body.upper.to_raw(), -1);
        assert_eq!(body.bounds_text().as_deref(), Some("[1:?]"));
    }

    #[test]
    fn test_unbounded_has_no_bounds_text() {
        assert_eq!(AggrBody::new(AggregateKind::Bag).bounds_text(), None);
    }
}
