//! Error types for the data dictionary

use thiserror::Error;

use crate::dictionary::TypeId;

/// Result type for dictionary operations
pub type Result<T> = std::result::Result<T, DictionaryError>;

/// Data dictionary errors
///
/// Unset links (a defined type without a referent, an entity without
/// supertypes) are never errors. They resolve to `Unknown` or `None`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DictionaryError {
    #[error("Index {index} out of range for registry of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Cyclic type graph detected at {name}")]
    CyclicTypeGraph { name: String },

    #[error("Unknown type handle: {0}")]
    UnknownType(TypeId),

    #[error("Schema not found: {0}")]
    UnknownSchema(String),

    #[error("Descriptor {name} is not {expected}")]
    KindMismatch { name: String, expected: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config_crate::ConfigError> for DictionaryError {
    fn from(err: config_crate::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
