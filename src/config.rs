//! Configuration for the data dictionary
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (express_dictionary.toml)
//! - Environment variables (EXPRESS_DICT__*)
//!
//! ## Example config file (express_dictionary.toml):
//! ```toml
//! [registry]
//! initial_capacity = 32
//! index_policy = "strict"
//!
//! [generation]
//! header_comment = false
//! ```

use std::path::PathBuf;

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{DictionaryError, Result};
use crate::registry::{IndexPolicy, DEFAULT_CAPACITY};

/// Main configuration for a [`crate::Dictionary`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryConfig {
    /// Registry settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Text generation settings
    #[serde(default)]
    pub generation: GenerationConfig,
}

/// Settings applied to every registry the dictionary creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Initial physical capacity
    #[serde(default = "default_capacity")]
    pub initial_capacity: usize,

    /// Behaviour of writes past the logical end
    #[serde(default)]
    pub index_policy: IndexPolicy,
}

/// Canonical text generation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Emit the leading `(* Generating: <name> *)` banner
    #[serde(default = "default_true")]
    pub header_comment: bool,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_true() -> bool {
    true
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            initial_capacity: default_capacity(),
            index_policy: IndexPolicy::default(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { header_comment: true }
    }
}

impl DictionaryConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, layering a specific file over the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        for location in ["express_dictionary.toml", ".express_dictionary.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(user_config) = Self::user_config_path().filter(|path| path.exists()) {
            builder = builder.add_source(File::from(user_config).required(false));
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("EXPRESS_DICT")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Per-user config file, e.g. `~/.config/express-dictionary/express_dictionary.toml`
    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "express-dictionary")
            .map(|dirs| dirs.config_dir().join("express_dictionary.toml"))
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| DictionaryError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = DictionaryConfig::default();
        assert_eq!(config.registry.initial_capacity, DEFAULT_CAPACITY);
        assert_eq!(config.registry.index_policy, IndexPolicy::Strict);
        assert!(config.generation.header_comment);
    }

    #[test]
    fn test_serialize_config() {
        let toml_str = DictionaryConfig::default().to_toml().unwrap();
        assert!(toml_str.contains("[registry]"));
        assert!(toml_str.contains("[generation]"));
        assert!(toml_str.contains("index_policy = \"strict\""));
    }

    #[test]
    fn test_user_config_lives_under_project_dir() {
        // No home directory means no user config layer at all
        if let Some(path) = DictionaryConfig::user_config_path() {
            assert!(path.ends_with("express_dictionary.toml"));
            assert!(path.components().any(|c| c.as_os_str() == "express-dictionary"));
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[registry]\ninitial_capacity = 4\nindex_policy = \"extend\"\n").unwrap();
        writeln!(file, "[generation]\nheader_comment = false").unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = DictionaryConfig::load_from(Some(&path)).unwrap();
        assert_eq!(config.registry.initial_capacity, 4);
        assert_eq!(config.registry.index_policy, IndexPolicy::Extend);
        assert!(!config.generation.header_comment);
    }
}
