//! Module: config
//! Responsibility: runtime configuration (key layout, reserved field names,
//! pagination limits) and its TOML loading.

use crate::{
    DEFAULT_KEY_SEPARATOR, DEFAULT_PAGE_SIZE,
    error::{ErrorClass, ErrorOrigin, InternalError},
};
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Config, err.to_string())
    }
}

///
/// DocdexConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocdexConfig {
    pub keys: KeyConfig,
    pub fields: FieldNames,
    pub list: ListConfig,
}

impl DocdexConfig {
    /// Parse and validate TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;

        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keys.separator.is_empty() {
            return Err(ConfigError::Invalid("keys.separator is empty".to_string()));
        }

        for (name, value) in [
            ("fields.id", &self.fields.id),
            ("fields.created", &self.fields.created),
            ("fields.modified", &self.fields.modified),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Invalid(format!("{name} is empty")));
            }
        }

        let list = &self.list;
        if list.default_page_size == 0 {
            return Err(ConfigError::Invalid(
                "list.default_page_size must be positive".to_string(),
            ));
        }
        if list.default_page_size > list.max_page_size {
            return Err(ConfigError::Invalid(format!(
                "list.default_page_size ({}) exceeds list.max_page_size ({})",
                list.default_page_size, list.max_page_size
            )));
        }

        Ok(())
    }
}

///
/// KeyConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyConfig {
    pub separator: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_KEY_SEPARATOR.to_string(),
        }
    }
}

///
/// FieldNames
/// Reserved attribute names filled in by the lifecycle layer.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldNames {
    pub id: String,
    pub created: String,
    pub modified: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            created: "created".to_string(),
            modified: "modified".to_string(),
        }
    }
}

///
/// ListConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: 1000,
        }
    }
}

///
/// TESTS
///
