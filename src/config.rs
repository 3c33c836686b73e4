//! JSON configuration for exporting resolved flags as shell variables.

use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

/// Prefix used for exported variables when the config does not set one.
pub const DEFAULT_PREFIX: &str = "GETARG_";

/// Errors that can occur during config parsing and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse JSON config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("invalid key '{0}': must be a single dash followed by a name, without '='")]
    InvalidKey(String),

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("duplicate export name: {0}")]
    DuplicateName(String),

    #[error("invalid export name '{0}': must be a shell identifier once '-' becomes '_'")]
    InvalidName(String),

    #[error("invalid prefix '{0}': must be empty or start a shell identifier")]
    InvalidPrefix(String),

    #[error("invalid default '{value}' for {value_type} key '{key}'")]
    InvalidDefault {
        key: String,
        value: String,
        value_type: ValueType,
    },
}

/// How a key's stored string is read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Raw string (default)
    #[default]
    String,
    /// Boolean: only "0" is false
    Bool,
    /// Signed 64-bit integer, non-numeric reads as 0
    Int,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
        };
        f.write_str(name)
    }
}

/// Configuration for a single exported key.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyConfig {
    /// The flag to look up, including its leading dash (e.g. "-port")
    pub key: String,
    /// Variable stem override; defaults to the key without its dash
    pub name: Option<String>,
    /// How to read the value
    #[serde(rename = "type", default)]
    pub value_type: ValueType,
    /// Value used when the key was not given
    pub default: Option<String>,
}

impl KeyConfig {
    /// The stem used for the exported variable name.
    pub fn effective_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) => name,
            None => self.key.strip_prefix('-').unwrap_or(&self.key),
        }
    }

    /// The default parsed as a boolean, if one is set.
    ///
    /// Accepts "true"/"false" and "1"/"0".
    pub fn bool_default(&self) -> Option<bool> {
        self.default.as_deref().and_then(parse_bool)
    }

    /// The default parsed as an integer, if one is set.
    pub fn int_default(&self) -> Option<i64> {
        self.default.as_deref().and_then(|d| d.parse().ok())
    }
}

/// Top-level export configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Environment variable prefix (default: "GETARG_")
    pub prefix: Option<String>,
    /// Keys to export
    #[serde(default)]
    pub keys: Vec<KeyConfig>,
}

impl Config {
    /// Parse a JSON string into a Config.
    pub fn from_json(json: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut keys = HashSet::new();
        let mut names = HashSet::new();

        if !is_valid_prefix(self.effective_prefix()) {
            return Err(ConfigError::InvalidPrefix(self.effective_prefix().to_string()));
        }

        for key in &self.keys {
            if !is_valid_key(&key.key) {
                return Err(ConfigError::InvalidKey(key.key.clone()));
            }
            if !keys.insert(&key.key) {
                return Err(ConfigError::DuplicateKey(key.key.clone()));
            }
            // Names collide after shell conversion, so compare that form
            let name = shell_var_name(key.effective_name());
            if !is_shell_identifier(&name) {
                return Err(ConfigError::InvalidName(key.effective_name().to_string()));
            }
            if !names.insert(name) {
                return Err(ConfigError::DuplicateName(key.effective_name().to_string()));
            }
            Self::validate_default(key)?;
        }

        Ok(())
    }

    /// Check that a default can be read as the key's type.
    fn validate_default(key: &KeyConfig) -> Result<(), ConfigError> {
        let Some(ref value) = key.default else {
            return Ok(());
        };
        let valid = match key.value_type {
            ValueType::String => true,
            ValueType::Bool => key.bool_default().is_some(),
            ValueType::Int => key.int_default().is_some(),
        };
        if !valid {
            return Err(ConfigError::InvalidDefault {
                key: key.key.clone(),
                value: value.clone(),
                value_type: key.value_type,
            });
        }
        Ok(())
    }

    /// Get the effective prefix, using the default if none is set.
    pub fn effective_prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or(DEFAULT_PREFIX)
    }
}

/// Parse a user-supplied boolean default.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Convert a key stem to a shell variable name.
///
/// Converts to uppercase and replaces hyphens with underscores.
pub fn shell_var_name(name: &str) -> String {
    name.to_uppercase().replace('-', "_")
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_shell_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Whether `prefix` can precede an exported name. Empty is allowed.
pub fn is_valid_prefix(prefix: &str) -> bool {
    prefix.is_empty() || is_shell_identifier(prefix)
}

/// A lookup key: one dash, a non-empty name, no '='.
fn is_valid_key(key: &str) -> bool {
    match key.strip_prefix('-') {
        Some(name) => !name.is_empty() && !name.starts_with('-') && !name.contains('='),
        None => false,
    }
}
