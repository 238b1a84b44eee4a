//! Template variables
//!
//! Variables are a YAML mapping merged from three sources, later ones winning:
//! environment defaults (`STACKLINT_VAR_<NAME>`), the variables file, and
//! `--var name=value` pairs.

use std::fs;
use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::config::ConfigError;

/// Prefix for environment variables that become template variables
pub const ENV_PREFIX: &str = "STACKLINT_VAR_";

/// Name/value mapping visible to templates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables {
    values: Mapping,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mapping(values: Mapping) -> Self {
        Self { values }
    }

    /// Collect `STACKLINT_VAR_<NAME>=value` pairs; names are lowercased
    pub fn from_env<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut variables = Self::new();
        for (key, value) in vars {
            if let Some(name) = key.strip_prefix(ENV_PREFIX) {
                if name.is_empty() {
                    continue;
                }
                variables.insert(name.to_lowercase(), parse_scalar(&value));
            }
        }
        variables
    }

    /// Load a YAML variables file; an empty file yields no variables
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Variables {
                path: path.to_path_buf(),
                source,
            })?;

        match value {
            Value::Null => Ok(Self::new()),
            Value::Mapping(values) => Ok(Self { values }),
            _ => Err(ConfigError::InvalidVariables {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Parse a `name=value` command-line assignment
    pub fn parse_assignment(assignment: &str) -> Result<(String, Value), ConfigError> {
        match assignment.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), parse_scalar(value)))
            }
            _ => Err(ConfigError::InvalidAssignment(assignment.to_string())),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(Value::String(name.into()), value);
    }

    /// Overlay `other` on top of `self`
    pub fn merge(&mut self, other: Variables) {
        for (key, value) in other.values {
            self.values.insert(key, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn mapping(&self) -> &Mapping {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Interpret a string as a boolean or number when that prints back as typed
///
/// Anything else, including `3.10` or `1e3`, stays the string the user wrote.
pub fn parse_scalar(raw: &str) -> Value {
    let typed = match serde_yaml::from_str::<Value>(raw) {
        Ok(value @ (Value::Bool(_) | Value::Number(_))) => value,
        _ => return Value::String(raw.to_string()),
    };
    let printed = match &typed {
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    };
    if printed == raw {
        typed
    } else {
        Value::String(raw.to_string())
    }
}
