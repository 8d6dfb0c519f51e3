//! Static application configuration supplied by the embedding application.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::key::normalize_key;

/// Namespace application config is read from when parsing whole documents.
pub const DEFAULT_NAMESPACE: &str = "jido_ai";

/// Application-level configuration: a nested key/value tree.
///
/// Nested tables are flattened by joining their path with `_`, so
/// `{ openai: { api_key: "x" } }` contributes the key `openai_api_key`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    entries: Map<String, Value>,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-built JSON object.
    pub fn from_map(entries: Map<String, Value>) -> Self {
        Self { entries }
    }

    /// Build from a JSON value, which must be an object (or null for empty).
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            Value::Null => Ok(Self::default()),
            other => Err(Error::InvalidAppConfig(format!(
                "expected a table, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Parse a YAML document and take the table under `namespace`.
    ///
    /// A document without that namespace yields an empty config.
    pub fn from_yaml_str(yaml: &str, namespace: &str) -> Result<Self> {
        let document: Value = serde_yaml::from_str(yaml)?;
        match document {
            Value::Null => Ok(Self::default()),
            Value::Object(mut root) => match root.remove(namespace) {
                Some(section) => Self::from_value(section),
                None => Ok(Self::default()),
            },
            other => Err(Error::InvalidAppConfig(format!(
                "expected a table at the document root, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Read and parse a YAML file. The file is required: a missing or
    /// unreadable file is a startup failure.
    pub fn from_yaml_file(path: impl AsRef<Path>, namespace: &str) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml, namespace)
    }

    /// Set a single entry, replacing any previous value.
    pub fn insert(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flatten into normalized keys.
    pub(crate) fn flatten(&self) -> HashMap<String, Value> {
        let mut out = HashMap::new();
        flatten_into(&mut out, "", &self.entries);
        out
    }
}

fn flatten_into(out: &mut HashMap<String, Value>, prefix: &str, table: &Map<String, Value>) {
    for (name, value) in table {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}_{name}")
        };
        match value {
            Value::Object(nested) => flatten_into(out, &path, nested),
            scalar => {
                let key = normalize_key(&path);
                if !key.is_empty() {
                    out.insert(key, scalar.clone());
                }
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a table",
    }
}
