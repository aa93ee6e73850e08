//! Configuration merging with priority ordering
//!
//! Priority order (lowest to highest):
//! 1. Defaults - Hardcoded sane defaults
//! 2. File config - From the desired configuration file
//! 3. Environment variables - APPSYNC__* pattern
//! 4. Explicit - Overrides passed in by the embedding program

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::ConfigError;

/// Priority levels for configuration sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Default = 0,
    File = 10,
    Environment = 30,
    Explicit = 40,
}

/// Partial configuration document.
///
/// Holds only the top-level keys a source actually set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialConfig {
    entries: Map<String, Value>,
}

impl PartialConfig {
    /// Create an empty partial config
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let value: Value = toml::from_str(toml_str)
            .map_err(|e| ConfigError::parse(format!("TOML parse error: {e}")))?;
        Self::from_json(value)
    }

    /// Parse from JSON value
    pub fn from_json(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            other => Err(ConfigError::parse(format!(
                "configuration document must be a table, got {other}"
            ))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Set a value at a dotted path, creating intermediate tables
    pub fn set_path(&mut self, path: &[String], value: Value) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        let mut cursor = &mut self.entries;
        for segment in parents {
            let slot = cursor
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            match slot {
                Value::Object(map) => cursor = map,
                _ => return,
            }
        }
        cursor.insert(last.clone(), value);
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }
}

/// Merged configuration with tracking of value sources
#[derive(Debug, Clone)]
pub struct MergedConfig {
    /// Merged configuration as JSON
    config: Value,
    /// Track which source each top-level key came from
    sources: HashMap<String, Priority>,
}

impl MergedConfig {
    /// Create with default values
    pub fn defaults() -> Self {
        let config = serde_json::json!({
            "sync": {
                "pollIntervalMs": 1000,
                "maxPollAttempts": 300,
                "roleSettleDelayMs": 10000,
                "templateRoot": "."
            }
        });

        let mut sources = HashMap::new();
        sources.insert("sync".to_string(), Priority::Default);

        Self { config, sources }
    }

    /// Merge a partial config with given priority
    pub fn merge(&mut self, partial: PartialConfig, priority: Priority) {
        for (key, new_value) in partial.entries {
            // Check if we should override based on priority
            let should_override = self
                .sources
                .get(&key)
                .map(|&existing| existing <= priority)
                .unwrap_or(true);

            if !should_override {
                tracing::debug!(key = %key, ?priority, "ignoring lower priority value");
                continue;
            }

            match self.config.get_mut(&key) {
                Some(existing) => deep_merge(existing, new_value),
                None => {
                    self.config[key.as_str()] = new_value;
                }
            }
            self.sources.insert(key, priority);
        }
    }

    /// Get the merged configuration as JSON
    pub fn as_json(&self) -> &Value {
        &self.config
    }

    /// Get a top-level value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    /// Get the source for a top-level key
    pub fn get_source(&self, key: &str) -> Option<Priority> {
        self.sources.get(key).copied()
    }

    /// Validate the merged configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(sync) = self.config.get("sync") {
            if !sync.is_object() {
                return Err(ConfigError::validation("sync must be a table"));
            }
            if sync.get("maxPollAttempts").and_then(Value::as_u64) == Some(0) {
                return Err(ConfigError::validation("sync.maxPollAttempts must be > 0"));
            }
        }

        if let Some(name) = self.config.get("name") {
            match name.as_str() {
                Some(name) if !name.trim().is_empty() => {}
                _ => return Err(ConfigError::validation("name must be a non-empty string")),
            }
        }

        if let Some(schema) = self.config.get("schema") {
            if !schema.is_string() {
                return Err(ConfigError::validation(
                    "schema must be inline SDL or a file path",
                ));
            }
        }

        Ok(())
    }

    /// Convert to a specific config type
    pub fn deserialize<T: for<'de> Deserialize<'de>>(&self) -> Result<T, ConfigError> {
        serde_json::from_value(self.config.clone())
            .map_err(|e| ConfigError::parse(format!("Failed to deserialize config: {e}")))
    }

    /// Convert one top-level table to a specific config type
    pub fn deserialize_section<T: for<'de> Deserialize<'de> + Default>(
        &self,
        key: &str,
    ) -> Result<T, ConfigError> {
        match self.config.get(key) {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| ConfigError::parse(format!("Failed to deserialize {key}: {e}"))),
            None => Ok(T::default()),
        }
    }
}

/// Deep merge two JSON values (right takes precedence for conflicts)
///
/// Arrays are replaced wholesale: a declared resource list is never spliced.
fn deep_merge(left: &mut Value, right: Value) {
    match (left, right) {
        (Value::Object(left_map), Value::Object(right_map)) => {
            for (key, right_value) in right_map {
                if let Some(left_value) = left_map.get_mut(&key) {
                    deep_merge(left_value, right_value);
                } else {
                    left_map.insert(key, right_value);
                }
            }
        }
        (left, right) => {
            *left = right;
        }
    }
}
