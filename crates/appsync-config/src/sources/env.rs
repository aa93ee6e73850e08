//! Environment variable overrides
//!
//! `APPSYNC__NAME=blog` sets `name`; `APPSYNC__SYNC__POLL_INTERVAL_MS=500`
//! sets `sync.pollIntervalMs`. String-typed settings (`name`, `apiId`,
//! `schema`, `authenticationType`, `sync.templateRoot`, `tags.*`) take the raw
//! text. Other values that parse as JSON (numbers, booleans, arrays, tables)
//! are taken as such, anything else is a plain string.

use serde_json::Value;

use crate::ConfigError;
use crate::merger::{PartialConfig, Priority};
use crate::sources::ConfigSource;

const DEFAULT_PREFIX: &str = "APPSYNC";

/// Settings that always deserialize as strings, so `APPSYNC__NAME=2024` stays `"2024"`.
const STRING_PATHS: &[&[&str]] = &[
    &["name"],
    &["apiId"],
    &["schema"],
    &["authenticationType"],
    &["sync", "templateRoot"],
];

fn is_string_path(path: &[String]) -> bool {
    if let [first, _] = path
        && first == "tags"
    {
        return true;
    }
    STRING_PATHS
        .iter()
        .any(|known| known.iter().copied().eq(path.iter().map(String::as_str)))
}

/// Configuration overrides taken from environment variables
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    vars: Vec<(String, String)>,
}

impl EnvSource {
    /// Snapshot of the process environment
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Source over an explicit set of variables
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Path segments for `key`, or `None` when it is not one of ours
    fn path_for(&self, key: &str) -> Option<Vec<String>> {
        let rest = key.strip_prefix(&self.prefix)?.strip_prefix("__")?;
        let path: Vec<String> = rest.split("__").map(camel_case).collect();
        if path.iter().any(String::is_empty) {
            return None;
        }
        Some(path)
    }
}

impl ConfigSource for EnvSource {
    fn name(&self) -> &str {
        "env"
    }

    fn priority(&self) -> Priority {
        Priority::Environment
    }

    fn load(&self) -> Result<PartialConfig, ConfigError> {
        let mut partial = PartialConfig::new();
        for (key, raw) in &self.vars {
            let Some(path) = self.path_for(key) else {
                continue;
            };
            let value = if is_string_path(&path) {
                Value::String(raw.clone())
            } else {
                serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.clone()))
            };
            tracing::debug!(variable = %key, path = %path.join("."), "applying env override");
            partial.set_path(&path, value);
        }
        Ok(partial)
    }
}

/// `POLL_INTERVAL_MS` -> `pollIntervalMs`
fn camel_case(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for (i, word) in segment.split('_').filter(|w| !w.is_empty()).enumerate() {
        let lower = word.to_ascii_lowercase();
        if i == 0 {
            out.push_str(&lower);
            continue;
        }
        let mut chars = lower.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars);
        }
    }
    out
}
