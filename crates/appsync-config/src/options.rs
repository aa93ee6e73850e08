//! Engine tuning read from the `sync` table.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_poll_attempts() -> u32 {
    300
}

fn default_role_settle_delay_ms() -> u64 {
    10_000
}

fn default_template_root() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOptions {
    /// Delay between schema creation status polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Polls before schema creation is reported as timed out.
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    /// Wait after creating or changing the service role so the identity
    /// service can propagate it.
    #[serde(default = "default_role_settle_delay_ms")]
    pub role_settle_delay_ms: u64,
    /// Directory that relative schema and template paths resolve against.
    #[serde(default = "default_template_root")]
    pub template_root: PathBuf,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            role_settle_delay_ms: default_role_settle_delay_ms(),
            template_root: default_template_root(),
        }
    }
}

impl SyncOptions {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn role_settle_delay(&self) -> Duration {
        Duration::from_millis(self.role_settle_delay_ms)
    }

    /// Options with no waiting, for tests and dry runs.
    pub fn immediate() -> Self {
        Self {
            poll_interval_ms: 0,
            role_settle_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_poll_attempts == 0 {
            return Err(ConfigError::validation("sync.maxPollAttempts must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_table() {
        let options: SyncOptions = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(options, SyncOptions::default());
        assert_eq!(options.poll_interval(), Duration::from_secs(1));
        assert_eq!(options.role_settle_delay(), Duration::from_secs(10));
        assert_eq!(options.max_poll_attempts, 300);
    }

    #[test]
    fn test_partial_override() {
        let options: SyncOptions =
            serde_json::from_value(serde_json::json!({"maxPollAttempts": 5})).unwrap();
        assert_eq!(options.max_poll_attempts, 5);
        assert_eq!(options.poll_interval_ms, 1000);
    }

    #[test]
    fn test_validate() {
        let options = SyncOptions {
            max_poll_attempts: 0,
            ..SyncOptions::immediate()
        };
        assert!(options.validate().is_err());
        assert!(SyncOptions::immediate().validate().is_ok());
    }
}
