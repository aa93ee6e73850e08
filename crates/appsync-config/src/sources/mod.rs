//! Configuration sources
//!
//! - File: the desired configuration document (TOML or JSON)
//! - Env: `APPSYNC__*` environment variable overrides

mod env;
mod file;

pub use env::EnvSource;
pub use file::FileSource;

use crate::ConfigError;
use crate::merger::{PartialConfig, Priority};

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync {
    /// Name of this source (for logging and debugging)
    fn name(&self) -> &str;

    /// Priority of this source (higher wins in merges)
    fn priority(&self) -> Priority;

    /// Load current configuration from this source
    fn load(&self) -> Result<PartialConfig, ConfigError>;
}

/// Fixed overrides supplied by the embedding program.
impl ConfigSource for PartialConfig {
    fn name(&self) -> &str {
        "explicit"
    }

    fn priority(&self) -> Priority {
        Priority::Explicit
    }

    fn load(&self) -> Result<PartialConfig, ConfigError> {
        Ok(self.clone())
    }
}
