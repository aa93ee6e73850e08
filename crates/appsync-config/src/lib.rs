//! Layered configuration loading for GraphQL API reconciliation.
//!
//! A desired configuration document is assembled from several sources and
//! merged with priority ordering:
//!
//! ```text
//!   defaults ──┐
//!   file ──────┼──► MergedConfig ──► validate ──► DesiredConfig + SyncOptions
//!   env ───────┤
//!   explicit ──┘
//! ```
//!
//! The document uses the same camelCase field names as [`DesiredConfig`];
//! engine tuning lives under a `sync` table.
//!
//! [`DesiredConfig`]: appsync_core::DesiredConfig

pub mod loader;
pub mod merger;
pub mod options;
pub mod settings;
pub mod sources;

pub use loader::{ConfigLoader, LoadedConfig, load_desired_config};
pub use merger::{MergedConfig, PartialConfig, Priority};
pub use options::SyncOptions;
pub use settings::{PartialApiSettings, apply_overrides};
pub use sources::{ConfigSource, EnvSource, FileSource};

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<appsync_core::CoreError> for ConfigError {
    fn from(err: appsync_core::CoreError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
