//! Reconciliation error types.

use std::fmt;

use appsync_config::ConfigError;
use appsync_core::CoreError;
use appsync_provider::ProviderError;

/// Errors that abort a reconciliation run.
///
/// No state is returned with an error: whatever was applied before the
/// failure is picked up again by the next run through the remote listings.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The declared configuration is invalid.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Engine options are invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A provider call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The service rejected the submitted schema.
    #[error("Schema creation failed for API {api_id}: {details}")]
    SchemaCreationFailed { api_id: String, details: String },

    /// Schema creation did not reach a terminal status in time.
    #[error("Schema creation for API {api_id} still pending after {attempts} polls")]
    Timeout { api_id: String, attempts: u32 },

    /// The run was cancelled through its cancellation token.
    #[error("Synchronization cancelled")]
    Cancelled,
}

impl SyncError {
    pub fn schema_failed(api_id: impl Into<String>, details: impl Into<String>) -> Self {
        Self::SchemaCreationFailed {
            api_id: api_id.into(),
            details: details.into(),
        }
    }

    pub fn timeout(api_id: impl Into<String>, attempts: u32) -> Self {
        Self::Timeout {
            api_id: api_id.into(),
            attempts,
        }
    }

    /// Returns `true` when the caller can fix the error by changing its input.
    pub fn is_configuration_error(&self) -> bool {
        match self {
            Self::Core(err) => err.is_configuration_error(),
            Self::Config(_) => true,
            _ => false,
        }
    }

    /// Returns `true` if this wraps a provider not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Provider(err) if err.is_not_found())
    }

    /// Returns the error category for logging/monitoring purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Core(err) if err.is_configuration_error() => ErrorCategory::Configuration,
            Self::Core(_) => ErrorCategory::Internal,
            Self::Config(_) => ErrorCategory::Configuration,
            Self::Provider(err) if err.is_not_found() => ErrorCategory::NotFound,
            Self::Provider(_) => ErrorCategory::Provider,
            Self::SchemaCreationFailed { .. } => ErrorCategory::Schema,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Cancelled => ErrorCategory::Cancelled,
        }
    }
}

/// Categories of reconciliation errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    NotFound,
    Provider,
    Schema,
    Timeout,
    Cancelled,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::NotFound => write!(f, "not_found"),
            Self::Provider => write!(f, "provider"),
            Self::Schema => write!(f, "schema"),
            Self::Timeout => write!(f, "timeout"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Result type for reconciliation operations.
pub type SyncResult<T> = Result<T, SyncError>;
