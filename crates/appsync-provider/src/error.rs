//! Provider error types.
//!
//! Every backend maps its native failures onto [`ProviderError`] so the
//! reconciler can tell "already gone" apart from real failures.

use std::fmt;

/// Errors reported by a provider client.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The addressed resource does not exist.
    #[error("Resource not found: {kind}/{id}")]
    NotFound {
        /// Kind of resource that was not found.
        kind: String,
        /// Identifier that was looked up.
        id: String,
    },

    /// The resource already exists or is in a conflicting state.
    #[error("Conflict on {kind}/{id}: {message}")]
    Conflict {
        kind: String,
        id: String,
        message: String,
    },

    /// The service rejected the request as malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// The service throttled the request.
    #[error("Request throttled: {message}")]
    Throttled { message: String },

    /// Any other service-side failure.
    #[error("Service error: {message}")]
    Service { message: String },

    /// A template or schema file could not be read.
    #[error("Failed to read {path}: {source}")]
    Template {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ProviderError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(
        kind: impl Into<String>,
        id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            kind: kind.into(),
            id: id.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Throttled` error.
    #[must_use]
    pub fn throttled(message: impl Into<String>) -> Self {
        Self::Throttled {
            message: message.into(),
        }
    }

    /// Creates a new `Service` error.
    #[must_use]
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a conflict error.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::Throttled { .. } => ErrorCategory::Throttling,
            Self::Service { .. } => ErrorCategory::Service,
            Self::Template { .. } => ErrorCategory::Io,
        }
    }
}

/// Categories of provider errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Resource not found.
    NotFound,
    /// Existence or state conflict.
    Conflict,
    /// Rejected request.
    Validation,
    /// Rate limited.
    Throttling,
    /// Service-side failure.
    Service,
    /// Local file access.
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Validation => write!(f, "validation"),
            Self::Throttling => write!(f, "throttling"),
            Self::Service => write!(f, "service"),
            Self::Io => write!(f, "io"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::not_found("function", "fn-1");
        assert_eq!(err.to_string(), "Resource not found: function/fn-1");

        let err = ProviderError::conflict("data source", "A", "already exists");
        assert_eq!(err.to_string(), "Conflict on data source/A: already exists");
    }

    #[test]
    fn test_error_predicates() {
        assert!(ProviderError::not_found("api", "x").is_not_found());
        assert!(!ProviderError::service("boom").is_not_found());
        assert!(ProviderError::conflict("api", "x", "y").is_conflict());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            ProviderError::not_found("api", "x").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            ProviderError::throttled("slow down").category(),
            ErrorCategory::Throttling
        );
        assert_eq!(
            ProviderError::invalid_request("bad").category(),
            ErrorCategory::Validation
        );
        assert_eq!(ErrorCategory::Service.to_string(), "service");
    }
}
