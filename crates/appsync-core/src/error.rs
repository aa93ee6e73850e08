use thiserror::Error;

/// Core error types for reconciliation input handling
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Duplicate {kind} for key ({keys}): {value}")]
    DuplicateKey {
        kind: String,
        keys: String,
        value: String,
    },

    #[error("Missing required field '{field}' on {kind}")]
    MissingField { kind: String, field: String },

    #[error("Invalid expiry value: {0}")]
    InvalidExpiry(String),

    #[error("Invalid ARN: {0}")]
    InvalidArn(String),

    #[error("Invalid Elasticsearch endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a new DuplicateKey error
    pub fn duplicate_key(
        kind: impl Into<String>,
        keys: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::DuplicateKey {
            kind: kind.into(),
            keys: keys.into(),
            value: value.into(),
        }
    }

    /// Create a new MissingField error
    pub fn missing_field(kind: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            kind: kind.into(),
            field: field.into(),
        }
    }

    /// Create a new InvalidExpiry error
    pub fn invalid_expiry(value: impl Into<String>) -> Self {
        Self::InvalidExpiry(value.into())
    }

    /// Create a new InvalidArn error
    pub fn invalid_arn(value: impl Into<String>) -> Self {
        Self::InvalidArn(value.into())
    }

    /// Create a new InvalidEndpoint error
    pub fn invalid_endpoint(value: impl Into<String>) -> Self {
        Self::InvalidEndpoint(value.into())
    }

    /// Check if this error was caused by the declared input and can be fixed by the caller
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, Self::JsonError(_))
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) | Self::MissingField { .. } => ErrorCategory::Configuration,
            Self::DuplicateKey { .. } => ErrorCategory::Conflict,
            Self::InvalidExpiry(_) | Self::InvalidArn(_) | Self::InvalidEndpoint(_) => {
                ErrorCategory::Validation
            }
            Self::JsonError(_) => ErrorCategory::Serialization,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    Serialization,
    Configuration,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Conflict => write!(f, "conflict"),
            Self::Serialization => write!(f, "serialization"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_error() {
        let err = CoreError::duplicate_key("resolver", "typeName, fieldName", "Query.getPost");
        assert_eq!(
            err.to_string(),
            "Duplicate resolver for key (typeName, fieldName): Query.getPost"
        );
        assert!(err.is_configuration_error());
        assert_eq!(err.category(), ErrorCategory::Conflict);
    }

    #[test]
    fn test_missing_field_error() {
        let err = CoreError::missing_field("api key", "name");
        assert_eq!(err.to_string(), "Missing required field 'name' on api key");
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("{ invalid json }").unwrap_err();
        let core_err: CoreError = json_err.into();

        assert!(matches!(core_err, CoreError::JsonError(_)));
        assert!(!core_err.is_configuration_error());
        assert_eq!(core_err.category(), ErrorCategory::Serialization);
    }

    #[test]
    fn test_error_categories_display() {
        assert_eq!(ErrorCategory::Validation.to_string(), "validation");
        assert_eq!(ErrorCategory::Conflict.to_string(), "conflict");
        assert_eq!(ErrorCategory::Serialization.to_string(), "serialization");
        assert_eq!(ErrorCategory::Configuration.to_string(), "configuration");
    }

    #[test]
    fn test_validation_errors() {
        assert_eq!(
            CoreError::invalid_expiry("-1").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            CoreError::invalid_arn("not-an-arn").category(),
            ErrorCategory::Validation
        );
        assert!(
            CoreError::invalid_endpoint("https://example.com")
                .to_string()
                .contains("https://example.com")
        );
    }
}
