//! Error types for Vultr facts operations.
//!
//! This module provides the error hierarchy shared by every Vultr facts module,
//! along with the retry and logging classification used by the transport and
//! the module runner.

use thiserror::Error;

/// Main error type for Vultr facts operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Vultr API is unavailable or rate limited
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// API credentials were rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse an API response
    #[error("Failed to parse Vultr API response: {0}")]
    ParseError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Operation timed out
    #[error("Timeout waiting for Vultr API: {0}")]
    Timeout(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A record field is present but cannot be converted
    #[error("Invalid value for field `{field}`: {message}")]
    InvalidField {
        /// Provider field name
        field: String,
        /// Conversion failure details
        message: String,
    },

    /// A record field required by the field table is absent or null
    #[error("Missing field `{0}` in Vultr API response")]
    MissingField(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Specialized result type for Vultr facts operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidField { .. } => "INVALID_FIELD",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
        }
    }

    /// Returns true if the transport should try the request again.
    ///
    /// Rate limiting, server errors, timeouts and connection failures are
    /// transient. Any other HTTP error is a final answer from the API.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_) | Self::Timeout(_))
    }

    /// Returns true if this error points at the module's setup rather than
    /// the data the API returned, and should be logged as an error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::ConfigError(_)
                | Self::ValidationError(_)
                | Self::InvalidEndpoint(_)
                | Self::Unauthorized(_)
        )
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            Self::ServiceUnavailable(err.to_string())
        } else if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::ServiceUnavailable("test".to_string()).error_code(),
            "SERVICE_UNAVAILABLE"
        );
        assert_eq!(
            Error::Unauthorized("test".to_string()).error_code(),
            "UNAUTHORIZED"
        );
        assert_eq!(
            Error::ParseError("test".to_string()).error_code(),
            "PARSE_ERROR"
        );
        assert_eq!(
            Error::ConfigError("test".to_string()).error_code(),
            "CONFIG_ERROR"
        );
        assert_eq!(Error::Timeout("test".to_string()).error_code(), "TIMEOUT");
        assert_eq!(
            Error::InvalidField {
                field: "rule_count".to_string(),
                message: "abc".to_string()
            }
            .error_code(),
            "INVALID_FIELD"
        );
        assert_eq!(
            Error::MissingField("rule_count".to_string()).error_code(),
            "MISSING_FIELD"
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::ServiceUnavailable("rate limited".to_string());
        assert_eq!(err.to_string(), "Service unavailable: rate limited");

        let err = Error::InvalidField {
            field: "rule_count".to_string(),
            message: "`abc` is not an integer".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for field `rule_count`: `abc` is not an integer"
        );

        let err = Error::MissingField("instance_count".to_string());
        assert_eq!(
            err.to_string(),
            "Missing field `instance_count` in Vultr API response"
        );
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::ServiceUnavailable("503".to_string()).is_retryable());
        assert!(Error::Timeout("slow".to_string()).is_retryable());
        assert!(!Error::Unauthorized("bad key".to_string()).is_retryable());
        assert!(!Error::NotFound("gone".to_string()).is_retryable());
        assert!(!Error::ParseError("junk".to_string()).is_retryable());
        assert!(!Error::HttpError("412 Precondition Failed".to_string()).is_retryable());
    }

    #[test]
    fn test_should_log() {
        assert!(Error::ConfigError("test".to_string()).should_log());
        assert!(Error::ValidationError("test".to_string()).should_log());
        assert!(Error::Unauthorized("test".to_string()).should_log());

        assert!(!Error::NotFound("test".to_string()).should_log());
        assert!(!Error::MissingField("test".to_string()).should_log());
    }

    #[test]
    fn test_from_url_parse_error() {
        let err = url::Url::parse("not a url").unwrap_err();
        let vultr_err: Error = err.into();
        assert!(matches!(vultr_err, Error::InvalidEndpoint(_)));
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let vultr_err: Error = err.into();
        assert!(matches!(vultr_err, Error::ParseError(_)));
    }

    #[test]
    fn test_from_validation_errors() {
        let mut errors = validator::ValidationErrors::new();
        errors.add("api_timeout_secs", validator::ValidationError::new("range"));
        let vultr_err: Error = errors.into();
        assert!(matches!(vultr_err, Error::ValidationError(_)));
    }
}
