//! Error types for clarity operations.
//!
//! Only generation-path and configuration failures surface as errors.
//! Malformed pattern blocks and a missing pattern document are recovered
//! locally (see [`crate::events`]) and never reach the caller.

use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for clarity operations.
pub type ClarityResult<T> = Result<T, ClarityError>;

/// Main error type for all clarity operations.
#[derive(Error, Debug)]
pub enum ClarityError {
    /// The generation backend rejected the credentials.
    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        details: HashMap<String, String>,
        suggestion: Option<String>,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        code: ErrorCode,
        retry_after: Option<u64>,
    },

    /// Quota exceeded.
    #[error("Quota exceeded: {message}")]
    QuotaExceeded { message: String, code: ErrorCode },

    /// Text generation failed.
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Network error.
    #[error("Network error: {message}")]
    Network {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Provider not supported.
    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },

    /// Parse error.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Authentication (AUTH_xxx)
    AuthInvalidKey,
    AuthMissingCredentials,

    // Validation (VAL_xxx)
    ValInvalidInput,
    ValOutOfRange,

    // Rate Limit (RATE_xxx)
    RateLimitExceeded,

    // Quota (QTA_xxx)
    QtaExceeded,

    // LLM (LLM_xxx)
    LlmNotInitialized,
    LlmGenerationFailed,
    LlmEmptyResponse,

    // Network (NET_xxx)
    NetConnectionFailed,

    // Parse (PARSE_xxx)
    ParseInvalidJson,
    ParseInvalidConfig,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AuthInvalidKey => "AUTH_001",
            ErrorCode::AuthMissingCredentials => "AUTH_002",
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValOutOfRange => "VAL_002",
            ErrorCode::RateLimitExceeded => "RATE_001",
            ErrorCode::QtaExceeded => "QTA_001",
            ErrorCode::LlmNotInitialized => "LLM_001",
            ErrorCode::LlmGenerationFailed => "LLM_002",
            ErrorCode::LlmEmptyResponse => "LLM_003",
            ErrorCode::NetConnectionFailed => "NET_001",
            ErrorCode::ParseInvalidJson => "PARSE_001",
            ErrorCode::ParseInvalidConfig => "PARSE_002",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl ClarityError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            details: HashMap::new(),
            suggestion: None,
        }
    }

    /// Create an out-of-range validation error naming the offending field.
    pub fn out_of_range(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut details = HashMap::new();
        details.insert("field".to_string(), field.into());
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValOutOfRange,
            details,
            suggestion: None,
        }
    }

    /// Create an LLM error.
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            code: ErrorCode::LlmGenerationFailed,
            source: None,
        }
    }

    /// Create an error for a generation client that was never set up.
    pub fn not_initialized(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            code: ErrorCode::LlmNotInitialized,
            source: None,
        }
    }

    /// Create an error for a backend that answered with no text.
    pub fn empty_response(provider: impl Into<String>) -> Self {
        Self::Llm {
            message: format!("Empty response from {}", provider.into()),
            code: ErrorCode::LlmEmptyResponse,
            source: None,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidJson,
        }
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            code: ErrorCode::AuthInvalidKey,
            source: None,
        }
    }

    /// Create a missing-credentials error.
    pub fn missing_credentials(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            code: ErrorCode::AuthMissingCredentials,
            source: None,
        }
    }

    /// Create a rate limit error.
    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::RateLimit {
            message: message.into(),
            code: ErrorCode::RateLimitExceeded,
            retry_after: None,
        }
    }

    /// Create a quota error.
    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::QuotaExceeded {
            message: message.into(),
            code: ErrorCode::QtaExceeded,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Authentication { code, .. } => *code,
            Self::Validation { code, .. } => *code,
            Self::RateLimit { code, .. } => *code,
            Self::QuotaExceeded { code, .. } => *code,
            Self::Llm { code, .. } => *code,
            Self::Network { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            Self::Configuration(_) => ErrorCode::ParseInvalidConfig,
            _ => ErrorCode::Internal,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Authentication { .. } => Some("Please check your API key in settings"),
            Self::RateLimit { .. } => Some("Please wait a moment and try again"),
            Self::QuotaExceeded { .. } => {
                Some("Please try again tomorrow or upgrade your plan")
            }
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::Llm {
                code: ErrorCode::LlmNotInitialized,
                ..
            } => Some("Please set your API key in settings"),
            Self::UnsupportedProvider { .. } => Some("Please use Gemini for now"),
            _ => None,
        }
    }

    /// Convert from an HTTP status code returned by a generation backend.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            400 => Self::Validation {
                message: body.to_string(),
                code: ErrorCode::ValInvalidInput,
                details: HashMap::new(),
                suggestion: Some("Please check your request parameters".to_string()),
            },
            401 | 403 => Self::authentication(body),
            429 => Self::rate_limit(body),
            _ => Self::llm(format!("HTTP {}: {}", status, body)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = ClarityError::validation("Invalid input");
        assert_eq!(err.code(), ErrorCode::ValInvalidInput);
        assert!(err.to_string().contains("Invalid input"));
    }

    #[test]
    fn test_out_of_range_records_field() {
        let err = ClarityError::out_of_range("certainty", "certainty must be between 1 and 10");
        match &err {
            ClarityError::Validation { details, .. } => {
                assert_eq!(details.get("field").map(String::as_str), Some("certainty"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.code(), ErrorCode::ValOutOfRange);
    }

    #[test]
    fn test_not_initialized_has_suggestion() {
        let err = ClarityError::not_initialized("Gemini service not initialized");
        assert_eq!(err.code(), ErrorCode::LlmNotInitialized);
        assert_eq!(err.suggestion(), Some("Please set your API key in settings"));
    }

    #[test]
    fn test_from_http_status() {
        assert_eq!(
            ClarityError::from_http_status(401, "bad key").code(),
            ErrorCode::AuthInvalidKey
        );
        assert_eq!(
            ClarityError::from_http_status(429, "slow down").code(),
            ErrorCode::RateLimitExceeded
        );
        assert_eq!(
            ClarityError::from_http_status(500, "boom").code(),
            ErrorCode::LlmGenerationFailed
        );
    }

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::AuthInvalidKey.as_str(), "AUTH_001");
        assert_eq!(ErrorCode::LlmEmptyResponse.as_str(), "LLM_003");
    }
}
