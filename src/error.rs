//! Error types
//!
//! A single error enum covers every failure the adapters can surface. Decode
//! errors on individual stream frames never reach this type: the stream
//! decoders skip them locally.

use thiserror::Error;

/// Errors produced while resolving auth, building transports or talking to a backend.
#[derive(Error, Debug)]
pub enum LlmError {
    /// No authentication mode could be resolved from the environment or settings.
    #[error(
        "Please set an Auth method in your settings or specify one of the following \
         environment variables before running: {}",
        .env_vars.join(", ")
    )]
    AuthNotFound { env_vars: Vec<&'static str> },

    /// The resolved authentication mode is inconsistent with the available credentials.
    #[error("Invalid auth configuration: {0}")]
    AuthValidation(String),

    /// Invalid or incomplete provider configuration.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The request never produced an HTTP response (connect failure, timeout, ...).
    #[error("{backend} request to {url} failed: {source}")]
    TransportError {
        backend: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status.
    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// A complete (non-streamed) response body could not be decoded.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Reading the streamed body failed part way through.
    #[error("Stream error: {0}")]
    StreamError(String),

    /// The caller supplied a request the backend cannot express.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl LlmError {
    /// Configuration failures are fatal to the session and must not be retried.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::AuthNotFound { .. } | Self::AuthValidation(_) | Self::ConfigurationError(_)
        )
    }

    /// Whether the transport layer may retry the request that produced this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TransportError { source, .. } => source.is_connect() || source.is_timeout(),
            Self::ApiError { code, .. } => *code == 429 || *code >= 500,
            _ => false,
        }
    }

    /// HTTP status code, if the error came from a backend response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            Self::TransportError { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_not_found_names_the_variables() {
        let err = LlmError::AuthNotFound {
            env_vars: vec!["GEMINI_API_KEY", "OPENAI_API_KEY"],
        };
        let msg = err.to_string();
        assert!(msg.contains("GEMINI_API_KEY, OPENAI_API_KEY"));
        assert!(err.is_configuration());
        assert!(!err.is_retryable());
    }

    #[test]
    fn api_error_retry_classification() {
        let server_error = LlmError::ApiError {
            code: 503,
            message: "unavailable".into(),
            details: None,
        };
        let rate_limited = LlmError::ApiError {
            code: 429,
            message: "slow down".into(),
            details: None,
        };
        let bad_request = LlmError::ApiError {
            code: 400,
            message: "bad".into(),
            details: None,
        };
        assert!(server_error.is_retryable());
        assert!(rate_limited.is_retryable());
        assert!(!bad_request.is_retryable());
        assert_eq!(bad_request.status_code(), Some(400));
    }

    #[test]
    fn json_errors_convert() {
        let err: LlmError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, LlmError::JsonError(_)));
    }
}
