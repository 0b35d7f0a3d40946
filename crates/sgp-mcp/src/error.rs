//! Error types for the SGP MCP server.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.
//!
//! Local precondition failures ([`ClientError`]) are returned as `Err` so callers
//! must handle them. Failures of an attempted upstream call ([`UpstreamError`])
//! never escape the client: they are folded into an error
//! [`ResponseEnvelope`](crate::models::ResponseEnvelope).

use std::time::Duration;

use crate::auth::AuthMethod;

/// Errors raised before an outbound call is attempted.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// Required credentials for the active auth mode are absent
    #[error("Missing credentials for {method} authentication: {}", missing.join(", "))]
    MissingCredentials {
        /// Auth mode that was requested
        method: AuthMethod,
        /// Credential fields that did not resolve
        missing: Vec<&'static str>,
    },

    /// Local quota exhausted for the auth mode's rate-limit key
    #[error("Rate limit exceeded for {key}: {limit} requests per window, retry in {retry_after:?}")]
    RateLimitExceeded {
        /// Rate-limit key (one per auth mode)
        key: String,
        /// Quota for the key
        limit: u32,
        /// Time until the oldest call leaves the window
        retry_after: Duration,
    },

    /// The request could not be assembled
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Create a missing credentials error.
    #[must_use]
    pub fn missing_credentials(method: AuthMethod, missing: Vec<&'static str>) -> Self {
        Self::MissingCredentials { method, missing }
    }

    /// Create a rate limit error.
    #[must_use]
    pub fn rate_limited(key: impl Into<String>, limit: u32, retry_after: Duration) -> Self {
        Self::RateLimitExceeded { key: key.into(), limit, retry_after }
    }

    /// Get the retry-after duration if this is a rate limit error.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimitExceeded { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Failures of an attempted upstream exchange.
///
/// These are normalized into error envelopes and never returned as `Err`.
#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    /// SGP kept answering 429 after the retry budget was spent
    #[error("HTTP 429: {message} (gave up after {attempts} attempts)")]
    Throttled {
        /// Number of attempts made
        attempts: u32,
        /// Message extracted from the last 429 response
        message: String,
    },

    /// Non-2xx status other than the throttling path
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// Connection, DNS, TLS or timeout failure
    #[error("Request failed: {0}")]
    Transport(String),

    /// Response body was not valid JSON
    #[error("Failed to parse response: {0}")]
    Decode(String),
}

impl From<reqwest_middleware::Error> for UpstreamError {
    fn from(err: reqwest_middleware::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Transport(format!("request timed out: {err}"));
        }
        Self::Transport(err.to_string())
    }
}

/// Errors from MCP tool execution.
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    /// Error from the API client
    #[error("{0}")]
    Client(#[from] ClientError),

    /// Input validation failed
    #[error("Validation error: {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No tool registered under the requested name
    #[error("Tool not found: {0}")]
    NotFound(String),
}

impl ToolError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    /// Convert to a user-friendly error message for tool responses.
    #[must_use]
    pub fn to_user_message(&self) -> String {
        match self {
            Self::Client(ClientError::RateLimitExceeded { key, retry_after, .. }) => {
                format!(
                    "Local rate limit reached for {key}. Please wait {:.1}s before retrying.",
                    retry_after.as_secs_f64()
                )
            }
            Self::Client(ClientError::MissingCredentials { method, missing }) => {
                format!("Cannot authenticate with {method}: missing {}", missing.join(", "))
            }
            Self::Validation { field, message } => {
                format!("Invalid input for '{field}': {message}")
            }
            _ => self.to_string(),
        }
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_retry_after() {
        let err = ClientError::rate_limited("rate_limit_basic", 100, Duration::from_secs(12));
        assert_eq!(err.retry_after(), Some(Duration::from_secs(12)));

        let err = ClientError::missing_credentials(AuthMethod::Basic, vec!["username"]);
        assert_eq!(err.retry_after(), None);
    }

    #[test]
    fn test_missing_credentials_message_lists_fields() {
        let err = ClientError::missing_credentials(AuthMethod::CpfCnpj, vec!["cpfcnpj", "senha"]);
        let msg = err.to_string();
        assert!(msg.contains("cpf_cnpj"));
        assert!(msg.contains("cpfcnpj, senha"));
    }

    #[test]
    fn test_upstream_error_display() {
        let err = UpstreamError::Throttled { attempts: 2, message: "slow down".into() };
        assert_eq!(err.to_string(), "HTTP 429: slow down (gave up after 2 attempts)");

        let err = UpstreamError::Status { status: 404, message: "not found".into() };
        assert_eq!(err.to_string(), "HTTP 404: not found");
    }

    #[test]
    fn test_tool_error_user_message() {
        let err = ToolError::validation("contrato", "must be positive");
        assert!(err.to_user_message().contains("contrato"));
        assert!(err.to_user_message().contains("must be positive"));

        let err = ToolError::from(ClientError::rate_limited(
            "rate_limit_token",
            300,
            Duration::from_millis(1500),
        ));
        assert!(err.to_user_message().contains("rate_limit_token"));
    }
}
