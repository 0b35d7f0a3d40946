//! The uniform result shape returned by every client and tool call.

use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;

/// Message attached to successful envelopes.
pub const SUCCESS_MESSAGE: &str = "Request completed successfully";

/// Outcome tag of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// `{status, message, data}`. `data` is the opaque SGP payload, or `null` on
/// error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: Status,
    pub message: String,
    pub data: serde_json::Value,
}

impl ResponseEnvelope {
    /// Successful envelope wrapping an upstream payload.
    #[must_use]
    pub fn success(data: serde_json::Value) -> Self {
        Self { status: Status::Success, message: SUCCESS_MESSAGE.to_string(), data }
    }

    /// Error envelope with a null payload.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self { status: Status::Error, message: message.into(), data: serde_json::Value::Null }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

impl From<UpstreamError> for ResponseEnvelope {
    fn from(err: UpstreamError) -> Self {
        Self::error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_success_shape() {
        let envelope = ResponseEnvelope::success(json!({"onus": []}));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"status": "success", "message": SUCCESS_MESSAGE, "data": {"onus": []}})
        );
        assert!(envelope.is_success());
    }

    #[test]
    fn test_error_shape_has_null_data() {
        let envelope = ResponseEnvelope::error("boom");
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"status": "error", "message": "boom", "data": null})
        );
        assert!(!envelope.is_success());
    }

    #[test]
    fn test_from_upstream_error() {
        let envelope = ResponseEnvelope::from(UpstreamError::Status {
            status: 500,
            message: "Internal Server Error".into(),
        });
        assert_eq!(envelope.status, Status::Error);
        assert_eq!(envelope.message, "HTTP 500: Internal Server Error");
    }
}
