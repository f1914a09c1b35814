// ABOUTME: Error taxonomy for REST calls: unauthorized, HTTP status, transport, decode.
// ABOUTME: Maps server error bodies to a banner message and per-field messages.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

/// Banner text when the server gives no usable message.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// A single field-level validation error reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Error payload returned by the server on failed requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected the credential. The session has already been
    /// cleared by the time a caller sees this.
    #[error("unauthorized")]
    Unauthorized { body: ErrorBody },
    #[error("request failed with status {status}")]
    Status { status: u16, body: ErrorBody },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build a status error carrying only a message.
    pub fn with_message(status: u16, message: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            body: ErrorBody {
                message: Some(message.into()),
                errors: Vec::new(),
            },
        }
    }

    fn body(&self) -> Option<&ErrorBody> {
        match self {
            ApiError::Unauthorized { body } | ApiError::Status { body, .. } => Some(body),
            ApiError::Transport(_) | ApiError::Decode(_) => None,
        }
    }

    /// Human-readable message for a banner.
    pub fn user_message(&self) -> String {
        self.body()
            .and_then(|b| b.message.clone())
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| UNEXPECTED_ERROR.to_string())
    }

    /// Per-field messages keyed by field name. Later duplicates win.
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        self.body()
            .map(|b| {
                b.errors
                    .iter()
                    .map(|e| (e.field.clone(), e.message.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_comes_from_body() {
        let err = ApiError::with_message(409, "Email already registered");
        assert_eq!(err.user_message(), "Email already registered");
        assert!(err.field_errors().is_empty());
    }

    #[test]
    fn transport_errors_fall_back_to_generic_message() {
        let err = ApiError::Transport("connection refused".to_string());
        assert_eq!(err.user_message(), UNEXPECTED_ERROR);
    }

    #[test]
    fn field_errors_are_keyed_by_field() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"message":"Validation failed","errors":[
                {"field":"email","message":"must be a well-formed email address"},
                {"field":"password","message":"size must be between 8 and 64"}
            ]}"#,
        )
        .unwrap();
        let err = ApiError::Status { status: 400, body };
        let fields = err.field_errors();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["email"], "must be a well-formed email address");
        assert_eq!(fields["password"], "size must be between 8 and 64");
    }

    #[test]
    fn unauthorized_keeps_server_message() {
        let err = ApiError::Unauthorized {
            body: ErrorBody {
                message: Some("Invalid credentials".to_string()),
                errors: Vec::new(),
            },
        };
        assert_eq!(err.user_message(), "Invalid credentials");
    }
}
