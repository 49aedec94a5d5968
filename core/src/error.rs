//! Error taxonomy for fetch requests
//!
//! Every variant is reported twice: as the payload of the FAILURE action (see
//! [`ApiError::to_payload`]) and as the rejection of the pending request handle.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors produced while building, issuing or interpreting a fetch request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server answered with a non-success status
    #[error("{message}")]
    Http {
        /// HTTP status code
        code: u16,
        /// Status text of the response
        message: String,
    },

    /// No response was received (connection refused, DNS, TLS, ...)
    #[error("Transport failed: {0}")]
    Transport(String),

    /// The response body could not be read or did not parse as declared
    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    /// The request action could not be turned into a request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The request task ended without reporting an outcome
    #[error("Request abandoned before settling")]
    Abandoned,
}

#[derive(Serialize)]
struct ErrorPayload<'a> {
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<u16>,
    message: &'a str,
}

impl ApiError {
    /// Short machine-readable name of the error kind
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Http { .. } => "http",
            Self::Transport(_) => "transport",
            Self::MalformedBody(_) => "malformed_body",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Abandoned => "abandoned",
        }
    }

    /// HTTP status code, for [`ApiError::Http`] only
    #[must_use]
    pub const fn code(&self) -> Option<u16> {
        match self {
            Self::Http { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// JSON payload carried by the FAILURE action
    ///
    /// HTTP failures produce `{ "kind": "http", "code": 404, "message": "Not Found" }`;
    /// other kinds omit `code`.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        let message = match self {
            Self::Http { message, .. } => message.clone(),
            other => other.to_string(),
        };
        let payload = ErrorPayload {
            kind: self.kind(),
            code: self.code(),
            message: &message,
        };
        serde_json::to_value(payload).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_http_error_payload() {
        let error = ApiError::Http {
            code: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(
            error.to_payload(),
            json!({ "kind": "http", "code": 404, "message": "Not Found" })
        );
        assert_eq!(error.to_string(), "Not Found");
    }

    #[test]
    fn test_transport_error_payload_has_no_code() {
        let error = ApiError::Transport("connection refused".to_string());
        assert_eq!(
            error.to_payload(),
            json!({ "kind": "transport", "message": "Transport failed: connection refused" })
        );
        assert_eq!(error.code(), None);
    }

    #[test]
    fn test_kinds_are_distinct() {
        let kinds = [
            ApiError::Http { code: 500, message: String::new() }.kind(),
            ApiError::Transport(String::new()).kind(),
            ApiError::MalformedBody(String::new()).kind(),
            ApiError::InvalidRequest(String::new()).kind(),
            ApiError::Abandoned.kind(),
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
