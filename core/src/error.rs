//! Error types for the courier API adapters and the quote workflow.
//!
//! # Design
//! Four failure kinds reach callers: local field validation, transport-level
//! network failure, a request the client refused to build, and the service
//! rejecting a payload. Service error bodies are kept as parsed JSON so the
//! caller can display exactly what the backend said.

use serde_json::Value;

use crate::http::HttpResponse;
use crate::validate::FieldErrors;

/// Errors returned by the `build_*` and `parse_*` adapter methods.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// One or more locally-checkable fields failed; no request was built.
    #[error("{} field(s) failed validation", .0.len())]
    FieldValidation(FieldErrors),

    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The client could not build a well-formed request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The service understood the request and rejected its payload.
    #[error("{}", .0.message())]
    Validation(ServiceError),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// The message to put in front of the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(NetworkError::Status { error, .. }) => error.message(),
            other => other.to_string(),
        }
    }

    /// Structured detail from the service, when there is any.
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            ApiError::Validation(error) | ApiError::Network(NetworkError::Status { error, .. }) => {
                Some(error)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetworkError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("network error: request timed out")]
    Timeout,

    #[error("HTTP {status}: {}", .error.message())]
    Status { status: u16, error: ServiceError },

    /// The response arrived but did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedPayload(String),
}

/// An error body returned by the backend, preserved as sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceError {
    pub status: u16,
    pub body: Value,
}

impl ServiceError {
    /// Non-JSON bodies are kept as a JSON string.
    pub fn from_response(response: &HttpResponse) -> Self {
        let body = serde_json::from_str(&response.body)
            .unwrap_or_else(|_| Value::String(response.body.clone()));
        Self {
            status: response.status,
            body,
        }
    }

    /// `error` or `message` from an object body, the raw text otherwise.
    pub fn message(&self) -> String {
        let field = ["error", "message"]
            .iter()
            .find_map(|key| self.body.get(*key).and_then(Value::as_str));
        match (field, &self.body) {
            (Some(msg), _) => msg.to_string(),
            (None, Value::String(raw)) => raw.clone(),
            (None, other) => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn message_prefers_error_field() {
        let err = ServiceError::from_response(&response(409, r#"{"error":"duplicate tracking code"}"#));
        assert_eq!(err.message(), "duplicate tracking code");
    }

    #[test]
    fn message_falls_back_to_message_field() {
        let err = ServiceError::from_response(&response(400, r#"{"message":"itemSize missing"}"#));
        assert_eq!(err.message(), "itemSize missing");
    }

    #[test]
    fn plain_text_body_is_kept_verbatim() {
        let err = ServiceError::from_response(&response(502, "Bad Gateway"));
        assert_eq!(err.body, Value::String("Bad Gateway".to_string()));
        assert_eq!(err.message(), "Bad Gateway");
    }

    #[test]
    fn structured_body_without_message_is_rendered_whole() {
        let err = ServiceError::from_response(&response(400, r#"{"fields":["to"]}"#));
        assert_eq!(err.message(), r#"{"fields":["to"]}"#);
    }

    #[test]
    fn validation_error_displays_service_message() {
        let err = ApiError::Validation(ServiceError::from_response(&response(
            400,
            r#"{"error":"duplicate tracking code"}"#,
        )));
        assert_eq!(err.to_string(), "duplicate tracking code");
        assert_eq!(err.user_message(), "duplicate tracking code");
    }
}
