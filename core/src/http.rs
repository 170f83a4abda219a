//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! crate builds `HttpRequest` values and parses `HttpResponse` values without
//! ever touching the network; the host executes the actual I/O and reports
//! transport failures back as `TransportError`.
//!
//! A request also carries the credential mode and timeout the host must
//! apply, so the adapter that built it decides both.

use std::time::Duration;

use crate::error::{ApiError, NetworkError, ServiceError};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// Whether the host attaches the session cookie to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credentials {
    Omit,
    Include,
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub credentials: Credentials,
    pub timeout: Duration,
}

/// An HTTP response described as plain data.
///
/// Constructed by the host after executing an `HttpRequest`, then passed
/// to the matching `parse_*` method.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }
}

/// Failure reported by the host when a request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connection(String),
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => ApiError::Network(NetworkError::Timeout),
            TransportError::Connection(msg) => ApiError::Network(NetworkError::Transport(msg)),
        }
    }
}

pub(crate) fn json_headers() -> Vec<(String, String)> {
    vec![("content-type".to_string(), "application/json".to_string())]
}

/// Non-2xx responses from read endpoints are transport-level failures.
pub(crate) fn require_success(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::Network(NetworkError::Status {
        status: response.status,
        error: ServiceError::from_response(response),
    }))
}

/// Like `require_success`, but a 4xx is the service rejecting the payload.
pub(crate) fn require_accepted(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_client_error() {
        return Err(ApiError::Validation(ServiceError::from_response(response)));
    }
    require_success(response)
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
    fn timeout_becomes_network_error() {
        let err: ApiError = TransportError::Timeout.into();
        assert!(matches!(err, ApiError::Network(NetworkError::Timeout)));
    }

    #[test]
    fn require_accepted_splits_client_and_server_errors() {
        let err = require_accepted(&response(422, r#"{"error":"bad"}"#)).unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref e) if e.status == 422));

        let err = require_accepted(&response(503, "down")).unwrap_err();
        assert!(matches!(err, ApiError::Network(NetworkError::Status { status: 503, .. })));

        assert!(require_accepted(&response(201, "{}")).is_ok());
    }
}
