//! Session check behind the staff and admin guards.

use std::fmt;

use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::{ApiError, NetworkError};
use crate::http::{require_success, Credentials, HttpMethod, HttpRequest, HttpResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Staff,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub role: Role,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCheck {
    Verified(Session),
    Denied,
}

#[derive(Deserialize)]
struct VerifyEnvelope {
    #[serde(default)]
    data: Option<VerifyData>,
}

#[derive(Deserialize)]
struct VerifyData {
    #[serde(default)]
    username: Option<String>,
}

/// Verifies the current session cookie for one role.
#[derive(Debug, Clone)]
pub struct SessionVerifier {
    config: ClientConfig,
    role: Role,
}

impl SessionVerifier {
    pub fn new(config: &ClientConfig, role: Role) -> Self {
        Self {
            config: config.clone(),
            role,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn build_verify(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.config.url(&format!("/api/{}/verify", self.role)),
            headers: Vec::new(),
            body: None,
            credentials: Credentials::Include,
            timeout: self.config.timeout(),
        }
    }

    pub fn parse_verify(&self, response: HttpResponse) -> Result<SessionCheck, ApiError> {
        if matches!(response.status, 401 | 403) {
            return Ok(SessionCheck::Denied);
        }
        require_success(&response)?;
        let envelope: VerifyEnvelope = serde_json::from_str(&response.body)
            .map_err(|e| NetworkError::MalformedPayload(e.to_string()))?;
        Ok(SessionCheck::Verified(Session {
            role: self.role,
            username: envelope.data.and_then(|d| d.username),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier(role: Role) -> SessionVerifier {
        SessionVerifier::new(&ClientConfig::new("http://localhost:3000"), role)
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn each_role_has_its_own_endpoint() {
        assert_eq!(
            verifier(Role::Staff).build_verify().path,
            "http://localhost:3000/api/staff/verify"
        );
        let req = verifier(Role::Admin).build_verify();
        assert_eq!(req.path, "http://localhost:3000/api/admin/verify");
        assert_eq!(req.credentials, Credentials::Include);
    }

    #[test]
    fn unauthorized_is_denied_not_error() {
        let check = verifier(Role::Admin)
            .parse_verify(response(401, r#"{"error":"Unauthorized"}"#))
            .unwrap();
        assert_eq!(check, SessionCheck::Denied);
    }

    #[test]
    fn ok_is_verified_with_username() {
        let check = verifier(Role::Staff)
            .parse_verify(response(200, r#"{"data":{"username":"kasun"}}"#))
            .unwrap();
        assert_eq!(
            check,
            SessionCheck::Verified(Session {
                role: Role::Staff,
                username: Some("kasun".to_string()),
            })
        );
    }

    #[test]
    fn server_error_propagates() {
        let err = verifier(Role::Staff).parse_verify(response(500, "")).unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }
}
