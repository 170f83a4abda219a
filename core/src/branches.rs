//! Branch directory adapter: the branch list feeding the origin and
//! destination selectors, plus the admin create/update/delete forms.

use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::{ApiError, NetworkError};
use crate::http::{
    json_headers, require_accepted, require_success, Credentials, HttpMethod, HttpRequest,
    HttpResponse,
};
use crate::types::Branch;
use crate::validate::BranchForm;

#[derive(Deserialize)]
struct ListEnvelope {
    data: ListData,
}

#[derive(Deserialize)]
struct ListData {
    branches: Vec<Branch>,
}

#[derive(Deserialize)]
struct OneEnvelope {
    data: OneData,
}

#[derive(Deserialize)]
struct OneData {
    branch: Branch,
}

#[derive(Debug, Clone)]
pub struct BranchDirectoryClient {
    config: ClientConfig,
}

impl BranchDirectoryClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn build_list_branches(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/api/branches", Credentials::Omit)
    }

    /// Order is preserved as sent. A payload without `data.branches` is a
    /// network failure, not an empty list.
    pub fn parse_list_branches(&self, response: HttpResponse) -> Result<Vec<Branch>, ApiError> {
        require_success(&response)?;
        let envelope: ListEnvelope = serde_json::from_str(&response.body)
            .map_err(|e| NetworkError::MalformedPayload(e.to_string()))?;
        Ok(envelope.data.branches)
    }

    pub fn build_create_branch(&self, form: &BranchForm) -> Result<HttpRequest, ApiError> {
        self.form_request(HttpMethod::Post, "/api/branches".to_string(), form)
    }

    pub fn build_update_branch(&self, id: &str, form: &BranchForm) -> Result<HttpRequest, ApiError> {
        self.form_request(HttpMethod::Put, format!("/api/branches/{id}"), form)
    }

    pub fn build_delete_branch(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/api/branches/{id}"), Credentials::Include)
    }

    pub fn parse_create_branch(&self, response: HttpResponse) -> Result<Branch, ApiError> {
        parse_one(response)
    }

    pub fn parse_update_branch(&self, response: HttpResponse) -> Result<Branch, ApiError> {
        parse_one(response)
    }

    pub fn parse_delete_branch(&self, response: HttpResponse) -> Result<(), ApiError> {
        require_accepted(&response)
    }

    fn form_request(&self, method: HttpMethod, path: String, form: &BranchForm) -> Result<HttpRequest, ApiError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(ApiError::FieldValidation(errors));
        }
        let body = serde_json::to_string(form).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut request = self.request(method, &path, Credentials::Include);
        request.headers = json_headers();
        request.body = Some(body);
        Ok(request)
    }

    fn request(&self, method: HttpMethod, path: &str, credentials: Credentials) -> HttpRequest {
        HttpRequest {
            method,
            path: self.config.url(path),
            headers: Vec::new(),
            body: None,
            credentials,
            timeout: self.config.timeout(),
        }
    }
}

fn parse_one(response: HttpResponse) -> Result<Branch, ApiError> {
    require_accepted(&response)?;
    let envelope: OneEnvelope = serde_json::from_str(&response.body)
        .map_err(|e| NetworkError::MalformedPayload(e.to_string()))?;
    Ok(envelope.data.branch)
}
