//! Parcel lodging adapter. Submission is not idempotent; nothing here
//! retries, and callers must only resend on an explicit user action.

use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::{ApiError, NetworkError};
use crate::http::{
    json_headers, require_accepted, require_success, Credentials, HttpMethod, HttpRequest,
    HttpResponse,
};
use crate::types::{LodgedParcel, ParcelRecord, SubmissionReceipt};

#[derive(Deserialize)]
struct ListEnvelope {
    data: ListData,
}

#[derive(Deserialize)]
struct ListData {
    parcels: Vec<LodgedParcel>,
}

#[derive(Debug, Clone)]
pub struct ParcelSubmissionClient {
    config: ClientConfig,
}

impl ParcelSubmissionClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn build_submit_parcel(&self, record: &ParcelRecord) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(record).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.config.url("/api/parcels/addparcel"),
            headers: json_headers(),
            body: Some(body),
            credentials: Credentials::Include,
            timeout: self.config.timeout(),
        })
    }

    /// A 4xx carries the service's error body unchanged in
    /// `ApiError::Validation`.
    pub fn parse_submit_parcel(&self, response: HttpResponse) -> Result<SubmissionReceipt, ApiError> {
        require_accepted(&response)?;
        if response.body.trim().is_empty() {
            return Ok(SubmissionReceipt::default());
        }
        serde_json::from_str(&response.body)
            .map_err(|e| NetworkError::MalformedPayload(e.to_string()).into())
    }

    pub fn build_list_parcels(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.config.url("/api/parcels"),
            headers: Vec::new(),
            body: None,
            credentials: Credentials::Include,
            timeout: self.config.timeout(),
        }
    }

    pub fn parse_list_parcels(&self, response: HttpResponse) -> Result<Vec<LodgedParcel>, ApiError> {
        require_success(&response)?;
        let envelope: ListEnvelope = serde_json::from_str(&response.body)
            .map_err(|e| NetworkError::MalformedPayload(e.to_string()))?;
        Ok(envelope.data.parcels)
    }
}
