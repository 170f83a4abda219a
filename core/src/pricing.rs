//! Pricing adapter for `GET /api/payment/get-price`.
//!
//! The service distinguishes an absent `from`/`to` parameter from an empty
//! one, so absent branch ids are left out of the query string entirely.

use serde::Deserialize;
use url::form_urlencoded;

use crate::config::ClientConfig;
use crate::error::{ApiError, NetworkError};
use crate::http::{require_success, Credentials, HttpMethod, HttpRequest, HttpResponse};
use crate::types::{Quote, QuoteRequest};

const DEFAULT_CURRENCY: &str = "LKR";

#[derive(Deserialize)]
struct PriceEnvelope {
    data: PriceData,
}

#[derive(Deserialize)]
struct PriceData {
    price: f64,
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PricingClient {
    config: ClientConfig,
}

impl PricingClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Full request URL for `request`, skipping absent or empty branch ids.
    pub fn build_query_url(&self, request: &QuoteRequest) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("itemSize", request.item_size.as_str());
        query.append_pair("shippingMethod", request.shipping_method.as_str());
        let branches = [
            ("from", &request.origin_branch_id),
            ("to", &request.destination_branch_id),
        ];
        for (key, id) in branches {
            if let Some(id) = id.as_deref().filter(|id| !id.trim().is_empty()) {
                query.append_pair(key, id);
            }
        }
        format!("{}?{}", self.config.url("/api/payment/get-price"), query.finish())
    }

    pub fn build_get_quote(&self, request: &QuoteRequest) -> Result<HttpRequest, ApiError> {
        if !request.is_routable() {
            return Err(ApiError::InvalidRequest(
                "origin and destination branches are both required for a quote".to_string(),
            ));
        }
        Ok(HttpRequest {
            method: HttpMethod::Get,
            path: self.build_query_url(request),
            headers: Vec::new(),
            body: None,
            credentials: Credentials::Omit,
            timeout: self.config.timeout(),
        })
    }

    pub fn parse_get_quote(&self, basis: QuoteRequest, response: HttpResponse) -> Result<Quote, ApiError> {
        require_success(&response)?;
        let envelope: PriceEnvelope = serde_json::from_str(&response.body)
            .map_err(|e| NetworkError::MalformedPayload(e.to_string()))?;
        if !envelope.data.price.is_finite() || envelope.data.price < 0.0 {
            return Err(NetworkError::MalformedPayload(format!(
                "price out of range: {}",
                envelope.data.price
            ))
            .into());
        }
        Ok(Quote {
            amount: envelope.data.price,
            currency: envelope
                .data
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            basis,
        })
    }
}
