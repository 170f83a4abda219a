//! Executes core `HttpRequest` values over real HTTP.

use std::time::Duration;

use courier_core::{ClientConfig, Credentials, HttpMethod, HttpRequest, HttpResponse, TransportError};
use tracing::debug;

/// Anything that can carry a request to the backend and bring back a
/// response. Status codes are data; only transport failures are `Err`.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// ureq-backed transport holding the session cookie for credentialed calls.
pub struct UreqTransport {
    agent: ureq::Agent,
    session_cookie: Option<String>,
}

impl UreqTransport {
    /// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
    /// responses reach the core parsers. `config` sets the agent default;
    /// each request still applies its own `timeout`.
    pub fn new(config: &ClientConfig, session_cookie: Option<String>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout()))
            .build()
            .new_agent();
        Self {
            agent,
            session_cookie,
        }
    }

    fn headers(&self, request: &HttpRequest) -> Vec<(String, String)> {
        let mut headers = request.headers.clone();
        if let (Credentials::Include, Some(cookie)) = (request.credentials, &self.session_cookie) {
            headers.push(("cookie".to_string(), cookie.clone()));
        }
        headers
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(method = ?request.method, path = %request.path, "executing request");
        let headers = self.headers(request);
        let body = request.body.as_deref().unwrap_or_default();

        let timeout = request.timeout;
        let result = match request.method {
            HttpMethod::Get => prepare(self.agent.get(&request.path), &headers, timeout).call(),
            HttpMethod::Delete => prepare(self.agent.delete(&request.path), &headers, timeout).call(),
            HttpMethod::Post => {
                prepare(self.agent.post(&request.path), &headers, timeout).send(body.as_bytes())
            }
            HttpMethod::Put => {
                prepare(self.agent.put(&request.path), &headers, timeout).send(body.as_bytes())
            }
        };

        let mut response = result.map_err(map_error)?;
        let status = response.status().as_u16();
        let response_headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response.body_mut().read_to_string().map_err(map_error)?;

        Ok(HttpResponse {
            status,
            headers: response_headers,
            body,
        })
    }
}

/// Attach headers and the request's own timeout, which overrides the
/// agent default.
fn prepare<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
    timeout: Duration,
) -> ureq::RequestBuilder<B> {
    for (key, value) in headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    builder.config().timeout_global(Some(timeout)).build()
}

fn map_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        other => TransportError::Connection(other.to_string()),
    }
}
