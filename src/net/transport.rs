//! JSON-over-HTTP transport to the helper backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every flow in the crate talks to the backend through [`Transport::call`].
//! The trait keeps controllers testable against a scripted double while
//! [`HttpTransport`] does the real work with `reqwest`.
//!
//! ERROR HANDLING
//! ==============
//! Bodies are always parsed as JSON and empty/non-JSON bodies collapse to
//! `{}`. Non-2xx statuses become [`TransportError::Application`] carrying the
//! server's `error`/`message` text. Connection-level failures stay distinct
//! (`Network`/`Timeout`) so callers can show connection messaging. No retries
//! happen here.

use std::time::Duration;

use reqwest::Method;
use reqwest::header::ACCEPT;
use serde_json::Value;

/// Errors produced by a transport call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// DNS, connect, offline, or body-read failure.
    #[error("network error: {0}")]
    Network(String),

    /// The request did not settle within the deadline.
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Application { status: u16, message: String },

    /// A 2xx body did not match the shape expected for the endpoint.
    #[error("unexpected response payload: {0}")]
    InvalidPayload(String),
}

impl TransportError {
    /// True for failures below the HTTP layer.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }

    /// HTTP status for application errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Application { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Minimal request surface used by the typed API layer.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Issue `method path` with an optional JSON body and return the decoded body.
    async fn call(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, TransportError>;
}

/// `reqwest`-backed transport with a cookie store so the server session
/// persists across calls.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl HttpTransport {
    /// Build a transport for `base_url` with request/connect deadlines.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Network`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, request_timeout: Duration, connect_timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned(), request_timeout })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.request_timeout)
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn call(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, TransportError> {
        let mut request = self
            .http
            .request(method.clone(), self.url(path))
            .header(ACCEPT, "application/json");
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| self.map_error(e))?;

        tracing::debug!(%method, path, status, bytes = text.len(), "transport: response");
        normalize_response(status, &text)
    }
}

/// Parse a body leniently: empty or non-JSON text becomes `{}`.
pub(crate) fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Object(serde_json::Map::new());
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

/// Server-provided error text from an `{error?, message?}` body.
pub(crate) fn server_error_text(body: &Value) -> Option<String> {
    ["error", "message"]
        .iter()
        .filter_map(|field| body.get(field).and_then(Value::as_str))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_owned)
}

pub(crate) fn request_failed_message(status: u16) -> String {
    format!("request failed ({status})")
}

/// Map `(status, body text)` to the transport contract.
pub(crate) fn normalize_response(status: u16, text: &str) -> Result<Value, TransportError> {
    let body = parse_body(text);
    if (200..300).contains(&status) {
        return Ok(body);
    }
    let message = server_error_text(&body).unwrap_or_else(|| request_failed_message(status));
    Err(TransportError::Application { status, message })
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
