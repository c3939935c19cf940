//! The HTTP execution primitive underneath the pipeline.
//!
//! `Transport` sends one already-prepared `RequestSpec` and reports either
//! the raw response (any status) or a network-level error. It never retries
//! and never interprets status codes.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use serde_json::Value;
use thiserror::Error;

use crate::config::{ClientConfig, ConfigError};

use super::types::{FormPart, HttpMethod, RequestBody, RequestSpec};

/// Failure before any HTTP response was received.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    /// The request could not be built or its body could not be encoded.
    Request,
    Other,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_builder() || err.is_request() {
            TransportErrorKind::Request
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, err.to_string())
    }
}

/// A received HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// Parsed JSON body; non-JSON text is kept as a JSON string and an empty
    /// body is `None`.
    pub body: Option<Value>,
}

impl TransportResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub type TransportOutcome = Result<TransportResponse, TransportError>;

/// Trait abstracting HTTP execution for testability.
///
/// In production, `ReqwestTransport` performs the round-trip.
/// In tests, a scripted implementation returns canned outcomes.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn execute(&self, request: &RequestSpec) -> TransportOutcome;
}

/// reqwest-backed transport bound to the configured base URL.
///
/// The cookie store is enabled so session cookies set by the backend
/// travel alongside the bearer header.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .cookie_store(true)
            .build()
            .map_err(|e| ConfigError::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a request URL against the base URL. Absolute URLs pass through.
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            format!("{}/{}", self.base_url, url)
        }
    }
}

impl Transport for ReqwestTransport {
    async fn execute(&self, request: &RequestSpec) -> TransportOutcome {
        let url = self.resolve(&request.url);
        log::debug!("{} {}", request.method, url);

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &url)
            .header(reqwest::header::ACCEPT, "application/json");

        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(parts) => builder.multipart(build_form(parts)?),
            RequestBody::Bytes { content_type, data } => builder
                .header(reqwest::header::CONTENT_TYPE, content_type.as_str())
                .body(data.clone()),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        log::debug!("{} {} -> {}", request.method, url, status);
        Ok(TransportResponse::new(status, parse_body(&bytes)))
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Rebuilt on every send; `reqwest::multipart::Form` is not `Clone` and a
/// retried request needs a fresh one.
fn build_form(parts: &[FormPart]) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
            FormPart::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                let mut file = Part::bytes(bytes.clone()).file_name(filename.clone());
                if let Some(mime) = content_type {
                    file = file
                        .mime_str(mime)
                        .map_err(|e| TransportError::new(TransportErrorKind::Request, e.to_string()))?;
                }
                form.part(name.clone(), file)
            }
        };
    }
    Ok(form)
}

fn parse_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}
