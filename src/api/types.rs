//! Request and response types shared by the pipeline and its callers.
//!
//! Wire-facing structs use camelCase serialization to match the API's JSON format.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Uniform envelope returned for every call, success or failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResult<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    #[serde(default)]
    pub meta: Map<String, Value>,
    pub status_code: u16,
}

impl<T> ApiResult<T> {
    /// Failure envelope. `data` is always `None`.
    pub fn failure(message: impl Into<String>, meta: Map<String, Value>, status_code: u16) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            meta,
            status_code,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Methods whose bodies go through the sensitive-field cipher.
    pub fn carries_payload(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// JSON payload. Only objects are eligible for field encryption.
    Json(Value),
    /// Form upload, sent as-is.
    Multipart(Vec<FormPart>),
    /// Raw binary payload, sent as-is.
    Bytes {
        content_type: String,
        data: Vec<u8>,
    },
}

impl RequestBody {
    /// True for a JSON object, i.e. a plain field mapping.
    pub fn is_field_mapping(&self) -> bool {
        matches!(self, RequestBody::Json(Value::Object(_)))
    }
}

/// Everything needed to issue one request.
///
/// Callers build it once; the pipeline derives copies from it and never
/// mutates the original.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    /// Path relative to the base URL (e.g. `/projects`) or an absolute URL.
    pub url: String,
    pub method: HttpMethod,
    pub params: BTreeMap<String, String>,
    pub body: RequestBody,
    pub headers: BTreeMap<String, String>,
    /// Overrides the configured default when set.
    pub timeout: Option<Duration>,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, url: &str) -> Self {
        Self {
            url: url.to_string(),
            method,
            params: BTreeMap::new(),
            body: RequestBody::Empty,
            headers: BTreeMap::new(),
            timeout: None,
        }
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Fold caller options into the spec. Returns the success message override.
    pub fn with_options(mut self, options: RequestOptions) -> (Self, Option<String>) {
        self.headers.extend(options.headers);
        self.params.extend(options.params);
        if options.timeout.is_some() {
            self.timeout = options.timeout;
        }
        (self, options.success_message)
    }

    /// Header lookup, case-insensitive on the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Per-call overrides accepted by the facade verbs.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Merged with the injected authorization header.
    pub headers: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
    /// Encoded into the query string.
    pub params: BTreeMap<String, String>,
    /// Used when the backend response carries no message of its own.
    pub success_message: Option<String>,
}

impl RequestOptions {
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn success_message(mut self, message: &str) -> Self {
        self.success_message = Some(message.to_string());
        self
    }
}

/// Login request body sent to POST /auth/login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body sent to POST /auth/register.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Body sent to POST /auth/verify-otp.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Body sent to POST /auth/forgot-password.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Body sent to POST /auth/reset-password.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// `data` payload of a successful login or refresh.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}
