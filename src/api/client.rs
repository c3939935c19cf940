//! Client facade: the only entry point the rest of the application uses.
//!
//! Every verb returns an [`ApiResult`]; ordinary API failures never surface
//! as Rust errors. Construction is the only fallible step (configuration).

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Map;

use crate::config::{ClientConfig, ConfigError};

use super::credentials::CredentialStore;
use super::keychain::CredentialPersistence;
use super::normalize::{normalize, NO_RESPONSE_STATUS};
use super::pipeline::Pipeline;
use super::transport::{ReqwestTransport, Transport};
use super::types::{ApiResult, FormPart, HttpMethod, RequestBody, RequestOptions, RequestSpec};

/// HTTP client with credential injection, field encryption, refresh-on-401
/// and response normalization.
pub struct ApiClient<T: Transport = ReqwestTransport> {
    pipeline: Pipeline<T>,
}

impl ApiClient<ReqwestTransport> {
    /// Build the production client, restoring any persisted credential.
    pub fn new(config: &ClientConfig, persistence: Arc<dyn CredentialPersistence>) -> Result<Self, ConfigError> {
        config.validate()?;
        let transport = ReqwestTransport::new(config)?;
        let credentials = Arc::new(CredentialStore::load(persistence));
        Self::with_transport(config, transport, credentials)
    }
}

impl<T: Transport> ApiClient<T> {
    /// Build a client over any transport and an injected credential store.
    pub fn with_transport(
        config: &ClientConfig,
        transport: T,
        credentials: Arc<CredentialStore>,
    ) -> Result<Self, ConfigError> {
        let cipher = config.field_cipher()?;
        if cipher.is_some() {
            log::info!(
                "Field encryption enabled for {} field(s)",
                config.sensitive_fields.len()
            );
        }
        Ok(Self {
            pipeline: Pipeline::new(transport, credentials, cipher),
        })
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        self.pipeline.credentials()
    }

    pub fn transport(&self) -> &T {
        self.pipeline.transport()
    }

    /// Send a fully specified request.
    pub async fn request<R: DeserializeOwned>(&self, spec: RequestSpec, success_message: Option<&str>) -> ApiResult<R> {
        let outcome = self.pipeline.execute(spec).await;
        normalize(outcome, success_message)
    }

    pub async fn get<R: DeserializeOwned>(&self, url: &str, options: RequestOptions) -> ApiResult<R> {
        self.send(RequestSpec::new(HttpMethod::Get, url), options).await
    }

    pub async fn delete<R: DeserializeOwned>(&self, url: &str, options: RequestOptions) -> ApiResult<R> {
        self.send(RequestSpec::new(HttpMethod::Delete, url), options).await
    }

    pub async fn post<B, R>(&self, url: &str, body: &B, options: RequestOptions) -> ApiResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send_json(HttpMethod::Post, url, body, options).await
    }

    pub async fn put<B, R>(&self, url: &str, body: &B, options: RequestOptions) -> ApiResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send_json(HttpMethod::Put, url, body, options).await
    }

    pub async fn patch<B, R>(&self, url: &str, body: &B, options: RequestOptions) -> ApiResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send_json(HttpMethod::Patch, url, body, options).await
    }

    /// POST a multipart form. Form bodies are never field-encrypted.
    pub async fn post_multipart<R: DeserializeOwned>(
        &self,
        url: &str,
        parts: Vec<FormPart>,
        options: RequestOptions,
    ) -> ApiResult<R> {
        let spec = RequestSpec::new(HttpMethod::Post, url).with_body(RequestBody::Multipart(parts));
        self.send(spec, options).await
    }

    async fn send_json<B, R>(&self, method: HttpMethod, url: &str, body: &B, options: RequestOptions) -> ApiResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = match serde_json::to_value(body) {
            Ok(value) => value,
            Err(e) => {
                log::error!("Failed to serialize {} {} body: {}", method, url, e);
                return ApiResult::failure(
                    format!("Failed to serialize request body: {e}"),
                    Map::new(),
                    NO_RESPONSE_STATUS,
                );
            }
        };
        let spec = RequestSpec::new(method, url).with_body(RequestBody::Json(body));
        self.send(spec, options).await
    }

    async fn send<R: DeserializeOwned>(&self, spec: RequestSpec, options: RequestOptions) -> ApiResult<R> {
        let (spec, success_message) = spec.with_options(options);
        self.request(spec, success_message.as_deref()).await
    }
}
