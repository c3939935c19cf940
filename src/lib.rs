//! Client-side HTTP layer for a JSON API.
//!
//! Application code talks only to [`ApiClient`]. Underneath, every request
//! passes through an interceptor pipeline that attaches the bearer
//! credential, encrypts sensitive body fields, and recovers from an expired
//! credential with a single refresh-and-retry. Every outcome, including
//! network failures, comes back as an [`ApiResult`] envelope.

pub mod api;
pub mod config;
pub mod crypto;

pub use api::{ApiClient, ApiResult, Credential, CredentialStore, RequestOptions, RequestSpec};
pub use config::{ClientConfig, ConfigError};
pub use crypto::{FieldCipher, SensitiveFieldSet};
