//! API client module.
//!
//! Provides the request pipeline (credential injection, field encryption,
//! refresh-on-401), response normalization, credential storage, and the
//! `ApiClient` facade used by application code.

pub mod auth;
pub mod client;
pub mod credentials;
pub mod endpoints;
pub mod keychain;
pub mod normalize;
pub mod pipeline;
pub mod refresh;
pub mod transport;
pub mod types;


pub use client::ApiClient;
pub use credentials::{Credential, CredentialStore};
pub use keychain::{CredentialPersistence, KeychainPersistence, MemoryPersistence};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportOutcome, TransportResponse};
pub use types::{ApiResult, FormPart, HttpMethod, RequestBody, RequestOptions, RequestSpec};
