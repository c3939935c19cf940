//! Interceptor pipeline around the transport.
//!
//! Outbound: `prepare` derives the wire request from the caller's spec by
//! attaching the bearer credential and, for POST/PUT/PATCH JSON objects,
//! encrypting sensitive fields. Inbound: every outcome is fed to the refresh
//! state machine, which may detour through one refresh and one retry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::crypto::{CipherError, FieldCipher};

use super::credentials::{Credential, CredentialStore};
use super::refresh::{transition, RefreshAction, RefreshCoordinator, RefreshEvent, RefreshState};
use super::transport::{Transport, TransportError, TransportErrorKind, TransportOutcome};
use super::types::{RequestBody, RequestSpec};

pub const AUTHORIZATION: &str = "Authorization";

/// A request on its way through the pipeline, with its single-retry marker.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub spec: RequestSpec,
    pub retried: bool,
}

impl Dispatch {
    pub fn new(spec: RequestSpec) -> Self {
        Self { spec, retried: false }
    }

    /// The same request, marked so it can never trigger another refresh.
    pub fn into_retry(self) -> Self {
        Self {
            spec: self.spec,
            retried: true,
        }
    }
}

/// Outbound transform: `RequestSpec -> RequestSpec`.
///
/// The caller's spec is never modified. Non-object bodies (multipart, raw
/// bytes, arrays) and payload-less methods are forwarded verbatim.
pub fn prepare(
    spec: &RequestSpec,
    credential: Option<&Credential>,
    cipher: Option<&FieldCipher>,
) -> Result<RequestSpec, CipherError> {
    let mut wire = spec.clone();

    if let Some(credential) = credential {
        wire.headers
            .retain(|name, _| !name.eq_ignore_ascii_case(AUTHORIZATION));
        wire.headers
            .insert(AUTHORIZATION.to_string(), credential.bearer());
    }

    if let Some(cipher) = cipher {
        if spec.method.carries_payload() && spec.body.is_field_mapping() {
            if let RequestBody::Json(body) = &spec.body {
                wire.body = RequestBody::Json(cipher.encrypt_body(body)?);
            }
        }
    }

    Ok(wire)
}

pub struct Pipeline<T: Transport> {
    transport: T,
    credentials: Arc<CredentialStore>,
    cipher: Option<FieldCipher>,
    coordinator: RefreshCoordinator,
    next_request_id: AtomicU64,
}

impl<T: Transport> Pipeline<T> {
    /// `cipher` is `None` when field encryption is disabled.
    pub fn new(transport: T, credentials: Arc<CredentialStore>, cipher: Option<FieldCipher>) -> Self {
        Self {
            transport,
            coordinator: RefreshCoordinator::new(credentials.clone()),
            credentials,
            cipher,
            next_request_id: AtomicU64::new(1),
        }
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one caller request to its final transport outcome.
    pub async fn execute(&self, spec: RequestSpec) -> TransportOutcome {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let dispatch = Dispatch::new(spec);

        let credential = self.credentials.get().await;
        let outcome = self.send(&dispatch, credential.as_ref()).await;

        let event = RefreshCoordinator::observe(request_id, &dispatch.spec, dispatch.retried, &outcome);
        let (action, state) = transition(RefreshState::Idle, event);
        if action != RefreshAction::IssueRefresh {
            return outcome;
        }

        log::info!(
            "Request #{} {} {} returned 401, refreshing credential",
            request_id,
            dispatch.spec.method,
            dispatch.spec.url
        );
        let dispatch = dispatch.into_retry();

        let event = match self.coordinator.refresh(&self.transport).await {
            Ok(credential) => RefreshEvent::RefreshSucceeded(credential),
            Err(e) => {
                log::warn!("Credential refresh failed for request #{}: {}", request_id, e);
                RefreshEvent::RefreshFailed(e)
            }
        };

        match transition(state, event).0 {
            RefreshAction::RetryWith(credential) => {
                log::info!("Retrying request #{} with refreshed credential", request_id);
                self.send(&dispatch, Some(&credential)).await
            }
            _ => outcome,
        }
    }

    async fn send(&self, dispatch: &Dispatch, credential: Option<&Credential>) -> TransportOutcome {
        let wire = prepare(&dispatch.spec, credential, self.cipher.as_ref()).map_err(|e| {
            log::error!("Refusing to send {} {}: {}", dispatch.spec.method, dispatch.spec.url, e);
            TransportError::new(TransportErrorKind::Request, format!("Failed to encrypt request body: {e}"))
        })?;
        self.transport.execute(&wire).await
    }
}
