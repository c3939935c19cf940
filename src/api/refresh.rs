//! Credential refresh after an authentication failure.
//!
//! States: `Idle` -> `Refreshing` -> `Idle`
//!
//! - Idle + 401 on a fresh, non-exempt request: mark it retried, issue one
//!   refresh call, move to Refreshing.
//! - Refreshing + new credential: store it, re-issue the original request
//!   with it, back to Idle.
//! - Refreshing + refresh failure: surface the original 401, back to Idle.
//! - Anything else: pass the outcome through.
//!
//! The retry marker is set before the refresh is attempted and checked
//! before a new one is triggered, so one request gets at most one refresh
//! and one retry. Concurrent 401s on different requests each refresh on
//! their own; nothing is coalesced.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use super::credentials::{Credential, CredentialStore};
use super::endpoints;
use super::transport::{Transport, TransportError, TransportOutcome};
use super::types::{HttpMethod, RequestSpec};

/// HTTP status that triggers the refresh protocol.
pub const UNAUTHORIZED: u16 = 401;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    /// `request_id` identifies the request waiting on the refresh outcome.
    Refreshing { request_id: u64 },
}

#[derive(Debug)]
pub enum RefreshEvent {
    Response {
        request_id: u64,
        status: Option<u16>,
        retried: bool,
        exempt: bool,
    },
    RefreshSucceeded(Credential),
    RefreshFailed(RefreshError),
}

#[derive(Debug, PartialEq)]
pub enum RefreshAction {
    PassThrough,
    IssueRefresh,
    RetryWith(Credential),
    SurfaceOriginal,
}

#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    #[error("Refresh request failed: {0}")]
    Transport(#[from] TransportError),
    #[error("Refresh rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("Refresh response did not contain an access token")]
    MissingToken,
}

/// Pure transition function of the refresh state machine.
pub fn transition(state: RefreshState, event: RefreshEvent) -> (RefreshAction, RefreshState) {
    match (state, event) {
        (
            RefreshState::Idle,
            RefreshEvent::Response {
                request_id,
                status: Some(UNAUTHORIZED),
                retried: false,
                exempt: false,
            },
        ) => (RefreshAction::IssueRefresh, RefreshState::Refreshing { request_id }),
        (RefreshState::Refreshing { .. }, RefreshEvent::RefreshSucceeded(credential)) => {
            (RefreshAction::RetryWith(credential), RefreshState::Idle)
        }
        (RefreshState::Refreshing { .. }, RefreshEvent::RefreshFailed(_)) => {
            (RefreshAction::SurfaceOriginal, RefreshState::Idle)
        }
        (state, _) => (RefreshAction::PassThrough, state),
    }
}

/// Issues the refresh call and stores the resulting credential.
pub struct RefreshCoordinator {
    credentials: Arc<CredentialStore>,
}

impl RefreshCoordinator {
    pub fn new(credentials: Arc<CredentialStore>) -> Self {
        Self { credentials }
    }

    /// Build the refresh event for a transport outcome.
    pub fn observe(request_id: u64, spec: &RequestSpec, retried: bool, outcome: &TransportOutcome) -> RefreshEvent {
        RefreshEvent::Response {
            request_id,
            status: outcome.as_ref().ok().map(|response| response.status),
            retried,
            exempt: endpoints::is_refresh_exempt(&spec.url),
        }
    }

    /// POST /auth/refresh (no body) and, on success, replace the stored
    /// credential. The store is left untouched on failure.
    pub async fn refresh<T: Transport>(&self, transport: &T) -> Result<Credential, RefreshError> {
        let mut spec = RequestSpec::new(HttpMethod::Post, endpoints::REFRESH);
        if let Some(current) = self.credentials.get().await {
            spec.headers.insert("Authorization".to_string(), current.bearer());
        }

        let response = transport.execute(&spec).await?;
        let payload = response.body.unwrap_or(Value::Null);

        let signalled_failure = payload.get("success").and_then(Value::as_bool) == Some(false);
        if !(200..300).contains(&response.status) || signalled_failure {
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Refresh failed")
                .to_string();
            return Err(RefreshError::Rejected {
                status: response.status,
                message,
            });
        }

        let token = extract_access_token(&payload).ok_or(RefreshError::MissingToken)?;
        let credential = Credential::new(token);
        self.credentials.set(credential.clone()).await;
        Ok(credential)
    }
}

/// `data.accessToken`, falling back to a top-level `accessToken`.
fn extract_access_token(payload: &Value) -> Option<String> {
    payload
        .get("data")
        .and_then(|data| data.get("accessToken"))
        .or_else(|| payload.get("accessToken"))
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
