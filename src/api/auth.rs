//! Session endpoints on top of the facade.
//!
//! `login` is the only place besides the refresh protocol that writes the
//! credential store; `logout` is the only place that clears it.

use serde_json::Value;

use super::client::ApiClient;
use super::credentials::Credential;
use super::endpoints;
use super::transport::Transport;
use super::types::{
    ApiResult, ForgotPasswordRequest, HttpMethod, LoginRequest, RegisterRequest, RequestOptions, RequestSpec,
    ResetPasswordRequest, TokenResponse, VerifyOtpRequest,
};

impl<T: Transport> ApiClient<T> {
    /// POST /auth/login and store the returned access token.
    pub async fn login(&self, request: &LoginRequest) -> ApiResult<TokenResponse> {
        let result: ApiResult<TokenResponse> = self
            .post(endpoints::LOGIN, request, RequestOptions::default().success_message("Logged in"))
            .await;

        if let Some(tokens) = result.data.as_ref() {
            self.credentials()
                .set(Credential::new(tokens.access_token.clone()))
                .await;
            log::info!("Login succeeded, credential stored");
        } else {
            log::warn!("Login failed ({}): {}", result.status_code, result.message);
        }
        result
    }

    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<Value> {
        self.post(endpoints::REGISTER, request, RequestOptions::default()).await
    }

    pub async fn verify_otp(&self, request: &VerifyOtpRequest) -> ApiResult<Value> {
        self.post(endpoints::VERIFY_OTP, request, RequestOptions::default()).await
    }

    pub async fn forgot_password(&self, request: &ForgotPasswordRequest) -> ApiResult<Value> {
        self.post(endpoints::FORGOT_PASSWORD, request, RequestOptions::default()).await
    }

    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> ApiResult<Value> {
        self.post(endpoints::RESET_PASSWORD, request, RequestOptions::default()).await
    }

    /// POST /auth/logout (best-effort), then clear the credential locally.
    ///
    /// The local credential is cleared even when the server is unreachable.
    pub async fn logout(&self) -> ApiResult<Value> {
        let result: ApiResult<Value> = self
            .request(RequestSpec::new(HttpMethod::Post, endpoints::LOGOUT), Some("Logged out"))
            .await;
        if !result.success {
            log::warn!("Logout request failed (continuing local cleanup): {}", result.message);
        }
        self.credentials().clear().await;
        log::info!("Logout complete");
        result
    }
}
