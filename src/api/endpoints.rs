//! Backend endpoint paths.

pub const LOGIN: &str = "/auth/login";
pub const REGISTER: &str = "/auth/register";
pub const LOGOUT: &str = "/auth/logout";
pub const REFRESH: &str = "/auth/refresh";
pub const FORGOT_PASSWORD: &str = "/auth/forgot-password";
pub const RESET_PASSWORD: &str = "/auth/reset-password";
pub const VERIFY_OTP: &str = "/auth/verify-otp";

/// Requests to these paths never trigger a credential refresh.
pub fn is_refresh_exempt(url: &str) -> bool {
    url.contains(REFRESH) || url.contains(LOGIN)
}
