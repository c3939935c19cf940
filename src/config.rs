//! Process-wide client configuration.
//!
//! Loaded once at startup (usually from the environment after `dotenvy` has
//! read a `.env` file) and treated as immutable afterwards.

use std::time::Duration;

use thiserror::Error;

use crate::crypto::{CipherError, FieldCipher, SensitiveFieldSet};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(50);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API base URL is not configured (set API_BASE_URL)")]
    MissingBaseUrl,
    #[error("Encryption is enabled but ENCRYPTION_SECRET is not set")]
    MissingEncryptionSecret,
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error("Cipher setup failed: {0}")]
    Cipher(#[from] CipherError),
    #[error("HTTP client setup failed: {0}")]
    Http(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub encryption_enabled: bool,
    pub encryption_secret: Option<String>,
    pub sensitive_fields: SensitiveFieldSet,
}

impl ClientConfig {
    /// Configuration with defaults for everything except the base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            encryption_enabled: false,
            encryption_secret: None,
            sensitive_fields: SensitiveFieldSet::default(),
        }
    }

    /// Read configuration from process environment variables.
    ///
    /// Base URL: API_BASE_URL > EXPO_PUBLIC_BACKEND_URL (required)
    /// Encryption flag: ENABLE_ENCRYPTION > EXPO_PUBLIC_ENABLE_ENCRYPTION
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("API_BASE_URL")
            .or_else(|| lookup("EXPO_PUBLIC_BACKEND_URL"))
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingBaseUrl)?;

        let mut config = Self::new(base_url.trim());

        if let Some(raw) = lookup("API_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "API_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup("ENABLE_ENCRYPTION").or_else(|| lookup("EXPO_PUBLIC_ENABLE_ENCRYPTION")) {
            config.encryption_enabled = parse_flag(&raw).ok_or(ConfigError::InvalidValue {
                name: "ENABLE_ENCRYPTION",
                value: raw.clone(),
            })?;
        }

        config.encryption_secret = lookup("ENCRYPTION_SECRET").filter(|s| !s.is_empty());

        if let Some(list) = lookup("SENSITIVE_FIELDS") {
            config.sensitive_fields = SensitiveFieldSet::parse(&list);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable field encryption with the given pre-shared secret.
    pub fn with_encryption(mut self, secret: &str) -> Self {
        self.encryption_enabled = true;
        self.encryption_secret = Some(secret.to_string());
        self
    }

    pub fn with_sensitive_fields(mut self, fields: SensitiveFieldSet) -> Self {
        self.sensitive_fields = fields;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        if self.encryption_enabled && self.encryption_secret.is_none() {
            return Err(ConfigError::MissingEncryptionSecret);
        }
        Ok(())
    }

    /// Build the field cipher, or `None` when encryption is disabled.
    pub fn field_cipher(&self) -> Result<Option<FieldCipher>, ConfigError> {
        if !self.encryption_enabled {
            return Ok(None);
        }
        let secret = self
            .encryption_secret
            .as_deref()
            .ok_or(ConfigError::MissingEncryptionSecret)?;
        Ok(Some(FieldCipher::new(secret, self.sensitive_fields.clone())?))
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
