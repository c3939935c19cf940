//! Persistence of the access credential across process restarts.
//!
//! The token lives in the OS keychain under a single well-known entry.
//! `CredentialPersistence` keeps the store independent of the backend so
//! tests can swap in [`MemoryPersistence`].

use std::sync::Mutex;

use keyring::Entry;
use thiserror::Error;

/// Keychain service name for this client.
pub const SERVICE_NAME: &str = "secure-api-client";

/// Well-known entry holding the current access token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

#[derive(Debug, Error)]
pub enum KeychainError {
    #[error("Keychain operation failed: {0}")]
    OperationFailed(String),
}

impl From<keyring::Error> for KeychainError {
    fn from(err: keyring::Error) -> Self {
        KeychainError::OperationFailed(err.to_string())
    }
}

/// Backend that survives the process: read at startup, written on
/// login/refresh, cleared on logout.
pub trait CredentialPersistence: Send + Sync {
    fn load(&self) -> Result<Option<String>, KeychainError>;
    fn save(&self, token: &str) -> Result<(), KeychainError>;
    fn clear(&self) -> Result<(), KeychainError>;
}

/// OS keychain via the `keyring` crate.
#[derive(Debug, Clone)]
pub struct KeychainPersistence {
    service: String,
    key: String,
}

impl KeychainPersistence {
    pub fn new(service: &str, key: &str) -> Self {
        Self {
            service: service.to_string(),
            key: key.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry, KeychainError> {
        Ok(Entry::new(&self.service, &self.key)?)
    }
}

impl Default for KeychainPersistence {
    fn default() -> Self {
        Self::new(SERVICE_NAME, ACCESS_TOKEN_KEY)
    }
}

impl CredentialPersistence for KeychainPersistence {
    /// Returns `None` if no entry exists (never logged in, or logged out).
    fn load(&self) -> Result<Option<String>, KeychainError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(KeychainError::from(e)),
        }
    }

    fn save(&self, token: &str) -> Result<(), KeychainError> {
        self.entry()?.set_password(token)?;
        Ok(())
    }

    /// Idempotent: a missing entry is not an error.
    fn clear(&self) -> Result<(), KeychainError> {
        match self.entry()?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(KeychainError::from(e)),
        }
    }
}

/// In-process persistence, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    token: Mutex<Option<String>>,
}

impl MemoryPersistence {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, KeychainError> {
        self.token
            .lock()
            .map_err(|_| KeychainError::OperationFailed("memory store poisoned".to_string()))
    }
}

impl CredentialPersistence for MemoryPersistence {
    fn load(&self) -> Result<Option<String>, KeychainError> {
        Ok(self.slot()?.clone())
    }

    fn save(&self, token: &str) -> Result<(), KeychainError> {
        *self.slot()? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), KeychainError> {
        *self.slot()? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_persistence_lifecycle() {
        let store = MemoryPersistence::default();
        assert_eq!(store.load().unwrap(), None);

        store.save("abc").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));

        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
