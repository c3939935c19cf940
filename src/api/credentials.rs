//! Holder of the current access credential.
//!
//! One `CredentialStore` is created per client and shared by `Arc` with the
//! pipeline. Reads and writes go through a tokio `RwLock`; a request racing a
//! refresh may observe either the old or the new token.
//!
//! Keychain access is synchronous, so writes to the backend run on tokio's
//! blocking pool.

use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;
use zeroize::Zeroize;

use super::keychain::{CredentialPersistence, MemoryPersistence};

/// Opaque bearer token. Expiry is only discovered through a 401.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

pub struct CredentialStore {
    current: RwLock<Option<Credential>>,
    persistence: Arc<dyn CredentialPersistence>,
}

impl CredentialStore {
    /// Create a store and restore any previously persisted credential.
    ///
    /// A failing backend is logged and treated as "no credential".
    pub fn load(persistence: Arc<dyn CredentialPersistence>) -> Self {
        let restored = match persistence.load() {
            Ok(token) => token.filter(|t| !t.is_empty()).map(Credential::new),
            Err(e) => {
                log::warn!("Failed to read stored credential: {}", e);
                None
            }
        };
        if restored.is_some() {
            log::info!("Restored access credential from storage");
        }
        Self {
            current: RwLock::new(restored),
            persistence,
        }
    }

    /// Store with no persistence beyond the process.
    pub fn in_memory() -> Self {
        Self::load(Arc::new(MemoryPersistence::default()))
    }

    pub async fn get(&self) -> Option<Credential> {
        self.current.read().await.clone()
    }

    /// Replace the current credential and persist it.
    pub async fn set(&self, credential: Credential) {
        let persistence = Arc::clone(&self.persistence);
        let token = credential.clone();
        let saved = tokio::task::spawn_blocking(move || persistence.save(token.as_str())).await;
        match saved {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("Failed to persist credential: {}", e),
            Err(e) => log::warn!("Credential persistence task failed: {}", e),
        }
        *self.current.write().await = Some(credential);
    }

    /// Drop the current credential from memory and storage.
    pub async fn clear(&self) {
        *self.current.write().await = None;
        let persistence = Arc::clone(&self.persistence);
        match tokio::task::spawn_blocking(move || persistence.clear()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("Failed to clear stored credential: {}", e),
            Err(e) => log::warn!("Credential persistence task failed: {}", e),
        }
    }

    pub async fn is_present(&self) -> bool {
        self.current.read().await.is_some()
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set_clear() {
        let store = CredentialStore::in_memory();
        assert!(store.get().await.is_none());

        store.set(Credential::new("t1")).await;
        assert_eq!(store.get().await, Some(Credential::new("t1")));

        store.set(Credential::new("t2")).await;
        assert_eq!(store.get().await.unwrap().as_str(), "t2");

        store.clear().await;
        assert!(!store.is_present().await);
    }

    #[tokio::test]
    async fn test_restores_and_persists() {
        let backend = Arc::new(MemoryPersistence::with_token("saved"));
        let store = CredentialStore::load(backend.clone());
        assert_eq!(store.get().await.unwrap().as_str(), "saved");

        store.set(Credential::new("fresh")).await;
        assert_eq!(backend.load().unwrap().as_deref(), Some("fresh"));

        store.clear().await;
        assert_eq!(backend.load().unwrap(), None);
    }

    struct FailingPersistence;

    impl CredentialPersistence for FailingPersistence {
        fn load(&self) -> Result<Option<String>, crate::api::keychain::KeychainError> {
            Ok(None)
        }

        fn save(&self, _token: &str) -> Result<(), crate::api::keychain::KeychainError> {
            panic!("keychain unavailable")
        }

        fn clear(&self) -> Result<(), crate::api::keychain::KeychainError> {
            panic!("keychain unavailable")
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_backend_failure_keeps_in_memory_credential() {
        let store = CredentialStore::load(Arc::new(FailingPersistence));
        store.set(Credential::new("t1")).await;
        assert_eq!(store.get().await.unwrap().as_str(), "t1");

        store.clear().await;
        assert!(!store.is_present().await);
    }

    #[test]
    fn test_credential_debug_redacted() {
        let rendered = format!("{:?}", Credential::new("super-secret"));
        assert!(!rendered.contains("super-secret"));
        assert_eq!(Credential::new("abc").bearer(), "Bearer abc");
    }
}
