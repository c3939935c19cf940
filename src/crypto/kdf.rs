//! HKDF-SHA256 derivation of the field-encryption key.
//!
//! The pre-shared secret is an arbitrary string loaded from configuration.
//! It is stretched into a 256-bit AES key once at startup:
//!
//!   secret (utf-8 bytes)
//!     -> HKDF-SHA256(salt="SecureApiClient-v1", info="field-cipher-v1")
//!     -> 32-byte AES-256-GCM key

use hkdf::Hkdf;
use sha2::Sha256;
use thiserror::Error;

use super::aes::AES_KEY_SIZE;

const HKDF_SALT: &[u8] = b"SecureApiClient-v1";

const FIELD_CIPHER_INFO: &[u8] = b"field-cipher-v1";

#[derive(Debug, Error)]
pub enum KdfError {
    #[error("Encryption secret is empty")]
    EmptySecret,
    #[error("HKDF derivation failed")]
    DerivationFailed,
}

/// Derive the AES key used for sensitive request fields.
///
/// Deterministic: the same secret always yields the same key, so a backend
/// holding the same secret can open the values.
pub fn derive_field_key(secret: &str) -> Result<[u8; AES_KEY_SIZE], KdfError> {
    if secret.is_empty() {
        return Err(KdfError::EmptySecret);
    }

    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), secret.as_bytes());
    let mut okm = [0u8; AES_KEY_SIZE];
    hk.expand(FIELD_CIPHER_INFO, &mut okm)
        .map_err(|_| KdfError::DerivationFailed)?;
    Ok(okm)
}
