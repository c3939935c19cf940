//! AES-256-GCM sealing for individual field values.
//!
//! Sealed format: IV (12 bytes) || Ciphertext || Auth Tag (16 bytes)

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use thiserror::Error;

use super::utils::generate_iv;

/// AES-256-GCM key size in bytes (256 bits).
pub const AES_KEY_SIZE: usize = 32;

/// AES-GCM IV size in bytes (96 bits).
pub const AES_IV_SIZE: usize = 12;

/// AES-GCM authentication tag size in bytes (128 bits).
pub const AES_TAG_SIZE: usize = 16;

/// Minimum sealed data size: IV + auth tag (empty plaintext).
const MIN_SEALED_SIZE: usize = AES_IV_SIZE + AES_TAG_SIZE;

#[derive(Debug, Error)]
pub enum AesError {
    #[error("Encryption failed")]
    EncryptionFailed,
    #[error("Decryption failed")]
    DecryptionFailed,
    #[error("Sealed value too short ({0} bytes)")]
    TooShort(usize),
}

/// Seal a plaintext under `key` with a freshly generated IV.
pub fn seal(plaintext: &[u8], key: &[u8; AES_KEY_SIZE]) -> Result<Vec<u8>, AesError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| AesError::EncryptionFailed)?;
    let iv = generate_iv();

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|_| AesError::EncryptionFailed)?;

    let mut sealed = Vec::with_capacity(AES_IV_SIZE + ciphertext.len());
    sealed.extend_from_slice(&iv);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Open a value produced by [`seal`].
///
/// Fails if the input is truncated, was sealed under a different key,
/// or has been tampered with.
pub fn unseal(sealed: &[u8], key: &[u8; AES_KEY_SIZE]) -> Result<Vec<u8>, AesError> {
    if sealed.len() < MIN_SEALED_SIZE {
        return Err(AesError::TooShort(sealed.len()));
    }

    let (iv, ciphertext) = sealed.split_at(AES_IV_SIZE);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| AesError::DecryptionFailed)?;

    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| AesError::DecryptionFailed)
}
