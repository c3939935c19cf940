//! Field-level encryption for outbound request bodies.
//!
//! A single pre-shared secret is stretched with HKDF into an AES-256-GCM key;
//! sensitive fields are sealed individually and carried as base64 strings.

pub mod aes;
pub mod fields;
pub mod kdf;
pub mod utils;

pub use fields::{CipherError, FieldCipher, SensitiveFieldSet, DEFAULT_SENSITIVE_FIELDS};
