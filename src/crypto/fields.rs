//! Selective encryption of sensitive request-body fields.
//!
//! Only the configured field names are touched. Each value is coerced to a
//! string, sealed with AES-256-GCM and base64-encoded, so the field keeps a
//! JSON string type on the wire.

use std::collections::BTreeSet;
use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{Map, Value};
use thiserror::Error;

use super::aes::{self, AesError, AES_KEY_SIZE};
use super::kdf::{self, KdfError};
use super::utils::clear_bytes;

/// Field names encrypted when no explicit list is configured.
pub const DEFAULT_SENSITIVE_FIELDS: [&str; 5] = [
    "password",
    "otp",
    "confirmPassword",
    "currentPassword",
    "newPassword",
];

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("Invalid encryption secret: {0}")]
    Key(#[from] KdfError),
    #[error("Failed to encrypt field '{field}': {source}")]
    Encrypt { field: String, source: AesError },
    #[error("Failed to decrypt field '{field}': {source}")]
    Decrypt { field: String, source: AesError },
    #[error("Field '{0}' is not valid base64 ciphertext")]
    Encoding(String),
    #[error("Field '{0}' did not decrypt to UTF-8 text")]
    Utf8(String),
}

/// Immutable set of request-body field names that must never cross the
/// transport boundary in plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensitiveFieldSet(BTreeSet<String>);

impl SensitiveFieldSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Parse a comma-separated list, ignoring blanks (e.g. `"password, otp"`).
    pub fn parse(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty()),
        )
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SensitiveFieldSet {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVE_FIELDS)
    }
}

/// Keyed transform over JSON field mappings.
///
/// Constructed once at startup from the pre-shared secret. The derived key
/// is wiped when the cipher is dropped.
pub struct FieldCipher {
    key: [u8; AES_KEY_SIZE],
    fields: SensitiveFieldSet,
}

impl FieldCipher {
    pub fn new(secret: &str, fields: SensitiveFieldSet) -> Result<Self, CipherError> {
        let key = kdf::derive_field_key(secret)?;
        Ok(Self { key, fields })
    }

    pub fn fields(&self) -> &SensitiveFieldSet {
        &self.fields
    }

    /// Encrypt a single value and return base64 ciphertext.
    pub fn encrypt_value(&self, plaintext: &str) -> Result<String, AesError> {
        aes::seal(plaintext.as_bytes(), &self.key).map(|sealed| BASE64.encode(sealed))
    }

    /// Return a copy of `body` with every present, non-empty sensitive field
    /// replaced by its ciphertext.
    pub fn encrypt_fields(&self, body: &Map<String, Value>) -> Result<Map<String, Value>, CipherError> {
        let mut out = body.clone();
        for field in self.fields.iter() {
            let Some(value) = out.get_mut(field) else {
                continue;
            };
            let Some(plaintext) = coerce_to_string(value) else {
                continue;
            };
            let ciphertext = self
                .encrypt_value(&plaintext)
                .map_err(|source| CipherError::Encrypt {
                    field: field.to_string(),
                    source,
                })?;
            *value = Value::String(ciphertext);
        }
        Ok(out)
    }

    /// Inverse of [`encrypt_fields`](Self::encrypt_fields). Decrypted values
    /// come back as JSON strings.
    pub fn decrypt_fields(&self, body: &Map<String, Value>) -> Result<Map<String, Value>, CipherError> {
        let mut out = body.clone();
        for field in self.fields.iter() {
            let Some(Value::String(encoded)) = out.get(field) else {
                continue;
            };
            if encoded.is_empty() {
                continue;
            }
            let sealed = BASE64
                .decode(encoded)
                .map_err(|_| CipherError::Encoding(field.to_string()))?;
            let plain = aes::unseal(&sealed, &self.key).map_err(|source| CipherError::Decrypt {
                field: field.to_string(),
                source,
            })?;
            let text = String::from_utf8(plain).map_err(|_| CipherError::Utf8(field.to_string()))?;
            out.insert(field.to_string(), Value::String(text));
        }
        Ok(out)
    }

    /// Apply [`encrypt_fields`](Self::encrypt_fields) to an arbitrary JSON
    /// body. Anything other than an object is returned unchanged.
    pub fn encrypt_body(&self, body: &Value) -> Result<Value, CipherError> {
        match body {
            Value::Object(map) => Ok(Value::Object(self.encrypt_fields(map)?)),
            other => Ok(other.clone()),
        }
    }
}

impl fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldCipher")
            .field("key", &"<redacted>")
            .field("fields", &self.fields)
            .finish()
    }
}

impl Drop for FieldCipher {
    fn drop(&mut self) {
        clear_bytes(&mut self.key);
    }
}

/// String form of a field value, or `None` when the value is null or empty.
fn coerce_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
