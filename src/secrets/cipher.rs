//! Envelope encryption for the settings blob.
//!
//! The envelope is a single line, `coach-secrets:v1:<nonce>:<ciphertext>`,
//! with both parts URL-safe base64 without padding. The payload is sealed with
//! ChaCha20-Poly1305, so a wrong key or a flipped byte fails authentication
//! instead of yielding garbled plaintext.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chacha20poly1305::aead::Aead;
use chacha20poly1305::{ChaCha20Poly1305, KeyInit, Nonce};
use sha2::{Digest, Sha256};

const ENVELOPE_PREFIX: &str = "coach-secrets:v1:";
const NONCE_LEN: usize = 12;

/// A 256-bit symmetric key derived from the server secret.
///
/// The key is never persisted and never printed.
#[derive(Clone)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    /// Derive a key from the configured server secret.
    ///
    /// # Errors
    ///
    /// Returns [`super::SecretsError::MissingKey`] when the secret is empty.
    pub fn new(secret: &str) -> Result<Self, super::SecretsError> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(super::SecretsError::MissingKey);
        }
        Ok(Self(Sha256::digest(secret.as_bytes()).into()))
    }

    /// Derive a key from an optional config value, treating `None` as missing.
    pub fn from_config(secret: Option<&str>) -> Result<Self, super::SecretsError> {
        Self::new(secret.unwrap_or_default())
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// Why an envelope could not be opened. Only used for logging.
#[derive(Debug, thiserror::Error)]
pub(crate) enum OpenError {
    #[error("envelope prefix missing")]
    BadPrefix,
    #[error("envelope is malformed")]
    Malformed,
    #[error("authentication failed (wrong key or corrupted data)")]
    Authentication,
}

/// Encrypt `plaintext` into an envelope string.
pub(crate) fn seal(key: &SecretKey, plaintext: &[u8]) -> Result<String, super::SecretsError> {
    let nonce_bytes: [u8; NONCE_LEN] = rand::random();
    let nonce = Nonce::from_slice(&nonce_bytes);
    let aead = ChaCha20Poly1305::new_from_slice(&key.0)
        .map_err(|e| super::SecretsError::Encrypt(e.to_string()))?;
    let ciphertext = aead
        .encrypt(nonce, plaintext)
        .map_err(|e| super::SecretsError::Encrypt(e.to_string()))?;

    Ok(format!(
        "{ENVELOPE_PREFIX}{}:{}",
        URL_SAFE_NO_PAD.encode(nonce_bytes),
        URL_SAFE_NO_PAD.encode(ciphertext)
    ))
}

/// Decrypt an envelope produced by [`seal`].
pub(crate) fn open(key: &SecretKey, envelope: &str) -> Result<Vec<u8>, OpenError> {
    let body = envelope
        .trim()
        .strip_prefix(ENVELOPE_PREFIX)
        .ok_or(OpenError::BadPrefix)?;
    let (nonce_b64, ciphertext_b64) = body.split_once(':').ok_or(OpenError::Malformed)?;

    let nonce_raw = URL_SAFE_NO_PAD
        .decode(nonce_b64.as_bytes())
        .map_err(|_| OpenError::Malformed)?;
    if nonce_raw.len() != NONCE_LEN {
        return Err(OpenError::Malformed);
    }
    let ciphertext = URL_SAFE_NO_PAD
        .decode(ciphertext_b64.as_bytes())
        .map_err(|_| OpenError::Malformed)?;

    let aead = ChaCha20Poly1305::new_from_slice(&key.0).map_err(|_| OpenError::Malformed)?;
    aead.decrypt(Nonce::from_slice(&nonce_raw), ciphertext.as_slice())
        .map_err(|_| OpenError::Authentication)
}
