//! AES-256-GCM codec for webhook authorization parameters at rest.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ruleflow_application::WebhookSecretDecryptor;
use ruleflow_core::{AppError, AppResult};

const NONCE_LEN: usize = 12;

/// AES-256-GCM codec storing `base64(nonce || ciphertext)`.
#[derive(Clone)]
pub struct AesSecretEncryptor {
    cipher: Aes256Gcm,
}

impl AesSecretEncryptor {
    /// Creates a new encryptor from a 32-byte key.
    #[must_use]
    pub fn new(key_bytes: &[u8; 32]) -> Self {
        let cipher = Aes256Gcm::new(key_bytes.into());
        Self { cipher }
    }

    /// Creates a new encryptor from a hex-encoded 32-byte key.
    pub fn from_hex(hex_key: &str) -> AppResult<Self> {
        let decoded = hex::decode(hex_key.trim()).map_err(|error| {
            AppError::Validation(format!("invalid RULEFLOW_WEBHOOK_SECRET_KEY hex: {error}"))
        })?;

        let key: [u8; 32] = decoded.try_into().map_err(|_| {
            AppError::Validation(
                "RULEFLOW_WEBHOOK_SECRET_KEY must be exactly 32 bytes (64 hex chars)".to_owned(),
            )
        })?;
        Ok(Self::new(&key))
    }

    /// Encrypts a plaintext parameter into its stored form.
    pub fn encrypt_parameter(&self, plaintext: &str) -> AppResult<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|error| AppError::Internal(format!("failed to encrypt secret: {error}")))?;

        let mut stored = Vec::with_capacity(nonce.len() + ciphertext.len());
        stored.extend_from_slice(&nonce);
        stored.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(stored))
    }
}

impl WebhookSecretDecryptor for AesSecretEncryptor {
    fn decrypt_parameter(&self, encoded: &str) -> AppResult<String> {
        let stored = STANDARD.decode(encoded.trim()).map_err(|error| {
            AppError::Validation(format!("secret is not valid base64: {error}"))
        })?;
        if stored.len() <= NONCE_LEN {
            return Err(AppError::Validation(
                "ciphertext too short: missing nonce".to_owned(),
            ));
        }

        let (nonce_bytes, encrypted) = stored.split_at(NONCE_LEN);
        let nonce_array: [u8; NONCE_LEN] = nonce_bytes
            .try_into()
            .map_err(|_| AppError::Internal("nonce must be exactly 12 bytes".to_owned()))?;
        let nonce = Nonce::from(nonce_array);

        let plaintext = self
            .cipher
            .decrypt(&nonce, encrypted)
            .map_err(|error| AppError::Internal(format!("failed to decrypt secret: {error}")))?;

        String::from_utf8(plaintext)
            .map_err(|error| AppError::Internal(format!("decrypted secret is not utf-8: {error}")))
    }
}
