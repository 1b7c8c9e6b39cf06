//! Symmetric encryption port for credentials at rest.

use crate::credential::domain::EncryptedSecret;
use secrecy::SecretString;
use thiserror::Error;

/// Encrypts credentials before storage and decrypts them at use.
pub trait SecretCipher: Send + Sync {
    /// Encrypts `plaintext`.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Encrypt`] when encryption fails.
    fn encrypt(&self, plaintext: &str) -> Result<EncryptedSecret, CipherError>;

    /// Decrypts a stored secret.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Decrypt`] when the ciphertext is malformed,
    /// was produced under another key, or is not UTF-8.
    fn decrypt(&self, secret: &EncryptedSecret) -> Result<SecretString, CipherError>;
}

/// Errors returned by cipher implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CipherError {
    /// The key material is unusable.
    #[error("invalid encryption key: {0}")]
    InvalidKey(String),
    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encrypt(String),
    /// Decryption failed.
    #[error("decryption failed: {0}")]
    Decrypt(String),
}
