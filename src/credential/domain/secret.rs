//! Ciphertext of a stored credential.

use super::CredentialDomainError;
use serde::{Deserialize, Serialize};

/// Opaque, encoded ciphertext of an owner's credential.
///
/// Only a [`SecretCipher`](crate::credential::ports::SecretCipher) can turn it
/// back into plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedSecret(String);

impl EncryptedSecret {
    /// Wraps encoded ciphertext read from storage or produced by a cipher.
    #[must_use]
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Returns the encoded ciphertext.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Trims a submitted key and rejects it when nothing remains.
///
/// # Errors
///
/// Returns [`CredentialDomainError::EmptySecret`] for blank input.
pub fn validate_plaintext(plaintext: &str) -> Result<&str, CredentialDomainError> {
    let trimmed = plaintext.trim();
    if trimmed.is_empty() {
        return Err(CredentialDomainError::EmptySecret);
    }
    Ok(trimmed)
}
