//! Saves, reports, removes, and resolves per-owner generation credentials.

use crate::credential::{
    domain::{
        CredentialDomainError, CredentialStatus, OwnerId, UNREADABLE_PREVIEW, key_preview,
        validate_plaintext,
    },
    ports::{CipherError, CredentialRepository, CredentialRepositoryError, SecretCipher},
};
use crate::generation::ports::{CredentialLookupError, CredentialProvider};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Service-level errors for credential operations.
#[derive(Debug, Error)]
pub enum CredentialServiceError {
    /// Input validation failed.
    #[error(transparent)]
    Domain(#[from] CredentialDomainError),
    /// Encryption or decryption failed.
    #[error(transparent)]
    Cipher(#[from] CipherError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] CredentialRepositoryError),
}

/// Result type for credential service operations.
pub type CredentialServiceResult<T> = Result<T, CredentialServiceError>;

/// Credential management service.
#[derive(Clone)]
pub struct CredentialService<R, X>
where
    R: CredentialRepository,
    X: SecretCipher,
{
    repository: Arc<R>,
    cipher: Arc<X>,
}

impl<R, X> CredentialService<R, X>
where
    R: CredentialRepository,
    X: SecretCipher,
{
    /// Creates a new credential service.
    #[must_use]
    pub const fn new(repository: Arc<R>, cipher: Arc<X>) -> Self {
        Self { repository, cipher }
    }

    /// Encrypts and stores the owner's key, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialServiceError::Domain`] for a blank key, or a
    /// cipher or repository error when storing fails.
    pub async fn save(
        &self,
        owner_id: OwnerId,
        plaintext: &str,
    ) -> CredentialServiceResult<CredentialStatus> {
        let key = validate_plaintext(plaintext)?;
        let encrypted = self.cipher.encrypt(key)?;
        self.repository.store(owner_id, &encrypted).await?;
        info!(owner_id = %owner_id, "credential saved");
        Ok(CredentialStatus::present(key_preview(key)))
    }

    /// Reports whether the owner has a key and its masked preview.
    ///
    /// A stored key that no longer decrypts is reported with a fully masked
    /// preview rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialServiceError::Repository`] when the lookup fails.
    pub async fn status(&self, owner_id: OwnerId) -> CredentialServiceResult<CredentialStatus> {
        let Some(encrypted) = self.repository.find(owner_id).await? else {
            return Ok(CredentialStatus::absent());
        };
        let preview = match self.cipher.decrypt(&encrypted) {
            Ok(secret) => key_preview(secret.expose_secret()),
            Err(err) => {
                warn!(owner_id = %owner_id, error = %err, "stored credential is unreadable");
                UNREADABLE_PREVIEW.to_owned()
            }
        };
        Ok(CredentialStatus::present(preview))
    }

    /// Removes the owner's key; removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialServiceError::Repository`] when the removal fails.
    pub async fn remove(&self, owner_id: OwnerId) -> CredentialServiceResult<()> {
        if self.repository.remove(owner_id).await? {
            info!(owner_id = %owner_id, "credential removed");
        }
        Ok(())
    }

    /// Returns the owner's decrypted key, or `None` when none is stored.
    ///
    /// # Errors
    ///
    /// Returns a cipher or repository error when the key cannot be read.
    pub async fn resolve(
        &self,
        owner_id: OwnerId,
    ) -> CredentialServiceResult<Option<SecretString>> {
        let Some(encrypted) = self.repository.find(owner_id).await? else {
            return Ok(None);
        };
        Ok(Some(self.cipher.decrypt(&encrypted)?))
    }
}

#[async_trait]
impl<R, X> CredentialProvider for CredentialService<R, X>
where
    R: CredentialRepository,
    X: SecretCipher,
{
    async fn resolve(
        &self,
        owner_id: OwnerId,
    ) -> Result<Option<SecretString>, CredentialLookupError> {
        Self::resolve(self, owner_id)
            .await
            .map_err(CredentialLookupError::new)
    }
}
