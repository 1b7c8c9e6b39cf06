//! Repository port for encrypted credential persistence.

use crate::credential::domain::{EncryptedSecret, OwnerId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for credential repository operations.
pub type CredentialRepositoryResult<T> = Result<T, CredentialRepositoryError>;

/// Encrypted credential persistence contract, one secret per owner.
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Stores or replaces the owner's encrypted secret.
    async fn store(
        &self,
        owner_id: OwnerId,
        secret: &EncryptedSecret,
    ) -> CredentialRepositoryResult<()>;

    /// Returns the owner's encrypted secret, if any.
    async fn find(&self, owner_id: OwnerId) -> CredentialRepositoryResult<Option<EncryptedSecret>>;

    /// Removes the owner's secret and returns whether one was stored.
    async fn remove(&self, owner_id: OwnerId) -> CredentialRepositoryResult<bool>;
}

/// Errors returned by credential repository implementations.
#[derive(Debug, Clone, Error)]
pub enum CredentialRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl CredentialRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
