//! In-memory repository for encrypted credentials.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::credential::{
    domain::{EncryptedSecret, OwnerId},
    ports::{CredentialRepository, CredentialRepositoryError, CredentialRepositoryResult},
};

/// Thread-safe in-memory credential repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialRepository {
    secrets: Arc<RwLock<HashMap<OwnerId, EncryptedSecret>>>,
}

impl InMemoryCredentialRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> CredentialRepositoryError {
    CredentialRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    async fn store(
        &self,
        owner_id: OwnerId,
        secret: &EncryptedSecret,
    ) -> CredentialRepositoryResult<()> {
        let mut secrets = self.secrets.write().map_err(lock_error)?;
        secrets.insert(owner_id, secret.clone());
        Ok(())
    }

    async fn find(&self, owner_id: OwnerId) -> CredentialRepositoryResult<Option<EncryptedSecret>> {
        let secrets = self.secrets.read().map_err(lock_error)?;
        Ok(secrets.get(&owner_id).cloned())
    }

    async fn remove(&self, owner_id: OwnerId) -> CredentialRepositoryResult<bool> {
        let mut secrets = self.secrets.write().map_err(lock_error)?;
        Ok(secrets.remove(&owner_id).is_some())
    }
}
