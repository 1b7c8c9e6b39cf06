//! In-memory credential provider keyed by owner.

use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::generation::{
    domain::OwnerId,
    ports::{CredentialLookupError, CredentialProvider},
};

/// Thread-safe provider holding plaintext keys per owner.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialProvider {
    keys: Arc<RwLock<HashMap<OwnerId, String>>>,
}

impl InMemoryCredentialProvider {
    /// Creates a provider with no keys.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `key` for `owner_id`.
    pub fn grant(&self, owner_id: OwnerId, key: impl Into<String>) {
        if let Ok(mut keys) = self.keys.write() {
            keys.insert(owner_id, key.into());
        }
    }

    /// Removes the key of `owner_id`.
    pub fn revoke(&self, owner_id: OwnerId) {
        if let Ok(mut keys) = self.keys.write() {
            keys.remove(&owner_id);
        }
    }
}

#[async_trait]
impl CredentialProvider for InMemoryCredentialProvider {
    async fn resolve(
        &self,
        owner_id: OwnerId,
    ) -> Result<Option<SecretString>, CredentialLookupError> {
        let keys = self.keys.read().map_err(|err| {
            CredentialLookupError::new(std::io::Error::other(err.to_string()))
        })?;
        Ok(keys
            .get(&owner_id)
            .map(|key| SecretString::from(key.clone())))
    }
}
