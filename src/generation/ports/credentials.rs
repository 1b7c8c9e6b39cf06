//! Port resolving an owner's generation credential at run time.

use crate::generation::domain::OwnerId;
use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::Arc;
use thiserror::Error;

/// Resolves the decrypted credential of an owner.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns the owner's credential, or `None` when none is stored.
    async fn resolve(
        &self,
        owner_id: OwnerId,
    ) -> Result<Option<SecretString>, CredentialLookupError>;
}

/// Failure while looking up or decrypting a credential.
#[derive(Debug, Clone, Error)]
#[error("credential lookup failed: {0}")]
pub struct CredentialLookupError(pub Arc<dyn std::error::Error + Send + Sync>);

impl CredentialLookupError {
    /// Wraps an underlying error.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}
