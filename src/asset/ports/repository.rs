//! Repository port for asset records.

use crate::asset::domain::{Asset, AssetId, OwnerId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for asset repository operations.
pub type AssetRepositoryResult<T> = Result<T, AssetRepositoryError>;

/// Asset record persistence contract. Every read and delete is scoped by
/// owner.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Inserts a new asset record.
    ///
    /// # Errors
    ///
    /// Returns [`AssetRepositoryError::Duplicate`] when the identifier is
    /// already stored.
    async fn create(&self, asset: &Asset) -> AssetRepositoryResult<()>;

    /// Lists the owner's assets, newest first.
    async fn list_by_owner(&self, owner_id: OwnerId) -> AssetRepositoryResult<Vec<Asset>>;

    /// Finds an asset that belongs to `owner_id`.
    async fn find_owned(
        &self,
        id: AssetId,
        owner_id: OwnerId,
    ) -> AssetRepositoryResult<Option<Asset>>;

    /// Deletes an owned asset record and returns whether one was removed.
    async fn delete(&self, id: AssetId, owner_id: OwnerId) -> AssetRepositoryResult<bool>;
}

/// Errors returned by asset repository implementations.
#[derive(Debug, Clone, Error)]
pub enum AssetRepositoryError {
    /// An asset with this identifier already exists.
    #[error("duplicate asset identifier: {0}")]
    Duplicate(AssetId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl AssetRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
