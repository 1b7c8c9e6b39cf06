//! Stores owner assets and serves them back through signed URLs.

use crate::asset::{
    domain::{ASSET_BUCKET, Asset, AssetDomainError, AssetId, AssetKind, AssetUpload, OwnerId},
    ports::{AssetRepository, AssetRepositoryError},
};
use crate::generation::{
    domain::SignedUrl,
    ports::{ObjectStore, ObjectStoreError},
    services::DEFAULT_SIGNED_URL_TTL,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Errors returned by [`AssetService`] operations.
#[derive(Debug, Error)]
pub enum AssetServiceError {
    /// The upload failed validation.
    #[error(transparent)]
    Invalid(#[from] AssetDomainError),
    /// No asset with this identifier belongs to the caller.
    #[error("asset not found: {0}")]
    NotFound(AssetId),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] AssetRepositoryError),
    /// Object store operation failed.
    #[error(transparent)]
    Storage(#[from] ObjectStoreError),
}

impl AssetServiceError {
    /// Returns a stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "invalid_asset",
            Self::NotFound(_) => "not_found",
            Self::Repository(_) | Self::Storage(_) => "internal",
        }
    }
}

/// Result type for asset service operations.
pub type AssetServiceResult<T> = Result<T, AssetServiceError>;

/// Bucket and URL lifetime used for assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSettings {
    /// Bucket receiving asset files.
    pub bucket: String,
    /// Lifetime of issued retrieval URLs.
    pub signed_url_ttl: Duration,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            bucket: ASSET_BUCKET.to_owned(),
            signed_url_ttl: DEFAULT_SIGNED_URL_TTL,
        }
    }
}

/// Asset as returned to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetView {
    /// Asset identifier.
    pub id: AssetId,
    /// Display name.
    pub name: String,
    /// Media type.
    pub file_type: AssetKind,
    /// Fresh retrieval URL, absent when one could not be issued.
    pub url: Option<SignedUrl>,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
}

/// Asset management service.
pub struct AssetService<R, S, C>
where
    R: AssetRepository,
    S: ObjectStore,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    store: Arc<S>,
    clock: Arc<C>,
    settings: AssetSettings,
}

impl<R, S, C> AssetService<R, S, C>
where
    R: AssetRepository,
    S: ObjectStore,
    C: Clock + Send + Sync,
{
    /// Creates a new asset service.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        store: Arc<S>,
        clock: Arc<C>,
        settings: AssetSettings,
    ) -> Self {
        Self {
            repository,
            store,
            clock,
            settings,
        }
    }

    /// Stores the file and records the asset.
    ///
    /// The file is uploaded before the record is written; when the write
    /// fails the file is removed again.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the upload fails and a repository error
    /// when the record cannot be written.
    pub async fn upload(
        &self,
        owner_id: OwnerId,
        upload: AssetUpload,
    ) -> AssetServiceResult<AssetView> {
        let asset = Asset::new(owner_id, &upload, &*self.clock)?;
        let size = upload.size();
        let bucket = self.settings.bucket.as_str();
        self.store
            .put(
                bucket,
                asset.storage_path(),
                upload.into_bytes(),
                asset.kind().content_type(),
            )
            .await?;
        if let Err(err) = self.repository.create(&asset).await {
            self.discard(&asset).await;
            return Err(err.into());
        }
        info!(
            asset_id = %asset.id(),
            owner_id = %owner_id,
            file_type = %asset.kind(),
            size,
            "asset uploaded"
        );
        Ok(self.view(&asset).await)
    }

    /// Lists the owner's assets, newest first, each with a fresh URL.
    ///
    /// # Errors
    ///
    /// Returns [`AssetServiceError::Repository`] when the listing fails.
    pub async fn list(&self, owner_id: OwnerId) -> AssetServiceResult<Vec<AssetView>> {
        let assets = self.repository.list_by_owner(owner_id).await?;
        let mut views = Vec::with_capacity(assets.len());
        for asset in &assets {
            views.push(self.view(asset).await);
        }
        Ok(views)
    }

    /// Removes one of the owner's assets.
    ///
    /// File removal is best-effort; the record is deleted regardless.
    ///
    /// # Errors
    ///
    /// Returns [`AssetServiceError::NotFound`] when the asset does not exist
    /// or belongs to another owner.
    pub async fn delete(&self, asset_id: AssetId, owner_id: OwnerId) -> AssetServiceResult<()> {
        let asset = self
            .repository
            .find_owned(asset_id, owner_id)
            .await?
            .ok_or(AssetServiceError::NotFound(asset_id))?;
        self.discard(&asset).await;
        if !self.repository.delete(asset_id, owner_id).await? {
            return Err(AssetServiceError::NotFound(asset_id));
        }
        info!(asset_id = %asset_id, owner_id = %owner_id, "asset deleted");
        Ok(())
    }

    async fn view(&self, asset: &Asset) -> AssetView {
        let url = match self
            .store
            .signed_url(
                &self.settings.bucket,
                asset.storage_path(),
                self.settings.signed_url_ttl,
            )
            .await
        {
            Ok(url) => Some(url),
            Err(err) => {
                warn!(asset_id = %asset.id(), error = %err, "asset url unavailable");
                None
            }
        };
        AssetView {
            id: asset.id(),
            name: asset.name().to_owned(),
            file_type: asset.kind(),
            url,
            created_at: asset.created_at(),
        }
    }

    async fn discard(&self, asset: &Asset) {
        if let Err(err) = self
            .store
            .delete(&self.settings.bucket, asset.storage_path())
            .await
        {
            warn!(asset_id = %asset.id(), error = %err, "failed to remove asset file");
        }
    }
}
