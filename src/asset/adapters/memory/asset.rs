//! In-memory repository for asset records.

use async_trait::async_trait;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::asset::{
    domain::{Asset, AssetId, OwnerId},
    ports::{AssetRepository, AssetRepositoryError, AssetRepositoryResult},
};

/// Thread-safe in-memory asset repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssetRepository {
    assets: Arc<RwLock<HashMap<AssetId, Asset>>>,
}

impl InMemoryAssetRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> AssetRepositoryError {
    AssetRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl AssetRepository for InMemoryAssetRepository {
    async fn create(&self, asset: &Asset) -> AssetRepositoryResult<()> {
        let mut assets = self.assets.write().map_err(lock_error)?;
        if assets.contains_key(&asset.id()) {
            return Err(AssetRepositoryError::Duplicate(asset.id()));
        }
        assets.insert(asset.id(), asset.clone());
        Ok(())
    }

    async fn list_by_owner(&self, owner_id: OwnerId) -> AssetRepositoryResult<Vec<Asset>> {
        let assets = self.assets.read().map_err(lock_error)?;
        let mut owned: Vec<Asset> = assets
            .values()
            .filter(|asset| asset.owner_id() == owner_id)
            .cloned()
            .collect();
        owned.sort_by_key(|asset| Reverse(asset.created_at()));
        Ok(owned)
    }

    async fn find_owned(
        &self,
        id: AssetId,
        owner_id: OwnerId,
    ) -> AssetRepositoryResult<Option<Asset>> {
        let assets = self.assets.read().map_err(lock_error)?;
        Ok(assets
            .get(&id)
            .filter(|asset| asset.owner_id() == owner_id)
            .cloned())
    }

    async fn delete(&self, id: AssetId, owner_id: OwnerId) -> AssetRepositoryResult<bool> {
        let mut assets = self.assets.write().map_err(lock_error)?;
        let owned = assets
            .get(&id)
            .is_some_and(|asset| asset.owner_id() == owner_id);
        if owned {
            assets.remove(&id);
        }
        Ok(owned)
    }
}
