//! `PostgreSQL` repository implementation for asset records.

use super::{models::AssetRow, schema::custom_assets};
use crate::asset::{
    domain::{Asset, AssetId, AssetKind, OwnerId, PersistedAsset},
    ports::{AssetRepository, AssetRepositoryError, AssetRepositoryResult},
};
use crate::generation::{adapters::postgres::JobPgPool, domain::StoragePath};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed asset repository.
#[derive(Debug, Clone)]
pub struct PostgresAssetRepository {
    pool: JobPgPool,
}

impl PostgresAssetRepository {
    /// Creates a new repository sharing the job connection pool.
    #[must_use]
    pub const fn new(pool: JobPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> AssetRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> AssetRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(AssetRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(AssetRepositoryError::persistence)?
    }
}

fn to_row(asset: &Asset) -> AssetRow {
    AssetRow {
        id: asset.id().into_inner(),
        owner_id: asset.owner_id().into_inner(),
        name: asset.name().to_owned(),
        file_type: asset.kind().content_type().to_owned(),
        storage_path: asset.storage_path().as_str().to_owned(),
        created_at: asset.created_at(),
    }
}

fn row_to_asset(row: AssetRow) -> AssetRepositoryResult<Asset> {
    let kind: AssetKind = row
        .file_type
        .parse()
        .map_err(AssetRepositoryError::persistence)?;
    let storage_path =
        StoragePath::new(row.storage_path).map_err(AssetRepositoryError::persistence)?;
    Ok(Asset::from_persisted(PersistedAsset {
        id: AssetId::from_uuid(row.id),
        owner_id: OwnerId::from_uuid(row.owner_id),
        name: row.name,
        kind,
        storage_path,
        created_at: row.created_at,
    }))
}

#[async_trait]
impl AssetRepository for PostgresAssetRepository {
    async fn create(&self, asset: &Asset) -> AssetRepositoryResult<()> {
        let row = to_row(asset);
        let id = asset.id();
        self.run_blocking(move |connection| {
            diesel::insert_into(custom_assets::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        AssetRepositoryError::Duplicate(id)
                    }
                    other => AssetRepositoryError::persistence(other),
                })?;
            Ok(())
        })
        .await
    }

    async fn list_by_owner(&self, owner_id: OwnerId) -> AssetRepositoryResult<Vec<Asset>> {
        self.run_blocking(move |connection| {
            custom_assets::table
                .filter(custom_assets::owner_id.eq(owner_id.into_inner()))
                .order((custom_assets::created_at.desc(), custom_assets::id.desc()))
                .select(AssetRow::as_select())
                .load::<AssetRow>(connection)
                .map_err(AssetRepositoryError::persistence)?
                .into_iter()
                .map(row_to_asset)
                .collect()
        })
        .await
    }

    async fn find_owned(
        &self,
        id: AssetId,
        owner_id: OwnerId,
    ) -> AssetRepositoryResult<Option<Asset>> {
        self.run_blocking(move |connection| {
            custom_assets::table
                .filter(custom_assets::id.eq(id.into_inner()))
                .filter(custom_assets::owner_id.eq(owner_id.into_inner()))
                .select(AssetRow::as_select())
                .first::<AssetRow>(connection)
                .optional()
                .map_err(AssetRepositoryError::persistence)?
                .map(row_to_asset)
                .transpose()
        })
        .await
    }

    async fn delete(&self, id: AssetId, owner_id: OwnerId) -> AssetRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let removed = diesel::delete(
                custom_assets::table
                    .filter(custom_assets::id.eq(id.into_inner()))
                    .filter(custom_assets::owner_id.eq(owner_id.into_inner())),
            )
            .execute(connection)
            .map_err(AssetRepositoryError::persistence)?;
            Ok(removed > 0)
        })
        .await
    }
}
