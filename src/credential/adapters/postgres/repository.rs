//! `PostgreSQL` repository implementation for encrypted credentials.

use super::{models::CredentialRow, schema::owner_credentials};
use crate::credential::{
    domain::{EncryptedSecret, OwnerId},
    ports::{CredentialRepository, CredentialRepositoryError, CredentialRepositoryResult},
};
use crate::generation::adapters::postgres::JobPgPool;
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use mockable::Clock;
use std::sync::Arc;

/// `PostgreSQL`-backed credential repository.
#[derive(Clone)]
pub struct PostgresCredentialRepository<C: Clock + Send + Sync> {
    pool: JobPgPool,
    clock: Arc<C>,
}

impl<C: Clock + Send + Sync> PostgresCredentialRepository<C> {
    /// Creates a new repository sharing the job connection pool.
    #[must_use]
    pub const fn new(pool: JobPgPool, clock: Arc<C>) -> Self {
        Self { pool, clock }
    }

    async fn run_blocking<F, T>(&self, f: F) -> CredentialRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> CredentialRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(CredentialRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(CredentialRepositoryError::persistence)?
    }
}

#[async_trait]
impl<C: Clock + Send + Sync> CredentialRepository for PostgresCredentialRepository<C> {
    async fn store(
        &self,
        owner_id: OwnerId,
        secret: &EncryptedSecret,
    ) -> CredentialRepositoryResult<()> {
        let row = CredentialRow {
            owner_id: owner_id.into_inner(),
            encrypted_secret: secret.as_str().to_owned(),
            updated_at: self.clock.utc(),
        };
        self.run_blocking(move |connection| {
            diesel::insert_into(owner_credentials::table)
                .values(&row)
                .on_conflict(owner_credentials::owner_id)
                .do_update()
                .set(&row)
                .execute(connection)
                .map_err(CredentialRepositoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn find(&self, owner_id: OwnerId) -> CredentialRepositoryResult<Option<EncryptedSecret>> {
        self.run_blocking(move |connection| {
            let row = owner_credentials::table
                .filter(owner_credentials::owner_id.eq(owner_id.into_inner()))
                .select(CredentialRow::as_select())
                .first::<CredentialRow>(connection)
                .optional()
                .map_err(CredentialRepositoryError::persistence)?;
            Ok(row.map(|found| EncryptedSecret::new(found.encrypted_secret)))
        })
        .await
    }

    async fn remove(&self, owner_id: OwnerId) -> CredentialRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let removed = diesel::delete(
                owner_credentials::table
                    .filter(owner_credentials::owner_id.eq(owner_id.into_inner())),
            )
            .execute(connection)
            .map_err(CredentialRepositoryError::persistence)?;
            Ok(removed > 0)
        })
        .await
    }
}
