//! Credential repository tests against `PostgreSQL`.

use std::sync::Arc;

use eyre::ensure;
use paperjobs::credential::{
    adapters::postgres::PostgresCredentialRepository,
    domain::{EncryptedSecret, OwnerId},
    ports::CredentialRepository,
};
use rstest::rstest;

use super::helpers::{TestDatabase, database};
use crate::support::ManualClock;

#[rstest]
fn storing_twice_keeps_only_the_latest_secret(
    database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let db = database?;
    let repository =
        PostgresCredentialRepository::new(db.pool.clone(), Arc::new(ManualClock::default()));
    let owner = OwnerId::new();

    db.block_on(repository.store(owner, &EncryptedSecret::new("nonce-a:cipher-a")))?;
    db.block_on(repository.store(owner, &EncryptedSecret::new("nonce-b:cipher-b")))?;

    let stored = db.block_on(repository.find(owner))?;
    ensure!(stored == Some(EncryptedSecret::new("nonce-b:cipher-b")));
    ensure!(db.block_on(repository.find(OwnerId::new()))?.is_none());
    Ok(())
}

#[rstest]
fn removal_reports_whether_a_secret_existed(
    database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let db = database?;
    let repository =
        PostgresCredentialRepository::new(db.pool.clone(), Arc::new(ManualClock::default()));
    let owner = OwnerId::new();
    db.block_on(repository.store(owner, &EncryptedSecret::new("nonce:cipher")))?;

    ensure!(db.block_on(repository.remove(owner))?);
    ensure!(db.block_on(repository.find(owner))?.is_none());
    ensure!(!db.block_on(repository.remove(owner))?);
    Ok(())
}
