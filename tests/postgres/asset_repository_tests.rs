//! Asset repository tests against `PostgreSQL`.

use chrono::TimeDelta;
use eyre::{bail, ensure};
use paperjobs::asset::{
    adapters::postgres::PostgresAssetRepository,
    domain::{Asset, AssetId, AssetKind, AssetUpload, OwnerId},
    ports::{AssetRepository, AssetRepositoryError},
};
use rstest::rstest;

use super::helpers::{TestDatabase, database};
use crate::support::ManualClock;

fn asset(owner: OwnerId, name: &str, clock: &ManualClock) -> eyre::Result<Asset> {
    let upload = AssetUpload::new(name, "image/svg+xml", Some("mark.svg"), b"<svg/>".to_vec())?;
    let created = Asset::new(owner, &upload, clock)?;
    clock.advance(TimeDelta::minutes(1));
    Ok(created)
}

#[rstest]
fn records_read_back_and_refuse_duplicate_ids(
    database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let db = database?;
    let repository = PostgresAssetRepository::new(db.pool.clone());
    let owner = OwnerId::new();
    let logo = asset(owner, "Brand mark", &ManualClock::default())?;

    db.block_on(repository.create(&logo))?;
    let repeated = db.block_on(repository.create(&logo));

    ensure!(matches!(repeated, Err(AssetRepositoryError::Duplicate(id)) if id == logo.id()));
    let Some(stored) = db.block_on(repository.find_owned(logo.id(), owner))? else {
        bail!("asset {} must be stored", logo.id());
    };
    ensure!(stored == logo);
    ensure!(stored.kind() == AssetKind::Svg);
    Ok(())
}

#[rstest]
fn listing_is_owner_scoped_and_newest_first(
    database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let db = database?;
    let repository = PostgresAssetRepository::new(db.pool.clone());
    let clock = ManualClock::default();
    let owner = OwnerId::new();
    let older = asset(owner, "Primary logo", &clock)?;
    let foreign = asset(OwnerId::new(), "Other logo", &clock)?;
    let newer = asset(owner, "Secondary logo", &clock)?;
    for record in [&older, &foreign, &newer] {
        db.block_on(repository.create(record))?;
    }

    let listed = db.block_on(repository.list_by_owner(owner))?;

    let ids: Vec<AssetId> = listed.iter().map(Asset::id).collect();
    ensure!(ids == vec![newer.id(), older.id()]);
    Ok(())
}

#[rstest]
fn lookups_and_deletes_ignore_other_owners(
    database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let db = database?;
    let repository = PostgresAssetRepository::new(db.pool.clone());
    let owner = OwnerId::new();
    let stranger = OwnerId::new();
    let logo = asset(owner, "Brand mark", &ManualClock::default())?;
    db.block_on(repository.create(&logo))?;

    ensure!(db.block_on(repository.find_owned(logo.id(), stranger))?.is_none());
    ensure!(!db.block_on(repository.delete(logo.id(), stranger))?);
    ensure!(db.block_on(repository.find_owned(logo.id(), owner))?.is_some());

    ensure!(db.block_on(repository.delete(logo.id(), owner))?);
    ensure!(db.block_on(repository.find_owned(logo.id(), owner))?.is_none());
    Ok(())
}
