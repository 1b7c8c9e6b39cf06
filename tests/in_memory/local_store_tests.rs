//! Filesystem object storage with HMAC-signed retrieval URLs.

use std::sync::Arc;
use std::time::Duration;

use super::helpers::{ports_with, service_with};
use crate::support::{ManualClock, sample_request};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::TimeDelta;
use eyre::{ensure, eyre};
use paperjobs::generation::{
    adapters::{
        local::{LocalObjectStore, UrlVerificationError},
        memory::{InMemoryCredentialProvider, ScriptedGenerator},
    },
    domain::{JobStatus, OwnerId, SignedUrl, StoragePath},
    ports::{ObjectStore, ObjectStoreError},
    services::JobSettings,
};
use rstest::{fixture, rstest};
use tempfile::TempDir;

const BASE_URL: &str = "https://files.example.test/artifacts";
const TTL: Duration = Duration::from_secs(3600);

struct LocalStore {
    _root: TempDir,
    path: Utf8PathBuf,
    clock: Arc<ManualClock>,
    store: LocalObjectStore<ManualClock>,
}

#[fixture]
fn local() -> LocalStore {
    let root = tempfile::tempdir().expect("temporary directory");
    let path = Utf8Path::from_path(root.path())
        .expect("utf-8 temp path")
        .join("objects");
    let clock = Arc::new(ManualClock::default());
    let store = LocalObjectStore::open(&path, BASE_URL, vec![5_u8; 32], Arc::clone(&clock))
        .expect("open local store");
    LocalStore {
        _root: root,
        path,
        clock,
        store,
    }
}

struct UrlParts {
    bucket: String,
    path: String,
    expires: i64,
    signature: String,
}

fn split_url(url: &SignedUrl) -> eyre::Result<UrlParts> {
    let rest = url
        .as_str()
        .strip_prefix(BASE_URL)
        .and_then(|tail| tail.strip_prefix('/'))
        .ok_or_else(|| eyre!("unexpected url {url}"))?;
    let (location, query) = rest.split_once('?').ok_or_else(|| eyre!("no query in {url}"))?;
    let (bucket, path) = location
        .split_once('/')
        .ok_or_else(|| eyre!("no bucket in {url}"))?;
    let mut expires = None;
    let mut signature = None;
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some(("expires", value)) => expires = Some(value.parse::<i64>()?),
            Some(("signature", value)) => signature = Some(value.to_owned()),
            _ => {}
        }
    }
    Ok(UrlParts {
        bucket: bucket.to_owned(),
        path: path.to_owned(),
        expires: expires.ok_or_else(|| eyre!("missing expiry"))?,
        signature: signature.ok_or_else(|| eyre!("missing signature"))?,
    })
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stored_objects_get_verifiable_urls(local: LocalStore) -> eyre::Result<()> {
    let path = StoragePath::new("owner/job/final.png")?;
    local
        .store
        .put("generations", &path, b"png bytes".to_vec(), "image/png")
        .await?;
    ensure!(std::fs::read(local.path.join("generations/owner/job/final.png"))? == b"png bytes");

    let url = local.store.signed_url("generations", &path, TTL).await?;
    let parts = split_url(&url)?;
    ensure!(parts.bucket == "generations" && parts.path == path.as_str());
    local
        .store
        .verify(&parts.bucket, &parts.path, parts.expires, &parts.signature)?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn urls_expire_and_resist_tampering(local: LocalStore) -> eyre::Result<()> {
    let path = StoragePath::new("owner/job/thumbnail.png")?;
    local
        .store
        .put("generations", &path, vec![1, 2, 3], "image/png")
        .await?;
    let parts = split_url(&local.store.signed_url("generations", &path, TTL).await?)?;

    let tampered = local.store.verify(
        &parts.bucket,
        "other/job/thumbnail.png",
        parts.expires,
        &parts.signature,
    );
    ensure!(tampered == Err(UrlVerificationError::BadSignature));
    let extended = local.store.verify(
        &parts.bucket,
        &parts.path,
        parts.expires.saturating_add(60),
        &parts.signature,
    );
    ensure!(extended == Err(UrlVerificationError::BadSignature));

    local.clock.advance(TimeDelta::minutes(61));
    let expired = local
        .store
        .verify(&parts.bucket, &parts.path, parts.expires, &parts.signature);
    ensure!(expired == Err(UrlVerificationError::Expired));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleted_objects_cannot_be_signed(local: LocalStore) -> eyre::Result<()> {
    let path = StoragePath::new("owner/job/final.png")?;
    local
        .store
        .put("generations", &path, vec![9], "image/png")
        .await?;

    local.store.delete("generations", &path).await?;
    local.store.delete("generations", &path).await?;
    let result = local.store.signed_url("generations", &path, TTL).await;
    ensure!(matches!(result, Err(ObjectStoreError::NotFound { .. })));
    Ok(())
}

#[rstest]
#[case("")]
#[case(".")]
#[case("..")]
#[case("nested/bucket")]
#[tokio::test(flavor = "multi_thread")]
async fn bucket_names_must_be_single_segments(
    local: LocalStore,
    #[case] bucket: &str,
) -> eyre::Result<()> {
    let path = StoragePath::new("owner/job/final.png")?;
    let result = local.store.put(bucket, &path, vec![0], "image/png").await;
    ensure!(matches!(result, Err(ObjectStoreError::Backend(_))));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completed_jobs_link_to_local_files(local: LocalStore) -> eyre::Result<()> {
    let owner = OwnerId::new();
    let credentials = Arc::new(InMemoryCredentialProvider::new());
    credentials.grant(owner, "sk-local-0001");
    let store = Arc::new(local.store);
    let ports = ports_with(
        Arc::clone(&store),
        credentials,
        ScriptedGenerator::new().with_size(1200, 600),
        Arc::clone(&local.clock),
    );
    let service = service_with(ports, JobSettings::default());

    let job_id = service.submit(owner, sample_request()?).await?;
    service.executor().wait_idle().await;
    let view = service.status(job_id, owner).await?;
    ensure!(view.status == JobStatus::Completed);

    let thumbnail_url = view
        .thumbnail_url
        .ok_or_else(|| eyre!("missing thumbnail url"))?;
    let parts = split_url(&thumbnail_url)?;
    store.verify(&parts.bucket, &parts.path, parts.expires, &parts.signature)?;
    let thumbnail = image::open(local.path.join(&parts.bucket).join(&parts.path))?;
    ensure!(thumbnail.width() == 400 && thumbnail.height() == 200);
    Ok(())
}
