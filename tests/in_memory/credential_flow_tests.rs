//! Encrypted credentials resolved by the job pipeline.

use std::sync::Arc;

use super::helpers::{ports_with, service_with};
use crate::support::{ManualClock, sample_request};
use eyre::ensure;
use paperjobs::credential::{
    adapters::{
        cipher::{AesGcmCipher, ENCRYPTION_KEY_LEN},
        memory::InMemoryCredentialRepository,
    },
    services::CredentialService,
};
use paperjobs::generation::{
    adapters::memory::{InMemoryObjectStore, ScriptedGenerator},
    domain::{JobStatus, OwnerId},
    services::{JobServiceError, JobSettings},
};
use rstest::{fixture, rstest};

type Credentials = CredentialService<InMemoryCredentialRepository, AesGcmCipher>;

#[fixture]
fn credentials() -> Arc<Credentials> {
    let cipher = AesGcmCipher::from_key(&[42_u8; ENCRYPTION_KEY_LEN]).expect("valid key");
    Arc::new(CredentialService::new(
        Arc::new(InMemoryCredentialRepository::new()),
        Arc::new(cipher),
    ))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn saved_credential_lets_jobs_run(credentials: Arc<Credentials>) -> eyre::Result<()> {
    let owner = OwnerId::new();
    let ports = ports_with(
        Arc::new(InMemoryObjectStore::new()),
        Arc::clone(&credentials),
        ScriptedGenerator::new(),
        Arc::new(ManualClock::default()),
    );
    let service = service_with(ports, JobSettings::default());

    let rejected = service.submit(owner, sample_request()?).await;
    ensure!(matches!(rejected, Err(JobServiceError::CredentialMissing)));

    credentials.save(owner, "sk-proj-integration-01").await?;
    let job_id = service.submit(owner, sample_request()?).await?;
    service.executor().wait_idle().await;

    let view = service.status(job_id, owner).await?;
    ensure!(view.status == JobStatus::Completed, "job ended as {}", view.status);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn removed_credential_blocks_new_jobs(credentials: Arc<Credentials>) -> eyre::Result<()> {
    let owner = OwnerId::new();
    let ports = ports_with(
        Arc::new(InMemoryObjectStore::new()),
        Arc::clone(&credentials),
        ScriptedGenerator::new(),
        Arc::new(ManualClock::default()),
    );
    let service = service_with(ports, JobSettings::default());
    credentials.save(owner, "sk-proj-integration-02").await?;
    credentials.remove(owner).await?;

    let result = service.submit(owner, sample_request()?).await;
    ensure!(matches!(result, Err(JobServiceError::CredentialMissing)));
    ensure!(!credentials.status(owner).await?.has_key);
    Ok(())
}
