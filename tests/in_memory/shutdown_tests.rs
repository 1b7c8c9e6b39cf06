//! Shutdown drains running jobs and fails queued ones.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use super::helpers::{ports_with, service_with, wait_for_status};
use crate::support::{ManualClock, sample_request};
use eyre::ensure;
use paperjobs::generation::{
    adapters::memory::{InMemoryCredentialProvider, InMemoryObjectStore, ScriptedGenerator},
    domain::{JobStatus, OwnerId},
    services::{JobServiceError, JobSettings},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn shutdown_fails_queued_jobs_and_finishes_running_ones() -> eyre::Result<()> {
    let owner = OwnerId::new();
    let credentials = Arc::new(InMemoryCredentialProvider::new());
    credentials.grant(owner, "sk-shutdown-0001");
    let (generator, release) = ScriptedGenerator::new().held();
    let ports = ports_with(
        Arc::new(InMemoryObjectStore::new()),
        credentials,
        generator.clone(),
        Arc::new(ManualClock::default()),
    );
    let settings = JobSettings {
        max_concurrent_jobs: NonZeroUsize::MIN,
        ..JobSettings::default()
    };
    let service = service_with(ports, settings);

    let running = service.submit(owner, sample_request()?).await?;
    let queued = service.submit(owner, sample_request()?).await?;
    ensure!(wait_for_status(&service, running, owner, JobStatus::Running).await?);
    while generator.calls() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let draining = {
        let executor = service.executor().clone();
        tokio::spawn(async move { executor.shutdown().await })
    };
    ensure!(wait_for_status(&service, queued, owner, JobStatus::Failed).await?);
    let queued_view = service.status(queued, owner).await?;
    ensure!(
        queued_view.error_message.as_deref()
            == Some("cancelled before execution: service shutting down")
    );

    let late = service.submit(owner, sample_request()?).await;
    ensure!(matches!(late, Err(JobServiceError::ShuttingDown)));

    release.release(1);
    draining.await?;
    ensure!(service.status(running, owner).await?.status == JobStatus::Completed);
    ensure!(service.executor().in_flight() == 0);
    Ok(())
}
