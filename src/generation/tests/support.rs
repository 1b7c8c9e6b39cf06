//! Shared fixtures for generation unit tests.

use crate::generation::{
    adapters::memory::InMemoryJobRepository,
    domain::{
        GalleryQuery, GenerationRequest, Job, JobDomainError, JobId, JobUpdate, JobUpdateKind,
        NewJob, OwnerId,
    },
    ports::{JobPage, JobRepository, JobRepositoryError, JobRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use image::{DynamicImage, ImageFormat, RgbImage};
use mockable::Clock;
use std::io::{self, Cursor};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::starting_at(
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
                .single()
                .unwrap_or_default(),
        )
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn sample_request() -> Result<GenerationRequest, JobDomainError> {
    GenerationRequest::new(
        "We train a transformer on 10k annotated scans.",
        "Show the data flow from scans to predictions",
    )
}

pub fn png_bytes(width: u32, height: u32) -> eyre::Result<Vec<u8>> {
    let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
    let mut encoded = Cursor::new(Vec::new());
    image.write_to(&mut encoded, ImageFormat::Png)?;
    Ok(encoded.into_inner())
}

/// In-memory repository with scripted faults on the `running` write and an
/// optional pause between counting and returning the count.
#[derive(Default)]
pub struct FaultyRepository {
    inner: InMemoryJobRepository,
    rejected_started: AtomicUsize,
    unacknowledged_started: AtomicUsize,
    count_pause: Duration,
}

impl FaultyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the next `times` `running` writes without applying them.
    pub fn failing_started_writes(self, times: usize) -> Self {
        self.rejected_started.store(times, Ordering::SeqCst);
        self
    }

    /// Applies the next `times` `running` writes but reports them as failed.
    pub fn losing_started_acks(self, times: usize) -> Self {
        self.unacknowledged_started.store(times, Ordering::SeqCst);
        self
    }

    pub fn pausing_after_count(mut self, pause: Duration) -> Self {
        self.count_pause = pause;
        self
    }

    pub const fn inner(&self) -> &InMemoryJobRepository {
        &self.inner
    }
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
        .is_ok()
}

fn connection_reset() -> JobRepositoryError {
    JobRepositoryError::persistence(io::Error::other("connection reset by peer"))
}

#[async_trait]
impl JobRepository for FaultyRepository {
    async fn create(&self, new_job: &NewJob) -> JobRepositoryResult<Job> {
        self.inner.create(new_job).await
    }

    async fn update_fields(&self, id: JobId, update: &JobUpdate) -> JobRepositoryResult<Job> {
        if matches!(update.kind(), JobUpdateKind::Started { .. }) {
            if take_one(&self.rejected_started) {
                return Err(connection_reset());
            }
            if take_one(&self.unacknowledged_started) {
                self.inner.update_fields(id, update).await?;
                return Err(connection_reset());
            }
        }
        self.inner.update_fields(id, update).await
    }

    async fn find_by_id(&self, id: JobId) -> JobRepositoryResult<Option<Job>> {
        self.inner.find_by_id(id).await
    }

    async fn count_by_owner_since(
        &self,
        owner_id: OwnerId,
        since: DateTime<Utc>,
    ) -> JobRepositoryResult<u64> {
        let count = self.inner.count_by_owner_since(owner_id, since).await?;
        if !self.count_pause.is_zero() {
            tokio::time::sleep(self.count_pause).await;
        }
        Ok(count)
    }

    async fn list_by_owner(
        &self,
        owner_id: OwnerId,
        query: &GalleryQuery,
    ) -> JobRepositoryResult<JobPage> {
        self.inner.list_by_owner(owner_id, query).await
    }

    async fn delete(&self, id: JobId) -> JobRepositoryResult<()> {
        self.inner.delete(id).await
    }
}
