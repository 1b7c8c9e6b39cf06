//! Repository port for job persistence, partial updates, and history queries.

use crate::generation::domain::{
    GalleryQuery, Job, JobDomainError, JobId, JobUpdate, NewJob, OwnerId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for job repository operations.
pub type JobRepositoryResult<T> = Result<T, JobRepositoryError>;

/// One page of jobs plus the total number of matching records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPage {
    /// Jobs on the requested page, newest first.
    pub jobs: Vec<Job>,
    /// Total number of jobs matching the query filter.
    pub total: u64,
}

/// Job persistence contract.
///
/// Records are written through partial updates only, so a status poller can
/// read a job at any time and observe a consistent snapshot.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Inserts a new job in the `pending` status and returns the stored
    /// record with its assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`JobRepositoryError::Persistence`] when the record cannot be
    /// written.
    async fn create(&self, new_job: &NewJob) -> JobRepositoryResult<Job>;

    /// Applies a partial update to an existing job and returns the updated
    /// record.
    ///
    /// # Errors
    ///
    /// Returns [`JobRepositoryError::NotFound`] when the job does not exist
    /// and [`JobRepositoryError::RejectedTransition`] when its current status
    /// does not admit the update.
    async fn update_fields(&self, id: JobId, update: &JobUpdate) -> JobRepositoryResult<Job>;

    /// Finds a job by identifier.
    ///
    /// Returns `None` when the job does not exist.
    async fn find_by_id(&self, id: JobId) -> JobRepositoryResult<Option<Job>>;

    /// Counts the jobs `owner_id` created at or after `since`, in any status.
    async fn count_by_owner_since(
        &self,
        owner_id: OwnerId,
        since: DateTime<Utc>,
    ) -> JobRepositoryResult<u64>;

    /// Lists one page of the owner's jobs, newest first.
    async fn list_by_owner(
        &self,
        owner_id: OwnerId,
        query: &GalleryQuery,
    ) -> JobRepositoryResult<JobPage>;

    /// Deletes a job record.
    ///
    /// # Errors
    ///
    /// Returns [`JobRepositoryError::NotFound`] when the job does not exist.
    async fn delete(&self, id: JobId) -> JobRepositoryResult<()>;
}

/// Errors returned by job repository implementations.
#[derive(Debug, Clone, Error)]
pub enum JobRepositoryError {
    /// The job was not found.
    #[error("job not found: {0}")]
    NotFound(JobId),

    /// The job's current status does not admit the update.
    #[error(transparent)]
    RejectedTransition(JobDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl JobRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
