//! In-memory repository for generation job tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::generation::{
    domain::{GalleryQuery, Job, JobId, JobUpdate, NewJob, OwnerId},
    ports::{JobPage, JobRepository, JobRepositoryError, JobRepositoryResult},
};

/// Thread-safe in-memory job repository.
///
/// Each update is applied under the write lock, so readers always observe a
/// whole record before or after a transition.
#[derive(Debug, Clone, Default)]
pub struct InMemoryJobRepository {
    state: Arc<RwLock<HashMap<JobId, Job>>>,
}

impl InMemoryJobRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> JobRepositoryError {
    JobRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, new_job: &NewJob) -> JobRepositoryResult<Job> {
        let mut state = self.state.write().map_err(lock_error)?;
        let job = Job::from_new(JobId::new(), new_job.clone());
        state.insert(job.id(), job.clone());
        Ok(job)
    }

    async fn update_fields(&self, id: JobId, update: &JobUpdate) -> JobRepositoryResult<Job> {
        let mut state = self.state.write().map_err(lock_error)?;
        let job = state.get_mut(&id).ok_or(JobRepositoryError::NotFound(id))?;
        job.apply(update)
            .map_err(JobRepositoryError::RejectedTransition)?;
        Ok(job.clone())
    }

    async fn find_by_id(&self, id: JobId) -> JobRepositoryResult<Option<Job>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.get(&id).cloned())
    }

    async fn count_by_owner_since(
        &self,
        owner_id: OwnerId,
        since: DateTime<Utc>,
    ) -> JobRepositoryResult<u64> {
        let state = self.state.read().map_err(lock_error)?;
        let count = state
            .values()
            .filter(|job| job.is_owned_by(owner_id) && job.created_at() >= since)
            .count();
        u64::try_from(count).map_err(JobRepositoryError::persistence)
    }

    async fn list_by_owner(
        &self,
        owner_id: OwnerId,
        query: &GalleryQuery,
    ) -> JobRepositoryResult<JobPage> {
        let state = self.state.read().map_err(lock_error)?;
        let mut matching: Vec<&Job> = state
            .values()
            .filter(|job| job.is_owned_by(owner_id))
            .filter(|job| query.status().is_none_or(|status| job.status() == status))
            .collect();
        matching.sort_by(|left, right| right.created_at().cmp(&left.created_at()));

        let total = u64::try_from(matching.len()).map_err(JobRepositoryError::persistence)?;
        let skip = usize::try_from(query.offset()).map_err(JobRepositoryError::persistence)?;
        let take = usize::try_from(query.per_page()).map_err(JobRepositoryError::persistence)?;
        let jobs = matching.into_iter().skip(skip).take(take).cloned().collect();
        Ok(JobPage { jobs, total })
    }

    async fn delete(&self, id: JobId) -> JobRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state
            .remove(&id)
            .map(|_| ())
            .ok_or(JobRepositoryError::NotFound(id))
    }
}
