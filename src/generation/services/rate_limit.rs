//! Per-owner sliding-window submission limit.

use crate::generation::{
    domain::OwnerId,
    ports::{JobRepository, JobRepositoryError},
};
use chrono::TimeDelta;
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Length of the trailing window submissions are counted over.
pub const RATE_LIMIT_WINDOW: TimeDelta = TimeDelta::minutes(60);

/// Errors returned by [`RateLimiter::check`].
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// The owner reached the hourly cap.
    #[error("rate limit exceeded: at most {limit} generations per hour")]
    Exceeded {
        /// Configured hourly cap.
        limit: u32,
    },
    /// Counting recent submissions failed.
    #[error(transparent)]
    Repository(#[from] JobRepositoryError),
}

type OwnerLocks = HashMap<OwnerId, Arc<AsyncMutex<()>>>;

/// Exclusive right to record one submission for an owner.
///
/// Other reservations for the same owner wait until this one is dropped, so
/// the job must be persisted while it is held.
#[derive(Debug)]
pub struct RateLimitReservation {
    _owner_lock: OwnedMutexGuard<()>,
}

/// Admits a submission only while the owner has fewer than `limit` jobs
/// created in the trailing hour.
///
/// The count is taken over persisted creation timestamps, so jobs in every
/// status count toward the cap. Reservations serialise the count and the
/// subsequent insert per owner within this process.
#[derive(Clone)]
pub struct RateLimiter<R, C>
where
    R: JobRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    limit: u32,
    owner_locks: Arc<Mutex<OwnerLocks>>,
}

impl<R, C> RateLimiter<R, C>
where
    R: JobRepository,
    C: Clock + Send + Sync,
{
    /// Creates a limiter admitting `limit` submissions per owner per hour.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>, limit: u32) -> Self {
        Self {
            repository,
            clock,
            limit,
            owner_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the configured hourly cap.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Checks whether `owner_id` may submit another job now.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError::Exceeded`] when the owner already created
    /// `limit` jobs within the window, or [`RateLimitError::Repository`] when
    /// the count cannot be read.
    pub async fn check(&self, owner_id: OwnerId) -> Result<(), RateLimitError> {
        self.reserve(owner_id).await.map(drop)
    }

    /// Waits for exclusive use of the owner's quota, then checks it.
    ///
    /// The returned reservation must be held until the admitted job is
    /// persisted; concurrent submissions for the same owner then observe it
    /// in their count.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`RateLimiter::check`]. The reservation is
    /// released before an error is returned.
    pub async fn reserve(
        &self,
        owner_id: OwnerId,
    ) -> Result<RateLimitReservation, RateLimitError> {
        let owner_lock = self.owner_lock(owner_id).lock_owned().await;
        self.count_within_limit(owner_id).await?;
        Ok(RateLimitReservation {
            _owner_lock: owner_lock,
        })
    }

    fn owner_lock(&self, owner_id: OwnerId) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .owner_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(owner_id).or_default())
    }

    async fn count_within_limit(&self, owner_id: OwnerId) -> Result<(), RateLimitError> {
        let since = self.clock.utc() - RATE_LIMIT_WINDOW;
        let recent = self
            .repository
            .count_by_owner_since(owner_id, since)
            .await?;
        if recent >= u64::from(self.limit) {
            return Err(RateLimitError::Exceeded { limit: self.limit });
        }
        Ok(())
    }
}
