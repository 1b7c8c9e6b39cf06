//! Produced interface: job submission, status polling, history, and removal.

use super::{
    AdmissionGate, JobExecutor, JobOrchestrator, JobPorts, JobSettings, JobTicket, RateLimitError,
    RateLimiter,
};
use crate::generation::{
    domain::{
        GalleryItem, GalleryPage, GalleryQuery, GenerationRequest, Job, JobDetail, JobId,
        JobStatus, JobView, NewJob, OwnerId, SignedUrl, StoragePath,
    },
    ports::{
        CredentialLookupError, CredentialProvider, DiagramGenerator, JobRepository,
        JobRepositoryError, ObjectStore, ObjectStoreError,
    },
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors returned by [`JobService`] operations.
#[derive(Debug, Error)]
pub enum JobServiceError {
    /// The owner has no stored generation credential.
    #[error("a generation credential must be configured before submitting jobs")]
    CredentialMissing,
    /// The owner reached the hourly submission cap.
    #[error("rate limit exceeded: at most {limit} generations per hour")]
    RateLimited {
        /// Configured hourly cap.
        limit: u32,
    },
    /// The service is shutting down and accepts no new jobs.
    #[error("job service is shutting down")]
    ShuttingDown,
    /// No job with this identifier is visible to the caller.
    #[error("job not found: {0}")]
    NotFound(JobId),
    /// The job has not reached a terminal status.
    #[error("job {job_id} is still {status}")]
    NotTerminal {
        /// Job identifier.
        job_id: JobId,
        /// Current status.
        status: JobStatus,
    },
    /// Credential lookup failed.
    #[error(transparent)]
    Credential(#[from] CredentialLookupError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] JobRepositoryError),
    /// Object store operation failed.
    #[error(transparent)]
    Storage(#[from] ObjectStoreError),
}

impl JobServiceError {
    /// Returns a stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::CredentialMissing => "credential_missing",
            Self::RateLimited { .. } => "rate_limited",
            Self::ShuttingDown => "shutting_down",
            Self::NotFound(_) => "not_found",
            Self::NotTerminal { .. } => "job_active",
            Self::Credential(_) | Self::Repository(_) | Self::Storage(_) => "internal",
        }
    }
}

impl From<RateLimitError> for JobServiceError {
    fn from(err: RateLimitError) -> Self {
        match err {
            RateLimitError::Exceeded { limit } => Self::RateLimited { limit },
            RateLimitError::Repository(inner) => Self::Repository(inner),
        }
    }
}

/// Result type for job service operations.
pub type JobServiceResult<T> = Result<T, JobServiceError>;

/// Admits generation jobs and serves their status to owners.
///
/// Submission checks the credential and rate limit synchronously, records a
/// `pending` job, and hands it to the executor; the run itself happens
/// in the background under the admission gate.
pub struct JobService<R, S, G, P, C>
where
    R: JobRepository + 'static,
    S: ObjectStore + 'static,
    G: DiagramGenerator + 'static,
    P: CredentialProvider + 'static,
    C: Clock + Send + Sync + 'static,
{
    ports: JobPorts<R, S, G, P, C>,
    rate_limiter: RateLimiter<R, C>,
    orchestrator: Arc<JobOrchestrator<R, S, G, P, C>>,
    executor: JobExecutor,
    settings: JobSettings,
}

impl<R, S, G, P, C> JobService<R, S, G, P, C>
where
    R: JobRepository + 'static,
    S: ObjectStore + 'static,
    G: DiagramGenerator + 'static,
    P: CredentialProvider + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a service with its own admission gate sized from `settings`.
    #[must_use]
    pub fn new(
        ports: JobPorts<R, S, G, P, C>,
        settings: JobSettings,
        executor: JobExecutor,
    ) -> Self {
        let gate = AdmissionGate::new(settings.max_concurrent_jobs);
        Self::with_gate(ports, settings, executor, gate)
    }

    /// Creates a service sharing an existing admission gate.
    #[must_use]
    pub fn with_gate(
        ports: JobPorts<R, S, G, P, C>,
        settings: JobSettings,
        executor: JobExecutor,
        gate: AdmissionGate,
    ) -> Self {
        let rate_limiter = RateLimiter::new(
            Arc::clone(&ports.repository),
            Arc::clone(&ports.clock),
            settings.max_jobs_per_hour,
        );
        let orchestrator = Arc::new(JobOrchestrator::new(ports.clone(), gate, settings.clone()));
        Self {
            ports,
            rate_limiter,
            orchestrator,
            executor,
            settings,
        }
    }

    /// Returns the admission gate bounding execution.
    #[must_use]
    pub fn gate(&self) -> &AdmissionGate {
        self.orchestrator.gate()
    }

    /// Returns the executor running submitted jobs.
    #[must_use]
    pub const fn executor(&self) -> &JobExecutor {
        &self.executor
    }

    /// Submits a generation job for `owner_id` and returns its identifier.
    ///
    /// The job is recorded as `pending` before this returns; execution
    /// proceeds in the background. Concurrent submissions by one owner are
    /// counted and recorded one at a time, so the hourly cap holds under
    /// bursts.
    ///
    /// # Errors
    ///
    /// Returns [`JobServiceError::CredentialMissing`] when the owner has no
    /// stored credential, [`JobServiceError::RateLimited`] when the hourly cap
    /// is reached, and [`JobServiceError::ShuttingDown`] after shutdown has
    /// begun. Rejected submissions leave no record.
    pub async fn submit(
        &self,
        owner_id: OwnerId,
        request: GenerationRequest,
    ) -> JobServiceResult<JobId> {
        if self.executor.is_shutting_down() {
            return Err(JobServiceError::ShuttingDown);
        }
        if self.ports.credentials.resolve(owner_id).await?.is_none() {
            return Err(JobServiceError::CredentialMissing);
        }
        let reservation = self.rate_limiter.reserve(owner_id).await?;
        let new_job = NewJob::new(owner_id, request, &*self.ports.clock);
        let created = self.ports.repository.create(&new_job).await;
        drop(reservation);
        let job = created?;
        let ticket = JobTicket::from_job(&job);
        info!(
            job_id = %job.id(),
            owner_id = %owner_id,
            status = %job.status(),
            "job admitted"
        );

        let orchestrator = Arc::clone(&self.orchestrator);
        self.executor.spawn(move |shutdown| async move {
            orchestrator.run(ticket, &shutdown).await;
        });
        Ok(job.id())
    }

    /// Returns the current status of one of the owner's jobs.
    ///
    /// Retrieval URLs are issued afresh from the stored paths on every call.
    ///
    /// # Errors
    ///
    /// Returns [`JobServiceError::NotFound`] when the job does not exist or
    /// belongs to another owner.
    pub async fn status(&self, job_id: JobId, owner_id: OwnerId) -> JobServiceResult<JobView> {
        let job = self.owned_job(job_id, owner_id).await?;
        let artifacts = job.artifacts();
        let image_url = match artifacts {
            Some(stored) => self.fresh_url(&stored.image_path).await,
            None => None,
        };
        let thumbnail_url = match artifacts {
            Some(stored) => self.fresh_url(&stored.thumbnail_path).await,
            None => None,
        };

        Ok(JobView {
            job_id: job.id(),
            status: job.status(),
            progress: job.progress().map(str::to_owned),
            image_url,
            thumbnail_url,
            description: artifacts.map(|stored| stored.description.clone()),
            error_message: job.error_message().map(str::to_owned),
            metadata: artifacts.map(|stored| stored.run_metadata.clone()),
            created_at: job.created_at(),
            completed_at: job.completed_at(),
        })
    }

    /// Lists one page of the owner's jobs, newest first.
    ///
    /// Thumbnail URLs that cannot be issued are reported as absent.
    ///
    /// # Errors
    ///
    /// Returns [`JobServiceError::Repository`] when the listing fails.
    pub async fn gallery(
        &self,
        owner_id: OwnerId,
        query: GalleryQuery,
    ) -> JobServiceResult<GalleryPage> {
        let page = self.ports.repository.list_by_owner(owner_id, &query).await?;
        let mut items = Vec::with_capacity(page.jobs.len());
        for job in page.jobs {
            let thumbnail_url = match job.artifacts() {
                Some(stored) => self.fresh_url(&stored.thumbnail_path).await,
                None => None,
            };
            items.push(GalleryItem {
                job_id: job.id(),
                communicative_intent: job.request().communicative_intent().to_owned(),
                diagram_kind: job.request().diagram_kind(),
                thumbnail_url,
                status: job.status(),
                created_at: job.created_at(),
            });
        }

        Ok(GalleryPage {
            items,
            total: page.total,
            page: query.page(),
            per_page: query.per_page(),
        })
    }

    /// Returns the full detail of one of the owner's jobs.
    ///
    /// # Errors
    ///
    /// Returns [`JobServiceError::NotFound`] when the job does not exist or
    /// belongs to another owner.
    pub async fn detail(&self, job_id: JobId, owner_id: OwnerId) -> JobServiceResult<JobDetail> {
        let job = self.owned_job(job_id, owner_id).await?;
        let artifacts = job.artifacts();
        let image_url = match artifacts {
            Some(stored) => self.fresh_url(&stored.image_path).await,
            None => None,
        };
        let request = job.request();

        Ok(JobDetail {
            job_id: job.id(),
            source_context: request.source_context().to_owned(),
            communicative_intent: request.communicative_intent().to_owned(),
            diagram_kind: request.diagram_kind(),
            image_url,
            description: artifacts.map(|stored| stored.description.clone()),
            iterations: artifacts
                .map(|stored| stored.iterations.clone())
                .unwrap_or_default(),
            metadata: artifacts.map(|stored| stored.run_metadata.clone()),
            status: job.status(),
            created_at: job.created_at(),
            completed_at: job.completed_at(),
        })
    }

    /// Deletes one of the owner's finished jobs and its stored artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`JobServiceError::NotFound`] when the job is not visible to
    /// the owner and [`JobServiceError::NotTerminal`] while it is pending or
    /// running.
    pub async fn delete(&self, job_id: JobId, owner_id: OwnerId) -> JobServiceResult<()> {
        let job = self.owned_job(job_id, owner_id).await?;
        if !job.status().is_terminal() {
            return Err(JobServiceError::NotTerminal {
                job_id,
                status: job.status(),
            });
        }

        if let Some(stored) = job.artifacts() {
            let bucket = self.settings.storage_bucket.as_str();
            self.ports.store.delete(bucket, &stored.image_path).await?;
            self.ports.store.delete(bucket, &stored.thumbnail_path).await?;
        }
        self.ports.repository.delete(job_id).await?;
        info!(job_id = %job_id, owner_id = %owner_id, "job deleted");
        Ok(())
    }

    async fn owned_job(&self, job_id: JobId, owner_id: OwnerId) -> JobServiceResult<Job> {
        self.ports
            .repository
            .find_by_id(job_id)
            .await?
            .filter(|job| job.is_owned_by(owner_id))
            .ok_or(JobServiceError::NotFound(job_id))
    }

    async fn fresh_url(&self, path: &StoragePath) -> Option<SignedUrl> {
        let issued = self
            .ports
            .store
            .signed_url(
                self.settings.storage_bucket.as_str(),
                path,
                self.settings.signed_url_ttl,
            )
            .await;
        match issued {
            Ok(url) => Some(url),
            Err(err) => {
                warn!(path = %path, error = %err, "failed to issue retrieval url");
                None
            }
        }
    }
}
