//! Drives one submitted job through admission, generation, and publishing
//! to a terminal status.

use super::{AdmissionError, AdmissionGate, JobSettings, ThumbnailError, render_thumbnail};
use crate::generation::{
    domain::{
        GenerationRequest, IterationRecord, Job, JobArtifacts, JobId, JobStatus, JobUpdate,
        OwnerId, StoragePath,
    },
    ports::{
        CredentialLookupError, CredentialProvider, DiagramGenerator, GenerationOutput,
        GeneratorError, JobRepository, JobRepositoryError, ObjectStore, ObjectStoreError,
    },
};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use mockable::Clock;
use secrecy::SecretString;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Progress text written with the `running` transition.
pub const INITIALIZING_MESSAGE: &str = "Initializing pipeline...";
/// Progress text written just before the generator is invoked.
pub const GENERATING_MESSAGE: &str = "Generating diagram...";
/// Progress text written once the generator has returned.
pub const PUBLISHING_MESSAGE: &str = "Publishing artifacts...";

/// Work item handed from submission to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTicket {
    /// Job identifier.
    pub job_id: JobId,
    /// Submitting owner.
    pub owner_id: OwnerId,
    /// Immutable request parameters.
    pub request: GenerationRequest,
}

impl JobTicket {
    /// Builds the ticket for a freshly created job.
    #[must_use]
    pub fn from_job(job: &Job) -> Self {
        Self {
            job_id: job.id(),
            owner_id: job.owner_id(),
            request: job.request().clone(),
        }
    }
}

/// Terminal result of one orchestrated run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Artifacts were published and the job recorded as completed.
    Completed,
    /// The job was recorded as failed.
    Failed {
        /// Stable error code, see [`OrchestrationError::code`].
        code: &'static str,
        /// Message written to the job record.
        message: String,
    },
}

/// Failures while publishing generator output.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The generator reported an image outside its workspace.
    #[error("final image {0} lies outside the job workspace")]
    OutsideWorkspace(Utf8PathBuf),
    /// The final image could not be read.
    #[error("failed to read final image: {0}")]
    ReadImage(#[source] io::Error),
    /// The thumbnail could not be rendered.
    #[error(transparent)]
    Thumbnail(#[from] ThumbnailError),
    /// Uploading or signing an artifact failed.
    #[error("failed to store artifacts: {0}")]
    Store(#[from] ObjectStoreError),
    /// The `completed` write was refused.
    #[error("failed to record completion: {0}")]
    Record(#[from] JobRepositoryError),
    /// The blocking read-and-render task did not finish.
    #[error("artifact preparation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Reasons a run ends in the `failed` status.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// Shutdown began while the job waited for a slot.
    #[error("cancelled before execution: service shutting down")]
    Cancelled,
    /// The owner has no stored credential.
    #[error("no generation credential configured")]
    CredentialMissing,
    /// The credential could not be read or decrypted.
    #[error(transparent)]
    CredentialLookup(#[from] CredentialLookupError),
    /// The `running` transition could not be recorded.
    #[error("failed to record running status: {0}")]
    StatusWrite(#[source] JobRepositoryError),
    /// The scoped workspace could not be created.
    #[error("failed to allocate job workspace: {0}")]
    Workspace(#[source] io::Error),
    /// The generator failed; its message is kept verbatim.
    #[error(transparent)]
    Generation(#[from] GeneratorError),
    /// Publishing the generator output failed.
    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl OrchestrationError {
    /// Returns the stable error code recorded in logs and outcomes.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::CredentialMissing | Self::CredentialLookup(_) => "credential_missing",
            Self::StatusWrite(_) => "status_write_failed",
            Self::Workspace(_) => "workspace_unavailable",
            Self::Generation(_) => "generation_failed",
            Self::Publish(_) => "publish_failed",
        }
    }
}

impl From<AdmissionError> for OrchestrationError {
    fn from(_: AdmissionError) -> Self {
        Self::Cancelled
    }
}

/// Collaborators shared by the orchestrator and the job service.
pub struct JobPorts<R, S, G, P, C> {
    /// Job persistence.
    pub repository: Arc<R>,
    /// Artifact storage.
    pub store: Arc<S>,
    /// External diagram generator.
    pub generator: Arc<G>,
    /// Per-owner credential lookup.
    pub credentials: Arc<P>,
    /// Time source.
    pub clock: Arc<C>,
}

impl<R, S, G, P, C> Clone for JobPorts<R, S, G, P, C> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            store: Arc::clone(&self.store),
            generator: Arc::clone(&self.generator),
            credentials: Arc::clone(&self.credentials),
            clock: Arc::clone(&self.clock),
        }
    }
}

/// Runs jobs under the admission gate and records their terminal status.
pub struct JobOrchestrator<R, S, G, P, C>
where
    R: JobRepository,
    S: ObjectStore,
    G: DiagramGenerator,
    P: CredentialProvider,
    C: Clock + Send + Sync,
{
    ports: JobPorts<R, S, G, P, C>,
    gate: AdmissionGate,
    settings: JobSettings,
}

impl<R, S, G, P, C> JobOrchestrator<R, S, G, P, C>
where
    R: JobRepository,
    S: ObjectStore,
    G: DiagramGenerator,
    P: CredentialProvider,
    C: Clock + Send + Sync,
{
    /// Creates an orchestrator admitting work through `gate`.
    #[must_use]
    pub const fn new(
        ports: JobPorts<R, S, G, P, C>,
        gate: AdmissionGate,
        settings: JobSettings,
    ) -> Self {
        Self {
            ports,
            gate,
            settings,
        }
    }

    /// Returns the admission gate bounding execution.
    #[must_use]
    pub const fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    /// Runs `ticket` to a terminal status.
    ///
    /// Every failure is written to the job record as `failed`; nothing is
    /// returned as an error. The execution slot is held from admission until
    /// the terminal write, and the workspace is removed before it. The
    /// `running` write must succeed before any work starts; later progress
    /// writes are best-effort.
    pub async fn run(&self, ticket: JobTicket, cancel: &CancellationToken) -> JobOutcome {
        match self.gate.acquire(cancel).await {
            Ok(permit) => {
                debug!(
                    job_id = %ticket.job_id,
                    active = self.gate.active(),
                    "job admitted to execution"
                );
                let result = self.execute(&ticket).await;
                let outcome = self.finish(&ticket, result).await;
                drop(permit);
                outcome
            }
            Err(err) => self.finish(&ticket, Err(err.into())).await,
        }
    }

    async fn execute(&self, ticket: &JobTicket) -> Result<(), OrchestrationError> {
        let credential = self
            .ports
            .credentials
            .resolve(ticket.owner_id)
            .await?
            .ok_or(OrchestrationError::CredentialMissing)?;

        self.mark_running(ticket.job_id).await?;
        info!(
            job_id = %ticket.job_id,
            owner_id = %ticket.owner_id,
            status = %JobStatus::Running,
            "job running"
        );

        let workspace = tempfile::Builder::new()
            .prefix(&format!("job_{}_", ticket.job_id))
            .tempdir()
            .map_err(OrchestrationError::Workspace)?;
        let result = match Utf8Path::from_path(workspace.path()) {
            Some(dir) => self.generate_and_publish(ticket, &credential, dir).await,
            None => Err(OrchestrationError::Workspace(io::Error::other(
                "job workspace path is not valid UTF-8",
            ))),
        };
        if let Err(err) = workspace.close() {
            warn!(job_id = %ticket.job_id, error = %err, "failed to remove job workspace");
        }
        result
    }

    async fn generate_and_publish(
        &self,
        ticket: &JobTicket,
        credential: &SecretString,
        workspace: &Utf8Path,
    ) -> Result<(), OrchestrationError> {
        let clock = &*self.ports.clock;
        self.report(ticket.job_id, JobUpdate::progress(GENERATING_MESSAGE, clock))
            .await;
        let output = self
            .ports
            .generator
            .generate(&ticket.request, credential, workspace)
            .await?;
        self.report(ticket.job_id, JobUpdate::progress(PUBLISHING_MESSAGE, clock))
            .await;

        let mut uploaded = Vec::new();
        if let Err(err) = self.publish(ticket, output, workspace, &mut uploaded).await {
            self.discard(ticket.job_id, &uploaded).await;
            return Err(err.into());
        }
        Ok(())
    }

    async fn publish(
        &self,
        ticket: &JobTicket,
        output: GenerationOutput,
        workspace: &Utf8Path,
        uploaded: &mut Vec<StoragePath>,
    ) -> Result<(), PublishError> {
        let GenerationOutput {
            final_image,
            description,
            metadata,
            iterations,
        } = output;
        let relative = workspace_relative(&final_image, workspace)?;
        let content_type = content_type_for(&relative);
        let root = workspace.to_owned();
        let max_width = self.settings.thumbnail_max_width;
        let (image_bytes, thumbnail_bytes) =
            tokio::task::spawn_blocking(move || -> Result<_, PublishError> {
                let dir = Dir::open_ambient_dir(&root, ambient_authority())
                    .map_err(PublishError::ReadImage)?;
                let image = dir.read(&relative).map_err(PublishError::ReadImage)?;
                let thumbnail = render_thumbnail(&image, max_width)?;
                Ok((image, thumbnail))
            })
            .await??;

        let bucket = self.settings.storage_bucket.as_str();
        let image_path = StoragePath::final_image(ticket.owner_id, ticket.job_id);
        let thumbnail_path = StoragePath::thumbnail(ticket.owner_id, ticket.job_id);
        self.ports
            .store
            .put(bucket, &image_path, image_bytes, content_type)
            .await?;
        uploaded.push(image_path.clone());
        self.ports
            .store
            .put(bucket, &thumbnail_path, thumbnail_bytes, "image/png")
            .await?;
        uploaded.push(thumbnail_path.clone());
        for path in [&image_path, &thumbnail_path] {
            self.ports
                .store
                .signed_url(bucket, path, self.settings.signed_url_ttl)
                .await?;
        }

        let artifacts = JobArtifacts {
            image_path,
            thumbnail_path,
            description,
            run_metadata: metadata,
            iterations: iterations
                .into_iter()
                .map(IterationRecord::from_metadata)
                .collect(),
        };
        self.ports
            .repository
            .update_fields(
                ticket.job_id,
                &JobUpdate::completed(artifacts, &*self.ports.clock),
            )
            .await?;
        Ok(())
    }

    async fn finish(
        &self,
        ticket: &JobTicket,
        result: Result<(), OrchestrationError>,
    ) -> JobOutcome {
        let err = match result {
            Ok(()) => {
                info!(
                    job_id = %ticket.job_id,
                    owner_id = %ticket.owner_id,
                    status = %JobStatus::Completed,
                    "job completed"
                );
                return JobOutcome::Completed;
            }
            Err(err) => err,
        };

        let code = err.code();
        let message = err.to_string();
        let update = JobUpdate::failed(message.clone(), &*self.ports.clock);
        match self
            .ports
            .repository
            .update_fields(ticket.job_id, &update)
            .await
        {
            Ok(_) => warn!(
                job_id = %ticket.job_id,
                owner_id = %ticket.owner_id,
                status = %JobStatus::Failed,
                code,
                error = %message,
                "job failed"
            ),
            Err(write_err) => error!(
                job_id = %ticket.job_id,
                code,
                error = %write_err,
                "failed to record job failure"
            ),
        }
        JobOutcome::Failed { code, message }
    }

    /// Records the `running` transition, retrying once.
    ///
    /// A retry refused because the job is already `running` means the first
    /// write landed and only its acknowledgement was lost.
    async fn mark_running(&self, job_id: JobId) -> Result<(), OrchestrationError> {
        let started = || JobUpdate::started(INITIALIZING_MESSAGE, &*self.ports.clock);
        let Err(first_err) = self.ports.repository.update_fields(job_id, &started()).await else {
            return Ok(());
        };
        warn!(job_id = %job_id, error = %first_err, "running write failed, retrying");
        match self.ports.repository.update_fields(job_id, &started()).await {
            Ok(_) => Ok(()),
            Err(JobRepositoryError::RejectedTransition(_)) if self.is_running(job_id).await => {
                Ok(())
            }
            Err(err) => Err(OrchestrationError::StatusWrite(err)),
        }
    }

    async fn is_running(&self, job_id: JobId) -> bool {
        matches!(
            self.ports.repository.find_by_id(job_id).await,
            Ok(Some(job)) if job.status() == JobStatus::Running
        )
    }

    async fn report(&self, job_id: JobId, update: JobUpdate) {
        if let Err(err) = self.ports.repository.update_fields(job_id, &update).await {
            warn!(job_id = %job_id, error = %err, "progress write failed");
        }
    }

    async fn discard(&self, job_id: JobId, uploaded: &[StoragePath]) {
        let bucket = self.settings.storage_bucket.as_str();
        for path in uploaded {
            if let Err(err) = self.ports.store.delete(bucket, path).await {
                warn!(job_id = %job_id, path = %path, error = %err, "failed to discard artifact");
            }
        }
    }
}

fn workspace_relative(
    image: &Utf8Path,
    workspace: &Utf8Path,
) -> Result<Utf8PathBuf, PublishError> {
    if image.is_relative() {
        return Ok(image.to_owned());
    }
    image
        .strip_prefix(workspace)
        .map(Utf8Path::to_owned)
        .map_err(|_| PublishError::OutsideWorkspace(image.to_owned()))
}

fn content_type_for(path: &Utf8Path) -> &'static str {
    match path.extension().map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
