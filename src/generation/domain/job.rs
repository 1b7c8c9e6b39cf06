//! Job aggregate root and lifecycle status.

use super::{
    GenerationRequest, JobArtifacts, JobDomainError, JobId, JobUpdate, JobUpdateKind, OwnerId,
    ParseJobStatusError,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is recorded and waiting for an execution slot.
    Pending,
    /// Job holds an execution slot and is generating or publishing.
    Running,
    /// Job finished and its artifacts are published.
    Completed,
    /// Job finished without a usable result.
    Failed,
}

impl JobStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Running, Self::Completed, Self::Failed];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns whether no further transitions can occur.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns whether a write targeting `target` is allowed from this
    /// status.
    ///
    /// `running -> running` is the progress write. `pending -> failed` is the
    /// pre-execution fast-fail path.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Running | Self::Failed)
                | (Self::Running, Self::Running | Self::Completed | Self::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for JobStatus {
    type Error = ParseJobStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseJobStatusError(value.to_owned())),
        }
    }
}

/// A job that has not been persisted yet.
///
/// The persistence adapter assigns the identifier when it stores the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    owner_id: OwnerId,
    request: GenerationRequest,
    created_at: DateTime<Utc>,
}

impl NewJob {
    /// Creates a pending job submission for `owner_id`.
    #[must_use]
    pub fn new(owner_id: OwnerId, request: GenerationRequest, clock: &impl Clock) -> Self {
        Self {
            owner_id,
            request,
            created_at: clock.utc(),
        }
    }

    /// Returns the submitting owner.
    #[must_use]
    pub const fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    /// Returns the immutable request parameters.
    #[must_use]
    pub const fn request(&self) -> &GenerationRequest {
        &self.request
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Generation job aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    id: JobId,
    owner_id: OwnerId,
    status: JobStatus,
    progress: Option<String>,
    request: GenerationRequest,
    artifacts: Option<JobArtifacts>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted job aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedJobData {
    /// Persisted job identifier.
    pub id: JobId,
    /// Persisted owner identifier.
    pub owner_id: OwnerId,
    /// Persisted lifecycle status.
    pub status: JobStatus,
    /// Persisted progress text.
    pub progress: Option<String>,
    /// Persisted request parameters.
    pub request: GenerationRequest,
    /// Persisted result artifacts.
    pub artifacts: Option<JobArtifacts>,
    /// Persisted failure message.
    pub error_message: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted start timestamp.
    pub started_at: Option<DateTime<Utc>>,
    /// Persisted terminal timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Materializes a freshly stored job in the `pending` status.
    #[must_use]
    pub fn from_new(id: JobId, new_job: NewJob) -> Self {
        let NewJob {
            owner_id,
            request,
            created_at,
        } = new_job;
        Self {
            id,
            owner_id,
            status: JobStatus::Pending,
            progress: None,
            request,
            artifacts: None,
            error_message: None,
            created_at,
            started_at: None,
            completed_at: None,
            updated_at: created_at,
        }
    }

    /// Reconstructs a job from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedJobData) -> Self {
        Self {
            id: data.id,
            owner_id: data.owner_id,
            status: data.status,
            progress: data.progress,
            request: data.request,
            artifacts: data.artifacts,
            error_message: data.error_message,
            created_at: data.created_at,
            started_at: data.started_at,
            completed_at: data.completed_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the job identifier.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// Returns the submitting owner.
    #[must_use]
    pub const fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    /// Returns whether `owner_id` submitted this job.
    #[must_use]
    pub fn is_owned_by(&self, owner_id: OwnerId) -> bool {
        self.owner_id == owner_id
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> JobStatus {
        self.status
    }

    /// Returns the current progress text while running.
    #[must_use]
    pub fn progress(&self) -> Option<&str> {
        self.progress.as_deref()
    }

    /// Returns the immutable request parameters.
    #[must_use]
    pub const fn request(&self) -> &GenerationRequest {
        &self.request
    }

    /// Returns the published artifacts once completed.
    #[must_use]
    pub const fn artifacts(&self) -> Option<&JobArtifacts> {
        self.artifacts.as_ref()
    }

    /// Returns the failure message once failed.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the timestamp of the transition to `running`.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns the timestamp of the terminal transition.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies a partial field update, enforcing the lifecycle state machine.
    ///
    /// Only the fields owned by the update's transition change; the request
    /// and owner are never touched.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError::InvalidStateTransition`] when the current
    /// status is not an allowed source for the update, which includes every
    /// update of a terminal job. The job is left unchanged.
    pub fn apply(&mut self, update: &JobUpdate) -> Result<(), JobDomainError> {
        let target = update.target_status();
        if !update.allowed_sources().contains(&self.status) {
            return Err(JobDomainError::InvalidStateTransition {
                job_id: self.id,
                from: self.status,
                to: target,
            });
        }

        let at = update.at();
        match update.kind() {
            JobUpdateKind::Started { progress } => {
                self.progress = Some(progress.clone());
                self.started_at = Some(at);
            }
            JobUpdateKind::Progress { message } => {
                self.progress = Some(message.clone());
            }
            JobUpdateKind::Completed(artifacts) => {
                self.progress = None;
                self.artifacts = Some(artifacts.as_ref().clone());
                self.error_message = None;
                self.completed_at = Some(at);
            }
            JobUpdateKind::Failed { error_message } => {
                self.progress = None;
                self.artifacts = None;
                self.error_message = Some(error_message.clone());
                self.completed_at = Some(at);
            }
        }
        self.status = target;
        self.updated_at = at;
        Ok(())
    }
}
