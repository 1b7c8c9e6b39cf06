//! Partial field updates applied to persisted jobs.

use super::{JobArtifacts, JobStatus};
use chrono::{DateTime, Utc};
use mockable::Clock;

/// Message recorded when a failure carries no text of its own.
const UNDESCRIBED_FAILURE: &str = "job failed without an error message";

/// Transition-specific fields carried by a [`JobUpdate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobUpdateKind {
    /// `pending -> running`: sets the initial progress and `started_at`.
    Started {
        /// Initial progress text.
        progress: String,
    },
    /// `running -> running`: replaces the progress text.
    Progress {
        /// New progress text.
        message: String,
    },
    /// `running -> completed`: writes artifacts and `completed_at`.
    Completed(Box<JobArtifacts>),
    /// `pending | running -> failed`: writes the error and `completed_at`.
    Failed {
        /// Failure message shown to the owner.
        error_message: String,
    },
}

/// A partial update of a job record.
///
/// Every update writes the target status and `updated_at` together with its
/// transition-specific fields, so adapters can apply it as a single atomic
/// write without replacing the whole record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobUpdate {
    kind: JobUpdateKind,
    at: DateTime<Utc>,
}

impl JobUpdate {
    /// Builds the `running` transition with its initial progress text.
    #[must_use]
    pub fn started(progress: impl Into<String>, clock: &impl Clock) -> Self {
        Self {
            kind: JobUpdateKind::Started {
                progress: progress.into(),
            },
            at: clock.utc(),
        }
    }

    /// Builds a progress write for a running job.
    #[must_use]
    pub fn progress(message: impl Into<String>, clock: &impl Clock) -> Self {
        Self {
            kind: JobUpdateKind::Progress {
                message: message.into(),
            },
            at: clock.utc(),
        }
    }

    /// Builds the `completed` transition.
    #[must_use]
    pub fn completed(artifacts: JobArtifacts, clock: &impl Clock) -> Self {
        Self {
            kind: JobUpdateKind::Completed(Box::new(artifacts)),
            at: clock.utc(),
        }
    }

    /// Builds the `failed` transition.
    ///
    /// Blank messages are replaced so a failed job always explains itself.
    #[must_use]
    pub fn failed(error_message: impl Into<String>, clock: &impl Clock) -> Self {
        let raw = error_message.into();
        let error_message = if raw.trim().is_empty() {
            UNDESCRIBED_FAILURE.to_owned()
        } else {
            raw
        };
        Self {
            kind: JobUpdateKind::Failed { error_message },
            at: clock.utc(),
        }
    }

    /// Returns the transition-specific fields.
    #[must_use]
    pub const fn kind(&self) -> &JobUpdateKind {
        &self.kind
    }

    /// Returns the `updated_at` timestamp this update writes.
    #[must_use]
    pub const fn at(&self) -> DateTime<Utc> {
        self.at
    }

    /// Returns the status the job holds after this update.
    #[must_use]
    pub const fn target_status(&self) -> JobStatus {
        match self.kind {
            JobUpdateKind::Started { .. } | JobUpdateKind::Progress { .. } => JobStatus::Running,
            JobUpdateKind::Completed(_) => JobStatus::Completed,
            JobUpdateKind::Failed { .. } => JobStatus::Failed,
        }
    }

    /// Returns the statuses this update may be applied to.
    #[must_use]
    pub const fn allowed_sources(&self) -> &'static [JobStatus] {
        match self.kind {
            JobUpdateKind::Started { .. } => &[JobStatus::Pending],
            JobUpdateKind::Progress { .. } | JobUpdateKind::Completed(_) => &[JobStatus::Running],
            JobUpdateKind::Failed { .. } => &[JobStatus::Pending, JobStatus::Running],
        }
    }
}
