//! Error types for generation domain validation and parsing.

use super::{JobId, JobStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating generation domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JobDomainError {
    /// The source context is empty after trimming.
    #[error("source context must not be empty")]
    EmptySourceContext,

    /// The communicative intent is empty after trimming.
    #[error("communicative intent must not be empty")]
    EmptyCommunicativeIntent,

    /// The refinement iteration count is outside `1..=5`.
    #[error("refinement iterations must be between 1 and 5, got {0}")]
    InvalidRefinementIterations(u8),

    /// A storage path is empty or not relative.
    #[error("invalid storage path '{0}'")]
    InvalidStoragePath(String),

    /// Gallery pagination parameters are out of range.
    #[error("invalid pagination: page {page}, per_page {per_page}")]
    InvalidPagination {
        /// Requested one-based page.
        page: u32,
        /// Requested page size.
        per_page: u32,
    },

    /// The requested status transition is not permitted.
    #[error("invalid job state transition for {job_id}: {from} -> {to}")]
    InvalidStateTransition {
        /// Job identifier.
        job_id: JobId,
        /// Current status.
        from: JobStatus,
        /// Requested status.
        to: JobStatus,
    },
}

/// Error returned while parsing job statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown job status: {0}")]
pub struct ParseJobStatusError(pub String);

/// Error returned while parsing diagram kinds.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown diagram kind: {0}")]
pub struct ParseDiagramKindError(pub String);
