//! Read models served to status pollers and gallery listings.

use super::{DiagramKind, IterationRecord, JobDomainError, JobId, JobStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Time-limited retrieval URL for a stored object.
///
/// Signed URLs expire, so they are issued on every read and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedUrl(String);

impl SignedUrl {
    /// Wraps an issued URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Returns the URL as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status snapshot returned to a polling owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobView {
    /// Job identifier.
    pub job_id: JobId,
    /// Lifecycle status.
    pub status: JobStatus,
    /// Progress text while running.
    pub progress: Option<String>,
    /// Fresh URL of the final image once completed.
    pub image_url: Option<SignedUrl>,
    /// Fresh URL of the thumbnail once completed.
    pub thumbnail_url: Option<SignedUrl>,
    /// Generator-written description once completed.
    pub description: Option<String>,
    /// Failure message once failed.
    pub error_message: Option<String>,
    /// Run metadata once completed.
    pub metadata: Option<Map<String, Value>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Terminal transition timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Full detail of one job for the gallery view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobDetail {
    /// Job identifier.
    pub job_id: JobId,
    /// Source text the diagram was derived from.
    pub source_context: String,
    /// What the diagram communicates.
    pub communicative_intent: String,
    /// Requested diagram kind.
    pub diagram_kind: DiagramKind,
    /// Fresh URL of the final image, when available.
    pub image_url: Option<SignedUrl>,
    /// Generator-written description.
    pub description: Option<String>,
    /// Per-iteration records.
    pub iterations: Vec<IterationRecord>,
    /// Run metadata.
    pub metadata: Option<Map<String, Value>>,
    /// Lifecycle status.
    pub status: JobStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Terminal transition timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

/// One entry of an owner's generation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryItem {
    /// Job identifier.
    pub job_id: JobId,
    /// What the diagram communicates.
    pub communicative_intent: String,
    /// Requested diagram kind.
    pub diagram_kind: DiagramKind,
    /// Fresh thumbnail URL, when one could be issued.
    pub thumbnail_url: Option<SignedUrl>,
    /// Lifecycle status.
    pub status: JobStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One page of an owner's generation history, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryPage {
    /// Entries on this page.
    pub items: Vec<GalleryItem>,
    /// Total number of matching jobs.
    pub total: u64,
    /// One-based page number.
    pub page: u32,
    /// Page size.
    pub per_page: u32,
}

/// Pagination and filtering for gallery listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GalleryQuery {
    page: u32,
    per_page: u32,
    status: Option<JobStatus>,
}

impl GalleryQuery {
    /// Largest accepted page size.
    pub const MAX_PER_PAGE: u32 = 100;
    const DEFAULT_PER_PAGE: u32 = 20;

    /// Creates a validated query.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError::InvalidPagination`] when `page` is zero or
    /// `per_page` is outside `1..=100`.
    pub const fn new(page: u32, per_page: u32) -> Result<Self, JobDomainError> {
        if page == 0 || per_page == 0 || per_page > Self::MAX_PER_PAGE {
            return Err(JobDomainError::InvalidPagination { page, per_page });
        }
        Ok(Self {
            page,
            per_page,
            status: None,
        })
    }

    /// Restricts the listing to one status.
    #[must_use]
    pub const fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns the one-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Returns the page size.
    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Returns the status filter, if any.
    #[must_use]
    pub const fn status(&self) -> Option<JobStatus> {
        self.status
    }

    /// Returns the number of records preceding this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }
}

impl Default for GalleryQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: Self::DEFAULT_PER_PAGE,
            status: None,
        }
    }
}
