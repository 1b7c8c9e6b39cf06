//! Diesel row models for generation job persistence.

use super::schema::generation_jobs;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for job records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = generation_jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JobRow {
    /// Job identifier.
    pub id: uuid::Uuid,
    /// Owning user.
    pub owner_id: uuid::Uuid,
    /// Lifecycle status in its lowercase text form.
    pub status: String,
    /// Human-readable progress while running.
    pub progress: Option<String>,
    /// Immutable request parameters as JSON.
    pub request: Value,
    /// Storage path of the final image once completed.
    pub image_path: Option<String>,
    /// Storage path of the thumbnail once completed.
    pub thumbnail_path: Option<String>,
    /// Generator description of the diagram.
    pub description: Option<String>,
    /// Generator run metadata.
    pub run_metadata: Option<Value>,
    /// Per-iteration records as a JSON array.
    pub iterations: Option<Value>,
    /// Failure reason once failed.
    pub error_message: Option<String>,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the `running` transition.
    pub started_at: Option<DateTime<Utc>>,
    /// Timestamp of the terminal transition.
    pub completed_at: Option<DateTime<Utc>>,
    /// Timestamp of the last write.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for new pending jobs.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = generation_jobs)]
pub struct NewJobRow {
    /// Job identifier.
    pub id: uuid::Uuid,
    /// Owning user.
    pub owner_id: uuid::Uuid,
    /// Initial status, always `pending`.
    pub status: String,
    /// Immutable request parameters as JSON.
    pub request: Value,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Equal to `created_at` on insert.
    pub updated_at: DateTime<Utc>,
}

/// Partial update of a job row.
///
/// Outer `None` leaves a column untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = generation_jobs)]
pub struct JobChangeset {
    /// Status after the update.
    pub status: String,
    /// Timestamp of this write.
    pub updated_at: DateTime<Utc>,
    /// Progress text.
    pub progress: Option<Option<String>>,
    /// Set by the `running` transition.
    pub started_at: Option<DateTime<Utc>>,
    /// Final image path.
    pub image_path: Option<Option<String>>,
    /// Thumbnail path.
    pub thumbnail_path: Option<Option<String>>,
    /// Diagram description.
    pub description: Option<Option<String>>,
    /// Run metadata.
    pub run_metadata: Option<Option<Value>>,
    /// Iteration records.
    pub iterations: Option<Option<Value>>,
    /// Failure reason.
    pub error_message: Option<Option<String>>,
    /// Set by terminal transitions.
    pub completed_at: Option<DateTime<Utc>>,
}
