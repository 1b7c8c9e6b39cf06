//! Published result artifacts of a completed job.

use super::{JobDomainError, JobId, OwnerId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Metadata key under which generators report local image files.
const LOCAL_PATH_KEY: &str = "image_path";

/// Returns whether `bucket` names a single storage directory segment.
///
/// Accepted names are non-empty, contain no path separators, and are
/// neither `.` nor `..`.
#[must_use]
pub fn is_valid_bucket_name(bucket: &str) -> bool {
    !bucket.is_empty() && bucket != "." && bucket != ".." && !bucket.contains(['/', '\\'])
}

/// Stable object-storage path of a published artifact.
///
/// Paths are bucket-relative, never start with `/`, and never contain `..`
/// segments. Retrieval URLs are derived from them on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoragePath(String);

impl StoragePath {
    /// Creates a validated storage path.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError::InvalidStoragePath`] when the path is empty,
    /// absolute, or escapes its prefix.
    pub fn new(value: impl Into<String>) -> Result<Self, JobDomainError> {
        let raw = value.into();
        let is_valid = !raw.trim().is_empty()
            && !raw.starts_with('/')
            && raw.split('/').all(|segment| !segment.is_empty() && segment != "..");
        if !is_valid {
            return Err(JobDomainError::InvalidStoragePath(raw));
        }
        Ok(Self(raw))
    }

    /// Returns the owner/job-scoped path of the final image.
    #[must_use]
    pub fn final_image(owner_id: OwnerId, job_id: JobId) -> Self {
        Self(format!("{owner_id}/{job_id}/final.png"))
    }

    /// Returns the owner/job-scoped path of the thumbnail.
    #[must_use]
    pub fn thumbnail(owner_id: OwnerId, job_id: JobId) -> Self {
        Self(format!("{owner_id}/{job_id}/thumbnail.png"))
    }

    /// Returns the path as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StoragePath {
    type Error = JobDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StoragePath> for String {
    fn from(value: StoragePath) -> Self {
        value.0
    }
}

impl AsRef<str> for StoragePath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata recorded for one refinement iteration.
///
/// Local filesystem references are removed on construction; they point into
/// a workspace that no longer exists once the job finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct IterationRecord(Map<String, Value>);

impl IterationRecord {
    /// Creates a record from generator-reported metadata.
    #[must_use]
    pub fn from_metadata(mut metadata: Map<String, Value>) -> Self {
        metadata.remove(LOCAL_PATH_KEY);
        Self(metadata)
    }

    /// Returns the recorded metadata.
    #[must_use]
    pub const fn metadata(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for IterationRecord {
    fn from(metadata: Map<String, Value>) -> Self {
        Self::from_metadata(metadata)
    }
}

impl From<IterationRecord> for Map<String, Value> {
    fn from(record: IterationRecord) -> Self {
        record.0
    }
}

/// Result fields written by the `completed` transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobArtifacts {
    /// Storage path of the final image.
    pub image_path: StoragePath,
    /// Storage path of the derived thumbnail.
    pub thumbnail_path: StoragePath,
    /// Generator-written description of the diagram.
    pub description: String,
    /// Free-form run metadata reported by the generator.
    pub run_metadata: Map<String, Value>,
    /// Ordered per-iteration records.
    pub iterations: Vec<IterationRecord>,
}
