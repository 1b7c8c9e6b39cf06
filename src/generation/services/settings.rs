//! Tunable limits and publishing parameters for job services.

use std::num::{NonZeroU32, NonZeroUsize};
use std::time::Duration;

/// Default number of jobs allowed to execute at once.
pub const DEFAULT_MAX_CONCURRENT_JOBS: NonZeroUsize = match NonZeroUsize::new(3) {
    Some(capacity) => capacity,
    None => NonZeroUsize::MIN,
};
/// Default number of submissions allowed per owner per hour.
pub const DEFAULT_MAX_JOBS_PER_HOUR: u32 = 5;
/// Default bucket receiving published artifacts.
pub const DEFAULT_STORAGE_BUCKET: &str = "generations";
/// Default lifetime of issued retrieval URLs.
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(3600);
/// Default maximum thumbnail width in pixels.
pub const DEFAULT_THUMBNAIL_MAX_WIDTH: NonZeroU32 = match NonZeroU32::new(400) {
    Some(width) => width,
    None => NonZeroU32::MIN,
};

/// Settings shared by the job service and orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSettings {
    /// Capacity of the admission gate.
    pub max_concurrent_jobs: NonZeroUsize,
    /// Per-owner submissions allowed in any trailing hour.
    pub max_jobs_per_hour: u32,
    /// Bucket receiving published artifacts.
    pub storage_bucket: String,
    /// Lifetime of issued retrieval URLs.
    pub signed_url_ttl: Duration,
    /// Maximum thumbnail width in pixels.
    pub thumbnail_max_width: NonZeroU32,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            max_jobs_per_hour: DEFAULT_MAX_JOBS_PER_HOUR,
            storage_bucket: DEFAULT_STORAGE_BUCKET.to_owned(),
            signed_url_ttl: DEFAULT_SIGNED_URL_TTL,
            thumbnail_max_width: DEFAULT_THUMBNAIL_MAX_WIDTH,
        }
    }
}
