//! Service layer for job admission, execution, and status queries.

mod executor;
mod gate;
mod job_service;
mod orchestrator;
mod rate_limit;
mod settings;
mod thumbnail;

pub use executor::JobExecutor;
pub use gate::{AdmissionError, AdmissionGate, AdmissionPermit};
pub use job_service::{JobService, JobServiceError, JobServiceResult};
pub use orchestrator::{
    GENERATING_MESSAGE, INITIALIZING_MESSAGE, JobOrchestrator, JobOutcome, JobPorts, JobTicket,
    OrchestrationError, PUBLISHING_MESSAGE, PublishError,
};
pub use rate_limit::{RATE_LIMIT_WINDOW, RateLimitError, RateLimitReservation, RateLimiter};
pub use settings::{
    DEFAULT_MAX_CONCURRENT_JOBS, DEFAULT_MAX_JOBS_PER_HOUR, DEFAULT_SIGNED_URL_TTL,
    DEFAULT_STORAGE_BUCKET, DEFAULT_THUMBNAIL_MAX_WIDTH, JobSettings,
};
pub use thumbnail::{ThumbnailError, render_thumbnail};
