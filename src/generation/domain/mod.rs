//! Domain model for generation jobs.
//!
//! The job domain models immutable generation requests, the job lifecycle
//! state machine, partial field updates, and the read models served to
//! pollers, keeping infrastructure concerns outside the domain boundary.

mod artifacts;
mod error;
mod ids;
mod job;
mod request;
mod update;
mod view;

pub use artifacts::{IterationRecord, JobArtifacts, StoragePath, is_valid_bucket_name};
pub use error::{JobDomainError, ParseDiagramKindError, ParseJobStatusError};
pub use ids::{JobId, OwnerId};
pub use job::{Job, JobStatus, NewJob, PersistedJobData};
pub use request::{DiagramKind, GenerationRequest, RefinementIterations};
pub use update::{JobUpdate, JobUpdateKind};
pub use view::{GalleryItem, GalleryPage, GalleryQuery, JobDetail, JobView, SignedUrl};
