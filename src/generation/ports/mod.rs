//! Port contracts for generation job management.
//!
//! Ports define infrastructure-agnostic interfaces used by the job services:
//! durable job records, artifact object storage, the external diagram
//! generator, and per-owner credential lookup.

pub mod credentials;
pub mod generator;
pub mod object_store;
pub mod repository;

pub use credentials::{CredentialLookupError, CredentialProvider};
pub use generator::{DiagramGenerator, GeneratedIteration, GenerationOutput, GeneratorError};
pub use object_store::{ObjectStore, ObjectStoreError, ObjectStoreResult};
pub use repository::{JobPage, JobRepository, JobRepositoryError, JobRepositoryResult};
