//! In-memory adapters for generation job tests and single-process use.

mod credentials;
mod generator;
mod job;
mod object_store;

pub use credentials::InMemoryCredentialProvider;
pub use generator::{GeneratorRelease, ScriptedGenerator};
pub use job::InMemoryJobRepository;
pub use object_store::{InMemoryObjectStore, StoredObject};
