//! In-memory adapters for credential tests.

mod credential;

pub use credential::InMemoryCredentialRepository;
