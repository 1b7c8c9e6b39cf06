//! Service layer for credential management.

mod credential;

pub use credential::{CredentialService, CredentialServiceError, CredentialServiceResult};
