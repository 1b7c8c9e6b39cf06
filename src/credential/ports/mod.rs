//! Port contracts for credential storage and encryption.

pub mod cipher;
pub mod repository;

pub use cipher::{CipherError, SecretCipher};
pub use repository::{CredentialRepository, CredentialRepositoryError, CredentialRepositoryResult};
