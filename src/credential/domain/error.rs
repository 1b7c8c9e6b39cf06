//! Error types for credential validation.

use thiserror::Error;

/// Errors returned while validating credential input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialDomainError {
    /// The submitted key is empty after trimming.
    #[error("credential must not be empty")]
    EmptySecret,
}
