//! Domain model for stored credentials.

mod error;
mod secret;
mod status;

pub use crate::generation::domain::OwnerId;
pub use error::CredentialDomainError;
pub use secret::{EncryptedSecret, validate_plaintext};
pub use status::{CredentialStatus, UNREADABLE_PREVIEW, key_preview};
