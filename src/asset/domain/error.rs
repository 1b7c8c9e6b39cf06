//! Validation errors for asset uploads.

use crate::generation::domain::JobDomainError;
use thiserror::Error;

/// Reasons an upload is refused before anything is stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetDomainError {
    /// The declared media type is not accepted.
    #[error("unsupported asset type '{0}'; allowed: image/png, image/jpeg, image/svg+xml")]
    UnsupportedType(String),
    /// The file exceeds the size limit.
    #[error("asset is {size} bytes; the limit is {limit} bytes")]
    TooLarge {
        /// Uploaded size in bytes.
        size: usize,
        /// Maximum accepted size in bytes.
        limit: usize,
    },
    /// The file has no content.
    #[error("asset file is empty")]
    EmptyFile,
    /// The display name is blank.
    #[error("asset name must not be empty")]
    EmptyName,
    /// The derived storage path was refused.
    #[error(transparent)]
    StoragePath(#[from] JobDomainError),
}
