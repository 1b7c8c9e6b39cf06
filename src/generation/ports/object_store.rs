//! Object storage port for published job artifacts.

use crate::generation::domain::{SignedUrl, StoragePath};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for object store operations.
pub type ObjectStoreResult<T> = Result<T, ObjectStoreError>;

/// Bucketed object storage with time-limited retrieval URLs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads `bytes` to `path` within `bucket`, replacing any existing
    /// object.
    async fn put(
        &self,
        bucket: &str,
        path: &StoragePath,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> ObjectStoreResult<()>;

    /// Issues a retrieval URL for `path` that expires after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::NotFound`] when no object exists at the
    /// path.
    async fn signed_url(
        &self,
        bucket: &str,
        path: &StoragePath,
        ttl: Duration,
    ) -> ObjectStoreResult<SignedUrl>;

    /// Removes the object at `path`. Removing a missing object succeeds.
    async fn delete(&self, bucket: &str, path: &StoragePath) -> ObjectStoreResult<()>;
}

/// Errors returned by object store implementations.
#[derive(Debug, Clone, Error)]
pub enum ObjectStoreError {
    /// No object exists at the path.
    #[error("object not found: {bucket}/{path}")]
    NotFound {
        /// Bucket name.
        bucket: String,
        /// Object path.
        path: StoragePath,
    },

    /// The store rejected or failed the operation.
    #[error("object store failure: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl ObjectStoreError {
    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}
