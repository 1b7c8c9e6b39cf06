//! In-memory object store with failure injection for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::generation::{
    domain::{SignedUrl, StoragePath},
    ports::{ObjectStore, ObjectStoreError, ObjectStoreResult},
};

/// Object stored in memory together with its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Raw object bytes.
    pub bytes: Vec<u8>,
    /// Declared MIME type.
    pub content_type: String,
}

type ObjectKey = (String, String);

/// Thread-safe in-memory object store.
///
/// Uploads can be made to fail on demand to exercise publish-failure paths.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<RwLock<HashMap<ObjectKey, StoredObject>>>,
    fail_puts: Arc<AtomicBool>,
}

impl InMemoryObjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent uploads fail (or succeed again).
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Returns the object stored at `path`, if any.
    #[must_use]
    pub fn object(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .ok()
            .and_then(|objects| objects.get(&key(bucket, path)).cloned())
    }

    /// Returns the number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().map_or(0, |objects| objects.len())
    }

    /// Returns whether the store holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn key(bucket: &str, path: &str) -> ObjectKey {
    (bucket.to_owned(), path.to_owned())
}

fn lock_error(err: impl ToString) -> ObjectStoreError {
    ObjectStoreError::backend(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(
        &self,
        bucket: &str,
        path: &StoragePath,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> ObjectStoreResult<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::backend(std::io::Error::other(
                "upload rejected by store",
            )));
        }
        let mut objects = self.objects.write().map_err(lock_error)?;
        objects.insert(
            key(bucket, path.as_str()),
            StoredObject {
                bytes,
                content_type: content_type.to_owned(),
            },
        );
        Ok(())
    }

    async fn signed_url(
        &self,
        bucket: &str,
        path: &StoragePath,
        ttl: Duration,
    ) -> ObjectStoreResult<SignedUrl> {
        let objects = self.objects.read().map_err(lock_error)?;
        if !objects.contains_key(&key(bucket, path.as_str())) {
            return Err(ObjectStoreError::NotFound {
                bucket: bucket.to_owned(),
                path: path.clone(),
            });
        }
        Ok(SignedUrl::new(format!(
            "memory://{bucket}/{path}?expires_in={}",
            ttl.as_secs()
        )))
    }

    async fn delete(&self, bucket: &str, path: &StoragePath) -> ObjectStoreResult<()> {
        let mut objects = self.objects.write().map_err(lock_error)?;
        objects.remove(&key(bucket, path.as_str()));
        Ok(())
    }
}
