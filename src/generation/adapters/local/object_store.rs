//! Object store that keeps artifacts under a capability-scoped directory and
//! issues HMAC-signed retrieval URLs.

use crate::generation::{
    domain::{SignedUrl, StoragePath, is_valid_bucket_name},
    ports::{ObjectStore, ObjectStoreError, ObjectStoreResult},
};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use hmac::{Hmac, Mac};
use mockable::Clock;
use secrecy::{ExposeSecret, SecretSlice};
use sha2::Sha256;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Reasons a presented retrieval URL is refused.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum UrlVerificationError {
    /// The expiry instant has passed.
    #[error("signed url has expired")]
    Expired,
    /// The signature does not match the bucket, path, and expiry.
    #[error("signed url signature is invalid")]
    BadSignature,
}

/// Filesystem object store rooted at a single directory.
///
/// Each bucket is a subdirectory of the root. Retrieval URLs carry an expiry
/// timestamp and an HMAC-SHA256 signature over bucket, path, and expiry; a
/// file server checks them with [`LocalObjectStore::verify`].
pub struct LocalObjectStore<C: Clock + Send + Sync> {
    root: Arc<Dir>,
    base_url: String,
    signing_key: SecretSlice<u8>,
    clock: Arc<C>,
}

impl<C: Clock + Send + Sync + 'static> LocalObjectStore<C> {
    /// Opens the store rooted at `root`, creating the directory when absent.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the root cannot be created or opened.
    pub fn open(
        root: &Utf8Path,
        base_url: impl Into<String>,
        signing_key: Vec<u8>,
        clock: Arc<C>,
    ) -> io::Result<Self> {
        std::fs::create_dir_all(root)?;
        let dir = Dir::open_ambient_dir(root, ambient_authority())?;
        Ok(Self {
            root: Arc::new(dir),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            signing_key: SecretSlice::from(signing_key),
            clock,
        })
    }

    /// Checks a presented signature against the bucket, path, and expiry.
    ///
    /// # Errors
    ///
    /// Returns [`UrlVerificationError::Expired`] once `expires` has passed
    /// and [`UrlVerificationError::BadSignature`] when the signature does not
    /// match.
    pub fn verify(
        &self,
        bucket: &str,
        path: &str,
        expires: i64,
        signature: &str,
    ) -> Result<(), UrlVerificationError> {
        if self.clock.utc().timestamp() > expires {
            return Err(UrlVerificationError::Expired);
        }
        let presented = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| UrlVerificationError::BadSignature)?;
        let mac = self
            .mac_for(bucket, path, expires)
            .map_err(|_| UrlVerificationError::BadSignature)?;
        mac.verify_slice(&presented)
            .map_err(|_| UrlVerificationError::BadSignature)
    }

    fn mac_for(&self, bucket: &str, path: &str, expires: i64) -> io::Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.signing_key.expose_secret())
            .map_err(|err| io::Error::other(err.to_string()))?;
        mac.update(bucket.as_bytes());
        mac.update(b"/");
        mac.update(path.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }

    async fn run_blocking<F, T>(&self, f: F) -> ObjectStoreResult<T>
    where
        F: FnOnce(&Dir) -> io::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let root = Arc::clone(&self.root);
        tokio::task::spawn_blocking(move || f(&root))
            .await
            .map_err(ObjectStoreError::backend)?
            .map_err(ObjectStoreError::backend)
    }
}

fn bucket_dir(bucket: &str) -> io::Result<&Utf8Path> {
    if !is_valid_bucket_name(bucket) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid bucket name '{bucket}'"),
        ));
    }
    Ok(Utf8Path::new(bucket))
}

fn object_path(bucket: &str, path: &StoragePath) -> io::Result<camino::Utf8PathBuf> {
    Ok(bucket_dir(bucket)?.join(path.as_str()))
}

#[async_trait]
impl<C: Clock + Send + Sync + 'static> ObjectStore for LocalObjectStore<C> {
    async fn put(
        &self,
        bucket: &str,
        path: &StoragePath,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> ObjectStoreResult<()> {
        let target = object_path(bucket, path).map_err(ObjectStoreError::backend)?;
        self.run_blocking(move |root| {
            if let Some(parent) = target.parent() {
                root.create_dir_all(parent)?;
            }
            root.write(&target, bytes)
        })
        .await
    }

    async fn signed_url(
        &self,
        bucket: &str,
        path: &StoragePath,
        ttl: Duration,
    ) -> ObjectStoreResult<SignedUrl> {
        let target = object_path(bucket, path).map_err(ObjectStoreError::backend)?;
        let exists = self
            .run_blocking(move |root| root.try_exists(&target))
            .await?;
        if !exists {
            return Err(ObjectStoreError::NotFound {
                bucket: bucket.to_owned(),
                path: path.clone(),
            });
        }

        let lifetime = chrono::Duration::from_std(ttl).map_err(ObjectStoreError::backend)?;
        let expires = self
            .clock
            .utc()
            .checked_add_signed(lifetime)
            .ok_or_else(|| ObjectStoreError::backend(io::Error::other("url expiry overflow")))?
            .timestamp();
        let mac = self
            .mac_for(bucket, path.as_str(), expires)
            .map_err(ObjectStoreError::backend)?;
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(SignedUrl::new(format!(
            "{}/{bucket}/{path}?expires={expires}&signature={signature}",
            self.base_url
        )))
    }

    async fn delete(&self, bucket: &str, path: &StoragePath) -> ObjectStoreResult<()> {
        let target = object_path(bucket, path).map_err(ObjectStoreError::backend)?;
        self.run_blocking(move |root| match root.remove_file(&target) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        })
        .await
    }
}
