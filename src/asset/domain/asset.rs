//! Asset records and validated uploads.

use super::{AssetDomainError, AssetKind, OwnerId};
use crate::generation::domain::StoragePath;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Largest accepted upload, in bytes.
pub const MAX_ASSET_BYTES: usize = 5 * 1024 * 1024;

/// Default bucket receiving asset files.
pub const ASSET_BUCKET: &str = "assets";

/// Longest file extension kept from an uploaded file name.
const MAX_EXTENSION_LEN: usize = 8;

/// Unique identifier for an asset record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(Uuid);

impl AssetId {
    /// Creates a new random asset identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an asset identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An upload that passed type, size, and name checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUpload {
    name: String,
    kind: AssetKind,
    extension: String,
    bytes: Vec<u8>,
}

impl AssetUpload {
    /// Validates an upload.
    ///
    /// The stored extension comes from `file_name` when it has a short
    /// alphanumeric one, and from the media type otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`AssetDomainError::UnsupportedType`] for media types other
    /// than PNG, JPEG, and SVG, [`AssetDomainError::TooLarge`] above
    /// [`MAX_ASSET_BYTES`], and [`AssetDomainError::EmptyFile`] or
    /// [`AssetDomainError::EmptyName`] for blank input.
    pub fn new(
        name: &str,
        content_type: &str,
        file_name: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<Self, AssetDomainError> {
        let kind: AssetKind = content_type.parse()?;
        if bytes.len() > MAX_ASSET_BYTES {
            return Err(AssetDomainError::TooLarge {
                size: bytes.len(),
                limit: MAX_ASSET_BYTES,
            });
        }
        if bytes.is_empty() {
            return Err(AssetDomainError::EmptyFile);
        }
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(AssetDomainError::EmptyName);
        }
        let extension = file_name
            .and_then(|file| file.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| {
                !ext.is_empty()
                    && ext.len() <= MAX_EXTENSION_LEN
                    && ext.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .unwrap_or_else(|| kind.default_extension().to_owned());
        Ok(Self {
            name: trimmed.to_owned(),
            kind,
            extension,
            bytes,
        })
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the media type.
    #[must_use]
    pub const fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Returns the lowercase file extension used in the storage path.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Consumes the upload and returns the file content.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Stored asset record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    id: AssetId,
    owner_id: OwnerId,
    name: String,
    kind: AssetKind,
    storage_path: StoragePath,
    created_at: DateTime<Utc>,
}

/// Field values of an asset read back from persistence.
#[derive(Debug, Clone)]
pub struct PersistedAsset {
    /// Asset identifier.
    pub id: AssetId,
    /// Owning user.
    pub owner_id: OwnerId,
    /// Display name.
    pub name: String,
    /// Media type.
    pub kind: AssetKind,
    /// Owner-scoped storage path.
    pub storage_path: StoragePath,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
}

impl Asset {
    /// Creates the record for a fresh upload, stored at
    /// `<owner>/<asset id>.<extension>`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetDomainError::StoragePath`] when the derived path is
    /// refused.
    pub fn new(
        owner_id: OwnerId,
        upload: &AssetUpload,
        clock: &impl Clock,
    ) -> Result<Self, AssetDomainError> {
        let id = AssetId::new();
        let storage_path = StoragePath::new(format!("{owner_id}/{id}.{}", upload.extension()))?;
        Ok(Self {
            id,
            owner_id,
            name: upload.name().to_owned(),
            kind: upload.kind(),
            storage_path,
            created_at: clock.utc(),
        })
    }

    /// Rebuilds an asset from persisted fields.
    #[must_use]
    pub fn from_persisted(data: PersistedAsset) -> Self {
        Self {
            id: data.id,
            owner_id: data.owner_id,
            name: data.name,
            kind: data.kind,
            storage_path: data.storage_path,
            created_at: data.created_at,
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> AssetId {
        self.id
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the media type.
    #[must_use]
    pub const fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Returns the owner-scoped storage path.
    #[must_use]
    pub const fn storage_path(&self) -> &StoragePath {
        &self.storage_path
    }

    /// Returns the upload timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
