//! Domain model for custom assets.

mod asset;
mod error;
mod kind;

pub use crate::generation::domain::OwnerId;
pub use asset::{ASSET_BUCKET, Asset, AssetId, AssetUpload, MAX_ASSET_BYTES, PersistedAsset};
pub use error::AssetDomainError;
pub use kind::AssetKind;
