//! Asset upload, listing, and removal.

mod asset;

pub use asset::{AssetService, AssetServiceError, AssetServiceResult, AssetSettings, AssetView};
