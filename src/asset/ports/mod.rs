//! Port contracts for asset persistence.
//!
//! Asset files go through the generation
//! [`ObjectStore`](crate::generation::ports::ObjectStore) port.

pub mod repository;

pub use repository::{AssetRepository, AssetRepositoryError, AssetRepositoryResult};
