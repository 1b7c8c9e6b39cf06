//! In-memory adapters for asset tests.

mod asset;

pub use asset::InMemoryAssetRepository;
