//! `PostgreSQL` adapters for asset persistence.

mod models;
mod repository;
mod schema;

pub use repository::PostgresAssetRepository;
