//! Diesel row models for asset persistence.

use super::schema::custom_assets;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row of the asset table, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = custom_assets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AssetRow {
    /// Asset identifier.
    pub id: uuid::Uuid,
    /// Owning user.
    pub owner_id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// MIME type of the stored file.
    pub file_type: String,
    /// Owner-scoped storage path.
    pub storage_path: String,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
}
