//! Diesel row models for credential persistence.

use super::schema::owner_credentials;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row of the credential table, used for both reads and upserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = owner_credentials)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CredentialRow {
    /// Owning user, one row per owner.
    pub owner_id: uuid::Uuid,
    /// Nonce-prefixed AES-GCM ciphertext, base64-encoded.
    pub encrypted_secret: String,
    /// Timestamp of the last upsert.
    pub updated_at: DateTime<Utc>,
}
