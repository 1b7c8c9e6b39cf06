//! Diesel schema for asset persistence.

diesel::table! {
    /// Owner-uploaded assets, one row per file.
    custom_assets (id) {
        /// Asset identifier.
        id -> Uuid,
        /// Owning user.
        owner_id -> Uuid,
        /// Display name.
        name -> Text,
        /// MIME type.
        #[max_length = 32]
        file_type -> Varchar,
        /// Owner-scoped storage path.
        storage_path -> Text,
        /// Upload timestamp.
        created_at -> Timestamptz,
    }
}
