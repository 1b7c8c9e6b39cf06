//! Diesel schema for credential persistence.

diesel::table! {
    /// Encrypted generation credentials, one row per owner.
    owner_credentials (owner_id) {
        /// Owning user.
        owner_id -> Uuid,
        /// Encoded nonce and ciphertext.
        encrypted_secret -> Text,
        /// Last write timestamp.
        updated_at -> Timestamptz,
    }
}
