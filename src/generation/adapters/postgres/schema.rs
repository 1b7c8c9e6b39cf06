//! Diesel schema for generation job persistence.

diesel::table! {
    /// Generation job records, one row per submission.
    generation_jobs (id) {
        /// Job identifier.
        id -> Uuid,
        /// Submitting owner.
        owner_id -> Uuid,
        /// Job lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Progress text while running.
        progress -> Nullable<Text>,
        /// Immutable request parameters.
        request -> Jsonb,
        /// Storage path of the final image.
        image_path -> Nullable<Text>,
        /// Storage path of the thumbnail.
        thumbnail_path -> Nullable<Text>,
        /// Generator-written description.
        description -> Nullable<Text>,
        /// Free-form run metadata.
        run_metadata -> Nullable<Jsonb>,
        /// Ordered iteration records.
        iterations -> Nullable<Jsonb>,
        /// Failure message.
        error_message -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Transition to running.
        started_at -> Nullable<Timestamptz>,
        /// Terminal transition.
        completed_at -> Nullable<Timestamptz>,
        /// Latest mutation.
        updated_at -> Timestamptz,
    }
}
