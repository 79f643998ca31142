//! Diesel schema for case record persistence.

diesel::table! {
    /// Case records.
    case_records (id) {
        /// Case identifier.
        id -> Uuid,
        /// Case type.
        #[max_length = 50]
        case_type -> Varchar,
        /// Owning local authority.
        local_authority_id -> Uuid,
        /// Assigned officer.
        assigned_user_id -> Nullable<Uuid>,
        /// Originating submission.
        submission_id -> Nullable<Uuid>,
        /// When the case entered assessment.
        in_assessment_at -> Nullable<Timestamptz>,
        /// Soft-deletion timestamp.
        deleted_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
