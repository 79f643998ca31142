//! Diesel schema for validation request persistence.

diesel::table! {
    /// Validation requests of every type in one table.
    validation_requests (id) {
        /// Request identifier.
        id -> Uuid,
        /// Owning case.
        case_id -> Uuid,
        /// Owner discriminant: `case`, `condition` or `document`.
        #[max_length = 50]
        owner_type -> Varchar,
        /// Owner identifier.
        owner_id -> Uuid,
        /// Request type.
        #[max_length = 50]
        request_type -> Varchar,
        /// Lifecycle state.
        #[max_length = 50]
        state -> Varchar,
        /// Whether a milestone closed the request.
        auto_closed -> Bool,
        /// Per-case sequence number.
        sequence -> Int4,
        /// Whether the request was raised after validation.
        post_validation -> Bool,
        /// Officer's reason.
        reason -> Nullable<Text>,
        /// Officer's suggestion.
        suggestion -> Nullable<Text>,
        /// Applicant approval decision.
        applicant_approved -> Nullable<Bool>,
        /// Applicant's rejection reason.
        applicant_rejection_reason -> Nullable<Text>,
        /// Applicant's free-text response.
        applicant_response -> Nullable<Text>,
        /// Type-specific payload.
        specific_attributes -> Jsonb,
        /// When the request was sent.
        notified_at -> Nullable<Timestamptz>,
        /// When the request was cancelled.
        cancelled_at -> Nullable<Timestamptz>,
        /// Why the request was cancelled.
        cancel_reason -> Nullable<Text>,
        /// When a milestone closed the request.
        auto_closed_at -> Nullable<Timestamptz>,
        /// Milestone that closed the request.
        #[max_length = 50]
        closing_milestone -> Nullable<Varchar>,
        /// When the request was closed.
        closed_at -> Nullable<Timestamptz>,
        /// Officer who raised the request.
        created_by -> Uuid,
        /// Party behind the latest change.
        last_actor -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
