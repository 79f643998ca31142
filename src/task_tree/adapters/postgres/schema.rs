//! Diesel schema for task tree persistence.

diesel::table! {
    /// Checklist tasks of every case.
    case_tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning case.
        case_id -> Uuid,
        /// Parent discriminant: `case` or `task`.
        #[max_length = 50]
        parent_type -> Varchar,
        /// Parent identifier.
        parent_id -> Uuid,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Path segment.
        #[max_length = 255]
        slug -> Varchar,
        /// Checklist status.
        #[max_length = 50]
        status -> Varchar,
        /// Whether a raised request started the task.
        started_by_request -> Bool,
        /// Hidden from the visible checklist.
        hidden -> Bool,
        /// Status suppressed from rollups.
        status_hidden -> Bool,
        /// Does not block case completion.
        optional -> Bool,
        /// Sibling ordering key.
        position -> Int4,
        /// Creation order within the tree.
        creation_order -> Int4,
        /// When work started.
        started_at -> Nullable<Timestamptz>,
        /// When the task was completed.
        completed_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
