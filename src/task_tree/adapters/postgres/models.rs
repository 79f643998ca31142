//! Diesel row models for task tree persistence.

use super::schema::case_tasks;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for tasks.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = case_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning case.
    pub case_id: uuid::Uuid,
    /// Parent discriminant.
    pub parent_type: String,
    /// Parent identifier.
    pub parent_id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Path segment.
    pub slug: String,
    /// Checklist status.
    pub status: String,
    /// Whether a raised request started the task.
    pub started_by_request: bool,
    /// Hidden flag.
    pub hidden: bool,
    /// Status-hidden flag.
    pub status_hidden: bool,
    /// Optional flag.
    pub optional: bool,
    /// Sibling ordering key.
    pub position: i32,
    /// Creation order within the tree.
    pub creation_order: i32,
    /// When work started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the task was completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for tasks.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = case_tasks)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning case.
    pub case_id: uuid::Uuid,
    /// Parent discriminant.
    pub parent_type: String,
    /// Parent identifier.
    pub parent_id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Path segment.
    pub slug: String,
    /// Checklist status.
    pub status: String,
    /// Whether a raised request started the task.
    pub started_by_request: bool,
    /// Hidden flag.
    pub hidden: bool,
    /// Status-hidden flag.
    pub status_hidden: bool,
    /// Optional flag.
    pub optional: bool,
    /// Sibling ordering key.
    pub position: i32,
    /// Creation order within the tree.
    pub creation_order: i32,
    /// When work started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the task was completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Columns that status and visibility changes may touch.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = case_tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskChangeset {
    /// Checklist status.
    pub status: String,
    /// Whether a raised request started the task.
    pub started_by_request: bool,
    /// Hidden flag.
    pub hidden: bool,
    /// When work started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the task was completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
