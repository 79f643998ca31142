//! Error types for task tree validation and parsing.

use thiserror::Error;

/// Errors returned while constructing task tree values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskTreeDomainError {
    /// The slug contains characters outside `[a-z0-9-]` or is badly formed.
    #[error("invalid task slug '{0}', expected lowercase letters, digits and inner hyphens")]
    InvalidSlug(String),

    /// The slug path has no segments.
    #[error("task slug path must not be empty")]
    EmptySlugPath,

    /// The task name is empty after trimming.
    #[error("task name must not be empty")]
    EmptyTaskName,

    /// Two siblings share a slug.
    #[error("duplicate task slug '{slug}' under '{parent}'")]
    DuplicateSiblingSlug {
        /// Slug path of the parent, or `/` for the case root.
        parent: String,
        /// Offending slug.
        slug: String,
    },

    /// Two siblings share a display name.
    #[error("duplicate task name '{name}' under '{parent}'")]
    DuplicateSiblingName {
        /// Slug path of the parent, or `/` for the case root.
        parent: String,
        /// Offending name.
        name: String,
    },

    /// The template defines no tasks.
    #[error("task template must define at least one task")]
    EmptyTemplate,
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing a persisted task parent discriminant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task parent kind: {0}")]
pub struct ParseTaskParentError(pub String);
