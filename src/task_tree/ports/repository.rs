//! Repository port for task tree persistence.

use crate::case::domain::CaseId;
use crate::task_tree::domain::{Task, TaskId, TaskParent, TaskSlug, TaskStatus};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task tree repository operations.
pub type TaskTreeRepositoryResult<T> = Result<T, TaskTreeRepositoryError>;

/// Task tree persistence contract.
///
/// Sibling slugs are unique per parent; implementations reject writes that
/// would break this.
#[async_trait]
pub trait TaskTreeRepository: Send + Sync {
    /// Stores a freshly instantiated tree in one write.
    ///
    /// # Errors
    ///
    /// Returns [`TaskTreeRepositoryError::DuplicateTask`] or
    /// [`TaskTreeRepositoryError::DuplicateSibling`] without storing any task
    /// of the batch.
    async fn store_tree(&self, tasks: &[Task]) -> TaskTreeRepositoryResult<()>;

    /// Persists `task` only if the stored status still equals `expected`.
    ///
    /// Visibility changes pass the task's current status as `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskTreeRepositoryError::NotFound`] or
    /// [`TaskTreeRepositoryError::StaleStatus`].
    async fn update_if_status(
        &self,
        task: &Task,
        expected: TaskStatus,
    ) -> TaskTreeRepositoryResult<()>;

    /// Finds a task by identifier.
    async fn find_by_id(&self, id: TaskId) -> TaskTreeRepositoryResult<Option<Task>>;

    /// Finds the child of `parent` with the given slug.
    async fn find_child(
        &self,
        parent: TaskParent,
        slug: &TaskSlug,
    ) -> TaskTreeRepositoryResult<Option<Task>>;

    /// Returns the direct children of `parent` ordered by position, then
    /// creation order.
    async fn children_of(&self, parent: TaskParent) -> TaskTreeRepositoryResult<Vec<Task>>;

    /// Returns every task of a case in unspecified order.
    async fn list_for_case(&self, case_id: CaseId) -> TaskTreeRepositoryResult<Vec<Task>>;
}

/// Errors returned by task tree repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskTreeRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The parent already has a child with the same slug.
    #[error("{parent:?} already has a child with slug '{slug}'")]
    DuplicateSibling {
        /// Parent holding the conflicting child.
        parent: TaskParent,
        /// Conflicting slug.
        slug: TaskSlug,
    },

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The stored status no longer matches the expected status.
    #[error("task {task_id} is {actual}, expected {expected}")]
    StaleStatus {
        /// Task identifier.
        task_id: TaskId,
        /// Status the writer expected.
        expected: TaskStatus,
        /// Status found in storage.
        actual: TaskStatus,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskTreeRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
