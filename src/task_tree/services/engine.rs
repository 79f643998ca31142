//! Task tree engine: path resolution, status writes and request reactions.

use crate::case::domain::CaseId;
use crate::error::ErrorKind;
use crate::task_tree::{
    domain::{
        ChecklistNode, RequestEvent, SlugPath, Task, TaskForest, TaskId, TaskParent, TaskStatus,
        TaskTemplate, TaskTreeDomainError,
    },
    ports::{TaskTreeRepository, TaskTreeRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Service-level errors for task tree operations.
#[derive(Debug, Error)]
pub enum TaskTreeServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskTreeDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskTreeRepositoryError),

    /// The task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A slug path segment does not resolve.
    #[error("no task at '{missing}' in case {case_id} while resolving '{path}'")]
    PathNotFound {
        /// Case being searched.
        case_id: CaseId,
        /// Requested path.
        path: SlugPath,
        /// Prefix of `path` ending at the first missing segment.
        missing: SlugPath,
    },
}

impl TaskTreeServiceError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) => ErrorKind::SchemaValidation,
            Self::NotFound(_)
            | Self::PathNotFound { .. }
            | Self::Repository(TaskTreeRepositoryError::NotFound(_)) => ErrorKind::NotFound,
            Self::Repository(TaskTreeRepositoryError::StaleStatus { .. }) => {
                ErrorKind::IllegalTransition
            }
            Self::Repository(
                TaskTreeRepositoryError::DuplicateTask(_)
                | TaskTreeRepositoryError::DuplicateSibling { .. },
            ) => ErrorKind::Conflict,
            Self::Repository(TaskTreeRepositoryError::Persistence(_)) => ErrorKind::Persistence,
        }
    }
}

/// Result type for task tree service operations.
pub type TaskTreeServiceResult<T> = Result<T, TaskTreeServiceError>;

/// Task tree orchestration service.
///
/// Every status or visibility write is a compare-and-set on the stored
/// status; a lost race surfaces as
/// [`TaskTreeRepositoryError::StaleStatus`] and is not retried.
pub struct TaskTreeService<R, C>
where
    R: TaskTreeRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> Clone for TaskTreeService<R, C>
where
    R: TaskTreeRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, C> TaskTreeService<R, C>
where
    R: TaskTreeRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task tree service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Instantiates `template` as the task tree of `case_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskTreeServiceError::Domain`] for an invalid template or
    /// [`TaskTreeServiceError::Repository`] when the tree cannot be stored.
    pub async fn build_tree(
        &self,
        case_id: CaseId,
        template: &TaskTemplate,
    ) -> TaskTreeServiceResult<Vec<Task>> {
        let tasks = template.instantiate(case_id, &*self.clock)?;
        self.repository.store_tree(&tasks).await?;
        info!(case_id = %case_id, tasks = tasks.len(), "task tree created");
        Ok(tasks)
    }

    /// Walks `path` from the case root, one segment at a time.
    ///
    /// # Errors
    ///
    /// Returns [`TaskTreeServiceError::PathNotFound`] naming the first
    /// missing segment.
    pub async fn resolve(&self, case_id: CaseId, path: &SlugPath) -> TaskTreeServiceResult<Task> {
        let mut parent = TaskParent::Case(case_id);
        let mut walked: Vec<_> = Vec::with_capacity(path.segments().len());
        let mut found = None;
        for segment in path.segments() {
            walked.push(segment.clone());
            let Some(task) = self.repository.find_child(parent, segment).await? else {
                return Err(TaskTreeServiceError::PathNotFound {
                    case_id,
                    path: path.clone(),
                    missing: SlugPath::from_segments(walked)?,
                });
            };
            parent = TaskParent::Task(task.id());
            found = Some(task);
        }
        found.ok_or(TaskTreeServiceError::Domain(
            TaskTreeDomainError::EmptySlugPath,
        ))
    }

    /// Finds a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskTreeServiceError::Repository`] when lookup fails.
    pub async fn find(&self, task_id: TaskId) -> TaskTreeServiceResult<Option<Task>> {
        Ok(self.repository.find_by_id(task_id).await?)
    }

    /// Writes `status` directly. Ancestors are not touched.
    ///
    /// # Errors
    ///
    /// Returns [`TaskTreeServiceError::NotFound`] or a repository error,
    /// including a stale-status conflict.
    pub async fn set_status(
        &self,
        task_id: TaskId,
        status: TaskStatus,
    ) -> TaskTreeServiceResult<Task> {
        let mut task = self.load(task_id).await?;
        let previous = task.status();
        task.set_status(status, &*self.clock);
        self.repository.update_if_status(&task, previous).await?;
        info!(task_id = %task_id, from = %previous, to = %status, "task status set");
        Ok(task)
    }

    /// Shows a hidden task. Its status is kept.
    ///
    /// # Errors
    ///
    /// Returns [`TaskTreeServiceError::NotFound`] or a repository error.
    pub async fn reveal(&self, task_id: TaskId) -> TaskTreeServiceResult<Task> {
        self.set_hidden(task_id, false).await
    }

    /// Hides a task. Its status is kept.
    ///
    /// # Errors
    ///
    /// Returns [`TaskTreeServiceError::NotFound`] or a repository error.
    pub async fn hide(&self, task_id: TaskId) -> TaskTreeServiceResult<Task> {
        self.set_hidden(task_id, true).await
    }

    /// Marks an untouched task as started because a request bound to it was
    /// raised.
    ///
    /// # Errors
    ///
    /// Returns [`TaskTreeServiceError::NotFound`] or a repository error.
    pub async fn react_to_request_raised(&self, task_id: TaskId) -> TaskTreeServiceResult<Task> {
        self.react(task_id, RequestEvent::Raised).await
    }

    /// Flags completed work for another look because a request bound to it
    /// was closed. Unfinished tasks keep their status whatever the decision.
    ///
    /// # Errors
    ///
    /// Returns [`TaskTreeServiceError::NotFound`] or a repository error.
    pub async fn react_to_request_closed(
        &self,
        task_id: TaskId,
        was_approved: Option<bool>,
    ) -> TaskTreeServiceResult<Task> {
        debug!(task_id = %task_id, ?was_approved, "request closed on task");
        self.react(task_id, RequestEvent::Closed).await
    }

    /// Resets a task whose only blocking request was cancelled, provided the
    /// task was started by a raised request and not by the officer.
    ///
    /// The caller decides whether the request was the sole blocker.
    ///
    /// # Errors
    ///
    /// Returns [`TaskTreeServiceError::NotFound`] or a repository error.
    pub async fn react_to_request_cancelled(&self, task_id: TaskId) -> TaskTreeServiceResult<Task> {
        self.react(task_id, RequestEvent::Cancelled).await
    }

    /// Returns the children of `parent` ordered by position, then creation
    /// order. Hidden children are included.
    ///
    /// # Errors
    ///
    /// Returns [`TaskTreeServiceError::Repository`] when lookup fails.
    pub async fn children(&self, parent: TaskParent) -> TaskTreeServiceResult<Vec<Task>> {
        Ok(self.repository.children_of(parent).await?)
    }

    /// Builds the visible checklist of a case with rolled-up statuses.
    ///
    /// # Errors
    ///
    /// Returns [`TaskTreeServiceError::Repository`] when lookup fails.
    pub async fn checklist(&self, case_id: CaseId) -> TaskTreeServiceResult<Vec<ChecklistNode>> {
        Ok(self.forest(case_id).await?.checklist())
    }

    /// Returns the read-time aggregated status of a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskTreeServiceError::NotFound`] or a repository error.
    pub async fn rollup_status(&self, task_id: TaskId) -> TaskTreeServiceResult<TaskStatus> {
        let task = self.load(task_id).await?;
        self.forest(task.case_id())
            .await?
            .rollup(task_id)
            .ok_or(TaskTreeServiceError::NotFound(task_id))
    }

    /// Returns `true` when every visible, required leaf of the case is
    /// completed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskTreeServiceError::Repository`] when lookup fails.
    pub async fn is_case_complete(&self, case_id: CaseId) -> TaskTreeServiceResult<bool> {
        Ok(self.forest(case_id).await?.is_complete())
    }

    async fn forest(&self, case_id: CaseId) -> TaskTreeServiceResult<TaskForest> {
        let tasks = self.repository.list_for_case(case_id).await?;
        Ok(TaskForest::new(case_id, tasks))
    }

    async fn load(&self, task_id: TaskId) -> TaskTreeServiceResult<Task> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or(TaskTreeServiceError::NotFound(task_id))
    }

    async fn set_hidden(&self, task_id: TaskId, hidden: bool) -> TaskTreeServiceResult<Task> {
        let mut task = self.load(task_id).await?;
        if task.is_hidden() == hidden {
            return Ok(task);
        }
        let status = task.status();
        task.set_hidden(hidden, &*self.clock);
        self.repository.update_if_status(&task, status).await?;
        info!(task_id = %task_id, hidden, "task visibility changed");
        Ok(task)
    }

    async fn react(&self, task_id: TaskId, event: RequestEvent) -> TaskTreeServiceResult<Task> {
        let mut task = self.load(task_id).await?;
        let previous = task.status();
        if !task.react_to(event, &*self.clock) {
            debug!(
                task_id = %task_id,
                status = %previous,
                event = event.as_str(),
                "task reaction not applicable"
            );
            return Ok(task);
        }
        match self.repository.update_if_status(&task, previous).await {
            Ok(()) => {}
            Err(err @ TaskTreeRepositoryError::StaleStatus { .. }) => {
                let current = self.load(task_id).await?;
                if current.is_affected_by(event) {
                    return Err(err.into());
                }
                debug!(
                    task_id = %task_id,
                    status = %current.status(),
                    event = event.as_str(),
                    "task moved concurrently, reaction no longer applicable"
                );
                return Ok(current);
            }
            Err(err) => return Err(err.into()),
        }
        info!(
            task_id = %task_id,
            from = %previous,
            to = %task.status(),
            event = event.as_str(),
            "task reacted to request"
        );
        Ok(task)
    }
}
