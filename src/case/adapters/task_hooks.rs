//! Routes request transitions to the task each request type is bound to.

use crate::case::domain::CaseId;
use crate::config::RequestTaskBindings;
use crate::task_tree::{
    domain::Task,
    ports::TaskTreeRepository,
    services::{TaskTreeService, TaskTreeServiceError},
};
use crate::validation_request::{
    domain::RequestType,
    ports::{RequestTaskHooks, TaskHookError, TaskHookResult},
};
use async_trait::async_trait;
use mockable::Clock;
use tracing::debug;

/// [`RequestTaskHooks`] implementation backed by the task tree engine.
///
/// A request type whose bound path does not exist in the case's tree (for
/// example an enforcement case without a fee check) triggers no reaction.
#[derive(Clone)]
pub struct TaskTreeHooks<R, C>
where
    R: TaskTreeRepository,
    C: Clock + Send + Sync,
{
    tasks: TaskTreeService<R, C>,
    bindings: RequestTaskBindings,
}

impl<R, C> TaskTreeHooks<R, C>
where
    R: TaskTreeRepository,
    C: Clock + Send + Sync,
{
    /// Creates hooks over `tasks` using `bindings`.
    #[must_use]
    pub const fn new(tasks: TaskTreeService<R, C>, bindings: RequestTaskBindings) -> Self {
        Self { tasks, bindings }
    }

    async fn bound_task(
        &self,
        case_id: CaseId,
        request_type: RequestType,
    ) -> TaskHookResult<Option<Task>> {
        let Some(path) = self.bindings.path_for(request_type) else {
            debug!(
                case_id = %case_id,
                request_type = %request_type,
                "request type has no task binding"
            );
            return Ok(None);
        };
        match self.tasks.resolve(case_id, path).await {
            Ok(task) => Ok(Some(task)),
            Err(TaskTreeServiceError::PathNotFound { missing, .. }) => {
                debug!(
                    case_id = %case_id,
                    request_type = %request_type,
                    path = %path,
                    missing = %missing,
                    "bound task absent from case tree, skipping reaction"
                );
                Ok(None)
            }
            Err(err) => Err(TaskHookError::new(err)),
        }
    }
}

#[async_trait]
impl<R, C> RequestTaskHooks for TaskTreeHooks<R, C>
where
    R: TaskTreeRepository,
    C: Clock + Send + Sync,
{
    async fn request_raised(
        &self,
        case_id: CaseId,
        request_type: RequestType,
    ) -> TaskHookResult<()> {
        if let Some(task) = self.bound_task(case_id, request_type).await? {
            self.tasks
                .react_to_request_raised(task.id())
                .await
                .map_err(TaskHookError::new)?;
        }
        Ok(())
    }

    async fn request_closed(
        &self,
        case_id: CaseId,
        request_type: RequestType,
        approved: Option<bool>,
    ) -> TaskHookResult<()> {
        if let Some(task) = self.bound_task(case_id, request_type).await? {
            self.tasks
                .react_to_request_closed(task.id(), approved)
                .await
                .map_err(TaskHookError::new)?;
        }
        Ok(())
    }

    async fn request_cancelled(
        &self,
        case_id: CaseId,
        request_type: RequestType,
        still_unresolved: Vec<RequestType>,
    ) -> TaskHookResult<()> {
        let still_blocked = still_unresolved
            .iter()
            .any(|other| self.bindings.share_task(*other, request_type));
        if still_blocked {
            debug!(
                case_id = %case_id,
                request_type = %request_type,
                "task still blocked by another request"
            );
            return Ok(());
        }
        if let Some(task) = self.bound_task(case_id, request_type).await? {
            self.tasks
                .react_to_request_cancelled(task.id())
                .await
                .map_err(TaskHookError::new)?;
        }
        Ok(())
    }
}
