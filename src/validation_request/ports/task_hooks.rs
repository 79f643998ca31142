//! Port through which request transitions reach the task tree.

use crate::case::domain::CaseId;
use crate::validation_request::domain::RequestType;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task hook calls.
pub type TaskHookResult<T> = Result<T, TaskHookError>;

/// Reactions the task tree performs when requests change state.
///
/// The lifecycle service calls these after the request transition has been
/// persisted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestTaskHooks: Send + Sync {
    /// A request of `request_type` was raised in the case.
    async fn request_raised(&self, case_id: CaseId, request_type: RequestType)
    -> TaskHookResult<()>;

    /// A request was closed by the applicant or by a milestone.
    ///
    /// `approved` carries the applicant's decision, if any.
    async fn request_closed(
        &self,
        case_id: CaseId,
        request_type: RequestType,
        approved: Option<bool>,
    ) -> TaskHookResult<()>;

    /// A request was cancelled.
    ///
    /// `still_unresolved` lists the types of the case's other unresolved
    /// requests, so the hook can tell whether the cancelled request was the
    /// last one holding its task.
    async fn request_cancelled(
        &self,
        case_id: CaseId,
        request_type: RequestType,
        still_unresolved: Vec<RequestType>,
    ) -> TaskHookResult<()>;
}

/// Failure raised by a task hook.
#[derive(Debug, Clone, Error)]
#[error("task hook failed: {0}")]
pub struct TaskHookError(pub Arc<dyn std::error::Error + Send + Sync>);

impl TaskHookError {
    /// Wraps the underlying failure.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}
