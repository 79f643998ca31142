//! Case record service: opening cases and driving case milestones.

use crate::case::{
    domain::{
        CaseChange, CaseDomainError, CaseId, CaseRecord, CaseType, LocalAuthorityId, SubmissionId,
        UserId,
    },
    ports::{CaseRepository, CaseRepositoryError, TaskTemplateSource, TemplateSourceError},
};
use crate::error::ErrorKind;
use crate::task_tree::{
    domain::{SlugPath, Task},
    ports::TaskTreeRepository,
    services::{TaskTreeService, TaskTreeServiceError},
};
use crate::validation_request::{
    domain::{Actor, Milestone, RequestOwner, RequestType, ValidationRequest},
    ports::{RequestTaskHooks, ValidationRequestRepository},
    services::{ValidationRequestService, ValidationRequestServiceError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Input for opening a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenCase {
    /// Kind of case; selects the task template.
    pub case_type: CaseType,
    /// Local authority handling the case.
    pub local_authority: LocalAuthorityId,
    /// Submission the case was created from, if any.
    pub submission: Option<SubmissionId>,
}

/// Service-level errors for case operations.
#[derive(Debug, Error)]
pub enum CaseServiceError {
    /// The case rejected the change.
    #[error(transparent)]
    Domain(#[from] CaseDomainError),

    /// Case repository operation failed.
    #[error(transparent)]
    Repository(#[from] CaseRepositoryError),

    /// No usable template for the case type.
    #[error(transparent)]
    Template(#[from] TemplateSourceError),

    /// Task tree operation failed.
    #[error(transparent)]
    TaskTree(#[from] TaskTreeServiceError),

    /// Request lifecycle operation failed.
    #[error(transparent)]
    Requests(#[from] ValidationRequestServiceError),

    /// The case does not exist.
    #[error("case not found: {0}")]
    NotFound(CaseId),

    /// No consultation task path is configured.
    #[error("consultation task path is not configured")]
    ConsultationNotConfigured,
}

impl CaseServiceError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) | Self::Repository(CaseRepositoryError::Rejected(_)) => {
                ErrorKind::IllegalTransition
            }
            Self::Repository(CaseRepositoryError::DuplicateCase(_)) => ErrorKind::Conflict,
            Self::Repository(CaseRepositoryError::NotFound(_)) | Self::NotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Repository(CaseRepositoryError::Persistence(_)) => ErrorKind::Persistence,
            Self::Template(_) | Self::ConsultationNotConfigured => ErrorKind::Configuration,
            Self::TaskTree(err) => err.kind(),
            Self::Requests(err) => err.kind(),
        }
    }
}

/// Result type for case service operations.
pub type CaseServiceResult<T> = Result<T, CaseServiceError>;

/// Case record orchestration service.
///
/// Owns the two engines so that case milestones reach both the task tree
/// and the case's requests.
#[derive(Clone)]
pub struct CaseService<K, T, R, H, C>
where
    K: CaseRepository,
    T: TaskTreeRepository,
    R: ValidationRequestRepository,
    H: RequestTaskHooks,
    C: Clock + Send + Sync,
{
    cases: Arc<K>,
    templates: Arc<dyn TaskTemplateSource>,
    tasks: TaskTreeService<T, C>,
    requests: ValidationRequestService<R, K, H, C>,
    clock: Arc<C>,
    consultation_task_path: Option<SlugPath>,
}

impl<K, T, R, H, C> CaseService<K, T, R, H, C>
where
    K: CaseRepository,
    T: TaskTreeRepository,
    R: ValidationRequestRepository,
    H: RequestTaskHooks,
    C: Clock + Send + Sync,
{
    /// Creates a new case service.
    #[must_use]
    pub const fn new(
        cases: Arc<K>,
        templates: Arc<dyn TaskTemplateSource>,
        tasks: TaskTreeService<T, C>,
        requests: ValidationRequestService<R, K, H, C>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            cases,
            templates,
            tasks,
            requests,
            clock,
            consultation_task_path: None,
        }
    }

    /// Sets the root of the task subtree toggled by
    /// [`CaseService::set_consultation_required`].
    #[must_use]
    pub fn with_consultation_task_path(mut self, path: Option<SlugPath>) -> Self {
        self.consultation_task_path = path;
        self
    }

    /// Returns the task tree engine.
    #[must_use]
    pub const fn tasks(&self) -> &TaskTreeService<T, C> {
        &self.tasks
    }

    /// Returns the request lifecycle engine.
    #[must_use]
    pub const fn requests(&self) -> &ValidationRequestService<R, K, H, C> {
        &self.requests
    }

    /// Opens a case and seeds its task tree from the case type's template.
    ///
    /// # Errors
    ///
    /// Returns [`CaseServiceError::Template`] when no valid template exists,
    /// or a repository error when storing the case or its tree fails.
    pub async fn open(&self, input: OpenCase) -> CaseServiceResult<CaseRecord> {
        let template = self.templates.template_for(input.case_type)?;
        let case = CaseRecord::open(
            input.case_type,
            input.local_authority,
            input.submission,
            &*self.clock,
        );
        self.cases.store(&case).await?;
        self.tasks.build_tree(case.id(), &template).await?;
        info!(case_id = %case.id(), case_type = %case.case_type(), "case opened");
        Ok(case)
    }

    /// Finds a case by identifier, including soft-deleted cases.
    ///
    /// # Errors
    ///
    /// Returns [`CaseServiceError::Repository`] when lookup fails.
    pub async fn find(&self, case_id: CaseId) -> CaseServiceResult<Option<CaseRecord>> {
        Ok(self.cases.find_by_id(case_id).await?)
    }

    /// Assigns an officer to the case.
    ///
    /// # Errors
    ///
    /// Returns [`CaseServiceError::NotFound`] or
    /// [`CaseServiceError::Domain`] for a deleted case.
    pub async fn assign(&self, case_id: CaseId, user: UserId) -> CaseServiceResult<CaseRecord> {
        self.set_assignee(case_id, Some(user)).await
    }

    /// Clears the case's assigned officer.
    ///
    /// # Errors
    ///
    /// Returns [`CaseServiceError::NotFound`] or
    /// [`CaseServiceError::Domain`] for a deleted case.
    pub async fn unassign(&self, case_id: CaseId) -> CaseServiceResult<CaseRecord> {
        self.set_assignee(case_id, None).await
    }

    /// Returns requests concerning `owner`, optionally of one type, ordered
    /// by sequence.
    ///
    /// # Errors
    ///
    /// Returns [`CaseServiceError::Requests`] when lookup fails.
    pub async fn requests_for(
        &self,
        owner: RequestOwner,
        request_type: Option<RequestType>,
    ) -> CaseServiceResult<Vec<ValidationRequest>> {
        Ok(self.requests.list_for_owner(owner, request_type).await?)
    }

    /// Records that the case entered assessment and auto-closes the
    /// milestone-sensitive requests raised before it.
    ///
    /// The milestone timestamp is written once. Calling again on a case
    /// already in assessment keeps that timestamp and re-runs the sweep, so
    /// a sweep interrupted by a failure can be completed.
    ///
    /// Returns the case and the requests this call closed.
    ///
    /// # Errors
    ///
    /// Returns [`CaseServiceError::NotFound`],
    /// [`CaseServiceError::Domain`] for a deleted case, or the sweep's
    /// error.
    pub async fn mark_in_assessment(
        &self,
        case_id: CaseId,
    ) -> CaseServiceResult<(CaseRecord, Vec<ValidationRequest>)> {
        let case = match self.change(case_id, CaseChange::EnterAssessment).await {
            Ok(case) => {
                info!(case_id = %case_id, "case entered assessment");
                case
            }
            Err(CaseServiceError::Domain(CaseDomainError::AlreadyInAssessment(_))) => {
                debug!(case_id = %case_id, "assessment already recorded, repeating sweep");
                self.load(case_id).await?
            }
            Err(err) => return Err(err),
        };

        let closed = self
            .requests
            .auto_close_for_milestone(case_id, Milestone::EnteredAssessment, Actor::System)
            .await?;
        Ok((case, closed))
    }

    /// Reveals or hides the consultation subtree root.
    ///
    /// # Errors
    ///
    /// Returns [`CaseServiceError::ConsultationNotConfigured`] without a
    /// configured path, or a task tree error when the path does not resolve.
    pub async fn set_consultation_required(
        &self,
        case_id: CaseId,
        required: bool,
    ) -> CaseServiceResult<Task> {
        let path = self
            .consultation_task_path
            .as_ref()
            .ok_or(CaseServiceError::ConsultationNotConfigured)?;
        self.load(case_id).await?.ensure_active()?;
        let task = self.tasks.resolve(case_id, path).await?;
        let updated = if required {
            self.tasks.reveal(task.id()).await?
        } else {
            self.tasks.hide(task.id()).await?
        };
        Ok(updated)
    }

    /// Soft-deletes the case.
    ///
    /// # Errors
    ///
    /// Returns [`CaseServiceError::NotFound`] or
    /// [`CaseServiceError::Domain`] when already deleted.
    pub async fn soft_delete(&self, case_id: CaseId) -> CaseServiceResult<CaseRecord> {
        let case = self.change(case_id, CaseChange::SoftDelete).await?;
        info!(case_id = %case_id, "case soft-deleted");
        Ok(case)
    }

    async fn set_assignee(
        &self,
        case_id: CaseId,
        user: Option<UserId>,
    ) -> CaseServiceResult<CaseRecord> {
        let case = self.change(case_id, CaseChange::Assign(user)).await?;
        info!(case_id = %case_id, assigned_user = ?user, "case assignment changed");
        Ok(case)
    }

    async fn change(&self, case_id: CaseId, change: CaseChange) -> CaseServiceResult<CaseRecord> {
        self.cases
            .apply(case_id, change, self.clock.utc())
            .await
            .map_err(|err| match err {
                CaseRepositoryError::Rejected(domain) => CaseServiceError::Domain(domain),
                CaseRepositoryError::NotFound(id) => CaseServiceError::NotFound(id),
                other => CaseServiceError::Repository(other),
            })
    }

    async fn load(&self, case_id: CaseId) -> CaseServiceResult<CaseRecord> {
        self.cases
            .find_by_id(case_id)
            .await?
            .ok_or(CaseServiceError::NotFound(case_id))
    }
}
