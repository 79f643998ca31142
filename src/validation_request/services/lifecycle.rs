//! Request lifecycle engine.
//!
//! Every transition re-reads the request, applies the domain state machine
//! and persists with a compare-and-set on the previous state, so racing
//! officer and applicant sessions see exactly one winner. Task reactions run
//! after the transition has been stored.

use crate::case::{
    domain::{CaseDomainError, CaseId},
    ports::{CaseRepository, CaseRepositoryError},
};
use crate::config::LifecycleConfig;
use crate::error::ErrorKind;
use crate::validation_request::{
    domain::{
        Actor, ApplicantResponse, Milestone, NewRequestParams, RequestAction, RequestEdit,
        RequestId, RequestOwner, RequestSequence, RequestState, RequestType, SpecificAttributes,
        ValidationRequest, ValidationRequestDomainError,
    },
    ports::{
        RequestTaskHooks, RequestVersion, TaskHookError, ValidationRequestRepository,
        ValidationRequestRepositoryError,
    },
};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Tries at auto-closing a request that concurrent edits keep changing.
const MILESTONE_CLOSE_ATTEMPTS: u32 = 3;

/// Officer input for raising a request.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRequest {
    case_id: CaseId,
    owner: RequestOwner,
    request_type: RequestType,
    attributes: Value,
    reason: Option<String>,
    suggestion: Option<String>,
}

impl CreateRequest {
    /// Creates input for a request with no attributes yet.
    #[must_use]
    pub const fn new(case_id: CaseId, owner: RequestOwner, request_type: RequestType) -> Self {
        Self {
            case_id,
            owner,
            request_type,
            attributes: Value::Null,
            reason: None,
            suggestion: None,
        }
    }

    /// Sets the type-specific attribute payload.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Value) -> Self {
        self.attributes = attributes;
        self
    }

    /// Sets why the request is raised.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Sets what the officer suggests the applicant does.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Officer input for amending an unresolved request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditRequest {
    reason: Option<String>,
    suggestion: Option<String>,
    attributes: Option<Value>,
}

impl EditRequest {
    /// Creates an edit that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Replaces the suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Replaces the attribute payload.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Value) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

/// Service-level errors for the request lifecycle.
#[derive(Debug, Error)]
pub enum ValidationRequestServiceError {
    /// Domain validation or state machine check failed.
    #[error(transparent)]
    Domain(#[from] ValidationRequestDomainError),

    /// Request repository operation failed.
    #[error(transparent)]
    Repository(#[from] ValidationRequestRepositoryError),

    /// Case repository operation failed.
    #[error(transparent)]
    CaseRepository(#[from] CaseRepositoryError),

    /// The case rejects further changes.
    #[error(transparent)]
    Case(#[from] CaseDomainError),

    /// A task reaction failed after the transition was stored.
    #[error(transparent)]
    TaskHook(#[from] TaskHookError),

    /// The request does not exist.
    #[error("request not found: {0}")]
    NotFound(RequestId),

    /// The case does not exist.
    #[error("case not found: {0}")]
    CaseNotFound(CaseId),

    /// The owner names a different case.
    #[error("{owner} does not belong to case {case_id}")]
    OwnerOutsideCase {
        /// Requested owner.
        owner: RequestOwner,
        /// Case the request was raised in.
        case_id: CaseId,
    },

    /// Only officers raise requests.
    #[error("{actor} may not raise requests")]
    CreatorNotOfficer {
        /// Kind of the acting party.
        actor: &'static str,
    },

    /// A single-instance request for the same owner and type is unresolved.
    #[error("an unresolved {request_type} request already exists for {owner}")]
    Conflict {
        /// Record the requests concern.
        owner: RequestOwner,
        /// Conflicting request type.
        request_type: RequestType,
    },

    /// Another writer moved the request first.
    #[error("cannot {action} request {request_id}: it is now {actual}, not {expected}")]
    IllegalTransition {
        /// Request identifier.
        request_id: RequestId,
        /// Attempted action.
        action: RequestAction,
        /// State the transition started from.
        expected: RequestState,
        /// State found when writing.
        actual: RequestState,
    },

    /// Another writer changed the request after it was loaded.
    #[error("cannot {action} request {request_id}: it was modified concurrently")]
    ConcurrentModification {
        /// Request identifier.
        request_id: RequestId,
        /// Attempted action.
        action: RequestAction,
    },

    /// Every sequence number tried was taken by a concurrent writer.
    #[error("no free sequence number in case {case_id} after {attempts} attempts")]
    SequenceExhausted {
        /// Case identifier.
        case_id: CaseId,
        /// Attempts made.
        attempts: u32,
    },
}

impl ValidationRequestServiceError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(ValidationRequestDomainError::SchemaValidation { .. }) => {
                ErrorKind::SchemaValidation
            }
            Self::Domain(_)
            | Self::Case(_)
            | Self::CreatorNotOfficer { .. }
            | Self::IllegalTransition { .. }
            | Self::ConcurrentModification { .. }
            | Self::CaseRepository(CaseRepositoryError::Rejected(_))
            | Self::Repository(
                ValidationRequestRepositoryError::StaleState { .. }
                | ValidationRequestRepositoryError::Modified(_),
            ) => ErrorKind::IllegalTransition,
            Self::Conflict { .. }
            | Self::SequenceExhausted { .. }
            | Self::Repository(
                ValidationRequestRepositoryError::UnresolvedRequestExists { .. }
                | ValidationRequestRepositoryError::DuplicateSequence { .. }
                | ValidationRequestRepositoryError::DuplicateRequest(_),
            )
            | Self::CaseRepository(CaseRepositoryError::DuplicateCase(_)) => ErrorKind::Conflict,
            Self::NotFound(_)
            | Self::CaseNotFound(_)
            | Self::OwnerOutsideCase { .. }
            | Self::Repository(ValidationRequestRepositoryError::NotFound(_))
            | Self::CaseRepository(CaseRepositoryError::NotFound(_)) => ErrorKind::NotFound,
            Self::TaskHook(_)
            | Self::Repository(ValidationRequestRepositoryError::Persistence(_))
            | Self::CaseRepository(CaseRepositoryError::Persistence(_)) => ErrorKind::Persistence,
        }
    }
}

/// Result type for request lifecycle operations.
pub type ValidationRequestServiceResult<T> = Result<T, ValidationRequestServiceError>;

/// Request lifecycle orchestration service.
#[derive(Clone)]
pub struct ValidationRequestService<R, K, H, C>
where
    R: ValidationRequestRepository,
    K: CaseRepository,
    H: RequestTaskHooks,
    C: Clock + Send + Sync,
{
    requests: Arc<R>,
    cases: Arc<K>,
    hooks: Arc<H>,
    clock: Arc<C>,
    config: LifecycleConfig,
}

impl<R, K, H, C> ValidationRequestService<R, K, H, C>
where
    R: ValidationRequestRepository,
    K: CaseRepository,
    H: RequestTaskHooks,
    C: Clock + Send + Sync,
{
    /// Creates a new lifecycle service.
    #[must_use]
    pub const fn new(
        requests: Arc<R>,
        cases: Arc<K>,
        hooks: Arc<H>,
        clock: Arc<C>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            requests,
            cases,
            hooks,
            clock,
            config,
        }
    }

    /// Raises a new `pending` request.
    ///
    /// The next per-case sequence is claimed by storing the request; when a
    /// concurrent writer takes the same number the store is retried up to
    /// [`LifecycleConfig::max_sequence_retries`] times.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationRequestServiceError::Conflict`] when an unresolved
    /// single-instance request for the owner and type exists, a schema
    /// validation error for bad attributes, or a not-found error for the case
    /// or owner.
    pub async fn create(
        &self,
        input: CreateRequest,
        actor: Actor,
    ) -> ValidationRequestServiceResult<ValidationRequest> {
        let Some(created_by) = actor.officer() else {
            return Err(ValidationRequestServiceError::CreatorNotOfficer {
                actor: actor.kind(),
            });
        };
        let case = self
            .cases
            .find_by_id(input.case_id)
            .await?
            .ok_or(ValidationRequestServiceError::CaseNotFound(input.case_id))?;
        case.ensure_active()?;
        if matches!(input.owner, RequestOwner::Case(owner_case) if owner_case != input.case_id) {
            return Err(ValidationRequestServiceError::OwnerOutsideCase {
                owner: input.owner,
                case_id: input.case_id,
            });
        }

        let attributes = SpecificAttributes::from_json(input.request_type, input.attributes)?;
        if !input.request_type.is_multi_instance() {
            self.ensure_no_unresolved(input.owner, input.request_type)
                .await?;
        }

        let post_validation = case.is_in_assessment();
        let request = self
            .store_with_next_sequence(input.case_id, |sequence| {
                ValidationRequest::new(
                    NewRequestParams {
                        case_id: input.case_id,
                        owner: input.owner,
                        attributes: attributes.clone(),
                        reason: input.reason.clone(),
                        suggestion: input.suggestion.clone(),
                        sequence,
                        post_validation,
                        created_by,
                    },
                    self.config.max_text_length,
                    &*self.clock,
                )
            })
            .await?;

        info!(
            request_id = %request.id(),
            case_id = %request.case_id(),
            request_type = %request.request_type(),
            sequence = %request.sequence(),
            post_validation = request.is_post_validation(),
            "validation request created"
        );
        self.hooks
            .request_raised(request.case_id(), request.request_type())
            .await?;
        self.close_if_superseded(request).await
    }

    /// Sends a `pending` request to the applicant.
    ///
    /// # Errors
    ///
    /// Returns an illegal-transition error unless the request is `pending`
    /// and an officer acts.
    pub async fn dispatch(
        &self,
        id: RequestId,
        actor: Actor,
    ) -> ValidationRequestServiceResult<ValidationRequest> {
        self.transition(id, RequestAction::Dispatch, |request| {
            request.dispatch(actor, &*self.clock)
        })
        .await
    }

    /// Records the applicant's answer to an `open` request.
    ///
    /// # Errors
    ///
    /// Returns an illegal-transition error unless the request is `open` and
    /// the applicant acts, or a schema validation error for an answer that
    /// does not fit the request type.
    pub async fn respond(
        &self,
        id: RequestId,
        response: ApplicantResponse,
        actor: Actor,
    ) -> ValidationRequestServiceResult<ValidationRequest> {
        let max_text_length = self.config.max_text_length;
        let request = self
            .transition(id, RequestAction::Respond, |request| {
                request.respond(response, actor, max_text_length, &*self.clock)
            })
            .await?;
        self.hooks
            .request_closed(
                request.case_id(),
                request.request_type(),
                request.applicant_approved(),
            )
            .await?;
        Ok(request)
    }

    /// Withdraws an unresolved request.
    ///
    /// # Errors
    ///
    /// Returns an illegal-transition error from a terminal state or for a
    /// non-officer, or a schema validation error for an empty reason.
    pub async fn cancel(
        &self,
        id: RequestId,
        reason: &str,
        actor: Actor,
    ) -> ValidationRequestServiceResult<ValidationRequest> {
        let max_text_length = self.config.max_text_length;
        let request = self
            .transition(id, RequestAction::Cancel, |request| {
                request.cancel(reason, actor, max_text_length, &*self.clock)
            })
            .await?;

        let still_unresolved = self
            .requests
            .list_for_case(request.case_id())
            .await?
            .into_iter()
            .filter(|other| other.id() != request.id() && other.state().is_unresolved())
            .map(|other| other.request_type())
            .collect();
        self.hooks
            .request_cancelled(request.case_id(), request.request_type(), still_unresolved)
            .await?;
        Ok(request)
    }

    /// Closes an unresolved milestone-sensitive request on behalf of the
    /// system.
    ///
    /// # Errors
    ///
    /// Returns an illegal-transition error from a terminal state, for a
    /// non-system actor, or for a type that milestones do not close.
    pub async fn auto_close(
        &self,
        id: RequestId,
        milestone: Milestone,
        actor: Actor,
    ) -> ValidationRequestServiceResult<ValidationRequest> {
        let request = self
            .transition(id, RequestAction::AutoClose, |request| {
                request.auto_close(milestone, actor, &*self.clock)
            })
            .await?;
        self.hooks
            .request_closed(request.case_id(), request.request_type(), None)
            .await?;
        Ok(request)
    }

    /// Auto-closes every eligible request of a case for `milestone`.
    ///
    /// Entering assessment only supersedes requests raised before it.
    /// Requests another writer resolved in the meantime are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first error other than a lost race.
    pub async fn auto_close_for_milestone(
        &self,
        case_id: CaseId,
        milestone: Milestone,
        actor: Actor,
    ) -> ValidationRequestServiceResult<Vec<ValidationRequest>> {
        let candidates: Vec<RequestId> = self
            .requests
            .list_for_case(case_id)
            .await?
            .into_iter()
            .filter(|request| {
                request.state().is_unresolved()
                    && request.request_type().is_milestone_sensitive()
                    && !(milestone == Milestone::EnteredAssessment
                        && request.is_post_validation())
            })
            .map(|request| request.id())
            .collect();

        let mut closed = Vec::with_capacity(candidates.len());
        for id in candidates {
            if let Some(request) = self.close_for_milestone(id, milestone, actor).await? {
                closed.push(request);
            }
        }
        Ok(closed)
    }

    /// Auto-closes one request, retrying when a concurrent edit lands first.
    ///
    /// Returns `None` when another writer resolved the request.
    async fn close_for_milestone(
        &self,
        id: RequestId,
        milestone: Milestone,
        actor: Actor,
    ) -> ValidationRequestServiceResult<Option<ValidationRequest>> {
        let mut attempt = 1;
        loop {
            let err = match self.auto_close(id, milestone, actor).await {
                Ok(request) => return Ok(Some(request)),
                Err(ValidationRequestServiceError::ConcurrentModification { .. })
                    if attempt < MILESTONE_CLOSE_ATTEMPTS =>
                {
                    debug!(request_id = %id, attempt, "request edited during auto close, retrying");
                    attempt += 1;
                    continue;
                }
                Err(err) if err.kind() == ErrorKind::IllegalTransition => err,
                Err(err) => return Err(err),
            };
            if self.load(id).await?.state().is_unresolved() {
                return Err(err);
            }
            warn!(
                request_id = %id,
                milestone = %milestone,
                error = %err,
                "skipping request resolved concurrently"
            );
            return Ok(None);
        }
    }

    /// Closes a freshly stored pre-validation request when its case entered
    /// assessment while the request was being created, since that
    /// milestone's sweep may have listed the case's requests before this one
    /// was stored.
    async fn close_if_superseded(
        &self,
        request: ValidationRequest,
    ) -> ValidationRequestServiceResult<ValidationRequest> {
        if request.is_post_validation() || !request.request_type().is_milestone_sensitive() {
            return Ok(request);
        }
        let in_assessment = self
            .cases
            .find_by_id(request.case_id())
            .await?
            .is_some_and(|case| case.is_in_assessment());
        if !in_assessment {
            return Ok(request);
        }

        let id = request.id();
        match self
            .close_for_milestone(id, Milestone::EnteredAssessment, Actor::System)
            .await?
        {
            Some(closed) => {
                warn!(
                    request_id = %id,
                    case_id = %closed.case_id(),
                    "case entered assessment during creation, request closed"
                );
                Ok(closed)
            }
            None => self.load(id).await,
        }
    }

    /// Amends officer-authored fields of an unresolved request.
    ///
    /// # Errors
    ///
    /// Returns an illegal-transition error from a terminal state or for a
    /// non-officer, or a schema validation error for invalid fields.
    pub async fn edit(
        &self,
        id: RequestId,
        input: EditRequest,
        actor: Actor,
    ) -> ValidationRequestServiceResult<ValidationRequest> {
        let request_type = self.load(id).await?.request_type();
        let attributes = input
            .attributes
            .map(|value| SpecificAttributes::from_json(request_type, value))
            .transpose()?;
        let edit = RequestEdit {
            reason: input.reason,
            suggestion: input.suggestion,
            attributes,
        };
        let max_text_length = self.config.max_text_length;
        self.transition(id, RequestAction::Edit, |request| {
            request.edit(edit, actor, max_text_length, &*self.clock)
        })
        .await
    }

    /// Finds a request by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationRequestServiceError::Repository`] when lookup
    /// fails.
    pub async fn find(
        &self,
        id: RequestId,
    ) -> ValidationRequestServiceResult<Option<ValidationRequest>> {
        Ok(self.requests.find_by_id(id).await?)
    }

    /// Lists the requests of a case ordered by sequence.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationRequestServiceError::Repository`] when lookup
    /// fails.
    pub async fn list_for_case(
        &self,
        case_id: CaseId,
    ) -> ValidationRequestServiceResult<Vec<ValidationRequest>> {
        Ok(self.requests.list_for_case(case_id).await?)
    }

    /// Lists requests concerning `owner`, optionally of one type, ordered by
    /// sequence.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationRequestServiceError::Repository`] when lookup
    /// fails.
    pub async fn list_for_owner(
        &self,
        owner: RequestOwner,
        request_type: Option<RequestType>,
    ) -> ValidationRequestServiceResult<Vec<ValidationRequest>> {
        Ok(self.requests.list_for_owner(owner, request_type).await?)
    }

    /// Builds and stores a request under the next free sequence number,
    /// retrying when a concurrent writer claims the number first.
    async fn store_with_next_sequence<F>(
        &self,
        case_id: CaseId,
        build: F,
    ) -> ValidationRequestServiceResult<ValidationRequest>
    where
        F: Fn(RequestSequence) -> Result<ValidationRequest, ValidationRequestDomainError> + Send,
    {
        for attempt in 1..=self.config.max_sequence_retries {
            let sequence = self.requests.next_sequence(case_id).await?;
            let request = build(sequence)?;
            match self.requests.store(&request).await {
                Ok(()) => return Ok(request),
                Err(ValidationRequestRepositoryError::DuplicateSequence { .. }) => {
                    warn!(
                        case_id = %case_id,
                        sequence = %sequence,
                        attempt,
                        "request sequence taken, retrying"
                    );
                }
                Err(ValidationRequestRepositoryError::UnresolvedRequestExists {
                    owner,
                    request_type,
                }) => {
                    return Err(ValidationRequestServiceError::Conflict {
                        owner,
                        request_type,
                    });
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(ValidationRequestServiceError::SequenceExhausted {
            case_id,
            attempts: self.config.max_sequence_retries,
        })
    }

    async fn ensure_no_unresolved(
        &self,
        owner: RequestOwner,
        request_type: RequestType,
    ) -> ValidationRequestServiceResult<()> {
        let existing = self
            .requests
            .list_for_owner(owner, Some(request_type))
            .await?;
        if existing.iter().any(|request| request.state().is_unresolved()) {
            return Err(ValidationRequestServiceError::Conflict {
                owner,
                request_type,
            });
        }
        Ok(())
    }

    async fn load(&self, id: RequestId) -> ValidationRequestServiceResult<ValidationRequest> {
        self.requests
            .find_by_id(id)
            .await?
            .ok_or(ValidationRequestServiceError::NotFound(id))
    }

    async fn transition<F>(
        &self,
        id: RequestId,
        action: RequestAction,
        apply: F,
    ) -> ValidationRequestServiceResult<ValidationRequest>
    where
        F: FnOnce(&mut ValidationRequest) -> Result<(), ValidationRequestDomainError> + Send,
    {
        let mut request = self.load(id).await?;
        let loaded = RequestVersion::of(&request);
        let from = loaded.state;
        apply(&mut request)?;
        match self.requests.update_if_unchanged(&request, loaded).await {
            Ok(()) => {}
            Err(ValidationRequestRepositoryError::StaleState { actual, .. }) => {
                return Err(ValidationRequestServiceError::IllegalTransition {
                    request_id: id,
                    action,
                    expected: from,
                    actual,
                });
            }
            Err(ValidationRequestRepositoryError::Modified(_)) => {
                return Err(ValidationRequestServiceError::ConcurrentModification {
                    request_id: id,
                    action,
                });
            }
            Err(err) => return Err(err.into()),
        }
        info!(
            request_id = %id,
            case_id = %request.case_id(),
            action = %action,
            from = %from,
            to = %request.state(),
            "validation request transitioned"
        );
        Ok(request)
    }
}
