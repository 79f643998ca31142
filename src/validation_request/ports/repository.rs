//! Repository port for validation request persistence.

use crate::case::domain::CaseId;
use crate::validation_request::domain::{
    RequestId, RequestOwner, RequestSequence, RequestState, RequestType, ValidationRequest,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for validation request repository operations.
pub type ValidationRequestRepositoryResult<T> = Result<T, ValidationRequestRepositoryError>;

/// Stored version of a request that a compare-and-set write replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestVersion {
    /// Lifecycle state when the request was loaded.
    pub state: RequestState,
    /// Modification timestamp when the request was loaded.
    pub updated_at: DateTime<Utc>,
}

impl RequestVersion {
    /// Captures the version of a loaded request.
    #[must_use]
    pub const fn of(request: &ValidationRequest) -> Self {
        Self {
            state: request.state(),
            updated_at: request.updated_at(),
        }
    }
}

/// Validation request persistence contract.
///
/// Implementations enforce two invariants at write time: `(case_id,
/// sequence)` is unique, and at most one request per `(owner, request_type)`
/// is unresolved for single-instance request types.
#[async_trait]
pub trait ValidationRequestRepository: Send + Sync {
    /// Stores a new request.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationRequestRepositoryError::DuplicateRequest`] when the
    /// identifier exists, [`ValidationRequestRepositoryError::DuplicateSequence`]
    /// when the case already used the sequence number, or
    /// [`ValidationRequestRepositoryError::UnresolvedRequestExists`] when a
    /// single-instance request for the same owner and type is unresolved.
    async fn store(&self, request: &ValidationRequest) -> ValidationRequestRepositoryResult<()>;

    /// Persists `request` only if the stored copy is still the `loaded`
    /// version: same state and same modification timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationRequestRepositoryError::NotFound`] when the request
    /// does not exist, [`ValidationRequestRepositoryError::StaleState`] when
    /// another writer changed the state first, or
    /// [`ValidationRequestRepositoryError::Modified`] when another writer
    /// changed the request without moving its state.
    async fn update_if_unchanged(
        &self,
        request: &ValidationRequest,
        loaded: RequestVersion,
    ) -> ValidationRequestRepositoryResult<()>;

    /// Finds a request by identifier.
    ///
    /// Returns `None` when the request does not exist.
    async fn find_by_id(
        &self,
        id: RequestId,
    ) -> ValidationRequestRepositoryResult<Option<ValidationRequest>>;

    /// Returns every request of a case ordered by sequence.
    async fn list_for_case(
        &self,
        case_id: CaseId,
    ) -> ValidationRequestRepositoryResult<Vec<ValidationRequest>>;

    /// Returns requests concerning `owner`, optionally filtered by type,
    /// ordered by sequence.
    async fn list_for_owner(
        &self,
        owner: RequestOwner,
        request_type: Option<RequestType>,
    ) -> ValidationRequestRepositoryResult<Vec<ValidationRequest>>;

    /// Returns the next unused sequence number for a case.
    ///
    /// The value is a hint; [`ValidationRequestRepository::store`] remains the
    /// authority on uniqueness.
    async fn next_sequence(&self, case_id: CaseId)
    -> ValidationRequestRepositoryResult<RequestSequence>;
}

/// Errors returned by validation request repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ValidationRequestRepositoryError {
    /// A request with the same identifier already exists.
    #[error("duplicate request identifier: {0}")]
    DuplicateRequest(RequestId),

    /// The sequence number is already used within the case.
    #[error("sequence {sequence} already used in case {case_id}")]
    DuplicateSequence {
        /// Case identifier.
        case_id: CaseId,
        /// Conflicting sequence number.
        sequence: RequestSequence,
    },

    /// A single-instance request for the same owner and type is unresolved.
    #[error("an unresolved {request_type} request already exists for {owner}")]
    UnresolvedRequestExists {
        /// Record the requests concern.
        owner: RequestOwner,
        /// Conflicting request type.
        request_type: RequestType,
    },

    /// The request was not found.
    #[error("request not found: {0}")]
    NotFound(RequestId),

    /// The stored state no longer matches the expected state.
    #[error("request {request_id} is {actual}, expected {expected}")]
    StaleState {
        /// Request identifier.
        request_id: RequestId,
        /// State the writer expected.
        expected: RequestState,
        /// State found in storage.
        actual: RequestState,
    },

    /// Another writer changed the request while keeping its state.
    #[error("request {0} was modified concurrently")]
    Modified(RequestId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ValidationRequestRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
