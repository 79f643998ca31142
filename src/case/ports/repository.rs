//! Repository port for case record persistence.

use crate::case::domain::{CaseChange, CaseDomainError, CaseId, CaseRecord};
use chrono::{DateTime, Utc};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for case repository operations.
pub type CaseRepositoryResult<T> = Result<T, CaseRepositoryError>;

/// Case record persistence contract.
#[async_trait]
pub trait CaseRepository: Send + Sync {
    /// Stores a new case record.
    ///
    /// # Errors
    ///
    /// Returns [`CaseRepositoryError::DuplicateCase`] when the identifier
    /// already exists.
    async fn store(&self, case: &CaseRecord) -> CaseRepositoryResult<()>;

    /// Applies `change` to the stored record as one atomic step and returns
    /// the updated record.
    ///
    /// Only the fields the change names are written, and the change is
    /// checked against the stored record rather than a caller's copy.
    ///
    /// # Errors
    ///
    /// Returns [`CaseRepositoryError::NotFound`] when the case does not exist
    /// and [`CaseRepositoryError::Rejected`] when the stored record refuses
    /// the change.
    async fn apply(
        &self,
        case_id: CaseId,
        change: CaseChange,
        at: DateTime<Utc>,
    ) -> CaseRepositoryResult<CaseRecord>;

    /// Finds a case by identifier, including soft-deleted cases.
    async fn find_by_id(&self, id: CaseId) -> CaseRepositoryResult<Option<CaseRecord>>;
}

/// Errors returned by case repository implementations.
#[derive(Debug, Clone, Error)]
pub enum CaseRepositoryError {
    /// A case with the same identifier already exists.
    #[error("duplicate case identifier: {0}")]
    DuplicateCase(CaseId),

    /// The case was not found.
    #[error("case not found: {0}")]
    NotFound(CaseId),

    /// The stored record refused the change.
    #[error(transparent)]
    Rejected(CaseDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl CaseRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
