//! Error types for case domain validation and parsing.

use super::CaseId;
use thiserror::Error;

/// Errors returned while mutating a case record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaseDomainError {
    /// The case has been soft-deleted and accepts no further changes.
    #[error("case {0} has been deleted")]
    CaseDeleted(CaseId),

    /// The case already passed its assessment milestone.
    #[error("case {0} has already entered assessment")]
    AlreadyInAssessment(CaseId),
}

/// Error returned while parsing case types from persistence or templates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown case type: {0}")]
pub struct ParseCaseTypeError(pub String);
