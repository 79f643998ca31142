//! Domain model for case records.
//!
//! A case record is the aggregate root that the task tree and validation
//! requests hang off. It carries the local authority, the assigned officer and
//! the milestones that other contexts react to.

mod case_record;
mod error;
mod ids;

pub use case_record::{CaseChange, CaseRecord, CaseType, PersistedCaseData};
pub use error::{CaseDomainError, ParseCaseTypeError};
pub use ids::{CaseId, LocalAuthorityId, SubmissionId, UserId};
