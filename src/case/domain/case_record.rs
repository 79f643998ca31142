//! Case record aggregate root.

use super::{CaseDomainError, CaseId, LocalAuthorityId, ParseCaseTypeError, SubmissionId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of case, selecting the task template seeded at opening time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseType {
    /// A full or householder planning application.
    PlanningApplication,
    /// A planning enforcement investigation.
    Enforcement,
    /// A pre-application advice request.
    PreApplication,
}

impl CaseType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlanningApplication => "planning_application",
            Self::Enforcement => "enforcement",
            Self::PreApplication => "pre_application",
        }
    }
}

impl TryFrom<&str> for CaseType {
    type Error = ParseCaseTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "planning_application" => Ok(Self::PlanningApplication),
            "enforcement" => Ok(Self::Enforcement),
            "pre_application" => Ok(Self::PreApplication),
            _ => Err(ParseCaseTypeError(value.to_owned())),
        }
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One targeted change to a stored case record.
///
/// Repositories apply a change against the stored row, so concurrent changes
/// to different fields never overwrite each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseChange {
    /// Replaces the assigned officer; `None` clears it.
    Assign(Option<UserId>),
    /// Records the assessment milestone.
    EnterAssessment,
    /// Soft-deletes the case.
    SoftDelete,
}

impl CaseChange {
    /// Returns a short label for logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assign(_) => "assign",
            Self::EnterAssessment => "enter_assessment",
            Self::SoftDelete => "soft_delete",
        }
    }
}

/// Case record aggregate root.
///
/// Binds one case to its local authority and assigned officer. The task tree
/// and requests reference the record by [`CaseId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    id: CaseId,
    case_type: CaseType,
    local_authority: LocalAuthorityId,
    assigned_user: Option<UserId>,
    submission: Option<SubmissionId>,
    in_assessment_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted case record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedCaseData {
    /// Persisted case identifier.
    pub id: CaseId,
    /// Persisted case type.
    pub case_type: CaseType,
    /// Owning local authority.
    pub local_authority: LocalAuthorityId,
    /// Assigned officer, if any.
    pub assigned_user: Option<UserId>,
    /// Originating submission, if any.
    pub submission: Option<SubmissionId>,
    /// When the case entered assessment.
    pub in_assessment_at: Option<DateTime<Utc>>,
    /// Soft-deletion timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl CaseRecord {
    /// Opens a new case record.
    #[must_use]
    pub fn open(
        case_type: CaseType,
        local_authority: LocalAuthorityId,
        submission: Option<SubmissionId>,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: CaseId::new(),
            case_type,
            local_authority,
            assigned_user: None,
            submission,
            in_assessment_at: None,
            deleted_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a case record from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedCaseData) -> Self {
        Self {
            id: data.id,
            case_type: data.case_type,
            local_authority: data.local_authority,
            assigned_user: data.assigned_user,
            submission: data.submission,
            in_assessment_at: data.in_assessment_at,
            deleted_at: data.deleted_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the case identifier.
    #[must_use]
    pub const fn id(&self) -> CaseId {
        self.id
    }

    /// Returns the case type.
    #[must_use]
    pub const fn case_type(&self) -> CaseType {
        self.case_type
    }

    /// Returns the owning local authority.
    #[must_use]
    pub const fn local_authority(&self) -> LocalAuthorityId {
        self.local_authority
    }

    /// Returns the assigned officer, if any.
    #[must_use]
    pub const fn assigned_user(&self) -> Option<UserId> {
        self.assigned_user
    }

    /// Returns the originating submission, if any.
    #[must_use]
    pub const fn submission(&self) -> Option<SubmissionId> {
        self.submission
    }

    /// Returns when the case entered assessment.
    #[must_use]
    pub const fn in_assessment_at(&self) -> Option<DateTime<Utc>> {
        self.in_assessment_at
    }

    /// Returns `true` once the case has passed its validation milestone.
    #[must_use]
    pub const fn is_in_assessment(&self) -> bool {
        self.in_assessment_at.is_some()
    }

    /// Returns the soft-deletion timestamp.
    #[must_use]
    pub const fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Returns `true` if the case has been soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Fails when the case no longer accepts changes.
    ///
    /// # Errors
    ///
    /// Returns [`CaseDomainError::CaseDeleted`] for soft-deleted cases.
    pub const fn ensure_active(&self) -> Result<(), CaseDomainError> {
        if self.is_deleted() {
            return Err(CaseDomainError::CaseDeleted(self.id));
        }
        Ok(())
    }

    /// Assigns an officer, replacing any previous assignment.
    ///
    /// # Errors
    ///
    /// Returns [`CaseDomainError::CaseDeleted`] for soft-deleted cases.
    pub fn assign(
        &mut self,
        user: Option<UserId>,
        clock: &impl Clock,
    ) -> Result<(), CaseDomainError> {
        self.apply(CaseChange::Assign(user), clock.utc())
    }

    /// Records that the case entered assessment.
    ///
    /// # Errors
    ///
    /// Returns [`CaseDomainError::AlreadyInAssessment`] when the milestone has
    /// already been recorded, or [`CaseDomainError::CaseDeleted`].
    pub fn enter_assessment(&mut self, clock: &impl Clock) -> Result<(), CaseDomainError> {
        self.apply(CaseChange::EnterAssessment, clock.utc())
    }

    /// Soft-deletes the case.
    ///
    /// # Errors
    ///
    /// Returns [`CaseDomainError::CaseDeleted`] if the case is already deleted.
    pub fn soft_delete(&mut self, clock: &impl Clock) -> Result<(), CaseDomainError> {
        self.apply(CaseChange::SoftDelete, clock.utc())
    }

    /// Applies `change` as of `at`.
    ///
    /// # Errors
    ///
    /// Returns [`CaseDomainError::CaseDeleted`] for soft-deleted cases and
    /// [`CaseDomainError::AlreadyInAssessment`] when the milestone is
    /// recorded twice.
    pub fn apply(&mut self, change: CaseChange, at: DateTime<Utc>) -> Result<(), CaseDomainError> {
        self.ensure_active()?;
        match change {
            CaseChange::Assign(user) => self.assigned_user = user,
            CaseChange::EnterAssessment => {
                if self.in_assessment_at.is_some() {
                    return Err(CaseDomainError::AlreadyInAssessment(self.id));
                }
                self.in_assessment_at = Some(at);
            }
            CaseChange::SoftDelete => self.deleted_at = Some(at),
        }
        self.updated_at = at;
        Ok(())
    }
}
