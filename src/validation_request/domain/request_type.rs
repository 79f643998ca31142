//! Request types, request owners and case milestones.

use super::{ConditionId, DocumentId, ParseRequestOwnerError, ParseRequestTypeError};
use crate::case::domain::CaseId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of change or information a request asks the applicant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    /// The officer proposes a new development description.
    DescriptionChange,
    /// The applicant must supply a missing document.
    AdditionalDocument,
    /// The applicant must replace an unsuitable document.
    ReplacementDocument,
    /// The officer proposes a corrected red line boundary.
    RedLineBoundaryChange,
    /// The application fee needs correcting.
    FeeChange,
    /// Any other validation issue.
    OtherChange,
}

impl RequestType {
    /// Every request type, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::DescriptionChange,
        Self::AdditionalDocument,
        Self::ReplacementDocument,
        Self::RedLineBoundaryChange,
        Self::FeeChange,
        Self::OtherChange,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DescriptionChange => "description_change",
            Self::AdditionalDocument => "additional_document",
            Self::ReplacementDocument => "replacement_document",
            Self::RedLineBoundaryChange => "red_line_boundary_change",
            Self::FeeChange => "fee_change",
            Self::OtherChange => "other_change",
        }
    }

    /// Returns `true` when several unresolved requests of this type may
    /// target the same owner.
    #[must_use]
    pub const fn is_multi_instance(self) -> bool {
        matches!(self, Self::AdditionalDocument | Self::OtherChange)
    }

    /// Returns `true` when a case milestone may auto-close the request.
    #[must_use]
    pub const fn is_milestone_sensitive(self) -> bool {
        matches!(self, Self::DescriptionChange | Self::RedLineBoundaryChange)
    }

    /// Returns `true` when the applicant answers by approving or rejecting a
    /// proposed change rather than with free text.
    #[must_use]
    pub const fn requires_approval(self) -> bool {
        matches!(self, Self::DescriptionChange | Self::RedLineBoundaryChange)
    }

    /// Returns `true` for document requests, which the applicant answers by
    /// uploading rather than writing.
    #[must_use]
    pub const fn is_document_request(self) -> bool {
        matches!(self, Self::AdditionalDocument | Self::ReplacementDocument)
    }
}

impl TryFrom<&str> for RequestType {
    type Error = ParseRequestTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == normalized)
            .ok_or_else(|| ParseRequestTypeError(value.to_owned()))
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record a request concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum RequestOwner {
    /// The case itself.
    Case(CaseId),
    /// A planning condition on the case.
    Condition(ConditionId),
    /// A document submitted with the case.
    Document(DocumentId),
}

impl RequestOwner {
    /// Returns the persisted discriminant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Case(_) => "case",
            Self::Condition(_) => "condition",
            Self::Document(_) => "document",
        }
    }

    /// Returns the referenced record identifier.
    #[must_use]
    pub const fn raw_id(&self) -> Uuid {
        match self {
            Self::Case(id) => id.into_inner(),
            Self::Condition(id) => id.into_inner(),
            Self::Document(id) => id.into_inner(),
        }
    }

    /// Rebuilds an owner from its persisted discriminant and identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ParseRequestOwnerError`] for an unknown discriminant.
    pub fn from_parts(kind: &str, id: Uuid) -> Result<Self, ParseRequestOwnerError> {
        match kind {
            "case" => Ok(Self::Case(CaseId::from_uuid(id))),
            "condition" => Ok(Self::Condition(ConditionId::from_uuid(id))),
            "document" => Ok(Self::Document(DocumentId::from_uuid(id))),
            _ => Err(ParseRequestOwnerError(kind.to_owned())),
        }
    }
}

impl fmt::Display for RequestOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.raw_id())
    }
}

/// Case lifecycle point that can supersede unresolved requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    /// The case passed validation and entered assessment.
    EnteredAssessment,
    /// The applicant's response window lapsed without an answer.
    ResponseDeadlineElapsed,
}

impl Milestone {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnteredAssessment => "entered_assessment",
            Self::ResponseDeadlineElapsed => "response_deadline_elapsed",
        }
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
