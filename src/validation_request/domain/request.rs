//! Validation request aggregate and its lifecycle state machine.

use super::{
    Actor, AttributeError, Milestone, ParseRequestStateError, RequestAction, RequestId,
    RequestOwner, RequestSequence, RequestType, SpecificAttributes, ValidationRequestDomainError,
};
use crate::case::domain::{CaseId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a validation request.
///
/// ```text
/// pending --dispatch--> open --respond--> closed
/// pending --cancel--> cancelled         open --cancel--> cancelled
/// pending --autoClose--> closed(auto)   open --autoClose--> closed(auto)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    /// Drafted by the officer, not yet sent.
    Pending,
    /// Sent to the applicant and awaiting an answer.
    Open,
    /// Answered by the applicant or closed by a milestone.
    Closed,
    /// Withdrawn by the officer.
    Cancelled,
}

impl RequestState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` if no transition may leave this state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Cancelled)
    }

    /// Returns `true` while the request still awaits resolution.
    #[must_use]
    pub const fn is_unresolved(self) -> bool {
        !self.is_terminal()
    }

    /// Returns the state reached by `action`, or `None` when the action is
    /// not permitted from this state.
    ///
    /// `Edit` keeps the state unchanged.
    #[must_use]
    pub const fn target_of(self, action: RequestAction) -> Option<Self> {
        match (self, action) {
            (Self::Pending, RequestAction::Dispatch) => Some(Self::Open),
            (Self::Open, RequestAction::Respond)
            | (Self::Pending | Self::Open, RequestAction::AutoClose) => Some(Self::Closed),
            (Self::Pending | Self::Open, RequestAction::Cancel) => Some(Self::Cancelled),
            (Self::Pending | Self::Open, RequestAction::Edit) => Some(self),
            _ => None,
        }
    }
}

impl TryFrom<&str> for RequestState {
    type Error = ParseRequestStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseRequestStateError(value.to_owned())),
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The applicant's answer to an open request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApplicantResponse {
    /// The applicant accepts the proposed change.
    Approved,
    /// The applicant rejects the proposed change.
    Rejected {
        /// Why the change was rejected.
        reason: String,
    },
    /// Free-text answer for request types without an approval decision.
    Responded {
        /// The applicant's text.
        text: String,
    },
}

/// Officer-authored fields for a new request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequestParams {
    /// Case the request belongs to.
    pub case_id: CaseId,
    /// Record the request concerns.
    pub owner: RequestOwner,
    /// Type-specific payload; determines the request type.
    pub attributes: SpecificAttributes,
    /// Why the request is being raised.
    pub reason: Option<String>,
    /// What the officer suggests the applicant does.
    pub suggestion: Option<String>,
    /// Per-case number assigned under the case's serializing guard.
    pub sequence: RequestSequence,
    /// Whether the case had already entered assessment.
    pub post_validation: bool,
    /// Officer raising the request.
    pub created_by: UserId,
}

/// Officer-authored changes to an unresolved request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestEdit {
    /// Replacement reason, if changing.
    pub reason: Option<String>,
    /// Replacement suggestion, if changing.
    pub suggestion: Option<String>,
    /// Replacement payload, if changing; must keep the request type.
    pub attributes: Option<SpecificAttributes>,
}

/// Validation request aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRequest {
    id: RequestId,
    case_id: CaseId,
    owner: RequestOwner,
    state: RequestState,
    auto_closed: bool,
    sequence: RequestSequence,
    post_validation: bool,
    reason: Option<String>,
    suggestion: Option<String>,
    applicant_approved: Option<bool>,
    applicant_rejection_reason: Option<String>,
    applicant_response: Option<String>,
    specific_attributes: SpecificAttributes,
    notified_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    cancel_reason: Option<String>,
    auto_closed_at: Option<DateTime<Utc>>,
    closing_milestone: Option<Milestone>,
    closed_at: Option<DateTime<Utc>>,
    created_by: UserId,
    last_actor: Actor,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRequestData {
    /// Persisted identifier.
    pub id: RequestId,
    /// Owning case.
    pub case_id: CaseId,
    /// Record the request concerns.
    pub owner: RequestOwner,
    /// Lifecycle state.
    pub state: RequestState,
    /// Whether a milestone closed the request.
    pub auto_closed: bool,
    /// Per-case number.
    pub sequence: RequestSequence,
    /// Whether the request was raised after validation.
    pub post_validation: bool,
    /// Officer's reason.
    pub reason: Option<String>,
    /// Officer's suggestion.
    pub suggestion: Option<String>,
    /// Applicant approval decision.
    pub applicant_approved: Option<bool>,
    /// Applicant's rejection reason.
    pub applicant_rejection_reason: Option<String>,
    /// Applicant's free-text response.
    pub applicant_response: Option<String>,
    /// Type-specific payload.
    pub specific_attributes: SpecificAttributes,
    /// When the request was sent.
    pub notified_at: Option<DateTime<Utc>>,
    /// When the request was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Why the request was cancelled.
    pub cancel_reason: Option<String>,
    /// When a milestone closed the request.
    pub auto_closed_at: Option<DateTime<Utc>>,
    /// Milestone that closed the request.
    pub closing_milestone: Option<Milestone>,
    /// When the request was closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Officer who raised the request.
    pub created_by: UserId,
    /// Party behind the latest change.
    pub last_actor: Actor,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ValidationRequest {
    /// Creates a new request in the `pending` state.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationRequestDomainError::SchemaValidation`] when the
    /// attributes or officer text fail validation.
    pub fn new(
        params: NewRequestParams,
        max_text_length: usize,
        clock: &impl Clock,
    ) -> Result<Self, ValidationRequestDomainError> {
        let request_type = params.attributes.request_type();
        validate_authored_fields(
            request_type,
            &params.attributes,
            params.reason.as_deref(),
            params.suggestion.as_deref(),
            max_text_length,
        )?;

        let timestamp = clock.utc();
        Ok(Self {
            id: RequestId::new(),
            case_id: params.case_id,
            owner: params.owner,
            state: RequestState::Pending,
            auto_closed: false,
            sequence: params.sequence,
            post_validation: params.post_validation,
            reason: normalize(params.reason),
            suggestion: normalize(params.suggestion),
            applicant_approved: None,
            applicant_rejection_reason: None,
            applicant_response: None,
            specific_attributes: params.attributes,
            notified_at: None,
            cancelled_at: None,
            cancel_reason: None,
            auto_closed_at: None,
            closing_milestone: None,
            closed_at: None,
            created_by: params.created_by,
            last_actor: Actor::Officer(params.created_by),
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a request from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedRequestData) -> Self {
        Self {
            id: data.id,
            case_id: data.case_id,
            owner: data.owner,
            state: data.state,
            auto_closed: data.auto_closed,
            sequence: data.sequence,
            post_validation: data.post_validation,
            reason: data.reason,
            suggestion: data.suggestion,
            applicant_approved: data.applicant_approved,
            applicant_rejection_reason: data.applicant_rejection_reason,
            applicant_response: data.applicant_response,
            specific_attributes: data.specific_attributes,
            notified_at: data.notified_at,
            cancelled_at: data.cancelled_at,
            cancel_reason: data.cancel_reason,
            auto_closed_at: data.auto_closed_at,
            closing_milestone: data.closing_milestone,
            closed_at: data.closed_at,
            created_by: data.created_by,
            last_actor: data.last_actor,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the request identifier.
    #[must_use]
    pub const fn id(&self) -> RequestId {
        self.id
    }

    /// Returns the owning case.
    #[must_use]
    pub const fn case_id(&self) -> CaseId {
        self.case_id
    }

    /// Returns the record the request concerns.
    #[must_use]
    pub const fn owner(&self) -> RequestOwner {
        self.owner
    }

    /// Returns the request type.
    #[must_use]
    pub const fn request_type(&self) -> RequestType {
        self.specific_attributes.request_type()
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> RequestState {
        self.state
    }

    /// Returns `true` if a milestone closed the request.
    #[must_use]
    pub const fn is_auto_closed(&self) -> bool {
        self.auto_closed
    }

    /// Returns the per-case number.
    #[must_use]
    pub const fn sequence(&self) -> RequestSequence {
        self.sequence
    }

    /// Returns `true` if the request was raised after validation.
    #[must_use]
    pub const fn is_post_validation(&self) -> bool {
        self.post_validation
    }

    /// Returns the officer's reason.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns the officer's suggestion.
    #[must_use]
    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    /// Returns the applicant's approval decision.
    #[must_use]
    pub const fn applicant_approved(&self) -> Option<bool> {
        self.applicant_approved
    }

    /// Returns the applicant's rejection reason.
    #[must_use]
    pub fn applicant_rejection_reason(&self) -> Option<&str> {
        self.applicant_rejection_reason.as_deref()
    }

    /// Returns the applicant's free-text response.
    #[must_use]
    pub fn applicant_response(&self) -> Option<&str> {
        self.applicant_response.as_deref()
    }

    /// Returns the type-specific payload.
    #[must_use]
    pub const fn specific_attributes(&self) -> &SpecificAttributes {
        &self.specific_attributes
    }

    /// Returns when the request was sent.
    #[must_use]
    pub const fn notified_at(&self) -> Option<DateTime<Utc>> {
        self.notified_at
    }

    /// Returns when the request was cancelled.
    #[must_use]
    pub const fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    /// Returns why the request was cancelled.
    #[must_use]
    pub fn cancel_reason(&self) -> Option<&str> {
        self.cancel_reason.as_deref()
    }

    /// Returns when a milestone closed the request.
    #[must_use]
    pub const fn auto_closed_at(&self) -> Option<DateTime<Utc>> {
        self.auto_closed_at
    }

    /// Returns the milestone that closed the request.
    #[must_use]
    pub const fn closing_milestone(&self) -> Option<Milestone> {
        self.closing_milestone
    }

    /// Returns when the request was closed.
    #[must_use]
    pub const fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    /// Returns the officer who raised the request.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the party behind the latest change.
    #[must_use]
    pub const fn last_actor(&self) -> Actor {
        self.last_actor
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

    /// Sends the request to the applicant.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationRequestDomainError::ActorNotPermitted`] unless an
    /// officer acts, or [`ValidationRequestDomainError::IllegalTransition`]
    /// unless the request is `pending`.
    pub fn dispatch(
        &mut self,
        actor: Actor,
        clock: &impl Clock,
    ) -> Result<(), ValidationRequestDomainError> {
        let target = self.guard(RequestAction::Dispatch, actor)?;
        let timestamp = clock.utc();
        self.state = target;
        self.notified_at = Some(timestamp);
        self.stamp(actor, timestamp);
        Ok(())
    }

    /// Records the applicant's answer and closes the request.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationRequestDomainError::ActorNotPermitted`] unless the
    /// applicant acts, [`ValidationRequestDomainError::IllegalTransition`]
    /// unless the request is `open`, or
    /// [`ValidationRequestDomainError::SchemaValidation`] when the answer does
    /// not fit the request type.
    pub fn respond(
        &mut self,
        response: ApplicantResponse,
        actor: Actor,
        max_text_length: usize,
        clock: &impl Clock,
    ) -> Result<(), ValidationRequestDomainError> {
        let target = self.guard(RequestAction::Respond, actor)?;
        self.validate_response(&response, max_text_length)?;

        match response {
            ApplicantResponse::Approved => self.applicant_approved = Some(true),
            ApplicantResponse::Rejected { reason } => {
                self.applicant_approved = Some(false);
                self.applicant_rejection_reason = Some(reason.trim().to_owned());
            }
            ApplicantResponse::Responded { text } => {
                self.applicant_response = normalize(Some(text));
            }
        }

        let timestamp = clock.utc();
        self.state = target;
        self.closed_at = Some(timestamp);
        self.stamp(actor, timestamp);
        Ok(())
    }

    /// Withdraws the request.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationRequestDomainError::ActorNotPermitted`] unless an
    /// officer acts, [`ValidationRequestDomainError::IllegalTransition`] from
    /// a terminal state, or [`ValidationRequestDomainError::SchemaValidation`]
    /// for an empty reason.
    pub fn cancel(
        &mut self,
        reason: &str,
        actor: Actor,
        max_text_length: usize,
        clock: &impl Clock,
    ) -> Result<(), ValidationRequestDomainError> {
        let target = self.guard(RequestAction::Cancel, actor)?;
        let mut errors = Vec::new();
        check_required_text(&mut errors, "cancel_reason", reason, max_text_length);
        self.fail_on(errors)?;

        let timestamp = clock.utc();
        self.state = target;
        self.cancelled_at = Some(timestamp);
        self.cancel_reason = Some(reason.trim().to_owned());
        self.stamp(actor, timestamp);
        Ok(())
    }

    /// Closes the request because a case milestone superseded it.
    ///
    /// Applicant fields are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationRequestDomainError::ActorNotPermitted`] unless the
    /// system acts, [`ValidationRequestDomainError::NotMilestoneSensitive`]
    /// for other request types, or
    /// [`ValidationRequestDomainError::IllegalTransition`] from a terminal
    /// state.
    pub fn auto_close(
        &mut self,
        milestone: Milestone,
        actor: Actor,
        clock: &impl Clock,
    ) -> Result<(), ValidationRequestDomainError> {
        let target = self.guard(RequestAction::AutoClose, actor)?;
        if !self.request_type().is_milestone_sensitive() {
            return Err(ValidationRequestDomainError::NotMilestoneSensitive {
                request_id: self.id,
                request_type: self.request_type(),
            });
        }

        let timestamp = clock.utc();
        self.state = target;
        self.auto_closed = true;
        self.auto_closed_at = Some(timestamp);
        self.closing_milestone = Some(milestone);
        self.closed_at = Some(timestamp);
        self.stamp(actor, timestamp);
        Ok(())
    }

    /// Amends officer-authored fields of an unresolved request.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationRequestDomainError::ActorNotPermitted`] unless an
    /// officer acts, [`ValidationRequestDomainError::IllegalTransition`] from
    /// a terminal state, or [`ValidationRequestDomainError::SchemaValidation`]
    /// when the amended fields fail validation or change the request type.
    pub fn edit(
        &mut self,
        edit: RequestEdit,
        actor: Actor,
        max_text_length: usize,
        clock: &impl Clock,
    ) -> Result<(), ValidationRequestDomainError> {
        self.guard(RequestAction::Edit, actor)?;

        let attributes = edit
            .attributes
            .unwrap_or_else(|| self.specific_attributes.clone());
        if attributes.request_type() != self.request_type() {
            return Err(ValidationRequestDomainError::SchemaValidation {
                request_type: self.request_type(),
                errors: vec![AttributeError::new(
                    "request_type",
                    "edits may not change the request type",
                )],
            });
        }
        let reason = edit.reason.or_else(|| self.reason.clone());
        let suggestion = edit.suggestion.or_else(|| self.suggestion.clone());
        validate_authored_fields(
            self.request_type(),
            &attributes,
            reason.as_deref(),
            suggestion.as_deref(),
            max_text_length,
        )?;

        self.specific_attributes = attributes;
        self.reason = normalize(reason);
        self.suggestion = normalize(suggestion);
        self.stamp(actor, clock.utc());
        Ok(())
    }

    /// Checks actor and state for `action`, returning the target state.
    fn guard(
        &self,
        action: RequestAction,
        actor: Actor,
    ) -> Result<RequestState, ValidationRequestDomainError> {
        let permitted = match action {
            RequestAction::Dispatch | RequestAction::Cancel | RequestAction::Edit => {
                matches!(actor, Actor::Officer(_))
            }
            RequestAction::Respond => matches!(actor, Actor::Applicant),
            RequestAction::AutoClose => matches!(actor, Actor::System),
        };
        if !permitted {
            return Err(ValidationRequestDomainError::ActorNotPermitted {
                request_id: self.id,
                action,
                actor: actor.kind(),
            });
        }
        self.state
            .target_of(action)
            .ok_or(ValidationRequestDomainError::IllegalTransition {
                request_id: self.id,
                from: self.state,
                action,
            })
    }

    fn validate_response(
        &self,
        response: &ApplicantResponse,
        max_text_length: usize,
    ) -> Result<(), ValidationRequestDomainError> {
        let request_type = self.request_type();
        let mut errors = Vec::new();
        match response {
            ApplicantResponse::Approved if request_type.requires_approval() => {}
            ApplicantResponse::Rejected { reason } if request_type.requires_approval() => {
                check_required_text(
                    &mut errors,
                    "applicant_rejection_reason",
                    reason,
                    max_text_length,
                );
            }
            ApplicantResponse::Responded { text } if !request_type.requires_approval() => {
                if request_type.is_document_request() {
                    if text.chars().count() > max_text_length {
                        errors.push(too_long("applicant_response", max_text_length));
                    }
                } else {
                    check_required_text(&mut errors, "applicant_response", text, max_text_length);
                }
            }
            ApplicantResponse::Approved | ApplicantResponse::Rejected { .. } => {
                errors.push(AttributeError::new(
                    "applicant_approved",
                    "this request type takes a written response",
                ));
            }
            ApplicantResponse::Responded { .. } => {
                errors.push(AttributeError::new(
                    "applicant_response",
                    "this request type takes an approval decision",
                ));
            }
        }
        self.fail_on(errors)
    }

    fn fail_on(&self, errors: Vec<AttributeError>) -> Result<(), ValidationRequestDomainError> {
        if errors.is_empty() {
            return Ok(());
        }
        Err(ValidationRequestDomainError::SchemaValidation {
            request_type: self.request_type(),
            errors,
        })
    }

    fn stamp(&mut self, actor: Actor, timestamp: DateTime<Utc>) {
        self.last_actor = actor;
        self.updated_at = timestamp;
    }
}

fn validate_authored_fields(
    request_type: RequestType,
    attributes: &SpecificAttributes,
    reason: Option<&str>,
    suggestion: Option<&str>,
    max_text_length: usize,
) -> Result<(), ValidationRequestDomainError> {
    let mut errors = match attributes.validate(max_text_length) {
        Ok(()) => Vec::new(),
        Err(ValidationRequestDomainError::SchemaValidation { errors, .. }) => errors,
        Err(other) => return Err(other),
    };

    // Other-change requests have no attributes; the reason is their summary.
    if request_type == RequestType::OtherChange {
        check_required_text(&mut errors, "reason", reason.unwrap_or_default(), max_text_length);
    } else if reason.is_some_and(|text| text.chars().count() > max_text_length) {
        errors.push(too_long("reason", max_text_length));
    }
    if suggestion.is_some_and(|text| text.chars().count() > max_text_length) {
        errors.push(too_long("suggestion", max_text_length));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationRequestDomainError::SchemaValidation {
            request_type,
            errors,
        })
    }
}

fn check_required_text(
    errors: &mut Vec<AttributeError>,
    field: &'static str,
    value: &str,
    max_text_length: usize,
) {
    if value.trim().is_empty() {
        errors.push(AttributeError::new(field, "must not be empty"));
    } else if value.chars().count() > max_text_length {
        errors.push(too_long(field, max_text_length));
    }
}

fn too_long(field: &'static str, max_text_length: usize) -> AttributeError {
    AttributeError::new(field, format!("exceeds {max_text_length} characters"))
}

fn normalize(text: Option<String>) -> Option<String> {
    text.map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
