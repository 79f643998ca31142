//! Diesel row models for validation request persistence.

use super::schema::validation_requests;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for validation requests.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = validation_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RequestRow {
    /// Request identifier.
    pub id: uuid::Uuid,
    /// Owning case.
    pub case_id: uuid::Uuid,
    /// Owner discriminant.
    pub owner_type: String,
    /// Owner identifier.
    pub owner_id: uuid::Uuid,
    /// Request type.
    pub request_type: String,
    /// Lifecycle state.
    pub state: String,
    /// Whether a milestone closed the request.
    pub auto_closed: bool,
    /// Per-case sequence number.
    pub sequence: i32,
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
    pub specific_attributes: Value,
    /// When the request was sent.
    pub notified_at: Option<DateTime<Utc>>,
    /// When the request was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Why the request was cancelled.
    pub cancel_reason: Option<String>,
    /// When a milestone closed the request.
    pub auto_closed_at: Option<DateTime<Utc>>,
    /// Milestone that closed the request.
    pub closing_milestone: Option<String>,
    /// When the request was closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Officer who raised the request.
    pub created_by: uuid::Uuid,
    /// Party behind the latest change.
    pub last_actor: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for validation requests.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = validation_requests)]
pub struct NewRequestRow {
    /// Request identifier.
    pub id: uuid::Uuid,
    /// Owning case.
    pub case_id: uuid::Uuid,
    /// Owner discriminant.
    pub owner_type: String,
    /// Owner identifier.
    pub owner_id: uuid::Uuid,
    /// Request type.
    pub request_type: String,
    /// Lifecycle state.
    pub state: String,
    /// Whether a milestone closed the request.
    pub auto_closed: bool,
    /// Per-case sequence number.
    pub sequence: i32,
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
    pub specific_attributes: Value,
    /// When the request was sent.
    pub notified_at: Option<DateTime<Utc>>,
    /// When the request was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Why the request was cancelled.
    pub cancel_reason: Option<String>,
    /// When a milestone closed the request.
    pub auto_closed_at: Option<DateTime<Utc>>,
    /// Milestone that closed the request.
    pub closing_milestone: Option<String>,
    /// When the request was closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Officer who raised the request.
    pub created_by: uuid::Uuid,
    /// Party behind the latest change.
    pub last_actor: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Columns a transition may change.
///
/// Identity, owner, type, sequence and authorship are immutable.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = validation_requests)]
#[diesel(treat_none_as_null = true)]
pub struct RequestChangeset {
    /// Lifecycle state.
    pub state: String,
    /// Whether a milestone closed the request.
    pub auto_closed: bool,
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
    pub specific_attributes: Value,
    /// When the request was sent.
    pub notified_at: Option<DateTime<Utc>>,
    /// When the request was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Why the request was cancelled.
    pub cancel_reason: Option<String>,
    /// When a milestone closed the request.
    pub auto_closed_at: Option<DateTime<Utc>>,
    /// Milestone that closed the request.
    pub closing_milestone: Option<String>,
    /// When the request was closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Party behind the latest change.
    pub last_actor: Value,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
