//! Diesel row models for case record persistence.

use super::schema::case_records;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for case records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = case_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CaseRow {
    /// Case identifier.
    pub id: uuid::Uuid,
    /// Case type.
    pub case_type: String,
    /// Owning local authority.
    pub local_authority_id: uuid::Uuid,
    /// Assigned officer.
    pub assigned_user_id: Option<uuid::Uuid>,
    /// Originating submission.
    pub submission_id: Option<uuid::Uuid>,
    /// When the case entered assessment.
    pub in_assessment_at: Option<DateTime<Utc>>,
    /// Soft-deletion timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for case records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = case_records)]
pub struct NewCaseRow {
    /// Case identifier.
    pub id: uuid::Uuid,
    /// Case type.
    pub case_type: String,
    /// Owning local authority.
    pub local_authority_id: uuid::Uuid,
    /// Assigned officer.
    pub assigned_user_id: Option<uuid::Uuid>,
    /// Originating submission.
    pub submission_id: Option<uuid::Uuid>,
    /// When the case entered assessment.
    pub in_assessment_at: Option<DateTime<Utc>>,
    /// Soft-deletion timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
