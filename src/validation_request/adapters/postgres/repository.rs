//! `PostgreSQL` repository implementation for validation request storage.

use super::{
    models::{NewRequestRow, RequestChangeset, RequestRow},
    schema::validation_requests,
};
use crate::case::domain::{CaseId, UserId};
use crate::validation_request::{
    domain::{
        Actor, Milestone, PersistedRequestData, RequestId, RequestOwner, RequestSequence,
        RequestState, RequestType, SpecificAttributes, ValidationRequest,
    },
    ports::{
        RequestVersion, ValidationRequestRepository, ValidationRequestRepositoryError,
        ValidationRequestRepositoryResult,
    },
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use serde_json::Value;

/// `PostgreSQL` connection pool type used by validation request adapters.
pub type RequestPgPool = Pool<ConnectionManager<PgConnection>>;

const SEQUENCE_CONSTRAINT: &str = "idx_validation_requests_case_sequence";
const UNRESOLVED_CONSTRAINT: &str = "idx_validation_requests_unresolved_single";

/// `PostgreSQL`-backed validation request repository.
///
/// Sequence and unresolved-request uniqueness are enforced by the unique
/// indexes created in the `create_casework` migration.
#[derive(Debug, Clone)]
pub struct PostgresValidationRequestRepository {
    pool: RequestPgPool,
}

impl PostgresValidationRequestRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: RequestPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ValidationRequestRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ValidationRequestRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(ValidationRequestRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ValidationRequestRepositoryError::persistence)?
    }
}

#[async_trait]
impl ValidationRequestRepository for PostgresValidationRequestRepository {
    async fn store(&self, request: &ValidationRequest) -> ValidationRequestRepositoryResult<()> {
        let request_id = request.id();
        let case_id = request.case_id();
        let sequence = request.sequence();
        let owner = request.owner();
        let request_type = request.request_type();
        let new_row = to_new_row(request)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(validation_requests::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if violates(info.as_ref(), SEQUENCE_CONSTRAINT) =>
                    {
                        ValidationRequestRepositoryError::DuplicateSequence { case_id, sequence }
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if violates(info.as_ref(), UNRESOLVED_CONSTRAINT) =>
                    {
                        ValidationRequestRepositoryError::UnresolvedRequestExists {
                            owner,
                            request_type,
                        }
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ValidationRequestRepositoryError::DuplicateRequest(request_id)
                    }
                    _ => ValidationRequestRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update_if_unchanged(
        &self,
        request: &ValidationRequest,
        loaded: RequestVersion,
    ) -> ValidationRequestRepositoryResult<()> {
        let request_id = request.id();
        let changeset = to_changeset(request)?;

        self.run_blocking(move |connection| {
            let updated = diesel::update(
                validation_requests::table
                    .filter(validation_requests::id.eq(request_id.into_inner()))
                    .filter(validation_requests::state.eq(loaded.state.as_str()))
                    .filter(validation_requests::updated_at.eq(loaded.updated_at)),
            )
            .set(&changeset)
            .execute(connection)
            .map_err(ValidationRequestRepositoryError::persistence)?;
            if updated > 0 {
                return Ok(());
            }

            let stored_state = validation_requests::table
                .filter(validation_requests::id.eq(request_id.into_inner()))
                .select(validation_requests::state)
                .first::<String>(connection)
                .optional()
                .map_err(ValidationRequestRepositoryError::persistence)?;
            let Some(raw) = stored_state else {
                return Err(ValidationRequestRepositoryError::NotFound(request_id));
            };
            let actual = parse_state(&raw)?;
            if actual == loaded.state {
                return Err(ValidationRequestRepositoryError::Modified(request_id));
            }
            Err(ValidationRequestRepositoryError::StaleState {
                request_id,
                expected: loaded.state,
                actual,
            })
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: RequestId,
    ) -> ValidationRequestRepositoryResult<Option<ValidationRequest>> {
        self.run_blocking(move |connection| {
            let row = validation_requests::table
                .filter(validation_requests::id.eq(id.into_inner()))
                .select(RequestRow::as_select())
                .first::<RequestRow>(connection)
                .optional()
                .map_err(ValidationRequestRepositoryError::persistence)?;
            row.map(row_to_request).transpose()
        })
        .await
    }

    async fn list_for_case(
        &self,
        case_id: CaseId,
    ) -> ValidationRequestRepositoryResult<Vec<ValidationRequest>> {
        self.run_blocking(move |connection| {
            let rows = validation_requests::table
                .filter(validation_requests::case_id.eq(case_id.into_inner()))
                .order(validation_requests::sequence.asc())
                .select(RequestRow::as_select())
                .load::<RequestRow>(connection)
                .map_err(ValidationRequestRepositoryError::persistence)?;
            rows.into_iter().map(row_to_request).collect()
        })
        .await
    }

    async fn list_for_owner(
        &self,
        owner: RequestOwner,
        request_type: Option<RequestType>,
    ) -> ValidationRequestRepositoryResult<Vec<ValidationRequest>> {
        self.run_blocking(move |connection| {
            let mut query = validation_requests::table
                .filter(validation_requests::owner_type.eq(owner.kind()))
                .filter(validation_requests::owner_id.eq(owner.raw_id()))
                .into_boxed();
            if let Some(wanted) = request_type {
                query = query.filter(validation_requests::request_type.eq(wanted.as_str()));
            }
            let rows = query
                .order((
                    validation_requests::case_id.asc(),
                    validation_requests::sequence.asc(),
                ))
                .select(RequestRow::as_select())
                .load::<RequestRow>(connection)
                .map_err(ValidationRequestRepositoryError::persistence)?;
            rows.into_iter().map(row_to_request).collect()
        })
        .await
    }

    async fn next_sequence(
        &self,
        case_id: CaseId,
    ) -> ValidationRequestRepositoryResult<RequestSequence> {
        self.run_blocking(move |connection| {
            let highest = validation_requests::table
                .filter(validation_requests::case_id.eq(case_id.into_inner()))
                .select(diesel::dsl::max(validation_requests::sequence))
                .first::<Option<i32>>(connection)
                .map_err(ValidationRequestRepositoryError::persistence)?;
            match highest {
                None => Ok(RequestSequence::FIRST),
                Some(raw) => Ok(sequence_from_db(raw)?.next()),
            }
        })
        .await
    }
}

fn violates(info: &dyn DatabaseErrorInformation, constraint: &str) -> bool {
    info.constraint_name().is_some_and(|name| name == constraint)
}

fn to_new_row(request: &ValidationRequest) -> ValidationRequestRepositoryResult<NewRequestRow> {
    let owner = request.owner();
    Ok(NewRequestRow {
        id: request.id().into_inner(),
        case_id: request.case_id().into_inner(),
        owner_type: owner.kind().to_owned(),
        owner_id: owner.raw_id(),
        request_type: request.request_type().as_str().to_owned(),
        state: request.state().as_str().to_owned(),
        auto_closed: request.is_auto_closed(),
        sequence: sequence_to_db(request.sequence())?,
        post_validation: request.is_post_validation(),
        reason: request.reason().map(str::to_owned),
        suggestion: request.suggestion().map(str::to_owned),
        applicant_approved: request.applicant_approved(),
        applicant_rejection_reason: request.applicant_rejection_reason().map(str::to_owned),
        applicant_response: request.applicant_response().map(str::to_owned),
        specific_attributes: to_json(request.specific_attributes())?,
        notified_at: request.notified_at(),
        cancelled_at: request.cancelled_at(),
        cancel_reason: request.cancel_reason().map(str::to_owned),
        auto_closed_at: request.auto_closed_at(),
        closing_milestone: request
            .closing_milestone()
            .map(|milestone| milestone.as_str().to_owned()),
        closed_at: request.closed_at(),
        created_by: request.created_by().into_inner(),
        last_actor: to_json(&request.last_actor())?,
        created_at: request.created_at(),
        updated_at: request.updated_at(),
    })
}

fn to_changeset(
    request: &ValidationRequest,
) -> ValidationRequestRepositoryResult<RequestChangeset> {
    Ok(RequestChangeset {
        state: request.state().as_str().to_owned(),
        auto_closed: request.is_auto_closed(),
        reason: request.reason().map(str::to_owned),
        suggestion: request.suggestion().map(str::to_owned),
        applicant_approved: request.applicant_approved(),
        applicant_rejection_reason: request.applicant_rejection_reason().map(str::to_owned),
        applicant_response: request.applicant_response().map(str::to_owned),
        specific_attributes: to_json(request.specific_attributes())?,
        notified_at: request.notified_at(),
        cancelled_at: request.cancelled_at(),
        cancel_reason: request.cancel_reason().map(str::to_owned),
        auto_closed_at: request.auto_closed_at(),
        closing_milestone: request
            .closing_milestone()
            .map(|milestone| milestone.as_str().to_owned()),
        closed_at: request.closed_at(),
        last_actor: to_json(&request.last_actor())?,
        updated_at: request.updated_at(),
    })
}

pub(crate) fn row_to_request(
    row: RequestRow,
) -> ValidationRequestRepositoryResult<ValidationRequest> {
    let RequestRow {
        id,
        case_id,
        owner_type,
        owner_id,
        request_type: persisted_type,
        state: persisted_state,
        auto_closed,
        sequence,
        post_validation,
        reason,
        suggestion,
        applicant_approved,
        applicant_rejection_reason,
        applicant_response,
        specific_attributes: persisted_attributes,
        notified_at,
        cancelled_at,
        cancel_reason,
        auto_closed_at,
        closing_milestone: persisted_milestone,
        closed_at,
        created_by,
        last_actor: persisted_actor,
        created_at,
        updated_at,
    } = row;

    let owner = RequestOwner::from_parts(&owner_type, owner_id)
        .map_err(ValidationRequestRepositoryError::persistence)?;
    let request_type = RequestType::try_from(persisted_type.as_str())
        .map_err(ValidationRequestRepositoryError::persistence)?;
    let specific_attributes = serde_json::from_value::<SpecificAttributes>(persisted_attributes)
        .map_err(ValidationRequestRepositoryError::persistence)?;
    if specific_attributes.request_type() != request_type {
        return Err(ValidationRequestRepositoryError::persistence(
            std::io::Error::other(format!(
                "request {id} is stored as {request_type} with {} attributes",
                specific_attributes.request_type()
            )),
        ));
    }
    let closing_milestone = persisted_milestone
        .map(|name| serde_json::from_value::<Milestone>(Value::String(name)))
        .transpose()
        .map_err(ValidationRequestRepositoryError::persistence)?;
    let last_actor = serde_json::from_value::<Actor>(persisted_actor)
        .map_err(ValidationRequestRepositoryError::persistence)?;

    let data = PersistedRequestData {
        id: RequestId::from_uuid(id),
        case_id: CaseId::from_uuid(case_id),
        owner,
        state: parse_state(&persisted_state)?,
        auto_closed,
        sequence: sequence_from_db(sequence)?,
        post_validation,
        reason,
        suggestion,
        applicant_approved,
        applicant_rejection_reason,
        applicant_response,
        specific_attributes,
        notified_at,
        cancelled_at,
        cancel_reason,
        auto_closed_at,
        closing_milestone,
        closed_at,
        created_by: UserId::from_uuid(created_by),
        last_actor,
        created_at,
        updated_at,
    };
    Ok(ValidationRequest::from_persisted(data))
}

fn parse_state(raw: &str) -> ValidationRequestRepositoryResult<RequestState> {
    RequestState::try_from(raw).map_err(ValidationRequestRepositoryError::persistence)
}

fn sequence_to_db(sequence: RequestSequence) -> ValidationRequestRepositoryResult<i32> {
    i32::try_from(sequence.value()).map_err(ValidationRequestRepositoryError::persistence)
}

fn sequence_from_db(raw: i32) -> ValidationRequestRepositoryResult<RequestSequence> {
    u32::try_from(raw)
        .map(RequestSequence::new)
        .map_err(ValidationRequestRepositoryError::persistence)
}

fn to_json<T: serde::Serialize>(value: &T) -> ValidationRequestRepositoryResult<Value> {
    serde_json::to_value(value).map_err(ValidationRequestRepositoryError::persistence)
}
