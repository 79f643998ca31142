//! `PostgreSQL` repository implementation for case record storage.

use super::{
    models::{CaseRow, NewCaseRow},
    schema::case_records,
};
use crate::case::{
    domain::{
        CaseChange, CaseId, CaseRecord, CaseType, LocalAuthorityId, PersistedCaseData,
        SubmissionId, UserId,
    },
    ports::{CaseRepository, CaseRepositoryError, CaseRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by case adapters.
pub type CasePgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed case repository.
#[derive(Debug, Clone)]
pub struct PostgresCaseRepository {
    pool: CasePgPool,
}

impl PostgresCaseRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: CasePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> CaseRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> CaseRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(CaseRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(CaseRepositoryError::persistence)?
    }
}

#[async_trait]
impl CaseRepository for PostgresCaseRepository {
    async fn store(&self, case: &CaseRecord) -> CaseRepositoryResult<()> {
        let case_id = case.id();
        let new_row = NewCaseRow {
            id: case_id.into_inner(),
            case_type: case.case_type().as_str().to_owned(),
            local_authority_id: case.local_authority().into_inner(),
            assigned_user_id: case.assigned_user().map(UserId::into_inner),
            submission_id: case.submission().map(SubmissionId::into_inner),
            in_assessment_at: case.in_assessment_at(),
            deleted_at: case.deleted_at(),
            created_at: case.created_at(),
            updated_at: case.updated_at(),
        };

        self.run_blocking(move |connection| {
            diesel::insert_into(case_records::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        CaseRepositoryError::DuplicateCase(case_id)
                    }
                    _ => CaseRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn apply(
        &self,
        case_id: CaseId,
        change: CaseChange,
        at: DateTime<Utc>,
    ) -> CaseRepositoryResult<CaseRecord> {
        self.run_blocking(move |connection| {
            let id = case_id.into_inner();
            let active = case_records::table
                .filter(case_records::id.eq(id))
                .filter(case_records::deleted_at.is_null());
            let updated = match change {
                CaseChange::Assign(user) => diesel::update(active)
                    .set((
                        case_records::assigned_user_id.eq(user.map(UserId::into_inner)),
                        case_records::updated_at.eq(at),
                    ))
                    .returning(CaseRow::as_returning())
                    .get_result::<CaseRow>(connection),
                CaseChange::EnterAssessment => {
                    diesel::update(active.filter(case_records::in_assessment_at.is_null()))
                        .set((
                            case_records::in_assessment_at.eq(Some(at)),
                            case_records::updated_at.eq(at),
                        ))
                        .returning(CaseRow::as_returning())
                        .get_result::<CaseRow>(connection)
                }
                CaseChange::SoftDelete => diesel::update(active)
                    .set((
                        case_records::deleted_at.eq(Some(at)),
                        case_records::updated_at.eq(at),
                    ))
                    .returning(CaseRow::as_returning())
                    .get_result::<CaseRow>(connection),
            }
            .optional()
            .map_err(CaseRepositoryError::persistence)?;

            match updated {
                Some(row) => row_to_case(row),
                None => Err(refusal(connection, case_id, change, at)?),
            }
        })
        .await
    }

    async fn find_by_id(&self, id: CaseId) -> CaseRepositoryResult<Option<CaseRecord>> {
        self.run_blocking(move |connection| {
            let row = case_records::table
                .filter(case_records::id.eq(id.into_inner()))
                .select(CaseRow::as_select())
                .first::<CaseRow>(connection)
                .optional()
                .map_err(CaseRepositoryError::persistence)?;
            row.map(row_to_case).transpose()
        })
        .await
    }
}

/// Explains why a conditional update matched no row.
fn refusal(
    connection: &mut PgConnection,
    case_id: CaseId,
    change: CaseChange,
    at: DateTime<Utc>,
) -> CaseRepositoryResult<CaseRepositoryError> {
    let row = case_records::table
        .filter(case_records::id.eq(case_id.into_inner()))
        .select(CaseRow::as_select())
        .first::<CaseRow>(connection)
        .optional()
        .map_err(CaseRepositoryError::persistence)?;
    let Some(row) = row else {
        return Ok(CaseRepositoryError::NotFound(case_id));
    };
    match row_to_case(row)?.apply(change, at) {
        Err(err) => Ok(CaseRepositoryError::Rejected(err)),
        Ok(()) => Ok(CaseRepositoryError::persistence(std::io::Error::other(format!(
            "conditional {} update of case {case_id} matched no row",
            change.as_str()
        )))),
    }
}

pub(crate) fn row_to_case(row: CaseRow) -> CaseRepositoryResult<CaseRecord> {
    let case_type =
        CaseType::try_from(row.case_type.as_str()).map_err(CaseRepositoryError::persistence)?;
    Ok(CaseRecord::from_persisted(PersistedCaseData {
        id: CaseId::from_uuid(row.id),
        case_type,
        local_authority: LocalAuthorityId::from_uuid(row.local_authority_id),
        assigned_user: row.assigned_user_id.map(UserId::from_uuid),
        submission: row.submission_id.map(SubmissionId::from_uuid),
        in_assessment_at: row.in_assessment_at,
        deleted_at: row.deleted_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
