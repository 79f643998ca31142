//! `PostgreSQL` repository implementation for task tree storage.

use super::{
    models::{NewTaskRow, TaskChangeset, TaskRow},
    schema::case_tasks,
};
use crate::case::domain::CaseId;
use crate::task_tree::{
    domain::{PersistedTaskData, Task, TaskId, TaskParent, TaskSlug, TaskStatus},
    ports::{TaskTreeRepository, TaskTreeRepositoryError, TaskTreeRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by task tree adapters.
pub type TaskTreePgPool = Pool<ConnectionManager<PgConnection>>;

const PRIMARY_KEY_CONSTRAINT: &str = "case_tasks_pkey";
const SIBLING_SLUG_CONSTRAINT: &str = "idx_case_tasks_parent_slug";

/// `PostgreSQL`-backed task tree repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskTreeRepository {
    pool: TaskTreePgPool,
}

impl PostgresTaskTreeRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskTreePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskTreeRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskTreeRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskTreeRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskTreeRepositoryError::persistence)?
    }
}

impl From<DieselError> for TaskTreeRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl TaskTreeRepository for PostgresTaskTreeRepository {
    async fn store_tree(&self, tasks: &[Task]) -> TaskTreeRepositoryResult<()> {
        let batch = tasks
            .iter()
            .map(|task| Ok((to_new_row(task)?, task.parent(), task.slug().clone())))
            .collect::<TaskTreeRepositoryResult<Vec<_>>>()?;

        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskTreeRepositoryError, _>(|tx| {
                for (row, parent, slug) in &batch {
                    diesel::insert_into(case_tasks::table)
                        .values(row)
                        .execute(tx)
                        .map_err(|err| map_insert_error(err, row.id, *parent, slug))?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn update_if_status(
        &self,
        task: &Task,
        expected: TaskStatus,
    ) -> TaskTreeRepositoryResult<()> {
        let task_id = task.id();
        let changeset = TaskChangeset {
            status: task.status().as_str().to_owned(),
            started_by_request: task.is_started_by_request(),
            hidden: task.is_hidden(),
            started_at: task.started_at(),
            completed_at: task.completed_at(),
            updated_at: task.updated_at(),
        };

        self.run_blocking(move |connection| {
            let updated = diesel::update(
                case_tasks::table
                    .filter(case_tasks::id.eq(task_id.into_inner()))
                    .filter(case_tasks::status.eq(expected.as_str())),
            )
            .set(&changeset)
            .execute(connection)?;
            if updated > 0 {
                return Ok(());
            }

            let stored_status = case_tasks::table
                .filter(case_tasks::id.eq(task_id.into_inner()))
                .select(case_tasks::status)
                .first::<String>(connection)
                .optional()?;
            match stored_status {
                None => Err(TaskTreeRepositoryError::NotFound(task_id)),
                Some(raw) => Err(TaskTreeRepositoryError::StaleStatus {
                    task_id,
                    expected,
                    actual: TaskStatus::try_from(raw.as_str())
                        .map_err(TaskTreeRepositoryError::persistence)?,
                }),
            }
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskTreeRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = case_tasks::table
                .filter(case_tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_child(
        &self,
        parent: TaskParent,
        slug: &TaskSlug,
    ) -> TaskTreeRepositoryResult<Option<Task>> {
        let lookup_slug = slug.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = case_tasks::table
                .filter(case_tasks::parent_type.eq(parent.kind()))
                .filter(case_tasks::parent_id.eq(parent.raw_id()))
                .filter(case_tasks::slug.eq(lookup_slug))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn children_of(&self, parent: TaskParent) -> TaskTreeRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = case_tasks::table
                .filter(case_tasks::parent_type.eq(parent.kind()))
                .filter(case_tasks::parent_id.eq(parent.raw_id()))
                .order((case_tasks::position.asc(), case_tasks::creation_order.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn list_for_case(&self, case_id: CaseId) -> TaskTreeRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = case_tasks::table
                .filter(case_tasks::case_id.eq(case_id.into_inner()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }
}

fn map_insert_error(
    err: DieselError,
    id: uuid::Uuid,
    parent: TaskParent,
    slug: &TaskSlug,
) -> TaskTreeRepositoryError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
            if violates(info.as_ref(), SIBLING_SLUG_CONSTRAINT) =>
        {
            TaskTreeRepositoryError::DuplicateSibling {
                parent,
                slug: slug.clone(),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
            if violates(info.as_ref(), PRIMARY_KEY_CONSTRAINT) =>
        {
            TaskTreeRepositoryError::DuplicateTask(TaskId::from_uuid(id))
        }
        _ => TaskTreeRepositoryError::persistence(err),
    }
}

fn violates(info: &dyn DatabaseErrorInformation, constraint: &str) -> bool {
    info.constraint_name().is_some_and(|name| name == constraint)
}

fn to_new_row(task: &Task) -> TaskTreeRepositoryResult<NewTaskRow> {
    let parent = task.parent();
    Ok(NewTaskRow {
        id: task.id().into_inner(),
        case_id: task.case_id().into_inner(),
        parent_type: parent.kind().to_owned(),
        parent_id: parent.raw_id(),
        name: task.name().to_owned(),
        slug: task.slug().as_str().to_owned(),
        status: task.status().as_str().to_owned(),
        started_by_request: task.is_started_by_request(),
        hidden: task.is_hidden(),
        status_hidden: task.is_status_hidden(),
        optional: task.is_optional(),
        position: i32::try_from(task.position()).map_err(TaskTreeRepositoryError::persistence)?,
        creation_order: i32::try_from(task.creation_order())
            .map_err(TaskTreeRepositoryError::persistence)?,
        started_at: task.started_at(),
        completed_at: task.completed_at(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

pub(crate) fn row_to_task(row: TaskRow) -> TaskTreeRepositoryResult<Task> {
    let TaskRow {
        id,
        case_id,
        parent_type,
        parent_id,
        name,
        slug: persisted_slug,
        status: persisted_status,
        started_by_request,
        hidden,
        status_hidden,
        optional,
        position,
        creation_order,
        started_at,
        completed_at,
        created_at,
        updated_at,
    } = row;

    let parent = TaskParent::from_parts(&parent_type, parent_id)
        .map_err(TaskTreeRepositoryError::persistence)?;
    let slug = TaskSlug::new(persisted_slug).map_err(TaskTreeRepositoryError::persistence)?;
    let status = TaskStatus::try_from(persisted_status.as_str())
        .map_err(TaskTreeRepositoryError::persistence)?;

    let data = PersistedTaskData {
        id: TaskId::from_uuid(id),
        case_id: CaseId::from_uuid(case_id),
        parent,
        name,
        slug,
        status,
        started_by_request,
        hidden,
        status_hidden,
        optional,
        position: u32::try_from(position).map_err(TaskTreeRepositoryError::persistence)?,
        creation_order: u32::try_from(creation_order)
            .map_err(TaskTreeRepositoryError::persistence)?,
        started_at,
        completed_at,
        created_at,
        updated_at,
    };
    Ok(Task::from_persisted(data))
}
