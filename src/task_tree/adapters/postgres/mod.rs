//! `PostgreSQL` adapters for task tree persistence.

pub(crate) mod models;
mod repository;
mod schema;

#[cfg(test)]
pub(crate) use repository::row_to_task;
pub use repository::{PostgresTaskTreeRepository, TaskTreePgPool};
