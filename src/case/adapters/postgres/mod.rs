//! `PostgreSQL` adapters for case record persistence.

pub(crate) mod models;
mod repository;
mod schema;

#[cfg(test)]
pub(crate) use repository::row_to_case;
pub use repository::{CasePgPool, PostgresCaseRepository};
