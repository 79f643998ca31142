//! `PostgreSQL` adapters for validation request persistence.

pub(crate) mod models;
mod repository;
mod schema;

#[cfg(test)]
pub(crate) use repository::row_to_request;
pub use repository::{PostgresValidationRequestRepository, RequestPgPool};
