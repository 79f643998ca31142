//! Persistence adapters for validation requests.
//!
//! - [`memory::InMemoryValidationRequestRepository`]: thread-safe in-memory
//!   storage for tests and single-process use
//! - [`postgres::PostgresValidationRequestRepository`]: Diesel-backed
//!   `PostgreSQL` storage

pub mod memory;
pub mod postgres;
