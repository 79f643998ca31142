//! Persistence adapters for task trees.
//!
//! - [`memory::InMemoryTaskTreeRepository`]: thread-safe in-memory storage
//! - [`postgres::PostgresTaskTreeRepository`]: Diesel-backed `PostgreSQL`
//!   storage

pub mod memory;
pub mod postgres;
