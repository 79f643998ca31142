//! Port contracts for task trees.

pub mod repository;

pub use repository::{TaskTreeRepository, TaskTreeRepositoryError, TaskTreeRepositoryResult};
