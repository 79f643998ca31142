//! Service layer for task trees.

mod engine;

pub use engine::{TaskTreeService, TaskTreeServiceError, TaskTreeServiceResult};
