//! Port contracts for validation request management.
//!
//! Ports define infrastructure-agnostic interfaces used by the lifecycle
//! service.

pub mod repository;
pub mod task_hooks;

pub use repository::{
    RequestVersion, ValidationRequestRepository, ValidationRequestRepositoryError,
    ValidationRequestRepositoryResult,
};
#[cfg(test)]
pub use task_hooks::MockRequestTaskHooks;
pub use task_hooks::{RequestTaskHooks, TaskHookError, TaskHookResult};
