//! Adapters for the case context.
//!
//! - [`memory::InMemoryCaseRepository`] and
//!   [`postgres::PostgresCaseRepository`] persist case records
//! - [`templates`] supplies task templates per case type
//! - [`task_hooks::TaskTreeHooks`] connects request transitions to the task
//!   tree

pub mod memory;
pub mod postgres;
pub mod task_hooks;
pub mod templates;
