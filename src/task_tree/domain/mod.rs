//! Domain model for per-case task trees.
//!
//! Tasks form a forest under each case record, addressed by slug paths from
//! the case root. Status semantics for request-driven reactions live on
//! [`TaskStatus`] so that services only orchestrate persistence.

mod error;
mod forest;
mod ids;
mod slug;
mod task;
mod template;

pub use error::{ParseTaskParentError, ParseTaskStatusError, TaskTreeDomainError};
pub use forest::{ChecklistNode, TaskForest};
pub use ids::TaskId;
pub use slug::{SlugPath, TaskSlug};
pub use task::{NewTaskParams, PersistedTaskData, RequestEvent, Task, TaskParent, TaskStatus};
pub use template::{TaskTemplate, TaskTemplateNode};
