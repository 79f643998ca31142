//! Identifier types for the task tree domain.

use crate::ids::uuid_identifier;

uuid_identifier!(
    /// Unique identifier for a task node.
    TaskId
);
