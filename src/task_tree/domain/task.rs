//! Task entity, status semantics and parent references.

use super::{ParseTaskParentError, ParseTaskStatusError, TaskId, TaskSlug};
use crate::case::domain::CaseId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Checklist status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// No work recorded yet.
    NotStarted,
    /// Work has begun.
    InProgress,
    /// The officer has signed the task off.
    Completed,
    /// A previously completed task needs another look.
    ActionRequired,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::ActionRequired => "action_required",
        }
    }

    /// Aggregates child statuses into a parent status for display.
    ///
    /// Any `action_required` child wins, then all-complete, then any started
    /// child. An empty set rolls up to `not_started`.
    #[must_use]
    pub fn rollup(statuses: impl IntoIterator<Item = Self>) -> Self {
        let mut seen_any = false;
        let mut all_completed = true;
        let mut any_started = false;
        for status in statuses {
            seen_any = true;
            match status {
                Self::ActionRequired => return Self::ActionRequired,
                Self::Completed => any_started = true,
                Self::InProgress => {
                    any_started = true;
                    all_completed = false;
                }
                Self::NotStarted => all_completed = false,
            }
        }
        if seen_any && all_completed {
            Self::Completed
        } else if any_started {
            Self::InProgress
        } else {
            Self::NotStarted
        }
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "action_required" => Ok(Self::ActionRequired),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request lifecycle event delivered to the task a request is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestEvent {
    /// A bound request was raised.
    Raised,
    /// A bound request was closed, by the applicant or a milestone.
    Closed,
    /// The last unresolved bound request was cancelled.
    Cancelled,
}

impl RequestEvent {
    /// Returns a short label for logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Raised => "raised",
            Self::Closed => "closed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Parent of a task node: the case root or another task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum TaskParent {
    /// Top-level task attached to the case record.
    Case(CaseId),
    /// Nested task.
    Task(TaskId),
}

impl TaskParent {
    /// Returns the persisted discriminant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Case(_) => "case",
            Self::Task(_) => "task",
        }
    }

    /// Returns the referenced record identifier.
    #[must_use]
    pub const fn raw_id(&self) -> Uuid {
        match self {
            Self::Case(id) => id.into_inner(),
            Self::Task(id) => id.into_inner(),
        }
    }

    /// Rebuilds a parent from its persisted discriminant and identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ParseTaskParentError`] for an unknown discriminant.
    pub fn from_parts(kind: &str, id: Uuid) -> Result<Self, ParseTaskParentError> {
        match kind {
            "case" => Ok(Self::Case(CaseId::from_uuid(id))),
            "task" => Ok(Self::Task(TaskId::from_uuid(id))),
            _ => Err(ParseTaskParentError(kind.to_owned())),
        }
    }
}

/// One node in a case's checklist tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    case_id: CaseId,
    parent: TaskParent,
    name: String,
    slug: TaskSlug,
    status: TaskStatus,
    started_by_request: bool,
    hidden: bool,
    status_hidden: bool,
    optional: bool,
    position: u32,
    creation_order: u32,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameters for creating a task node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskParams {
    /// Case that owns the tree.
    pub case_id: CaseId,
    /// Parent node.
    pub parent: TaskParent,
    /// Display name.
    pub name: String,
    /// Path segment.
    pub slug: TaskSlug,
    /// Sibling ordering key.
    pub position: u32,
    /// Creation order within the tree, used to break position ties.
    pub creation_order: u32,
    /// Whether the task blocks case completion.
    pub optional: bool,
    /// Whether the task starts hidden from the checklist.
    pub hidden: bool,
    /// Whether the status is suppressed from rollups.
    pub status_hidden: bool,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted identifier.
    pub id: TaskId,
    /// Owning case.
    pub case_id: CaseId,
    /// Parent node.
    pub parent: TaskParent,
    /// Display name.
    pub name: String,
    /// Path segment.
    pub slug: TaskSlug,
    /// Current status.
    pub status: TaskStatus,
    /// Whether the current `in_progress` status came from a raised request.
    pub started_by_request: bool,
    /// Hidden flag.
    pub hidden: bool,
    /// Status-hidden flag.
    pub status_hidden: bool,
    /// Optional flag.
    pub optional: bool,
    /// Sibling ordering key.
    pub position: u32,
    /// Creation order within the tree.
    pub creation_order: u32,
    /// When work started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the task was completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new task in the `not_started` status.
    #[must_use]
    pub fn new(params: NewTaskParams, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            case_id: params.case_id,
            parent: params.parent,
            name: params.name,
            slug: params.slug,
            status: TaskStatus::NotStarted,
            started_by_request: false,
            hidden: params.hidden,
            status_hidden: params.status_hidden,
            optional: params.optional,
            position: params.position,
            creation_order: params.creation_order,
            started_at: None,
            completed_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            case_id: data.case_id,
            parent: data.parent,
            name: data.name,
            slug: data.slug,
            status: data.status,
            started_by_request: data.started_by_request,
            hidden: data.hidden,
            status_hidden: data.status_hidden,
            optional: data.optional,
            position: data.position,
            creation_order: data.creation_order,
            started_at: data.started_at,
            completed_at: data.completed_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning case.
    #[must_use]
    pub const fn case_id(&self) -> CaseId {
        self.case_id
    }

    /// Returns the parent reference.
    #[must_use]
    pub const fn parent(&self) -> TaskParent {
        self.parent
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the path segment.
    #[must_use]
    pub const fn slug(&self) -> &TaskSlug {
        &self.slug
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns `true` while the task is `in_progress` only because a bound
    /// request was raised.
    #[must_use]
    pub const fn is_started_by_request(&self) -> bool {
        self.started_by_request
    }

    /// Returns `true` if the task is excluded from the visible checklist.
    #[must_use]
    pub const fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Returns `true` if the status is suppressed from rollups.
    #[must_use]
    pub const fn is_status_hidden(&self) -> bool {
        self.status_hidden
    }

    /// Returns `true` if the task does not block case completion.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Returns the sibling ordering key.
    #[must_use]
    pub const fn position(&self) -> u32 {
        self.position
    }

    /// Returns the creation order within the tree.
    #[must_use]
    pub const fn creation_order(&self) -> u32 {
        self.creation_order
    }

    /// Returns when work started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns when the task was completed.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Sibling sort key: position first, then creation order.
    #[must_use]
    pub const fn sort_key(&self) -> (u32, u32) {
        (self.position, self.creation_order)
    }

    /// Returns `true` if `event` would change this task.
    ///
    /// A raise starts an untouched task. A close flags completed work for
    /// another look and settles a request-started task so a later cancel
    /// keeps it. A cancel only undoes a start made by a raise.
    #[must_use]
    pub const fn is_affected_by(&self, event: RequestEvent) -> bool {
        match event {
            RequestEvent::Raised => matches!(self.status, TaskStatus::NotStarted),
            RequestEvent::Closed => {
                matches!(self.status, TaskStatus::Completed)
                    || (matches!(self.status, TaskStatus::InProgress) && self.started_by_request)
            }
            RequestEvent::Cancelled => {
                matches!(self.status, TaskStatus::InProgress) && self.started_by_request
            }
        }
    }

    /// Applies a request event, returning `false` when it leaves the task
    /// untouched.
    pub fn react_to(&mut self, event: RequestEvent, clock: &impl Clock) -> bool {
        if !self.is_affected_by(event) {
            return false;
        }
        match event {
            RequestEvent::Raised => {
                self.set_status(TaskStatus::InProgress, clock);
                self.started_by_request = true;
            }
            RequestEvent::Closed if self.status == TaskStatus::Completed => {
                self.set_status(TaskStatus::ActionRequired, clock);
            }
            RequestEvent::Closed => {
                self.started_by_request = false;
                self.updated_at = clock.utc();
            }
            RequestEvent::Cancelled => self.set_status(TaskStatus::NotStarted, clock),
        }
        true
    }

    /// Writes a new status and maintains the status timestamps.
    ///
    /// Any status is accepted. The write counts as officer work, so a later
    /// request cancellation leaves it alone.
    pub fn set_status(&mut self, status: TaskStatus, clock: &impl Clock) {
        let timestamp = clock.utc();
        self.started_by_request = false;
        match status {
            TaskStatus::NotStarted => {
                self.started_at = None;
                self.completed_at = None;
            }
            TaskStatus::InProgress | TaskStatus::ActionRequired => {
                self.started_at.get_or_insert(timestamp);
                self.completed_at = None;
            }
            TaskStatus::Completed => {
                self.started_at.get_or_insert(timestamp);
                self.completed_at = Some(timestamp);
            }
        }
        self.status = status;
        self.updated_at = timestamp;
    }

    /// Sets the hidden flag, leaving the status untouched.
    pub fn set_hidden(&mut self, hidden: bool, clock: &impl Clock) {
        self.hidden = hidden;
        self.updated_at = clock.utc();
    }
}
