//! Read-time views over a case's full task tree.

use super::{SlugPath, Task, TaskId, TaskParent, TaskSlug, TaskStatus};
use crate::case::domain::CaseId;
use serde::Serialize;
use std::collections::HashMap;

/// One visible task in a rendered checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistNode {
    /// Task identifier.
    pub task_id: TaskId,
    /// Display name.
    pub name: String,
    /// Path segment.
    pub slug: TaskSlug,
    /// Full slug path from the case root.
    pub path: SlugPath,
    /// Rolled-up status, or `None` when the status is not shown.
    pub status: Option<TaskStatus>,
    /// Whether the task may be skipped.
    pub optional: bool,
    /// Visible children in sibling order.
    pub children: Vec<Self>,
}

/// All tasks of one case, indexed by parent.
///
/// Siblings are kept in `(position, creation_order)` order.
#[derive(Debug, Clone)]
pub struct TaskForest {
    case_id: CaseId,
    tasks: HashMap<TaskId, Task>,
    children: HashMap<TaskParent, Vec<TaskId>>,
}

impl TaskForest {
    /// Indexes the tasks of `case_id`; tasks of other cases are ignored.
    #[must_use]
    pub fn new(case_id: CaseId, tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut ordered: Vec<Task> = tasks
            .into_iter()
            .filter(|task| task.case_id() == case_id)
            .collect();
        ordered.sort_by_key(Task::sort_key);

        let mut children: HashMap<TaskParent, Vec<TaskId>> = HashMap::new();
        for task in &ordered {
            children.entry(task.parent()).or_default().push(task.id());
        }
        Self {
            case_id,
            tasks: ordered.into_iter().map(|task| (task.id(), task)).collect(),
            children,
        }
    }

    /// Returns the task with `id`, if it belongs to this case.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Returns the children of `parent` in sibling order, hidden ones
    /// included.
    pub fn children(&self, parent: TaskParent) -> impl Iterator<Item = &Task> + '_ {
        self.children
            .get(&parent)
            .into_iter()
            .flatten()
            .filter_map(|id| self.tasks.get(id))
    }

    fn visible_children(&self, parent: TaskParent) -> impl Iterator<Item = &Task> + '_ {
        self.children(parent).filter(|task| !task.is_hidden())
    }

    /// Aggregated status of a task.
    ///
    /// A task without visible, status-bearing children reports its own
    /// status; otherwise the children's rolled-up statuses are combined with
    /// [`TaskStatus::rollup`].
    #[must_use]
    pub fn rollup(&self, id: TaskId) -> Option<TaskStatus> {
        self.get(id).map(|task| self.rollup_of(task))
    }

    fn rollup_of(&self, task: &Task) -> TaskStatus {
        let contributing: Vec<TaskStatus> = self
            .visible_children(TaskParent::Task(task.id()))
            .filter(|child| !child.is_status_hidden())
            .map(|child| self.rollup_of(child))
            .collect();
        if contributing.is_empty() {
            task.status()
        } else {
            TaskStatus::rollup(contributing)
        }
    }

    /// Builds the visible checklist. Hidden tasks and their subtrees are
    /// left out.
    #[must_use]
    pub fn checklist(&self) -> Vec<ChecklistNode> {
        self.visible_children(TaskParent::Case(self.case_id))
            .map(|task| self.checklist_node(task, None))
            .collect()
    }

    fn checklist_node(&self, task: &Task, prefix: Option<&SlugPath>) -> ChecklistNode {
        let path = prefix.map_or_else(
            || SlugPath::from_single(task.slug().clone()),
            |parent| parent.child(task.slug().clone()),
        );
        let children = self
            .visible_children(TaskParent::Task(task.id()))
            .map(|child| self.checklist_node(child, Some(&path)))
            .collect();
        ChecklistNode {
            task_id: task.id(),
            name: task.name().to_owned(),
            slug: task.slug().clone(),
            status: (!task.is_status_hidden()).then(|| self.rollup_of(task)),
            optional: task.is_optional(),
            path,
            children,
        }
    }

    /// Returns `true` when every visible, required leaf is completed.
    ///
    /// Optional tasks exempt their whole subtree.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let mut pending: Vec<&Task> = self
            .visible_children(TaskParent::Case(self.case_id))
            .collect();
        while let Some(task) = pending.pop() {
            if task.is_optional() {
                continue;
            }
            let before = pending.len();
            pending.extend(self.visible_children(TaskParent::Task(task.id())));
            let is_leaf = pending.len() == before;
            if is_leaf && task.status() != TaskStatus::Completed {
                return false;
            }
        }
        true
    }
}
