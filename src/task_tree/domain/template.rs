//! Case-type task templates and their instantiation into task trees.

use super::{NewTaskParams, SlugPath, Task, TaskParent, TaskSlug, TaskTreeDomainError};
use crate::case::domain::CaseId;
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One node of a task template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTemplateNode {
    /// Display name.
    pub name: String,
    /// Path segment, unique among siblings.
    pub slug: TaskSlug,
    /// Sibling ordering key.
    #[serde(default)]
    pub position: u32,
    /// Whether the task blocks case completion.
    #[serde(default)]
    pub optional: bool,
    /// Whether the task starts hidden.
    #[serde(default)]
    pub hidden: bool,
    /// Whether the status is suppressed from rollups.
    #[serde(default)]
    pub status_hidden: bool,
    /// Nested tasks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Self>,
}

impl TaskTemplateNode {
    /// Creates a visible, mandatory node at position 0.
    #[must_use]
    pub fn new(name: impl Into<String>, slug: TaskSlug) -> Self {
        Self {
            name: name.into(),
            slug,
            position: 0,
            optional: false,
            hidden: false,
            status_hidden: false,
            children: Vec::new(),
        }
    }

    /// Sets the sibling position.
    #[must_use]
    pub const fn at_position(mut self, position: u32) -> Self {
        self.position = position;
        self
    }

    /// Marks the node optional.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Marks the node initially hidden.
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Suppresses the node's status from rollups.
    #[must_use]
    pub const fn status_hidden(mut self) -> Self {
        self.status_hidden = true;
        self
    }

    /// Appends child nodes.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Ordered outline of the task tree seeded for a case type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskTemplate {
    /// Top-level nodes.
    pub nodes: Vec<TaskTemplateNode>,
}

impl TaskTemplate {
    /// Creates a template from top-level nodes.
    #[must_use]
    pub fn new(nodes: impl IntoIterator<Item = TaskTemplateNode>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
        }
    }

    /// Checks sibling uniqueness of names and slugs across the template.
    ///
    /// # Errors
    ///
    /// Returns [`TaskTreeDomainError::EmptyTemplate`],
    /// [`TaskTreeDomainError::EmptyTaskName`],
    /// [`TaskTreeDomainError::DuplicateSiblingSlug`] or
    /// [`TaskTreeDomainError::DuplicateSiblingName`].
    pub fn validate(&self) -> Result<(), TaskTreeDomainError> {
        if self.nodes.is_empty() {
            return Err(TaskTreeDomainError::EmptyTemplate);
        }
        validate_siblings(&self.nodes, None)
    }

    /// Returns the slug paths of every node in depth-first template order.
    #[must_use]
    pub fn paths(&self) -> Vec<SlugPath> {
        let mut paths = Vec::new();
        let mut stack: Vec<(Option<SlugPath>, &TaskTemplateNode)> =
            self.nodes.iter().rev().map(|node| (None, node)).collect();
        while let Some((prefix, node)) = stack.pop() {
            let path = match prefix {
                Some(parent) => parent.child(node.slug.clone()),
                None => SlugPath::from_single(node.slug.clone()),
            };
            for child in node.children.iter().rev() {
                stack.push((Some(path.clone()), child));
            }
            paths.push(path);
        }
        paths
    }

    /// Builds the task records for `case_id`.
    ///
    /// Tasks are returned in depth-first template order with increasing
    /// `creation_order`.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`TaskTemplate::validate`].
    pub fn instantiate(
        &self,
        case_id: CaseId,
        clock: &impl Clock,
    ) -> Result<Vec<Task>, TaskTreeDomainError> {
        self.validate()?;
        let mut tasks = Vec::new();
        let mut stack: Vec<(TaskParent, &TaskTemplateNode)> = self
            .nodes
            .iter()
            .rev()
            .map(|node| (TaskParent::Case(case_id), node))
            .collect();
        let mut creation_order: u32 = 0;
        while let Some((parent, node)) = stack.pop() {
            let task = Task::new(
                NewTaskParams {
                    case_id,
                    parent,
                    name: node.name.trim().to_owned(),
                    slug: node.slug.clone(),
                    position: node.position,
                    creation_order,
                    optional: node.optional,
                    hidden: node.hidden,
                    status_hidden: node.status_hidden,
                },
                clock,
            );
            creation_order = creation_order.saturating_add(1);
            for child in node.children.iter().rev() {
                stack.push((TaskParent::Task(task.id()), child));
            }
            tasks.push(task);
        }
        Ok(tasks)
    }
}

fn validate_siblings(
    nodes: &[TaskTemplateNode],
    parent: Option<&SlugPath>,
) -> Result<(), TaskTreeDomainError> {
    let parent_label = parent.map_or_else(|| "/".to_owned(), ToString::to_string);
    let mut slugs = HashSet::new();
    let mut names = HashSet::new();
    for node in nodes {
        let name = node.name.trim();
        if name.is_empty() {
            return Err(TaskTreeDomainError::EmptyTaskName);
        }
        if !slugs.insert(node.slug.as_str()) {
            return Err(TaskTreeDomainError::DuplicateSiblingSlug {
                parent: parent_label,
                slug: node.slug.to_string(),
            });
        }
        if !names.insert(name) {
            return Err(TaskTreeDomainError::DuplicateSiblingName {
                parent: parent_label,
                name: name.to_owned(),
            });
        }
        let path = parent.map_or_else(
            || SlugPath::from_single(node.slug.clone()),
            |prefix| prefix.child(node.slug.clone()),
        );
        validate_siblings(&node.children, Some(&path))?;
    }
    Ok(())
}
