//! In-memory repository for task trees.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::case::domain::CaseId;
use crate::task_tree::{
    domain::{Task, TaskId, TaskParent, TaskSlug, TaskStatus},
    ports::{TaskTreeRepository, TaskTreeRepositoryError, TaskTreeRepositoryResult},
};

/// Thread-safe in-memory task tree repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskTreeRepository {
    state: Arc<RwLock<InMemoryTaskTreeState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskTreeState {
    tasks: HashMap<TaskId, Task>,
    child_index: HashMap<TaskParent, HashMap<TaskSlug, TaskId>>,
    case_index: HashMap<CaseId, Vec<TaskId>>,
}

impl InMemoryTaskTreeRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl std::fmt::Display) -> TaskTreeRepositoryError {
    TaskTreeRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

/// Checks a batch against stored tasks and itself before anything is written.
fn check_batch(state: &InMemoryTaskTreeState, tasks: &[Task]) -> TaskTreeRepositoryResult<()> {
    let mut batch_ids = HashSet::new();
    let mut batch_siblings = HashSet::new();
    for task in tasks {
        if state.tasks.contains_key(&task.id()) || !batch_ids.insert(task.id()) {
            return Err(TaskTreeRepositoryError::DuplicateTask(task.id()));
        }
        let stored_sibling = state
            .child_index
            .get(&task.parent())
            .is_some_and(|children| children.contains_key(task.slug()));
        if stored_sibling || !batch_siblings.insert((task.parent(), task.slug().clone())) {
            return Err(TaskTreeRepositoryError::DuplicateSibling {
                parent: task.parent(),
                slug: task.slug().clone(),
            });
        }
    }
    Ok(())
}

#[async_trait]
impl TaskTreeRepository for InMemoryTaskTreeRepository {
    async fn store_tree(&self, tasks: &[Task]) -> TaskTreeRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        check_batch(&state, tasks)?;
        for task in tasks {
            state
                .child_index
                .entry(task.parent())
                .or_default()
                .insert(task.slug().clone(), task.id());
            state
                .case_index
                .entry(task.case_id())
                .or_default()
                .push(task.id());
            state.tasks.insert(task.id(), task.clone());
        }
        Ok(())
    }

    async fn update_if_status(
        &self,
        task: &Task,
        expected: TaskStatus,
    ) -> TaskTreeRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let stored = state
            .tasks
            .get_mut(&task.id())
            .ok_or(TaskTreeRepositoryError::NotFound(task.id()))?;
        if stored.status() != expected {
            return Err(TaskTreeRepositoryError::StaleStatus {
                task_id: task.id(),
                expected,
                actual: stored.status(),
            });
        }
        *stored = task.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskTreeRepositoryResult<Option<Task>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn find_child(
        &self,
        parent: TaskParent,
        slug: &TaskSlug,
    ) -> TaskTreeRepositoryResult<Option<Task>> {
        let state = self.state.read().map_err(poisoned)?;
        let task = state
            .child_index
            .get(&parent)
            .and_then(|children| children.get(slug))
            .and_then(|id| state.tasks.get(id))
            .cloned();
        Ok(task)
    }

    async fn children_of(&self, parent: TaskParent) -> TaskTreeRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(poisoned)?;
        let mut children: Vec<Task> = state
            .child_index
            .get(&parent)
            .map(|children| {
                children
                    .values()
                    .filter_map(|id| state.tasks.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        children.sort_by_key(Task::sort_key);
        Ok(children)
    }

    async fn list_for_case(&self, case_id: CaseId) -> TaskTreeRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(poisoned)?;
        let tasks = state
            .case_index
            .get(&case_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.tasks.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(tasks)
    }
}
