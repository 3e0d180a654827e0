//! Local mirror of the remote task collection.
//!
//! The mirror is replaced wholesale on every remote snapshot and patched in
//! place by optimistic local edits. Ids are unique on every path; when a
//! snapshot and a local edit disagree, the next snapshot wins.

use crate::task::{Task, TaskId};
use crate::view::{ViewQuery, visible_tasks};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole mirror with `tasks`, in the order given.
    ///
    /// A repeated id keeps its first occurrence. The new list is built before
    /// it is swapped in, so readers never see a mix of old and new.
    ///
    /// Returns whether the mirror changed.
    pub fn replace_all(&mut self, tasks: impl IntoIterator<Item = Task>) -> bool {
        let mut seen = HashSet::new();
        let next: Vec<Task> = tasks
            .into_iter()
            .filter(|task| seen.insert(task.id.clone()))
            .collect();
        if next == self.tasks {
            return false;
        }
        self.tasks = next;
        true
    }

    /// Puts `task` at the front of the mirror, evicting any entry with the same id.
    pub fn insert_local(&mut self, task: Task) -> bool {
        self.tasks.retain(|existing| existing.id != task.id);
        self.tasks.insert(0, task);
        true
    }

    /// Replaces the entry with `task`'s id. Does nothing if there is none.
    pub fn update_local(&mut self, task: Task) -> bool {
        match self.tasks.iter_mut().find(|existing| existing.id == task.id) {
            Some(slot) if *slot != task => {
                *slot = task;
                true
            }
            _ => false,
        }
    }

    /// Removes the entry with `id`. Does nothing if there is none.
    pub fn remove_local(&mut self, id: &TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| &task.id != id);
        self.tasks.len() != before
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The tasks `query` selects, in render order.
    pub fn view(&self, query: &ViewQuery) -> Vec<&Task> {
        visible_tasks(&self.tasks, query)
    }
}
