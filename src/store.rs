//! In-memory task store.
//!
//! `TaskStore` owns the ordered task list (most recent first) and applies the
//! four mutations the application supports. Every mutation publishes a new
//! `Arc<[Task]>`, so a snapshot handed out earlier never changes under its
//! holder.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::task::Task;

/// Issues task ids that look like millisecond timestamps but never repeat.
///
/// Two tasks created within the same millisecond get consecutive ids instead
/// of colliding.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    /// Start after the largest id already in use.
    pub fn seeded(tasks: &[Task]) -> Self {
        IdGenerator {
            last: tasks.iter().map(|t| t.id).max().unwrap_or(0),
        }
    }

    /// Next id given the current wall-clock time in milliseconds.
    ///
    /// Returns `None` once `u64::MAX` has been handed out.
    pub fn next(&mut self, now_ms: u64) -> Option<u64> {
        self.last = now_ms.max(self.last.checked_add(1)?);
        Some(self.last)
    }
}

/// Ordered list of tasks plus the id source for new ones.
#[derive(Debug, Clone)]
pub struct TaskStore {
    tasks: Arc<[Task]>,
    ids: IdGenerator,
}

impl Default for TaskStore {
    fn default() -> Self {
        TaskStore::from_tasks(Vec::new())
    }
}

impl TaskStore {
    /// Seed the store with a previously persisted list, kept in its order.
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let ids = IdGenerator::seeded(&tasks);
        TaskStore {
            tasks: tasks.into(),
            ids,
        }
    }

    /// Point-in-time view of the list.
    pub fn tasks(&self) -> Arc<[Task]> {
        Arc::clone(&self.tasks)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Get a task by ID.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Replace the whole list, e.g. after re-reading storage.
    pub fn replace(&mut self, tasks: Vec<Task>) {
        let seeded = IdGenerator::seeded(&tasks);
        if seeded.last > self.ids.last {
            self.ids = seeded;
        }
        self.tasks = tasks.into();
    }

    /// Prepend a new open task. Blank text is ignored and yields `None`, as
    /// does running out of ids.
    pub fn add(&mut self, text: &str, reminder: Option<DateTime<Utc>>) -> Option<u64> {
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring add with blank text");
            return None;
        }
        let now_ms = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let Some(id) = self.ids.next(now_ms) else {
            warn!("task id space exhausted, not adding");
            return None;
        };

        let mut next = Vec::with_capacity(self.tasks.len() + 1);
        next.push(Task::new(id, text, reminder));
        next.extend(self.tasks.iter().cloned());
        self.tasks = next.into();
        debug!(id, "task added");
        Some(id)
    }

    /// Flip the completion flag. Returns false when no task has `id`.
    pub fn toggle_complete(&mut self, id: u64) -> bool {
        self.update(id, |t| t.completed = !t.completed)
    }

    /// Remove the task with `id`, keeping the others in order.
    pub fn delete(&mut self, id: u64) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        let next: Vec<Task> = self.tasks.iter().filter(|t| t.id != id).cloned().collect();
        self.tasks = next.into();
        debug!(id, "task deleted");
        true
    }

    /// Set or clear the reminder on the task with `id`.
    pub fn set_reminder(&mut self, id: u64, reminder: Option<DateTime<Utc>>) -> bool {
        self.update(id, |t| t.reminder = reminder)
    }

    fn update(&mut self, id: u64, apply: impl FnOnce(&mut Task)) -> bool {
        let Some(idx) = self.tasks.iter().position(|t| t.id == id) else {
            debug!(id, "no task with id");
            return false;
        };
        let mut next = self.tasks.to_vec();
        apply(&mut next[idx]);
        self.tasks = next.into();
        true
    }
}
