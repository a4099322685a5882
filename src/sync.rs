//! Write-through persistence of the task list.
//!
//! The full list is stored as one JSON array under a single key. Loading
//! never fails: an absent, unreadable or malformed payload seeds an empty
//! list. Saving overwrites the whole payload and swallows backend errors
//! after logging them.

use tracing::{debug, warn};

use crate::kv::KeyValueStore;
use crate::task::Task;

/// Key the task list is stored under.
pub const STORAGE_KEY: &str = "todos";

/// Serialize a task list to the persisted payload.
pub fn encode(tasks: &[Task]) -> serde_json::Result<String> {
    serde_json::to_string(tasks)
}

/// Parse a persisted payload.
pub fn decode(payload: &str) -> serde_json::Result<Vec<Task>> {
    serde_json::from_str(payload)
}

/// Bridge between the task store and a key-value backend.
#[derive(Debug)]
pub struct PersistenceSync<S> {
    kv: S,
    key: String,
}

impl<S: KeyValueStore> PersistenceSync<S> {
    pub fn new(kv: S, key: impl Into<String>) -> Self {
        PersistenceSync { kv, key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &S {
        &self.kv
    }

    /// Raw payload as currently stored, if any.
    pub fn raw(&self) -> Option<String> {
        match self.kv.get(&self.key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %self.key, error = %e, "error reading saved tasks, treating as absent");
                None
            }
        }
    }

    /// Read the saved list, falling back to empty on any problem.
    pub fn load(&self) -> Vec<Task> {
        let Some(payload) = self.raw() else {
            debug!(key = %self.key, "no saved tasks");
            return Vec::new();
        };
        match decode(&payload) {
            Ok(tasks) => {
                debug!(key = %self.key, count = tasks.len(), "loaded saved tasks");
                tasks
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "error parsing saved tasks, starting fresh");
                Vec::new()
            }
        }
    }

    /// Overwrite the saved list. Failures are logged, never returned.
    pub fn save(&self, tasks: &[Task]) {
        let payload = match encode(tasks) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "failed to serialize tasks");
                return;
            }
        };
        if let Err(e) = self.kv.set(&self.key, &payload) {
            warn!(key = %self.key, error = %e, "failed to save tasks");
        } else {
            debug!(key = %self.key, count = tasks.len(), "tasks saved");
        }
    }
}
