//! Application state object.
//!
//! A `Session` owns the task store, its persistence bridge and the reminder
//! monitor, and is passed by reference to whatever drives it (a one-shot
//! command, the headless watcher or the TUI). Every store mutation that
//! changes the list is written through to storage and has its reminder
//! bookkeeping applied in the same call.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::kv::KeyValueStore;
use crate::notify::{Notifier, Permission};
use crate::reminder::ReminderMonitor;
use crate::store::TaskStore;
use crate::sync::PersistenceSync;
use crate::task::Task;

pub struct Session<S, N> {
    store: TaskStore,
    sync: PersistenceSync<S>,
    monitor: ReminderMonitor<N>,
}

impl<S: KeyValueStore, N: Notifier> Session<S, N> {
    /// Seed the store from storage and write the seeded list back.
    pub fn open(sync: PersistenceSync<S>, monitor: ReminderMonitor<N>) -> Self {
        let store = TaskStore::from_tasks(sync.load());
        sync.save(&store.tasks());
        info!(tasks = store.len(), key = sync.key(), "session opened");
        Session {
            store,
            sync,
            monitor,
        }
    }

    /// Begin reminder monitoring; requests notification permission once.
    pub fn start_reminders(&mut self) -> Permission {
        self.monitor.start()
    }

    /// Re-read the saved list, picking up changes made elsewhere.
    ///
    /// Tasks that were completed, reopened or deleted by another writer lose
    /// their reminder bookkeeping, and tasks whose reminder moved are rearmed,
    /// exactly as if the change had been made through this session.
    pub fn reload(&mut self) {
        let before = self.store.tasks();
        let after = self.sync.load();
        let now = Utc::now();
        for old in before.iter() {
            match after.iter().find(|t| t.id == old.id) {
                None => self.monitor.forget(old.id),
                Some(new) if new.completed != old.completed => self.monitor.forget(old.id),
                Some(new)
                    if new.reminder != old.reminder && starts_new_episode(new.reminder, now) =>
                {
                    self.monitor.rearm(old.id)
                }
                Some(_) => {}
            }
        }
        self.store.replace(after);
    }

    pub fn tasks(&self) -> Arc<[Task]> {
        self.store.tasks()
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.store.get(id)
    }

    pub fn add(&mut self, text: &str, reminder: Option<DateTime<Utc>>) -> Option<u64> {
        let id = self.store.add(text, reminder)?;
        self.persist();
        Some(id)
    }

    /// Toggle completion; a task that changes state stops alerting.
    pub fn toggle_complete(&mut self, id: u64) -> bool {
        if !self.store.toggle_complete(id) {
            return false;
        }
        self.monitor.forget(id);
        self.persist();
        true
    }

    pub fn delete(&mut self, id: u64) -> bool {
        if !self.store.delete(id) {
            return false;
        }
        self.monitor.forget(id);
        self.persist();
        true
    }

    /// Change the reminder; whether the task alerts is decided on the next tick.
    ///
    /// Moving an elapsed reminder to another elapsed time keeps the current
    /// alerting episode, so the task is not announced twice.
    pub fn set_reminder(&mut self, id: u64, reminder: Option<DateTime<Utc>>) -> bool {
        let Some(previous) = self.store.get(id).map(|t| t.reminder) else {
            return false;
        };
        self.store.set_reminder(id, reminder);
        if previous != reminder && starts_new_episode(reminder, Utc::now()) {
            self.monitor.rearm(id);
        }
        self.persist();
        true
    }

    /// Dismiss the alert for `id`. Returns false if it was not alerting.
    pub fn dismiss(&mut self, id: u64) -> bool {
        self.monitor.dismiss(id)
    }

    /// Run one reminder check against the current list.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<u64> {
        let tasks = self.store.tasks();
        self.monitor.tick(&tasks, now)
    }

    pub fn is_alerting(&self, id: u64) -> bool {
        self.monitor.is_alerting(id)
    }

    /// Alerting tasks in list order.
    pub fn alerting_tasks(&self) -> Vec<Task> {
        self.store
            .tasks()
            .iter()
            .filter(|t| self.monitor.is_alerting(t.id))
            .cloned()
            .collect()
    }

    pub fn monitor(&self) -> &ReminderMonitor<N> {
        &self.monitor
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        self.monitor.notifier_mut()
    }

    pub fn sync(&self) -> &PersistenceSync<S> {
        &self.sync
    }

    fn persist(&self) {
        self.sync.save(&self.store.tasks());
    }
}

/// A reminder that is cleared or still ahead ends the current episode.
fn starts_new_episode(reminder: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    reminder.map_or(true, |at| at > now)
}
