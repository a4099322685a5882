//! Reminder monitoring.
//!
//! Each task is either quiet or alerting. A tick recomputes the alerting set
//! from scratch out of the current list and clock, then notifies every
//! alerting task that has not been notified yet. The notified record is only
//! cleared by the task operations (complete, delete, reminder moved out of the
//! past) and by an explicit dismiss, so a task that stays due is announced once.
//!
//! Dismissal silences a task until its reminder is cleared or moved into the
//! future, or a tick sees it as not due any more.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::notify::{reminder_tag, Notification, Notifier, Permission};
use crate::task::Task;

/// Default title for reminder notifications.
pub const DEFAULT_TITLE: &str = "Reminder";

/// Ids of every open task whose reminder has elapsed at `now`.
pub fn due_ids(tasks: &[Task], now: DateTime<Utc>) -> BTreeSet<u64> {
    tasks.iter().filter(|t| t.is_due(now)).map(|t| t.id).collect()
}

/// Tracks alerting tasks and drives a notifier.
#[derive(Debug)]
pub struct ReminderMonitor<N> {
    notifier: N,
    title: String,
    alerting: BTreeSet<u64>,
    notified: HashSet<u64>,
    dismissed: BTreeSet<u64>,
    started: bool,
}

impl<N: Notifier> ReminderMonitor<N> {
    pub fn new(notifier: N) -> Self {
        ReminderMonitor {
            notifier,
            title: DEFAULT_TITLE.to_string(),
            alerting: BTreeSet::new(),
            notified: HashSet::new(),
            dismissed: BTreeSet::new(),
            started: false,
        }
    }

    /// Use a custom notification title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Ask for notification permission if it has never been decided.
    ///
    /// Only the first call does anything; a denied permission is never
    /// requested again.
    pub fn start(&mut self) -> Permission {
        if !self.started {
            self.started = true;
            if self.notifier.permission() == Permission::Default {
                let granted = self.notifier.request_permission();
                info!(permission = ?granted, "requested notification permission");
            }
        }
        self.notifier.permission()
    }

    /// Recompute the alerting set and notify newly alerting tasks.
    ///
    /// Returns the ids a notification was shown for during this tick.
    pub fn tick(&mut self, tasks: &[Task], now: DateTime<Utc>) -> Vec<u64> {
        let due = due_ids(tasks, now);
        self.dismissed.retain(|id| due.contains(id));
        self.alerting = due.difference(&self.dismissed).copied().collect();

        if self.notifier.permission() != Permission::Granted {
            debug!(alerting = self.alerting.len(), "notifications not permitted");
            return Vec::new();
        }

        let mut shown = Vec::new();
        for task in tasks.iter().filter(|t| self.alerting.contains(&t.id)) {
            if self.notified.insert(task.id) {
                self.notifier
                    .show(&Notification::for_task(&self.title, task.id, &task.text));
                info!(id = task.id, "reminder notification shown");
                shown.push(task.id);
            }
        }
        shown
    }

    /// Alerting ids as of the last tick, minus anything cleared since.
    pub fn alerting(&self) -> &BTreeSet<u64> {
        &self.alerting
    }

    pub fn is_alerting(&self, id: u64) -> bool {
        self.alerting.contains(&id)
    }

    pub fn was_notified(&self, id: u64) -> bool {
        self.notified.contains(&id)
    }

    /// Drop all bookkeeping for a completed or deleted task.
    pub fn forget(&mut self, id: u64) {
        self.alerting.remove(&id);
        self.notified.remove(&id);
        self.dismissed.remove(&id);
        self.notifier.close(&reminder_tag(id));
    }

    /// Silence an alerting task. Returns false if it was not alerting.
    pub fn dismiss(&mut self, id: u64) -> bool {
        if !self.alerting.remove(&id) {
            return false;
        }
        self.notified.remove(&id);
        self.dismissed.insert(id);
        self.notifier.close(&reminder_tag(id));
        debug!(id, "alert dismissed");
        true
    }

    /// Allow a task whose reminder moved to be announced again.
    ///
    /// The alerting set itself is left for the next tick to recompute.
    pub fn rearm(&mut self, id: u64) {
        self.notified.remove(&id);
        self.dismissed.remove(&id);
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }
}
