//! Notification delivery.
//!
//! A `Notifier` mirrors a desktop notification service: it has a permission
//! state, can be asked for permission once, and shows notifications carrying
//! a de-duplication tag. Showing a notification with a tag that is already
//! displayed replaces it instead of stacking a second copy.

use std::io::{self, IsTerminal, Write};

use serde::Deserialize;
use tracing::{debug, info};

/// Permission to display notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    Granted,
    Denied,
    /// Not yet asked.
    #[default]
    Default,
}

/// A notification to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Notifications sharing a tag coalesce into one.
    pub tag: String,
}

impl Notification {
    /// Reminder notification for a task.
    pub fn for_task(title: &str, id: u64, text: &str) -> Self {
        Notification {
            title: title.to_string(),
            body: text.to_string(),
            tag: reminder_tag(id),
        }
    }
}

/// De-duplication tag for a task's reminder.
pub fn reminder_tag(id: u64) -> String {
    format!("task-{id}")
}

/// A notification service.
pub trait Notifier {
    /// Current permission state.
    fn permission(&self) -> Permission;

    /// Ask for permission and return the resulting state.
    fn request_permission(&mut self) -> Permission;

    /// Display a notification. Callers check permission first.
    fn show(&mut self, notification: &Notification);

    /// Withdraw the notification carrying `tag`, if it is still displayed.
    fn close(&mut self, _tag: &str) {}
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn permission(&self) -> Permission {
        (**self).permission()
    }

    fn request_permission(&mut self) -> Permission {
        (**self).request_permission()
    }

    fn show(&mut self, notification: &Notification) {
        (**self).show(notification)
    }

    fn close(&mut self, tag: &str) {
        (**self).close(tag)
    }
}

/// Notifier that never shows anything. Used by one-shot commands.
#[derive(Debug, Default, Clone, Copy)]
pub struct Muted;

impl Notifier for Muted {
    fn permission(&self) -> Permission {
        Permission::Denied
    }

    fn request_permission(&mut self) -> Permission {
        Permission::Denied
    }

    fn show(&mut self, _notification: &Notification) {}
}

/// Rings the terminal bell and prints one line per notification to stderr.
#[derive(Debug)]
pub struct TerminalNotifier {
    permission: Permission,
    shown: Vec<String>,
}

impl TerminalNotifier {
    pub fn new(permission: Permission) -> Self {
        TerminalNotifier {
            permission,
            shown: Vec::new(),
        }
    }

    /// Tags printed so far, oldest first.
    pub fn shown_tags(&self) -> &[String] {
        &self.shown
    }
}

impl Notifier for TerminalNotifier {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self) -> Permission {
        if self.permission == Permission::Default {
            self.permission = if io::stderr().is_terminal() {
                Permission::Granted
            } else {
                Permission::Denied
            };
            info!(permission = ?self.permission, "notification permission resolved");
        }
        self.permission
    }

    fn show(&mut self, notification: &Notification) {
        if self.shown.iter().any(|t| *t == notification.tag) {
            debug!(tag = %notification.tag, "notification already shown, coalescing");
            return;
        }
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "\x07[{}] {}", notification.title, notification.body);
        self.shown.push(notification.tag.clone());
    }

    fn close(&mut self, tag: &str) {
        self.shown.retain(|t| t != tag);
    }
}

/// In-memory notification tray, drained by the interactive UI.
#[derive(Debug, Default)]
pub struct Inbox {
    permission: Permission,
    entries: Vec<Notification>,
}

impl Inbox {
    pub fn new(permission: Permission) -> Self {
        Inbox {
            permission,
            entries: Vec::new(),
        }
    }

    /// Notifications currently in the tray, newest last.
    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }

    /// Take every pending notification.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.entries)
    }
}

impl Notifier for Inbox {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self) -> Permission {
        if self.permission == Permission::Default {
            self.permission = Permission::Granted;
        }
        self.permission
    }

    fn show(&mut self, notification: &Notification) {
        match self.entries.iter_mut().find(|n| n.tag == notification.tag) {
            Some(existing) => *existing = notification.clone(),
            None => self.entries.push(notification.clone()),
        }
    }

    fn close(&mut self, tag: &str) {
        self.entries.retain(|n| n.tag != tag);
    }
}
