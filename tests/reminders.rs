//! End-to-end reminder behaviour through a `Session`.
//!
//! Uses an in-memory store and a notifier that records every call so the
//! number of notifications per alerting episode can be asserted exactly.

use chrono::{Duration, Utc};

use tasklet::kv::MemoryStore;
use tasklet::notify::{Notification, Notifier, Permission};
use tasklet::reminder::ReminderMonitor;
use tasklet::session::Session;
use tasklet::sync::{PersistenceSync, STORAGE_KEY};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Recorder {
    permission: Permission,
    requests: usize,
    grant_on_request: bool,
    shown: Vec<Notification>,
}

impl Notifier for Recorder {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self) -> Permission {
        self.requests += 1;
        self.permission = if self.grant_on_request {
            Permission::Granted
        } else {
            Permission::Denied
        };
        self.permission
    }

    fn show(&mut self, notification: &Notification) {
        self.shown.push(notification.clone());
    }
}

fn session_with(recorder: Recorder) -> Session<MemoryStore, Recorder> {
    let mut session = Session::open(
        PersistenceSync::new(MemoryStore::new(), STORAGE_KEY),
        ReminderMonitor::new(recorder),
    );
    session.start_reminders();
    session
}

fn granted() -> Session<MemoryStore, Recorder> {
    session_with(Recorder {
        permission: Permission::Granted,
        ..Default::default()
    })
}

fn shown(session: &Session<MemoryStore, Recorder>) -> &[Notification] {
    &session.monitor().notifier().shown
}

// ---------------------------------------------------------------------------
// Alerting set
// ---------------------------------------------------------------------------

#[test]
fn past_reminder_alerts_until_completed() {
    let now = Utc::now();
    let mut s = granted();
    let id = s.add("Take out bins", Some(now - Duration::minutes(5))).unwrap();

    s.tick(now);
    assert!(s.is_alerting(id));

    s.toggle_complete(id);
    assert!(!s.is_alerting(id));
}

#[test]
fn deleting_removes_only_that_task_and_its_alert() {
    let now = Utc::now();
    let mut s = granted();
    let keep = s.add("Keep me", Some(now - Duration::minutes(1))).unwrap();
    let gone = s.add("Delete me", Some(now - Duration::minutes(1))).unwrap();
    s.tick(now);

    s.delete(gone);
    assert!(s.is_alerting(keep));
    assert!(!s.is_alerting(gone));
    assert_eq!(s.tasks().len(), 1);
    assert_eq!(s.tasks()[0].id, keep);
}

// ---------------------------------------------------------------------------
// Notification counting
// ---------------------------------------------------------------------------

#[test]
fn one_notification_per_episode_across_ticks() {
    let now = Utc::now();
    let mut s = granted();
    let id = s.add("Stretch", Some(now - Duration::minutes(5))).unwrap();

    for minute in 0..5 {
        s.tick(now + Duration::minutes(minute));
    }
    assert_eq!(shown(&s).len(), 1);
    assert_eq!(shown(&s)[0].body, "Stretch");
    assert_eq!(shown(&s)[0].tag, format!("task-{id}"));
}

#[test]
fn new_episode_after_dismiss_notifies_once_more() {
    let now = Utc::now();
    let mut s = granted();
    let id = s.add("Stretch", Some(now - Duration::minutes(5))).unwrap();
    s.tick(now);
    assert!(s.dismiss(id));

    s.set_reminder(id, Some(now + Duration::minutes(10)));
    s.tick(now);
    assert_eq!(shown(&s).len(), 1);

    let later = now + Duration::minutes(11);
    s.tick(later);
    s.tick(later + Duration::minutes(1));
    assert_eq!(shown(&s).len(), 2);
}

#[test]
fn new_episode_after_completion_notifies_once_more() {
    let now = Utc::now();
    let mut s = granted();
    let id = s.add("Stretch", Some(now - Duration::minutes(5))).unwrap();
    s.tick(now);

    s.toggle_complete(id);
    s.tick(now);
    s.toggle_complete(id);
    s.set_reminder(id, Some(now + Duration::minutes(1)));
    s.tick(now);
    s.tick(now + Duration::minutes(2));
    s.tick(now + Duration::minutes(3));

    assert_eq!(shown(&s).len(), 2);
}

#[test]
fn reopening_an_overdue_task_alerts_again() {
    let now = Utc::now();
    let mut s = granted();
    let id = s.add("Stretch", Some(now - Duration::minutes(5))).unwrap();
    s.tick(now);
    s.toggle_complete(id);
    s.toggle_complete(id);
    s.tick(now);
    assert_eq!(shown(&s).len(), 2);
}

#[test]
fn rescheduling_into_the_past_does_not_renotify() {
    let now = Utc::now();
    let mut s = granted();
    let id = s.add("Stretch", Some(now - Duration::minutes(5))).unwrap();
    s.tick(now);

    s.set_reminder(id, Some(now - Duration::minutes(10)));
    s.tick(now + Duration::minutes(1));
    s.set_reminder(id, Some(now - Duration::minutes(1)));
    s.tick(now + Duration::minutes(2));

    assert_eq!(shown(&s).len(), 1);
    assert!(s.is_alerting(id));
}

#[test]
fn dismissed_task_is_not_renotified_while_still_due() {
    let now = Utc::now();
    let mut s = granted();
    let id = s.add("Stretch", Some(now - Duration::minutes(5))).unwrap();
    s.tick(now);
    s.dismiss(id);

    for minute in 1..4 {
        s.tick(now + Duration::minutes(minute));
    }
    assert_eq!(shown(&s).len(), 1);
    assert!(!s.is_alerting(id));
}

// ---------------------------------------------------------------------------
// Permission
// ---------------------------------------------------------------------------

#[test]
fn undecided_permission_is_requested_once() {
    let now = Utc::now();
    let mut s = session_with(Recorder {
        grant_on_request: true,
        ..Default::default()
    });
    s.start_reminders();
    s.add("Stretch", Some(now - Duration::minutes(5)));
    s.tick(now);
    s.tick(now);

    assert_eq!(s.monitor().notifier().requests, 1);
    assert_eq!(shown(&s).len(), 1);
}

#[test]
fn denied_permission_suppresses_notifications_without_retry() {
    let now = Utc::now();
    let mut s = session_with(Recorder::default());
    let id = s.add("Stretch", Some(now - Duration::minutes(5))).unwrap();
    s.start_reminders();
    s.tick(now);
    s.tick(now);

    assert_eq!(s.monitor().notifier().requests, 1);
    assert!(shown(&s).is_empty());
    assert!(s.is_alerting(id));
}

#[test]
fn already_denied_is_never_requested() {
    let mut s = session_with(Recorder {
        permission: Permission::Denied,
        grant_on_request: true,
        ..Default::default()
    });
    s.start_reminders();
    assert_eq!(s.monitor().notifier().requests, 0);
}
