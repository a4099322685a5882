//! Task data structure and related functionality.
//!
//! This module defines the `Task` record, the only entity the application
//! stores. It serializes to the persisted payload shape:
//! `{ "id": 1, "text": "...", "completed": false, "reminder": "<RFC 3339>" }`
//! where `reminder` is omitted when unset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single to-do entry with an optional reminder time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<DateTime<Utc>>,
}

impl Task {
    /// Create an open task. Callers are expected to have validated `text`.
    pub fn new(id: u64, text: impl Into<String>, reminder: Option<DateTime<Utc>>) -> Self {
        Task {
            id,
            text: text.into(),
            completed: false,
            reminder,
        }
    }

    /// True when the reminder has elapsed and the task is still open.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.reminder.is_some_and(|at| at <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn reminder_is_omitted_when_absent() {
        let task = Task::new(7, "Buy milk", None);
        let json = serde_json::to_string(&task).unwrap();
        assert_eq!(json, r#"{"id":7,"text":"Buy milk","completed":false}"#);
    }

    #[test]
    fn reminder_serializes_as_iso_8601() {
        let at = DateTime::parse_from_rfc3339("2026-03-01T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let task = Task::new(1, "Call Sam", Some(at));
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["reminder"], "2026-03-01T09:30:00Z");
    }

    #[test]
    fn accepts_payload_with_offset_and_missing_fields() {
        let task: Task =
            serde_json::from_str(r#"{"id":3,"text":"Stretch","reminder":"2026-03-01T10:30:00+01:00"}"#)
                .unwrap();
        assert!(!task.completed);
        assert_eq!(task.reminder.unwrap().to_rfc3339(), "2026-03-01T09:30:00+00:00");
    }

    #[test]
    fn due_only_when_open_and_elapsed() {
        let now = Utc::now();
        let mut task = Task::new(1, "Water plants", Some(now - Duration::minutes(5)));
        assert!(task.is_due(now));

        task.completed = true;
        assert!(!task.is_due(now));

        task.completed = false;
        task.reminder = Some(now + Duration::minutes(5));
        assert!(!task.is_due(now));

        task.reminder = None;
        assert!(!task.is_due(now));
    }

    #[test]
    fn reminder_exactly_now_is_due() {
        let now = Utc::now();
        let task = Task::new(1, "Stand up", Some(now));
        assert!(task.is_due(now));
    }
}
