//! Persistence across sessions and payload round trips.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use tasklet::kv::{FileStore, KeyValueStore, MemoryStore};
use tasklet::notify::Muted;
use tasklet::reminder::ReminderMonitor;
use tasklet::session::Session;
use tasklet::sync::{decode, encode, PersistenceSync, STORAGE_KEY};
use tasklet::task::Task;

fn open(dir: &std::path::Path) -> Session<FileStore, Muted> {
    let kv = FileStore::open(dir).unwrap();
    Session::open(PersistenceSync::new(kv, STORAGE_KEY), ReminderMonitor::new(Muted))
}

#[test]
fn tasks_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let at = Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap();

    let (first, second) = {
        let mut s = open(dir.path());
        let first = s.add("Buy milk", None).unwrap();
        let second = s.add("Call mum", Some(at)).unwrap();
        s.toggle_complete(first);
        (first, second)
    };

    let s = open(dir.path());
    let tasks = s.tasks();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id, second);
    assert_eq!(tasks[0].reminder, Some(at));
    assert_eq!(tasks[1].id, first);
    assert!(tasks[1].completed);
}

#[test]
fn corrupt_file_starts_fresh_without_crashing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("todos.json"), "[{\"id\": oops").unwrap();

    let mut s = open(dir.path());
    assert!(s.tasks().is_empty());
    assert!(s.add("Fresh start", None).is_some());
}

#[test]
fn new_ids_never_reuse_loaded_ones() {
    let dir = tempfile::tempdir().unwrap();
    let existing = vec![Task::new(u64::MAX / 4, "From the future", None)];
    FileStore::open(dir.path())
        .unwrap()
        .set(STORAGE_KEY, &encode(&existing).unwrap())
        .unwrap();

    let mut s = open(dir.path());
    let id = s.add("Next", None).unwrap();
    assert!(id > u64::MAX / 4);
}

#[test]
fn reload_sees_other_writers() {
    let dir = tempfile::tempdir().unwrap();
    let mut watcher = open(dir.path());
    let mut editor = open(dir.path());

    editor.add("Added elsewhere", None);
    assert!(watcher.tasks().is_empty());
    watcher.reload();
    assert_eq!(watcher.tasks()[0].text, "Added elsewhere");
}

#[test]
fn memory_store_session_writes_json_array() {
    let s = Session::open(
        PersistenceSync::new(MemoryStore::new(), STORAGE_KEY),
        ReminderMonitor::new(Muted),
    );
    let raw = s.sync().backend().get(STORAGE_KEY).unwrap().unwrap();
    assert_eq!(raw, "[]");
}

fn arb_reminder() -> impl Strategy<Value = Option<DateTime<Utc>>> {
    // Whole milliseconds between 2000 and 2100; the payload keeps sub-second precision.
    prop::option::of((946_684_800_000i64..4_102_444_800_000i64).prop_map(|ms| {
        Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
    }))
}

fn arb_task() -> impl Strategy<Value = Task> {
    (any::<u64>(), "\\PC{1,64}", any::<bool>(), arb_reminder()).prop_map(
        |(id, text, completed, reminder)| Task {
            id,
            text,
            completed,
            reminder,
        },
    )
}

proptest! {
    #[test]
    fn payload_round_trips(tasks in prop::collection::vec(arb_task(), 0..16)) {
        let payload = encode(&tasks).unwrap();
        prop_assert_eq!(decode(&payload).unwrap(), tasks);
    }
}
