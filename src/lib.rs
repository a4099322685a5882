//! # Tasklet
//!
//! A terminal task list with reminders.
//!
//! ## Key Features
//!
//! - **Quick capture**: add a task with one command, newest first
//! - **Reminders**: attach a time to any task and get notified once when it falls due
//! - **Two interfaces**: scriptable CLI plus an interactive TUI with a live reminder panel
//! - **Local storage**: the whole list lives in one JSON file, rewritten on every change
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a task, with and without a reminder
//! tasklet add Buy milk
//! tasklet add Call the dentist --remind "tomorrow 09:00"
//!
//! # List tasks
//! tasklet list
//!
//! # Launch the TUI, or watch reminders headless
//! tasklet ui
//! tasklet watch
//! ```
//!
//! Data is stored in `~/.local/share/tasklet/todos.json` unless `--data-dir`
//! or the config file says otherwise.

pub mod cli;
pub mod cmd;
pub mod config;
pub mod kv;
pub mod notify;
pub mod reminder;
pub mod schedule;
pub mod session;
pub mod store;
pub mod sync;
pub mod task;
pub mod when;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
}
