//! Command implementations for the CLI interface.
//!
//! This module contains the command handlers behind each subcommand: the
//! one-shot list edits, the headless reminder watcher and the TUI launcher.

use std::fs;
use std::path::PathBuf;

use chrono::{Local, Utc};
use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use tracing::{info, warn};

use crate::cli::Cli;
use crate::config::Config;
use crate::kv::FileStore;
use crate::notify::{Muted, Notifier, Permission, TerminalNotifier};
use crate::reminder::{due_ids, ReminderMonitor};
use crate::schedule::Ticker;
use crate::session::Session;
use crate::sync::PersistenceSync;
use crate::task::Task;
use crate::when::{format_reminder_relative, parse_reminder_input, truncate};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive UI with live reminders.
    Ui,

    /// Watch reminders in the foreground and notify when they fall due.
    Watch,

    /// Add a new task.
    Add {
        /// Task text. Multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Reminder time: "in 10m", "tomorrow 09:00", "2026-05-04 18:30", ...
        #[arg(long, short)]
        remind: Option<String>,
    },

    /// List tasks, most recent first.
    List {
        /// Hide completed tasks.
        #[arg(long)]
        pending: bool,
        /// Only show tasks whose reminder has fallen due.
        #[arg(long)]
        due: bool,
    },

    /// Toggle a task between open and completed.
    Done {
        /// Task ID.
        id: u64,
    },

    /// Delete a task.
    #[command(alias = "delete")]
    Rm {
        /// Task ID.
        id: u64,
    },

    /// Set or clear a task's reminder.
    Remind {
        /// Task ID.
        id: u64,
        /// Reminder time, or "none" to clear.
        when: String,
    },

    /// Export the saved task list as JSON.
    Export {
        /// Output file (stdout if omitted).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Open a session over the configured data directory.
pub fn open_session<N: Notifier>(config: &Config, notifier: N) -> Session<FileStore, N> {
    let kv = match FileStore::open(&config.data_dir) {
        Ok(kv) => kv,
        Err(e) => {
            eprintln!("Failed to open data directory {}: {e}", config.data_dir.display());
            std::process::exit(1);
        }
    };
    let sync = PersistenceSync::new(kv, config.storage_key.clone());
    let monitor = ReminderMonitor::new(notifier).with_title(config.notification_title.clone());
    Session::open(sync, monitor)
}

fn require_task<N: Notifier>(session: &Session<FileStore, N>, id: u64) {
    if session.get(id).is_none() {
        eprintln!("Task {id} not found.");
        std::process::exit(1);
    }
}

/// Add a task with an optional reminder.
pub fn cmd_add(config: &Config, text: Vec<String>, remind: Option<String>) {
    let reminder = match remind.as_deref().map(|s| parse_reminder_input(s, Local::now())) {
        Some(Ok(at)) => at,
        Some(Err(e)) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
        None => None,
    };

    let mut session = open_session(config, Muted);
    let text = text.join(" ");
    match session.add(&text, reminder) {
        Some(id) => println!("Added task {id}"),
        None if text.trim().is_empty() => println!("Nothing to add: task text is blank."),
        None => {
            eprintln!("Could not add task: no task ids left.");
            std::process::exit(1);
        }
    }
}

/// List tasks with optional filters.
pub fn cmd_list(config: &Config, pending: bool, due: bool) {
    let session = open_session(config, Muted);
    let tasks = session.tasks();
    let now = Utc::now();
    let due_now = due_ids(&tasks, now);

    let shown: Vec<&Task> = tasks
        .iter()
        .filter(|t| !pending || !t.completed)
        .filter(|t| !due || due_now.contains(&t.id))
        .collect();

    if shown.is_empty() {
        if tasks.is_empty() {
            println!("No tasks yet. Add one with `tasklet add <text>`.");
        } else {
            println!("No matching tasks.");
        }
        return;
    }
    print_table(&shown, |t| due_now.contains(&t.id));
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task], alerting: impl Fn(&Task) -> bool) {
    println!("{:<14} {:<4} {:<10} {:<1} {}", "ID", "Done", "Reminder", "!", "Text");
    let now = Utc::now();
    for t in tasks {
        println!(
            "{:<14} {:<4} {:<10} {:<1} {}",
            t.id,
            if t.completed { "[x]" } else { "[ ]" },
            format_reminder_relative(t.reminder, now),
            if alerting(*t) { "!" } else { "" },
            truncate(&t.text, 60)
        );
    }
}

/// Toggle completion on a task.
pub fn cmd_done(config: &Config, id: u64) {
    let mut session = open_session(config, Muted);
    require_task(&session, id);
    session.toggle_complete(id);
    match session.get(id) {
        Some(t) if t.completed => println!("Marked {id} done."),
        _ => println!("Reopened {id}."),
    }
}

/// Delete a task.
pub fn cmd_rm(config: &Config, id: u64) {
    let mut session = open_session(config, Muted);
    require_task(&session, id);
    session.delete(id);
    println!("Deleted {id}.");
}

/// Set or clear a task's reminder.
pub fn cmd_remind(config: &Config, id: u64, when: String) {
    let reminder = match parse_reminder_input(&when, Local::now()) {
        Ok(at) => at,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    let mut session = open_session(config, Muted);
    require_task(&session, id);
    session.set_reminder(id, reminder);
    match reminder {
        Some(at) => println!(
            "Reminder for {id} set {} ({}).",
            format_reminder_relative(Some(at), Utc::now()),
            at.with_timezone(&Local).format(&config.timestamp_format)
        ),
        None => println!("Reminder for {id} cleared."),
    }
}

/// Write the saved list as pretty JSON.
pub fn cmd_export(config: &Config, output: Option<PathBuf>) {
    let session = open_session(config, Muted);
    let tasks = session.tasks();
    let data = match serde_json::to_string_pretty(&*tasks) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Failed to serialize tasks: {e}");
            std::process::exit(1);
        }
    };
    match output {
        Some(path) => {
            if let Err(e) = fs::write(&path, data) {
                eprintln!("Failed to write {}: {e}", path.display());
                std::process::exit(1);
            }
            println!("Exported {} task(s) to {}", tasks.len(), path.display());
        }
        None => println!("{data}"),
    }
}

/// Print shell completions to stdout.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut std::io::stdout());
}

/// Run the reminder monitor in the foreground until Ctrl-C.
///
/// The saved list is re-read before every check so edits made with the other
/// subcommands are picked up.
pub async fn cmd_watch(config: &Config) {
    let mut session = open_session(config, TerminalNotifier::new(config.permission));
    let permission = session.start_reminders();
    if permission != Permission::Granted {
        println!("Notifications are not permitted; due reminders will only be logged.");
    }

    let (ticker, mut ticks) = Ticker::spawn(config.check_interval);
    println!(
        "Watching {} task(s), checking every {}s. Press Ctrl-C to stop.",
        session.tasks().len(),
        config.check_interval.as_secs()
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            tick = ticks.recv() => {
                if tick.is_none() {
                    warn!("ticker ended unexpectedly");
                    break;
                }
                session.reload();
                let shown = session.tick(Utc::now());
                if !shown.is_empty() {
                    info!(count = shown.len(), "reminders announced");
                }
            }
            _ = &mut ctrl_c => {
                break;
            }
        }
    }

    ticker.shutdown().await;
    println!("Stopped watching.");
}

/// Launch the TUI.
pub async fn cmd_ui(config: &Config) {
    if let Err(e) = crate::tui::run::run_tui(config).await {
        eprintln!("UI error: {e}");
        std::process::exit(1);
    }
}
