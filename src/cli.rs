use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;
use crate::notify::Permission;

/// Task list with reminders.
/// Tasks are stored as JSON under the data directory (see --data-dir).
#[derive(Parser, Debug)]
#[command(name = "tasklet", version, about = "Task list with reminder notifications")]
pub struct Cli {
    /// Directory holding the saved task list.
    #[arg(long, global = true, env = "TASKLET_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path to config file (default: `~/.config/tasklet/config.toml`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Notification permission to start from: granted | denied | default.
    #[arg(long, global = true, value_enum, env = "TASKLET_NOTIFICATIONS")]
    pub notifications: Option<Permission>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info", env = "TASKLET_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/tasklet.log`).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
