use std::path::Path;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use tasklet::cli::Cli;
use tasklet::cmd::*;
use tasklet::config::Config;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    // Logs go to a file, never stdout, since the TUI owns the terminal.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());
    tracing::info!(data_dir = %config.data_dir.display(), "tasklet starting");

    match cli.command {
        Commands::Ui => cmd_ui(&config).await,
        Commands::Watch => cmd_watch(&config).await,
        Commands::Add { text, remind } => cmd_add(&config, text, remind),
        Commands::List { pending, due } => cmd_list(&config, pending, due),
        Commands::Done { id } => cmd_done(&config, id),
        Commands::Rm { id } => cmd_rm(&config, id),
        Commands::Remind { id, when } => cmd_remind(&config, id, when),
        Commands::Export { output } => cmd_export(&config, output),
        Commands::Completions { shell } => cmd_completions(shell),
    }
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown so buffered
/// entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("tasklet.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}
