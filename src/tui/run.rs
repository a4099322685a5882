//! TUI entry point and terminal setup.

use std::io::{self, Stdout};

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};
use tracing::info;

use crate::cmd::open_session;
use crate::config::Config;
use crate::notify::Inbox;
use crate::schedule::Ticker;
use crate::tui::app::App;

/// Initialise and run the terminal user interface.
///
/// The reminder ticker starts before the first frame and is shut down once
/// the UI has exited and the terminal is restored.
pub async fn run_tui(config: &Config) -> io::Result<()> {
    let mut session = open_session(config, Inbox::new(config.permission));
    let permission = session.start_reminders();
    info!(?permission, "starting ui");

    let mut app = App::new(session, config.timestamp_format.clone());
    let (ticker, mut ticks) = Ticker::spawn(config.check_interval);

    let result = match setup_terminal() {
        // The event loop blocks on terminal input for the whole UI lifetime.
        Ok(mut terminal) => {
            let result = tokio::task::block_in_place(|| {
                app.run(&mut terminal, &mut ticks, config.poll_timeout)
            });
            restore_terminal(&mut terminal).and(result)
        }
        Err(e) => Err(e),
    };

    ticker.shutdown().await;
    info!("ui exited");
    result
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    undo_on_error(
        || {
            execute!(io::stdout(), EnterAlternateScreen)?;
            Terminal::new(CrosstermBackend::new(io::stdout()))
        },
        || {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            let _ = disable_raw_mode();
        },
    )
}

/// Run `step`; if it fails, run `undo` before returning the error.
fn undo_on_error<T>(step: impl FnOnce() -> io::Result<T>, undo: impl FnOnce()) -> io::Result<T> {
    let result = step();
    if result.is_err() {
        undo();
    }
    result
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}
