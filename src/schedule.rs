//! Recurring tick source.
//!
//! [`Ticker::spawn`] starts a background task that emits one tick per period
//! on a channel until its [`TickerHandle`] is shut down. The consumer runs the
//! actual work on its own loop, so a tick never overlaps the previous one and
//! state stays owned by a single thread.
//!
//! ```rust,ignore
//! let (handle, mut ticks) = Ticker::spawn(Duration::from_secs(60));
//! while let Some(at) = ticks.recv().await { /* check reminders */ }
//! handle.shutdown().await;
//! ```

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Interval between reminder checks.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(60);

/// Ticks are consumed promptly, so a small buffer is enough.
const TICK_BUFFER: usize = 4;

/// Spawns recurring ticks.
pub struct Ticker {
    period: Duration,
    tx: mpsc::Sender<Instant>,
    cancel: CancellationToken,
}

/// Cancellation handle for a running [`Ticker`].
///
/// Dropping the handle cancels the ticker as well.
#[derive(Debug)]
pub struct TickerHandle {
    cancel: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Start ticking every `period`, first tick immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(period: Duration) -> (TickerHandle, mpsc::Receiver<Instant>) {
        let (tx, rx) = mpsc::channel(TICK_BUFFER);
        let cancel = CancellationToken::new();
        let ticker = Ticker {
            period,
            tx,
            cancel: cancel.clone(),
        };
        let join = tokio::spawn(ticker.run());
        (
            TickerHandle {
                cancel,
                join: Some(join),
            },
            rx,
        )
    }

    async fn run(self) {
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = self.period.as_secs(), "ticker started");

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("ticker stopped");
                    break;
                }
                at = interval.tick() => {
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => {
                            info!("ticker stopped");
                            break;
                        }
                        sent = self.tx.send(at) => {
                            if sent.is_err() {
                                debug!("tick receiver gone, stopping ticker");
                                break;
                            }
                        }
                    }
                }
            }
        }
    }
}

impl TickerHandle {
    /// Stop the ticker and wait for its task to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
