//! Background session cleanup task.
//!
//! Periodically sweeps expired sessions out of a [`SessionCache`]. The
//! scheduler is either stopped or running; starting sweeps once right away
//! and then once per period until stopped.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::SessionCache;
use crate::config::CacheConfig;

/// Smallest period the scheduler will tick at.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to the running sweep task.
#[derive(Debug)]
struct Running {
    cancel: CancellationToken,
    // Never joined; cancellation goes through `cancel`.
    #[allow(dead_code)]
    task: JoinHandle<()>,
}

/// Owns the background task that sweeps a [`SessionCache`].
///
/// `start` and `stop` are synchronous and never wait on the task. Dropping
/// the scheduler stops it.
#[derive(Debug)]
pub struct CleanupScheduler {
    cache: SessionCache,
    period: Duration,
    state: Mutex<Option<Running>>,
}

impl CleanupScheduler {
    /// Create a stopped scheduler for `cache`, ticking at `config.cleanup_period`.
    pub fn new(cache: SessionCache, config: &CacheConfig) -> Self {
        Self {
            cache,
            period: config.cleanup_period.max(MIN_PERIOD),
            state: Mutex::new(None),
        }
    }

    /// The period between sweeps.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether the background task is running.
    pub fn is_running(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Start sweeping in the background.
    ///
    /// Runs one sweep immediately, then one per period. Returns `false`
    /// without touching the existing task if already running, or if called
    /// outside a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut state = self.state.lock();
        if state.is_some() {
            debug!("Cleanup scheduler already running, ignoring start");
            return false;
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "No Tokio runtime, session cleanup not started");
                return false;
            }
        };

        let cancel = CancellationToken::new();
        let task = handle.spawn(run(self.cache.clone(), self.period, cancel.clone()));
        *state = Some(Running { cancel, task });

        info!(period_secs = self.period.as_secs_f64(), "Started session cleanup");
        true
    }

    /// Signal the background task to stop. Returns `false` if it was not running.
    ///
    /// Does not wait for the task; a sweep already in progress finishes first.
    pub fn stop(&self) -> bool {
        match self.state.lock().take() {
            Some(running) => {
                running.cancel.cancel();
                info!("Stopped session cleanup");
                true
            }
            None => {
                debug!("Cleanup scheduler was not running");
                false
            }
        }
    }
}

impl Drop for CleanupScheduler {
    fn drop(&mut self) {
        if let Some(running) = self.state.get_mut().take() {
            running.cancel.cancel();
        }
    }
}

async fn run(cache: SessionCache, period: Duration, cancel: CancellationToken) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // The first tick completes immediately
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let removed = cache.sweep().await;
        if removed > 0 {
            info!(removed, "Session cleanup completed");
        } else {
            debug!("Session cleanup: no expired sessions");
        }
        let active_sessions = cache.count().await;
        debug!(active_sessions, "Session cache status");
    }

    debug!("Session cleanup task exiting");
}
