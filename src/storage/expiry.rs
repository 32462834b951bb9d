//! Background Expiry Sweeper
//!
//! Lazy expiry (checking on read) never reclaims a session whose client
//! simply stops coming back. The sweeper is a Tokio task that calls
//! [`RecordStore::cleanup`] on a fixed interval so those records are
//! removed anyway.
//!
//! ## Design
//!
//! The sweeper:
//! 1. Waits for the configured interval (default: 1 hour)
//! 2. Runs one cleanup pass over the whole store
//! 3. Logs how many records were reclaimed
//!
//! The task is owned by an [`ExpirySweeper`] handle. Stopping or dropping
//! the handle ends the task, so stores created in tests or embedded in
//! short-lived contexts do not leak it.

use crate::storage::{RecordStore, MAX_TTL};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace};

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Shortest interval the sweeper will run at.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Longest interval the sweeper will run at.
pub const MAX_SWEEP_INTERVAL: Duration = MAX_TTL;

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryConfig {
    /// Interval between sweeps (default: 1 hour)
    pub interval: Duration,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// A handle to the running expiry sweeper.
///
/// When this handle is dropped, the sweeper task will be stopped.
#[derive(Debug)]
pub struct ExpirySweeper {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,

    /// The sweeper task
    task: Option<JoinHandle<()>>,
}

impl ExpirySweeper {
    /// Starts the expiry sweeper as a background task.
    ///
    /// Must be called from within a Tokio runtime. The first sweep runs one
    /// full interval after start.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use flashsession::id::RandomGenerator;
    /// use flashsession::storage::{ExpiryConfig, ExpirySweeper, MemoryStore};
    /// use std::sync::Arc;
    ///
    /// let store: Arc<MemoryStore<RandomGenerator, ()>> =
    ///     Arc::new(MemoryStore::new(RandomGenerator::new()));
    /// let sweeper = ExpirySweeper::start(store, ExpiryConfig::default());
    ///
    /// // Sweeper runs in the background...
    ///
    /// sweeper.shutdown().await;
    /// ```
    pub fn start<S>(store: Arc<S>, config: ExpiryConfig) -> Self
    where
        S: RecordStore + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(sweeper_loop(store, config.clone(), shutdown_rx));

        info!(
            interval_secs = config.interval.as_secs(),
            "Background expiry sweeper started"
        );

        Self {
            shutdown_tx,
            task: Some(task),
        }
    }

    /// Signals the sweeper to stop.
    ///
    /// This is called automatically when the handle is dropped. Calling it
    /// more than once is harmless.
    pub fn stop(&self) {
        if !*self.shutdown_tx.borrow() {
            let _ = self.shutdown_tx.send(true);
            info!("Background expiry sweeper stopped");
        }
    }

    /// Stops the sweeper and waits for its task to finish.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Returns true once the sweeper task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The main sweeper loop.
async fn sweeper_loop<S>(store: Arc<S>, config: ExpiryConfig, mut shutdown_rx: watch::Receiver<bool>)
where
    S: RecordStore + 'static,
{
    let period = config.interval.clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Skip the first immediate tick
    ticker.tick().await;

    loop {
        // Wait for the interval or shutdown signal
        tokio::select! {
            _ = ticker.tick() => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown signal");
                    return;
                }
                continue;
            }
        }

        let removed = store.cleanup();

        if removed > 0 {
            debug!(
                removed = removed,
                records_remaining = store.len(),
                "Sweep reclaimed expired records"
            );
        } else {
            trace!(records = store.len(), "Sweep found nothing to reclaim");
        }
    }
}

/// Starts the expiry sweeper with default configuration.
///
/// This is a convenience function for simple use cases.
pub fn start_expiry_sweeper<S>(store: Arc<S>) -> ExpirySweeper
where
    S: RecordStore + 'static,
{
    ExpirySweeper::start(store, ExpiryConfig::default())
}
