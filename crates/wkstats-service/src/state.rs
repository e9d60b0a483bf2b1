//! Application state shared across handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock, watch};

use wkstats_client::WaniKaniClient;
use wkstats_store::HistoryStore;

use crate::config::Config;

/// Shared application state.
///
/// The store is behind a `Mutex`, so HTTP-triggered and scheduled
/// updates in the same process are serialized; the store's document
/// version check covers writers in other processes.
pub struct AppState {
    /// The history store (wrapped in Mutex for thread-safe access).
    pub store: Mutex<HistoryStore>,
    /// WaniKani API client.
    pub client: WaniKaniClient,
    /// Configuration (RwLock for runtime reads).
    pub config: RwLock<Config>,
    /// Scheduler control state.
    pub scheduler: SchedulerState,
}

impl AppState {
    /// Create new application state.
    pub fn new(store: HistoryStore, client: WaniKaniClient, config: Config) -> Arc<Self> {
        Arc::new(Self {
            store: Mutex::new(store),
            client,
            config: RwLock::new(config),
            scheduler: SchedulerState::new(),
        })
    }
}

/// State for tracking and controlling the scheduler.
pub struct SchedulerState {
    /// Whether the scheduler loop is currently running.
    running: AtomicBool,
    /// When the scheduler was started (Unix timestamp).
    started_at: AtomicU64,
    /// Channel to signal the scheduler task to stop.
    stop_tx: watch::Sender<bool>,
    /// Receiver for stop signal (cloned by the scheduler task).
    stop_rx: watch::Receiver<bool>,
    /// Outcome stats for update runs (scheduled and manual).
    pub stats: RwLock<RunStats>,
}

impl SchedulerState {
    /// Create a new scheduler state.
    pub fn new() -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        Self {
            running: AtomicBool::new(false),
            started_at: AtomicU64::new(0),
            stop_tx,
            stop_rx,
            stats: RwLock::new(RunStats::default()),
        }
    }

    /// Check if the scheduler is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Mark the scheduler as started or stopped.
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
        if running {
            let now = OffsetDateTime::now_utc().unix_timestamp() as u64;
            self.started_at.store(now, Ordering::SeqCst);
        }
    }

    /// Get the scheduler start time.
    pub fn started_at(&self) -> Option<OffsetDateTime> {
        let ts = self.started_at.load(Ordering::SeqCst);
        if ts == 0 {
            None
        } else {
            OffsetDateTime::from_unix_timestamp(ts as i64).ok()
        }
    }

    /// Get a receiver for the stop signal.
    pub fn subscribe_stop(&self) -> watch::Receiver<bool> {
        self.stop_rx.clone()
    }

    /// Signal the scheduler task to stop.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(true);
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome statistics for update runs.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RunStats {
    /// Time of the last successful update.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_run_at: Option<OffsetDateTime>,
    /// Time of the last failed update.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_error_at: Option<OffsetDateTime>,
    /// Last error message.
    pub last_error: Option<String>,
    /// Total successful updates.
    pub success_count: u64,
    /// Total failed updates.
    pub failure_count: u64,
}

impl RunStats {
    /// Record a successful update.
    pub fn record_success(&mut self) {
        self.last_run_at = Some(OffsetDateTime::now_utc());
        self.success_count += 1;
    }

    /// Record a failed update.
    pub fn record_failure(&mut self, error: &str) {
        self.last_error_at = Some(OffsetDateTime::now_utc());
        self.last_error = Some(error.to_string());
        self.failure_count += 1;
    }
}
