//! Daily update scheduler.

use std::sync::Arc;

use time::{OffsetDateTime, Time};
use tracing::{error, info, warn};

use wkstats_types::History;

use crate::state::AppState;

/// Background scheduler that runs one fetch+update per day at the
/// configured UTC time.
pub struct Scheduler {
    state: Arc<AppState>,
}

impl Scheduler {
    /// Create a new scheduler.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Start the scheduler loop.
    ///
    /// Returns immediately; the loop runs in the background until the
    /// stop signal fires. A failed run is logged and skipped, the loop
    /// simply waits for the next day.
    pub fn start(&self) {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            run_loop(state).await;
        });
    }
}

async fn run_loop(state: Arc<AppState>) {
    state.scheduler.set_running(true);
    let mut stop_rx = state.scheduler.subscribe_stop();

    loop {
        let fire_time = {
            let config = state.config.read().await;
            match config.schedule.fire_time() {
                Ok(t) => t,
                Err(e) => {
                    // Config was validated at startup; a bad value here
                    // means it was edited at runtime.
                    error!("Stopping scheduler: {}", e);
                    break;
                }
            }
        };

        let now = OffsetDateTime::now_utc();
        let fire_at = next_fire_time(now, fire_time);
        let delay = std::time::Duration::try_from(fire_at - now)
            .unwrap_or(std::time::Duration::from_secs(60));

        info!("Next scheduled update at {} UTC", fire_at);

        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                match update_once(&state).await {
                    Ok(history) => {
                        info!("Scheduled update complete ({} days recorded)", history.len());
                    }
                    Err(e) => {
                        warn!("Scheduled update failed, skipping this run: {}", e);
                    }
                }
            }
            _ = stop_rx.changed() => {
                if *stop_rx.borrow() {
                    info!("Scheduler stopping");
                    break;
                }
            }
        }
    }

    state.scheduler.set_running(false);
}

/// The next occurrence of `at` strictly after `now`.
fn next_fire_time(now: OffsetDateTime, at: Time) -> OffsetDateTime {
    let today = now.date().with_time(at).assume_utc();
    if today > now {
        today
    } else {
        now.date()
            .saturating_add(time::Duration::days(1))
            .with_time(at)
            .assume_utc()
    }
}

/// Errors from one fetch+update run.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("Failed to fetch snapshot: {0}")]
    Fetch(#[from] wkstats_client::Error),
    #[error("Failed to store snapshot: {0}")]
    Store(#[from] wkstats_store::Error),
}

/// Run one fetch+update cycle and record the outcome.
///
/// Shared by the scheduler and the manual update endpoint. The fetch
/// happens before the store lock is taken; a fetch failure leaves the
/// stored history untouched.
pub async fn update_once(state: &AppState) -> Result<History, UpdateError> {
    let result = fetch_and_store(state).await;

    let mut stats = state.scheduler.stats.write().await;
    match &result {
        Ok(_) => stats.record_success(),
        Err(e) => stats.record_failure(&e.to_string()),
    }

    result
}

async fn fetch_and_store(state: &AppState) -> Result<History, UpdateError> {
    let snapshot = state.client.fetch_snapshot().await?;
    info!(
        "Fetched snapshot for {}: {} items, level {}",
        snapshot.date,
        snapshot.stages.total(),
        snapshot.level
    );

    let mut store = state.store.lock().await;
    let history = store.update(snapshot)?;
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    use wkstats_client::WaniKaniClient;
    use wkstats_store::HistoryStore;

    use crate::config::Config;

    #[test]
    fn test_next_fire_time_later_today() {
        let now = datetime!(2024-06-01 10:00 UTC);
        let at = Time::from_hms(23, 59, 0).unwrap();
        assert_eq!(next_fire_time(now, at), datetime!(2024-06-01 23:59 UTC));
    }

    #[test]
    fn test_next_fire_time_rolls_to_tomorrow() {
        let now = datetime!(2024-06-01 23:59:30 UTC);
        let at = Time::from_hms(23, 59, 0).unwrap();
        assert_eq!(next_fire_time(now, at), datetime!(2024-06-02 23:59 UTC));
    }

    #[test]
    fn test_next_fire_time_exact_boundary_rolls_over() {
        let now = datetime!(2024-06-01 06:00 UTC);
        let at = Time::from_hms(6, 0, 0).unwrap();
        assert_eq!(next_fire_time(now, at), datetime!(2024-06-02 06:00 UTC));
    }

    #[tokio::test]
    async fn test_update_once_records_failure_and_leaves_store_empty() {
        let store = HistoryStore::open_in_memory();
        let client = WaniKaniClient::new("key", "http://127.0.0.1:9").unwrap();
        let state = crate::state::AppState::new(store, client, Config::default());

        let result = update_once(&state).await;
        assert!(matches!(result, Err(UpdateError::Fetch(_))));

        let stats = state.scheduler.stats.read().await;
        assert_eq!(stats.failure_count, 1);
        assert_eq!(stats.success_count, 0);
        assert!(stats.last_error.is_some());

        let store = state.store.lock().await;
        assert!(store.read_or_empty().unwrap().is_empty());
    }
}
