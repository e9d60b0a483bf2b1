//! Scheduled collector and web UI for WaniKani SRS statistics.
//!
//! This crate provides a service that:
//! - Fetches SRS stage totals and user level from WaniKani once a day
//! - Persists the daily history as a single JSON document
//! - Serves a web page with day-over-day deltas
//! - Exposes a small JSON API and a manual update trigger
//!
//! # HTTP Endpoints
//!
//! - `GET /` - Rendered history page (no auth)
//! - `GET /api/health` - Service health check
//! - `GET /api/status` - Scheduler state and run statistics
//! - `GET /api/history` - Full history as JSON
//! - `GET /api/deltas` - Day-over-day deltas as JSON
//! - `POST /api/update` - Fetch + persist now, returns the refreshed page
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/wkstats/server.toml`:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [storage]
//! path = "~/.local/share/wkstats/history.json"
//!
//! [schedule]
//! enabled = true
//! time = "23:59"  # UTC
//! ```
//!
//! The WaniKani credential is usually supplied via the
//! `WANIKANI_API_KEY` environment variable rather than the file.

pub mod api;
pub mod config;
pub mod render;
pub mod scheduler;
pub mod state;

pub use config::{
    Config, ConfigError, ScheduleConfig, ServerConfig, StorageConfig, WaniKaniConfig,
};
pub use scheduler::Scheduler;
pub use state::AppState;
