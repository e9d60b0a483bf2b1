//! HTTP endpoints for the wkstats service.
//!
//! The handlers are thin trigger adapters: each one sequences the two
//! core operations (fetch + update, or read + render) and owns no
//! business logic of its own.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use serde::Serialize;
use time::OffsetDateTime;

use wkstats_types::{DeltaView, History};

use crate::render;
use crate::scheduler::{self, UpdateError};
use crate::state::{AppState, RunStats};

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        // Web page
        .route("/", get(history_page))
        // Health and status
        .route("/api/health", get(health))
        .route("/api/status", get(get_status))
        // Data endpoints
        .route("/api/history", get(get_history))
        .route("/api/deltas", get(get_deltas))
        // Manual update trigger (GET kept for bookmark/cron use)
        .route("/api/update", post(trigger_update).get(trigger_update))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
    })
}

/// Scheduler status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Whether the scheduler loop is running.
    pub scheduler_running: bool,
    /// When the scheduler was started (if running).
    #[serde(with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    /// Update run statistics.
    pub runs: RunStats,
    /// Number of recorded days.
    pub history_len: usize,
}

/// Scheduler and update-run status.
async fn get_status(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, AppError> {
    let history_len = {
        let store = state.store.lock().await;
        store.read_or_empty()?.len()
    };

    let runs = state.scheduler.stats.read().await.clone();

    Ok(Json(StatusResponse {
        scheduler_running: state.scheduler.is_running(),
        started_at: state.scheduler.started_at(),
        runs,
        history_len,
    }))
}

/// Rendered history page. A missing document renders the empty state.
async fn history_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let history = {
        let store = state.store.lock().await;
        store.read_or_empty()?
    };

    let view = DeltaView::from_history(&history);
    Ok(Html(render::history_page(&view)))
}

/// Full history as JSON.
async fn get_history(State(state): State<Arc<AppState>>) -> Result<Json<History>, AppError> {
    let store = state.store.lock().await;
    let history = store.read_or_empty()?;
    Ok(Json(history))
}

/// Day-over-day deltas as JSON.
async fn get_deltas(State(state): State<Arc<AppState>>) -> Result<Json<DeltaView>, AppError> {
    let history = {
        let store = state.store.lock().await;
        store.read_or_empty()?
    };
    Ok(Json(DeltaView::from_history(&history)))
}

/// Manual update trigger: fetch a fresh snapshot, persist it, and
/// return the refreshed page.
async fn trigger_update(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let history = scheduler::update_once(&state).await?;
    let view = DeltaView::from_history(&history);
    Ok(Html(render::history_page(&view)))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Upstream(wkstats_client::Error),
    Store(wkstats_store::Error),
    Internal(String),
}

impl From<wkstats_store::Error> for AppError {
    fn from(e: wkstats_store::Error) -> Self {
        AppError::Store(e)
    }
}

impl From<wkstats_client::Error> for AppError {
    fn from(e: wkstats_client::Error) -> Self {
        AppError::Upstream(e)
    }
}

impl From<UpdateError> for AppError {
    fn from(e: UpdateError) -> Self {
        match e {
            UpdateError::Fetch(e) => AppError::Upstream(e),
            UpdateError::Store(e) => AppError::Store(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Upstream(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            AppError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}
