//! wkstats Service - Daily WaniKani stats collector and web UI.
//!
//! Run with: `cargo run -p wkstats-service`

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use wkstats_client::WaniKaniClient;
use wkstats_service::{AppState, Config, Scheduler, api};
use wkstats_store::HistoryStore;

/// wkstats Service - Daily WaniKani stats collector and web UI.
#[derive(Parser, Debug)]
#[command(name = "wkstats-service")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides config).
    #[arg(short, long)]
    bind: Option<String>,

    /// History document path (overrides config).
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Disable the daily scheduler (HTTP triggers only).
    #[arg(long)]
    no_scheduler: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wkstats_service=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    // Load configuration: file, then environment, then CLI flags
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default().unwrap_or_default(),
    };
    config.apply_env();

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(data_path) = args.data {
        config.storage.path = data_path;
    }

    config.validate()?;

    let api_key = config
        .wanikani
        .api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("No WaniKani API key: set WANIKANI_API_KEY or wanikani.api_key in the config file"))?;
    let client = WaniKaniClient::new(api_key, &config.wanikani.base_url)?;

    // Open the history store
    info!("Opening history store at {:?}", config.storage.path);
    let store = HistoryStore::open(&config.storage.path)?;

    // Create application state
    let schedule_enabled = config.schedule.enabled;
    let state = AppState::new(store, client, config.clone());

    // Start the daily scheduler
    if schedule_enabled && !args.no_scheduler {
        let scheduler = Scheduler::new(Arc::clone(&state));
        scheduler.start();
    } else {
        info!("Daily scheduler disabled");
    }

    // Build the router
    let app = Router::new()
        .merge(api::router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Parse bind address
    let addr: SocketAddr = config.server.bind.parse()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
