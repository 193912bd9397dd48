mod assembler;
mod catalog;
mod config;
mod errors;
mod models;
mod revision;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Pagewright v{}", env!("CARGO_PKG_VERSION"));

    // Load and validate the block catalog
    let catalog = Catalog::load(config.catalog_path.as_deref())
        .context("Failed to load block catalog")?;
    if catalog.is_empty() {
        warn!("Block catalog has no templates; every layout search will fail");
    }

    info!(
        "Assembler config: beam width {}, max depth {}, history cap {}, session TTL {}s",
        config.beam_width, config.max_depth, config.history_cap, config.session_ttl_secs
    );

    // Build app state
    let state = AppState::new(&config, catalog);
    state
        .sessions
        .spawn_idle_sweeper(Duration::from_secs(config.session_ttl_secs as u64));

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
