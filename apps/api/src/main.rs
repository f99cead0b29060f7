mod config;
mod db;
mod errors;
mod evaluator;
mod jobs;
mod models;
mod personas;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::evaluator::EvaluatorClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Persona API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url, config.database_max_connections).await?;

    // Initialize evaluation service client
    let evaluator = EvaluatorClient::new(&config.evaluator_url, config.evaluator_timeout)?;
    match config.evaluator_timeout {
        Some(timeout) => info!(
            "Evaluation service at {} (timeout {}s)",
            evaluator.base_url(),
            timeout.as_secs()
        ),
        None => info!("Evaluation service at {} (no timeout)", evaluator.base_url()),
    }

    let state = AppState {
        store: Arc::new(PgStore::new(pool)),
        evaluator,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
