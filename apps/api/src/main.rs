mod config;
mod errors;
mod models;
mod review;
mod routes;
mod screening_client;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::review::storage::FileStorage;
use crate::review::submission::SubmissionCoordinator;
use crate::review::workbench::ReviewWorkbench;
use crate::routes::build_router;
use crate::screening_client::{ScreeningClient, Session};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting screening API v{}", env!("CARGO_PKG_VERSION"));

    // Local decision badges
    let storage = FileStorage::new(&config.draft_store_dir).with_context(|| {
        format!("Cannot open draft store at '{}'", config.draft_store_dir)
    })?;
    info!("Draft store at {}", storage.dir().display());
    let workbench = ReviewWorkbench::new(Arc::new(storage));

    // Screening backend
    let session = Session::new(&config.screening_username, &config.screening_token);
    let client = ScreeningClient::new(&config.screening_api_url, session)
        .context("Failed to build screening backend client")?;
    info!(
        "Screening backend at {} (operator: {})",
        config.screening_api_url,
        client.session().username
    );

    let state = AppState {
        workbench: Arc::new(Mutex::new(workbench)),
        submitter: Arc::new(SubmissionCoordinator::new(Arc::new(client.clone()))),
        client,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to the review front-end origin

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
