mod activity;
mod api;
mod cache;
mod carrier;
mod config;
mod engine;
mod error;
mod mapping;
mod models;
mod observability;
mod phone;
mod state;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::carrier::NcmClient;

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    if config.carrier_api_key.is_empty() {
        tracing::warn!("NCM_API_KEY is not set; carrier calls will fail upstream");
    }

    let carrier = Arc::new(NcmClient::new(
        &config.carrier_api_url,
        &config.carrier_api_key,
        Duration::from_secs(config.carrier_timeout_secs),
    ));
    let shared_state = Arc::new(state::AppState::new(carrier, config.origin_branch.clone()));

    let app = api::rest::router(shared_state);

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| error::AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        origin_branch = %config.origin_branch,
        "shipment relay started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| error::AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
