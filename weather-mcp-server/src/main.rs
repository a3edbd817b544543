//! Binary crate for the weather MCP HTTP server.
//!
//! Serves `POST /mcp` (tool calls) and `GET /` (capabilities) on top of
//! the router from `weather-mcp-core`.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use weather_mcp_core::{Config, McpRouter, OpenMeteoProvider};

mod app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load()?;

    let lookup = OpenMeteoProvider::new(config.upstream.clone());
    let router = McpRouter::new(Arc::new(lookup));

    let listener = TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;

    info!(
        addr = %listener.local_addr()?,
        geocoding = %config.upstream.geocoding_url,
        forecast = %config.upstream.forecast_url,
        "weather MCP server listening"
    );

    axum::serve(listener, app::app(router))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
