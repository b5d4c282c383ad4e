// =============================================================================
// Stock Seeker: Main Entry Point
// =============================================================================
//
// Serves the analysis API for the stock dashboard.  Daily bars come from the
// Yahoo Finance chart endpoint through a retrying provider; every indicator is
// recomputed per request.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analysis;
mod api;
mod app_state;
mod errors;
mod forecast;
mod indicators;
mod market_data;
mod runtime_config;
mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::market_data::{MarketDataProvider, RetryingProvider, YahooChartProvider};
use crate::runtime_config::RuntimeConfig;

const CONFIG_PATH: &str = "stock_seeker_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Stock Seeker starting up");

    let mut config = RuntimeConfig::load_or_default(CONFIG_PATH);
    apply_env_overrides(&mut config);

    info!(
        tickers = ?config.tickers,
        provider = %config.provider.base_url,
        bind_addr = %config.bind_addr,
        "Runtime config ready"
    );

    // ── 2. Market data provider ──────────────────────────────────────────
    let yahoo = YahooChartProvider::new(
        config.provider.base_url.clone(),
        Duration::from_secs(config.provider.timeout_secs),
    )?;
    let provider: Arc<dyn MarketDataProvider> = Arc::new(RetryingProvider::new(
        yahoo,
        config.provider.max_attempts,
        Duration::from_millis(config.provider.retry_backoff_ms),
    ));

    // ── 3. Shared state ──────────────────────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, provider));

    // ── 4. API server ────────────────────────────────────────────────────
    let app = api::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server to {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening. Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    // ── 5. Graceful shutdown ─────────────────────────────────────────────
    info!(
        requests_served = state.requests_served(),
        "Stock Seeker shut down complete."
    );
    Ok(())
}

/// `STOCK_SEEKER_*` environment variables take precedence over the file.
fn apply_env_overrides(config: &mut RuntimeConfig) {
    if let Ok(addr) = std::env::var("STOCK_SEEKER_BIND_ADDR") {
        config.bind_addr = addr;
    }
    if let Ok(url) = std::env::var("STOCK_SEEKER_PROVIDER_URL") {
        config.provider.base_url = url;
    }
    if let Ok(list) = std::env::var("STOCK_SEEKER_TICKERS") {
        let tickers: Vec<String> = list
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if !tickers.is_empty() {
            config.tickers = tickers;
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C; serving until killed");
        std::future::pending::<()>().await;
    }
    warn!("Shutdown signal received, stopping gracefully");
}
