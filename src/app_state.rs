// =============================================================================
// Central Application State: Stock Seeker backend
// =============================================================================
//
// Shared by every request handler via `Arc<AppState>`.
//
// Thread safety:
//   - Atomic counter for lock-free request accounting.
//   - The runtime configuration is fixed at start-up and read without locking.
//   - parking_lot::RwLock for the recent-error log.
//   - The market-data provider is an `Arc<dyn MarketDataProvider>` and is
//     itself `Send + Sync`.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::market_data::MarketDataProvider;
use crate::runtime_config::RuntimeConfig;

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

/// A failed request, kept for the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

pub struct AppState {
    pub runtime_config: RuntimeConfig,
    pub provider: Arc<dyn MarketDataProvider>,

    /// Analysis and summary requests handled since start-up.
    pub requests_served: AtomicU64,
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: RuntimeConfig, provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            runtime_config: config,
            provider,
            requests_served: AtomicU64::new(0),
            recent_errors: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.runtime_config
    }

    /// Count one served request and return the new total.
    pub fn record_request(&self) -> u64 {
        self.requests_served.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn requests_served(&self) -> u64 {
        self.requests_served.load(Ordering::SeqCst)
    }

    /// Record an error message, evicting the oldest beyond
    /// [`MAX_RECENT_ERRORS`].
    pub fn push_error(&self, msg: String) {
        let record = ErrorRecord {
            message: msg,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
    }

    pub fn health(&self) -> HealthSnapshot {
        HealthSnapshot {
            status: "ok",
            requests_served: self.requests_served(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            server_time: Utc::now().timestamp_millis(),
            recent_errors: self.recent_errors.read().clone(),
        }
    }
}

/// Body of `GET /api/v1/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub requests_served: u64,
    pub uptime_secs: u64,
    /// Unix milliseconds.
    pub server_time: i64,
    pub recent_errors: Vec<ErrorRecord>,
}
