// =============================================================================
// Market-Data Provider Abstraction
// =============================================================================
//
// A provider answers "daily bars for SYMBOL between START and END, inclusive"
// and, when it has them, the dividends and splits over the same range.  Either
// answer may legitimately be empty (holidays, a range before listing, a stock
// that never paid a dividend) and bars may omit non-trading days.
//
// `RetryingProvider` wraps any provider with a bounded retry loop and a fixed
// back-off.  Only `UpstreamUnavailable` is retried; invalid input and
// rejected requests (unknown symbol) are returned immediately.
// =============================================================================

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::errors::{EngineError, EngineResult};

use super::{BarSeries, StockAction};

/// Source of historical daily bars.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<BarSeries>;

    /// Dividends and splits inside `start..=end`, oldest first.  Sources
    /// without corporate-action data report none.
    async fn fetch_actions(
        &self,
        _symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> EngineResult<Vec<StockAction>> {
        Ok(Vec::new())
    }
}

/// Retry wrapper around another provider.
pub struct RetryingProvider<P> {
    inner: P,
    max_attempts: u32,
    backoff: Duration,
}

impl<P: MarketDataProvider> RetryingProvider<P> {
    /// `max_attempts` counts the first try; values below 1 are treated as 1.
    pub fn new(inner: P, max_attempts: u32, backoff: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    async fn with_retry<T, F, Fut>(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        mut call: F,
    ) -> EngineResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = EngineResult<T>>,
    {
        if start > end {
            return Err(EngineError::invalid(format!(
                "start date {start} is after end date {end}"
            )));
        }

        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => {
                    debug!(symbol, attempt, "fetch succeeded");
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    warn!(
                        symbol,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "fetch failed, retrying"
                    );
                    tokio::time::sleep(self.backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl<P: MarketDataProvider> MarketDataProvider for RetryingProvider<P> {
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<BarSeries> {
        self.with_retry(symbol, start, end, || {
            self.inner.fetch_bars(symbol, start, end)
        })
        .await
    }

    async fn fetch_actions(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<StockAction>> {
        self.with_retry(symbol, start, end, || {
            self.inner.fetch_actions(symbol, start, end)
        })
        .await
    }
}
