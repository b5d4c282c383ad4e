// =============================================================================
// Yahoo Finance Chart API Client: daily OHLCV bars and corporate actions
// =============================================================================
//
// GET {base_url}/v8/finance/chart/{symbol}?period1=..&period2=..&interval=1d
//
// With `events=div|split` the same endpoint also returns dividends and splits
// under `chart.result[0].events`.
//
// The response carries parallel arrays (`timestamp` plus one array per quote
// field).  Any field may be null on a given day; such rows are skipped rather
// than guessed.  Timestamps are shifted by the exchange `gmtoffset` before
// taking the calendar date.
// =============================================================================

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::errors::{EngineError, EngineResult};

use super::actions::merge_actions;
use super::{Bar, BarSeries, MarketDataProvider, StockAction};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; stock-seeker/1.0)";

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

impl ChartError {
    fn reason(&self) -> String {
        format!("{}: {}", self.code, self.description)
    }
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
    #[serde(default)]
    events: ChartEvents,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Corporate actions, keyed by the event's unix timestamp as a string.
#[derive(Debug, Default, Deserialize)]
struct ChartEvents {
    #[serde(default)]
    dividends: HashMap<String, DividendEvent>,
    #[serde(default)]
    splits: HashMap<String, SplitEvent>,
}

#[derive(Debug, Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
struct SplitEvent {
    date: i64,
    numerator: f64,
    denominator: f64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Daily-bar provider backed by the Yahoo Finance chart endpoint.
#[derive(Clone)]
pub struct YahooChartProvider {
    base_url: String,
    client: reqwest::Client,
}

impl YahooChartProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "YahooChartProvider initialised");

        Ok(Self { base_url, client })
    }

    /// Raw chart body for `symbol`; `events` selects `history` or `div|split`.
    async fn fetch_chart(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        events: &str,
    ) -> EngineResult<String> {
        let (period1, period2) = period_bounds(start, end);
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", events.to_string()),
            ])
            .send()
            .await
            .map_err(|e| EngineError::upstream(symbol, format!("request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| EngineError::upstream(symbol, format!("failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(status_error(symbol, status, &body));
        }
        Ok(body)
    }
}

#[async_trait]
impl MarketDataProvider for YahooChartProvider {
    #[instrument(skip(self), name = "yahoo::fetch_bars")]
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<BarSeries> {
        let body = self.fetch_chart(symbol, start, end, "history").await?;
        let series = parse_chart(symbol, &body, start, end)?;
        debug!(symbol, bars = series.len(), "chart parsed");
        Ok(series)
    }

    #[instrument(skip(self), name = "yahoo::fetch_actions")]
    async fn fetch_actions(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<StockAction>> {
        let body = self.fetch_chart(symbol, start, end, "div|split").await?;
        let actions = parse_actions(symbol, &body, start, end)?;
        debug!(symbol, actions = actions.len(), "chart events parsed");
        Ok(actions)
    }
}

impl std::fmt::Debug for YahooChartProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooChartProvider")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Error classification
// ---------------------------------------------------------------------------

/// A client error means the request itself is wrong (unknown symbol, bad
/// range) and repeating it cannot help.  Timeouts, throttling and server
/// errors may clear up on a later attempt.
fn status_error(symbol: &str, status: StatusCode, body: &str) -> EngineError {
    let reason = chart_error(body)
        .map(|err| err.reason())
        .unwrap_or_else(|| format!("HTTP {status}"));

    let retryable = matches!(
        status,
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS
    );
    if status.is_client_error() && !retryable {
        EngineError::rejected(symbol, reason)
    } else {
        EngineError::upstream(symbol, reason)
    }
}

/// Yahoo answers an unknown or delisted symbol with code `Not Found`.
fn classify_chart_error(symbol: &str, err: &ChartError) -> EngineError {
    if err.code == "Not Found" {
        EngineError::rejected(symbol, err.reason())
    } else {
        EngineError::upstream(symbol, err.reason())
    }
}

fn chart_error(body: &str) -> Option<ChartError> {
    let envelope: ChartEnvelope = serde_json::from_str(body).ok()?;
    envelope.chart.error
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Unix-second bounds covering `start..=end` (end day included).
fn period_bounds(start: NaiveDate, end: NaiveDate) -> (i64, i64) {
    let p1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
    let p2 = end
        .succ_opt()
        .unwrap_or(end)
        .and_time(NaiveTime::MIN)
        .and_utc()
        .timestamp();
    (p1, p2)
}

/// Exchange-local calendar date of a unix timestamp.
fn local_date(ts: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts + gmtoffset, 0).map(|dt| dt.date_naive())
}

fn value_at(column: &[Option<f64>], i: usize) -> Option<f64> {
    column.get(i).copied().flatten()
}

/// Decode the envelope and return its first result, if any.
fn first_result(symbol: &str, body: &str) -> EngineResult<Option<ChartResult>> {
    let envelope: ChartEnvelope = serde_json::from_str(body)
        .map_err(|e| EngineError::upstream(symbol, format!("malformed chart response: {e}")))?;

    if let Some(err) = envelope.chart.error {
        return Err(classify_chart_error(symbol, &err));
    }
    Ok(envelope.chart.result.and_then(|r| r.into_iter().next()))
}

/// Parse a chart response body into date-ordered, de-duplicated bars inside
/// `start..=end`.
fn parse_chart(
    symbol: &str,
    body: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> EngineResult<BarSeries> {
    let result = match first_result(symbol, body)? {
        Some(r) => r,
        None => return Ok(BarSeries::new(symbol, Vec::new())),
    };

    let quote = match result.indicators.quote.into_iter().next() {
        Some(q) => q,
        None => return Ok(BarSeries::new(symbol, Vec::new())),
    };

    let offset = result.meta.gmtoffset;
    let mut bars = Vec::with_capacity(result.timestamp.len());
    let mut skipped = 0usize;

    for (i, &ts) in result.timestamp.iter().enumerate() {
        let row = (
            value_at(&quote.open, i),
            value_at(&quote.high, i),
            value_at(&quote.low, i),
            value_at(&quote.close, i),
            value_at(&quote.volume, i),
        );

        match (local_date(ts, offset), row) {
            (Some(date), (Some(open), Some(high), Some(low), Some(close), Some(volume)))
                if date >= start && date <= end =>
            {
                let bar = Bar::new(date, open, high, low, close, volume);
                if bar.is_finite() {
                    bars.push(bar);
                } else {
                    skipped += 1;
                }
            }
            (Some(date), _) if date < start || date > end => {}
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(symbol, skipped, "skipped incomplete chart rows");
    }

    bars.sort_by_key(|b| b.date);
    // Keep the last row for a repeated date (Yahoo appends a live row).
    bars.reverse();
    bars.dedup_by_key(|b| b.date);
    bars.reverse();

    Ok(BarSeries::new(symbol, bars))
}

/// Parse the `events` block of a chart body into one row per action date
/// inside `start..=end`.
fn parse_actions(
    symbol: &str,
    body: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> EngineResult<Vec<StockAction>> {
    let result = match first_result(symbol, body)? {
        Some(r) => r,
        None => return Ok(Vec::new()),
    };

    let offset = result.meta.gmtoffset;
    let in_range = |ts: i64| local_date(ts, offset).filter(|d| *d >= start && *d <= end);

    let dividends = result
        .events
        .dividends
        .values()
        .filter(|ev| ev.amount.is_finite())
        .filter_map(|ev| in_range(ev.date).map(|d| (d, ev.amount)));

    let splits = result.events.splits.values().filter_map(|ev| {
        if ev.denominator == 0.0 || !ev.numerator.is_finite() {
            warn!(symbol, date = ev.date, "skipped split with unusable ratio");
            return None;
        }
        in_range(ev.date).map(|d| (d, ev.numerator / ev.denominator))
    });

    Ok(merge_actions(dividends, splits))
}
