// =============================================================================
// Runtime Configuration: dashboard backend settings with atomic save
// =============================================================================
//
// Every tunable lives here: server address, ticker list, market-data provider
// settings, indicator windows and forecast parameters.
//
// The file is operator-owned: the server reads it at start-up and only
// writes it when none exists yet, seeding it with the defaults.  That write
// uses an atomic tmp + rename.  All fields carry `#[serde(default)]` so that
// adding new fields never breaks loading an older config file.
//
// =============================================================================

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::forecast::{linear, DEFAULT_LOOKBACK, DEFAULT_TRAIN_RATIO};
use crate::indicators::{
    CHAIKIN_LONG, CHAIKIN_SHORT, DEFAULT_HISTOGRAM_BINS, MACD_LONG, MACD_SHORT, MACD_SIGNAL,
    MA_LONG, MA_SHORT, RSI_WINDOW,
};
use crate::market_data::yahoo::DEFAULT_BASE_URL;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_tickers() -> Vec<String> {
    vec![
        "AAPL".to_string(),
        "META".to_string(),
        "NVDA".to_string(),
        "NFLX".to_string(),
    ]
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_chaikin_short() -> usize {
    CHAIKIN_SHORT
}

fn default_chaikin_long() -> usize {
    CHAIKIN_LONG
}

fn default_rsi_window() -> usize {
    RSI_WINDOW
}

fn default_macd_short() -> usize {
    MACD_SHORT
}

fn default_macd_long() -> usize {
    MACD_LONG
}

fn default_macd_signal() -> usize {
    MACD_SIGNAL
}

fn default_ma_short() -> usize {
    MA_SHORT
}

fn default_ma_long() -> usize {
    MA_LONG
}

fn default_histogram_bins() -> usize {
    DEFAULT_HISTOGRAM_BINS
}

fn default_lookback() -> usize {
    DEFAULT_LOOKBACK
}

fn default_train_ratio() -> f64 {
    DEFAULT_TRAIN_RATIO
}

fn default_learning_rate() -> f64 {
    linear::DEFAULT_LEARNING_RATE
}

fn default_epochs() -> usize {
    linear::DEFAULT_EPOCHS
}

// =============================================================================
// ProviderConfig
// =============================================================================

/// Market-data provider connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the chart API (no trailing path).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per fetch, counting the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

// =============================================================================
// IndicatorParams
// =============================================================================

/// Windows and spans for every indicator the dashboard draws.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorParams {
    #[serde(default = "default_chaikin_short")]
    pub chaikin_short: usize,
    #[serde(default = "default_chaikin_long")]
    pub chaikin_long: usize,
    #[serde(default = "default_rsi_window")]
    pub rsi_window: usize,
    #[serde(default = "default_macd_short")]
    pub macd_short: usize,
    #[serde(default = "default_macd_long")]
    pub macd_long: usize,
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,
    /// Short moving-average overlay (days).
    #[serde(default = "default_ma_short")]
    pub ma_short: usize,
    /// Long moving-average overlay (days).
    #[serde(default = "default_ma_long")]
    pub ma_long: usize,
    /// Buckets for the daily-change distribution.
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            chaikin_short: default_chaikin_short(),
            chaikin_long: default_chaikin_long(),
            rsi_window: default_rsi_window(),
            macd_short: default_macd_short(),
            macd_long: default_macd_long(),
            macd_signal: default_macd_signal(),
            ma_short: default_ma_short(),
            ma_long: default_ma_long(),
            histogram_bins: default_histogram_bins(),
        }
    }
}

// =============================================================================
// ForecastParams
// =============================================================================

/// Data preparation and training settings for the price forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastParams {
    /// Trailing window length fed to the model.
    #[serde(default = "default_lookback")]
    pub lookback: usize,
    /// Fraction of history used for training (rest is predicted).
    #[serde(default = "default_train_ratio")]
    pub train_ratio: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            train_ratio: default_train_ratio(),
            learning_rate: default_learning_rate(),
            epochs: default_epochs(),
        }
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Address the HTTP API binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Tickers offered in the dashboard's selector.
    #[serde(default = "default_tickers")]
    pub tickers: Vec<String>,

    /// Start date pre-filled in the dashboard's date range.
    #[serde(default = "default_start_date")]
    pub default_start_date: NaiveDate,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub indicators: IndicatorParams,

    #[serde(default)]
    pub forecast: ForecastParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            tickers: default_tickers(),
            default_start_date: default_start_date(),
            provider: ProviderConfig::default(),
            indicators: IndicatorParams::default(),
            forecast: ForecastParams::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("invalid runtime config in {}", path.display()))?;

        info!(
            path = %path.display(),
            tickers = ?config.tickers,
            bind_addr = %config.bind_addr,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Load `path`, falling back to defaults.
    ///
    /// A missing file is created from the defaults.  A file that exists but
    /// cannot be read, parsed or validated is left as it is.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            let config = Self::default();
            match config.save(path) {
                Ok(()) => info!(path = %path.display(), "wrote default runtime config"),
                Err(e) => warn!(error = %e, "Failed to write default runtime config"),
            }
            return config;
        }

        Self::load(path).unwrap_or_else(|e| {
            warn!(error = ?e, "Failed to load config, using defaults");
            Self::default()
        })
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Reject values the engine would refuse at request time anyway.
    pub fn validate(&self) -> Result<()> {
        let p = &self.indicators;
        let windows = [
            ("chaikin_short", p.chaikin_short),
            ("chaikin_long", p.chaikin_long),
            ("rsi_window", p.rsi_window),
            ("macd_short", p.macd_short),
            ("macd_long", p.macd_long),
            ("macd_signal", p.macd_signal),
            ("ma_short", p.ma_short),
            ("ma_long", p.ma_long),
            ("histogram_bins", p.histogram_bins),
            ("forecast.lookback", self.forecast.lookback),
            ("forecast.epochs", self.forecast.epochs),
        ];
        for (name, value) in windows {
            if value == 0 {
                bail!("{name} must be positive");
            }
        }

        let ratio = self.forecast.train_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            bail!("forecast.train_ratio must be in (0, 1), got {ratio}");
        }
        if !(self.forecast.learning_rate > 0.0) {
            bail!("forecast.learning_rate must be positive");
        }
        if self.provider.max_attempts == 0 {
            bail!("provider.max_attempts must be at least 1");
        }
        Ok(())
    }
}
