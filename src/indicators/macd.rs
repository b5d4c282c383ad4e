// =============================================================================
// MACD and Signal Line
// =============================================================================
//
//   MACD_i   = EMA_short(close)_i - EMA_long(close)_i
//   signal_i = EMA_signal(MACD)_i
//
// All three EMAs are seeded at their first observation, so both series are
// defined from index 0.  Unlike RSI there is no warm-up gap.
//
// Defaults: 12 / 26 / 9.
// =============================================================================

use serde::Serialize;

use crate::errors::EngineResult;

use super::ema::ema;
use super::{ensure_finite_series, ensure_positive};

pub const MACD_SHORT: usize = 12;
pub const MACD_LONG: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// MACD line and its signal line, both aligned to the input closes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

impl MacdSeries {
    /// Latest `(macd, signal)` pair.
    pub fn last(&self) -> Option<(f64, f64)> {
        Some((*self.macd.last()?, *self.signal.last()?))
    }
}

/// Compute MACD and signal for `closes`.
///
/// # Errors
/// `InvalidInput` when `closes` is empty or non-finite, or any span is zero.
pub fn macd(
    closes: &[f64],
    short_span: usize,
    long_span: usize,
    signal_span: usize,
) -> EngineResult<MacdSeries> {
    ensure_positive(short_span, "macd short span")?;
    ensure_positive(long_span, "macd long span")?;
    ensure_positive(signal_span, "macd signal span")?;
    ensure_finite_series(closes, "macd closes")?;

    let short = ema(closes, short_span)?;
    let long = ema(closes, long_span)?;
    let macd: Vec<f64> = short.iter().zip(&long).map(|(s, l)| s - l).collect();
    let signal = ema(&macd, signal_span)?;

    Ok(MacdSeries { macd, signal })
}
