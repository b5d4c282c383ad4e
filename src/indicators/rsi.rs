// =============================================================================
// Relative Strength Index (RSI): simple-moving-average form
// =============================================================================
//
// Step 1: Price changes: delta_i = close_i - close_{i-1}          (i >= 1)
// Step 2: gain_i = max(delta_i, 0), loss_i = max(-delta_i, 0)
// Step 3: avg_gain_i / avg_loss_i = SMA of the trailing `window` gains /
//          losses.  Undefined until `window` deltas exist, so the first
//          `window` outputs are `None`.
// Step 4: RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// A zero average loss makes RS infinite; RSI is pinned to exactly 100.0
// instead of letting 0/0 or x/0 leak out as NaN.
//
// Thresholds:  RSI >= 70 => OVERBOUGHT,  RSI <= 30 => OVERSOLD.
// =============================================================================

use serde::Serialize;

use crate::errors::EngineResult;

use super::{ensure_finite_series, ensure_positive};

pub const RSI_WINDOW: usize = 14;

/// Compute the RSI series for `closes` over a trailing `window`.
///
/// Output is aligned to `closes`; positions `0..window` are `None`.  An input
/// shorter than `window + 1` therefore yields an all-`None` series rather than
/// an error.
///
/// # Errors
/// `InvalidInput` when `closes` is empty or non-finite, or `window == 0`.
pub fn rsi(closes: &[f64], window: usize) -> EngineResult<Vec<Option<f64>>> {
    ensure_positive(window, "rsi window")?;
    ensure_finite_series(closes, "rsi closes")?;

    let mut out = vec![None; closes.len()];
    if closes.len() <= window {
        return Ok(out);
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = closes
        .windows(2)
        .map(|w| {
            let d = w[1] - w[0];
            (d.max(0.0), (-d).max(0.0))
        })
        .unzip();

    let w = window as f64;
    // Delta k sits at close index k + 1; the first full window ends at delta
    // index window - 1, i.e. close index `window`.
    for end in (window - 1)..gains.len() {
        let start = end + 1 - window;
        let avg_gain = gains[start..=end].iter().sum::<f64>() / w;
        let avg_loss = losses[start..=end].iter().sum::<f64>() / w;
        out[end + 1] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    Ok(out)
}

/// Most recent defined RSI value and its zone.
pub fn current_rsi(closes: &[f64], window: usize) -> EngineResult<Option<(f64, RsiZone)>> {
    let series = rsi(closes, window)?;
    Ok(series
        .iter()
        .rev()
        .find_map(|v| *v)
        .map(|v| (v, RsiZone::from_value(v))))
}

/// Overbought / oversold classification of an RSI reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    pub fn from_value(value: f64) -> Self {
        if value >= 70.0 {
            Self::Overbought
        } else if value <= 30.0 {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }
}

impl std::fmt::Display for RsiZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overbought => write!(f, "OVERBOUGHT"),
            Self::Oversold => write!(f, "OVERSOLD"),
            Self::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}
