// =============================================================================
// Accumulation/Distribution Line and Chaikin Oscillator
// =============================================================================
//
// Step 1: Money-flow multiplier per bar:
//            mfm = ((close - low) - (high - close)) / (high - low)
// Step 2: Cumulative AD line:
//            AD_i = AD_{i-1} + mfm_i * volume_i      (AD_{-1} = 0)
//          A bar with high == low has no trading range; it contributes nothing
//          and AD_i = AD_{i-1}.
// Step 3: Oscillator:
//            CO_i = EMA_short(AD)_i - EMA_long(AD)_i
//          using the recursive EMA seeded at AD_0 (see `ema.rs`).
//
// Defaults: short = 3, long = 10.
// =============================================================================

use crate::errors::{EngineError, EngineResult};
use crate::market_data::Bar;

use super::ema::ema;
use super::ensure_positive;

pub const CHAIKIN_SHORT: usize = 3;
pub const CHAIKIN_LONG: usize = 10;

/// Compute the cumulative Accumulation/Distribution line.
///
/// Path dependent: every value depends on all prior bars.
///
/// A zero-volume bar is not short-circuited.  With a non-zero range its
/// contribution is `mfm * 0.0 == 0.0`, so AD is carried forward exactly as on
/// a zero-range bar.
///
/// # Errors
/// `InvalidInput` when `bars` is empty or any field is non-finite.
pub fn accumulation_distribution(bars: &[Bar]) -> EngineResult<Vec<f64>> {
    if bars.is_empty() {
        return Err(EngineError::invalid("accumulation/distribution: empty bar sequence"));
    }
    if let Some(i) = bars.iter().position(|b| !b.is_finite()) {
        return Err(EngineError::invalid(format!(
            "accumulation/distribution: non-finite bar at index {i}"
        )));
    }

    let ad = bars
        .iter()
        .scan(0.0_f64, |acc, bar| {
            let range = bar.high - bar.low;
            // Zero range: carry forward, never divide.
            if range != 0.0 {
                let mfm = ((bar.close - bar.low) - (bar.high - bar.close)) / range;
                *acc += mfm * bar.volume;
            }
            Some(*acc)
        })
        .collect();

    Ok(ad)
}

/// Compute the Chaikin Oscillator for `bars` with spans `short` and `long`.
///
/// Output has one value per bar; index 0 is always `0.0` because both EMAs
/// seed at `AD_0`.
///
/// # Errors
/// `InvalidInput` when `bars` is empty or non-finite, or either span is zero.
pub fn chaikin_oscillator(bars: &[Bar], short: usize, long: usize) -> EngineResult<Vec<f64>> {
    ensure_positive(short, "chaikin short span")?;
    ensure_positive(long, "chaikin long span")?;

    let ad = accumulation_distribution(bars)?;
    let ema_short = ema(&ad, short)?;
    let ema_long = ema(&ad, long)?;

    Ok(ema_short
        .iter()
        .zip(&ema_long)
        .map(|(s, l)| s - l)
        .collect())
}
