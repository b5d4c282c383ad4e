// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free transformations from daily bars (or their close
// column) to derived series aligned to the same index.  Nothing here keeps
// state between calls: every invocation recomputes from scratch, so calling a
// function twice on the same input yields bit-identical output.
//
// Invalid arguments fail fast with `EngineError::InvalidInput`.  Warm-up
// positions that have no defined value are `None`, never NaN.

pub mod chaikin;
pub mod correlation;
pub mod ema;
pub mod macd;
pub mod moving_average;
pub mod returns;
pub mod rsi;

pub use chaikin::{chaikin_oscillator, CHAIKIN_LONG, CHAIKIN_SHORT};
pub use correlation::correlation_matrix;
pub use macd::{macd, MACD_LONG, MACD_SHORT, MACD_SIGNAL};
pub use moving_average::{rolling_mean, MA_LONG, MA_SHORT};
pub use returns::{daily_changes, daily_returns, histogram, HistogramBin, DEFAULT_HISTOGRAM_BINS};
pub use rsi::{current_rsi, rsi, RsiZone, RSI_WINDOW};

use crate::errors::{EngineError, EngineResult};

/// Reject empty input and non-finite values.
pub(crate) fn ensure_finite_series(values: &[f64], what: &str) -> EngineResult<()> {
    if values.is_empty() {
        return Err(EngineError::invalid(format!("{what}: empty series")));
    }
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(EngineError::invalid(format!(
            "{what}: non-finite value at index {i}"
        )));
    }
    Ok(())
}

pub(crate) fn ensure_positive(value: usize, name: &str) -> EngineResult<()> {
    if value == 0 {
        return Err(EngineError::invalid(format!("{name} must be positive")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_guard_rejects_empty_and_nan() {
        assert!(ensure_finite_series(&[], "closes").is_err());
        let err = ensure_finite_series(&[1.0, f64::INFINITY], "closes").unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidInput("closes: non-finite value at index 1".into())
        );
        assert!(ensure_finite_series(&[1.0, 2.0], "closes").is_ok());
    }

    #[test]
    fn positive_guard() {
        assert!(ensure_positive(0, "span").is_err());
        assert!(ensure_positive(1, "span").is_ok());
    }
}
