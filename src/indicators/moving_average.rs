// =============================================================================
// Rolling Simple Moving Average
// =============================================================================
//
// MA_i = mean(x_{i-window+1} ..= x_i), undefined (None) until the window is
// full.  Used for the 20- and 50-day moving-average overlays.
// =============================================================================

use crate::errors::EngineResult;

use super::{ensure_finite_series, ensure_positive};

pub const MA_SHORT: usize = 20;
pub const MA_LONG: usize = 50;

/// Rolling mean over a trailing `window`, aligned to `values`.
///
/// # Errors
/// `InvalidInput` when `values` is empty or non-finite, or `window == 0`.
pub fn rolling_mean(values: &[f64], window: usize) -> EngineResult<Vec<Option<f64>>> {
    ensure_positive(window, "moving-average window")?;
    ensure_finite_series(values, "moving-average input")?;

    let mut out = vec![None; values.len()];
    if values.len() < window {
        return Ok(out);
    }

    let w = window as f64;
    for end in (window - 1)..values.len() {
        let sum: f64 = values[end + 1 - window..=end].iter().sum();
        out[end] = Some(sum / w);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_mean_warm_up_then_values() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn rolling_mean_short_input() {
        let out = rolling_mean(&[1.0, 2.0], MA_SHORT).unwrap();
        assert_eq!(out, vec![None, None]);
    }

    #[test]
    fn rolling_mean_invalid() {
        assert!(rolling_mean(&[], 3).is_err());
        assert!(rolling_mean(&[1.0], 0).is_err());
    }

    #[test]
    fn rolling_mean_window_one_is_identity() {
        let xs = [4.0, 8.0, 15.0];
        let out = rolling_mean(&xs, 1).unwrap();
        assert_eq!(out, xs.iter().map(|v| Some(*v)).collect::<Vec<_>>());
    }
}
