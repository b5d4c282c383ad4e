// =============================================================================
// Daily Returns, Daily Changes and their Distribution
// =============================================================================

use serde::Serialize;

use crate::errors::{EngineError, EngineResult};

use super::ensure_positive;

pub const DEFAULT_HISTOGRAM_BINS: usize = 50;

/// Percentage change from the previous close, as a fraction.
///
/// Index 0 has no predecessor and is `None`; so is any day whose previous
/// close is zero.
pub fn daily_returns(closes: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return out;
    }
    out.push(None);
    out.extend(closes.windows(2).map(|w| {
        if w[0] == 0.0 {
            None
        } else {
            Some(w[1] / w[0] - 1.0)
        }
    }));
    out
}

/// First differences `close_i - close_{i-1}` for `i >= 1`.
///
/// The result is one element shorter than the input.
pub fn daily_changes(closes: &[f64]) -> Vec<f64> {
    closes.windows(2).map(|w| w[1] - w[0]).collect()
}

/// One equal-width histogram bucket: `[lower, upper)`; the last bucket is
/// closed on both ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Bucket finite `values` into `bins` equal-width buckets over `[min, max]`.
///
/// Non-finite values are ignored.  When every value is identical a single
/// bucket holding all of them is returned.
///
/// # Errors
/// `InvalidInput` when `bins == 0` or there is no finite value.
pub fn histogram(values: &[f64], bins: usize) -> EngineResult<Vec<HistogramBin>> {
    ensure_positive(bins, "histogram bins")?;

    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Err(EngineError::invalid("histogram: no finite values"));
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        return Ok(vec![HistogramBin {
            lower: min,
            upper: max,
            count: finite.len(),
        }]);
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in &finite {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count,
        })
        .collect())
}
