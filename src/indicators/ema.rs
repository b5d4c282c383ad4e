// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// Recursive EMA in its "adjust = false" form:
//
//   alpha   = 2 / (span + 1)
//   EMA_0   = x_0
//   EMA_t   = alpha * x_t + (1 - alpha) * EMA_{t-1}
//
// The series is seeded with the first observation, so it is defined from index
// 0 onward with no warm-up gap.
// =============================================================================

use crate::errors::EngineResult;

use super::{ensure_finite_series, ensure_positive};

/// Smoothing factor for a given span.
fn alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// Compute the EMA of `values` with the given `span`.
///
/// Output has the same length as the input.
///
/// # Errors
/// `InvalidInput` when `values` is empty or non-finite, or `span == 0`.
pub fn ema(values: &[f64], span: usize) -> EngineResult<Vec<f64>> {
    ensure_positive(span, "span")?;
    ensure_finite_series(values, "ema input")?;

    let a = alpha(span);
    let mut prev = values[0];
    let mut out = Vec::with_capacity(values.len());
    out.push(prev);

    for &x in &values[1..] {
        prev = a * x + (1.0 - a) * prev;
        out.push(prev);
    }
    Ok(out)
}
