// =============================================================================
// Price Forecast Delegate
// =============================================================================
//
// The forecaster treats its model as a black-box sequence regressor with a
// fit / predict contract.  This module owns only the data preparation around
// it:
//
//   1. Min-max scale every close into [0, 1].
//   2. train_len = ceil(n * train_ratio).
//   3. Training windows: scaled[i-L..i] -> scaled[i]   for L <= i < train_len.
//   4. Test windows:     scaled[i-L..i]                for train_len <= i < n.
//   5. Predictions are inverse-scaled back to prices; prediction k belongs to
//      close index train_len + k.
// =============================================================================

pub mod linear;
pub mod scaler;

pub use linear::LinearWindowRegressor;
pub use scaler::MinMaxScaler;

use serde::Serialize;
use tracing::debug;

use crate::errors::{EngineError, EngineResult};

pub const DEFAULT_LOOKBACK: usize = 60;
pub const DEFAULT_TRAIN_RATIO: f64 = 0.95;

/// A model that maps a fixed-length window of scaled values to the next value.
pub trait SequenceRegressor {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> EngineResult<()>;
    fn predict(&self, x: &[Vec<f64>]) -> EngineResult<Vec<f64>>;
}

/// Predicted prices for the test split.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    /// Close index of the first prediction.
    pub first_index: usize,
    pub predictions: Vec<f64>,
}

/// Fit `model` on the training split of `closes` and predict every test
/// position.
///
/// # Errors
/// `InvalidInput` when `lookback == 0`, `train_ratio` is outside `(0, 1)`,
/// closes are non-finite, or there are not enough closes for at least one
/// training window and one test window.
pub fn forecast<M: SequenceRegressor>(
    closes: &[f64],
    lookback: usize,
    train_ratio: f64,
    model: &mut M,
) -> EngineResult<Forecast> {
    if lookback == 0 {
        return Err(EngineError::invalid("forecast: lookback must be positive"));
    }
    if !(train_ratio > 0.0 && train_ratio < 1.0) {
        return Err(EngineError::invalid(format!(
            "forecast: train ratio {train_ratio} outside (0, 1)"
        )));
    }

    let n = closes.len();
    let train_len = (n as f64 * train_ratio).ceil() as usize;
    if train_len <= lookback || train_len >= n {
        return Err(EngineError::invalid(format!(
            "forecast: {n} closes are not enough for a {lookback}-day lookback"
        )));
    }

    let scaler = MinMaxScaler::fit(closes)?;
    let scaled = scaler.transform_all(closes);

    let x_train: Vec<Vec<f64>> = (lookback..train_len)
        .map(|i| scaled[i - lookback..i].to_vec())
        .collect();
    let y_train: Vec<f64> = (lookback..train_len).map(|i| scaled[i]).collect();
    let x_test: Vec<Vec<f64>> = (train_len..n)
        .map(|i| scaled[i - lookback..i].to_vec())
        .collect();

    debug!(
        closes = n,
        train_windows = x_train.len(),
        test_windows = x_test.len(),
        lookback,
        "fitting forecast model"
    );

    model.fit(&x_train, &y_train)?;
    let predicted = model.predict(&x_test)?;
    if predicted.len() != x_test.len() {
        return Err(EngineError::invalid(format!(
            "forecast: model returned {} predictions for {} windows",
            predicted.len(),
            x_test.len()
        )));
    }

    Ok(Forecast {
        first_index: train_len,
        predictions: predicted.into_iter().map(|p| scaler.inverse(p)).collect(),
    })
}
