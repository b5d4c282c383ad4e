// =============================================================================
// Windowed Linear Regressor
// =============================================================================
//
// Default `SequenceRegressor`: y_hat = b + sum_k w_k * x_k over one trailing
// window, trained with per-sample stochastic gradient descent on squared
// error.  By default it makes a single pass (one epoch, batch size 1) over the
// training windows.
//
// Weights start at 1/L: an untrained model predicts the window mean.
// =============================================================================

use crate::errors::{EngineError, EngineResult};

use super::SequenceRegressor;

pub const DEFAULT_LEARNING_RATE: f64 = 0.01;
pub const DEFAULT_EPOCHS: usize = 1;

#[derive(Debug, Clone)]
pub struct LinearWindowRegressor {
    learning_rate: f64,
    epochs: usize,
    weights: Vec<f64>,
    bias: f64,
}

impl LinearWindowRegressor {
    pub fn new(learning_rate: f64, epochs: usize) -> Self {
        Self {
            learning_rate,
            epochs,
            weights: Vec::new(),
            bias: 0.0,
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.weights.is_empty()
    }

    fn predict_one(&self, window: &[f64]) -> f64 {
        self.bias
            + self
                .weights
                .iter()
                .zip(window)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}

impl Default for LinearWindowRegressor {
    fn default() -> Self {
        Self::new(DEFAULT_LEARNING_RATE, DEFAULT_EPOCHS)
    }
}

impl SequenceRegressor for LinearWindowRegressor {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> EngineResult<()> {
        if x.is_empty() {
            return Err(EngineError::invalid("regressor: no training windows"));
        }
        if x.len() != y.len() {
            return Err(EngineError::invalid(format!(
                "regressor: {} windows but {} targets",
                x.len(),
                y.len()
            )));
        }
        let width = x[0].len();
        if width == 0 || x.iter().any(|w| w.len() != width) {
            return Err(EngineError::invalid("regressor: ragged or empty windows"));
        }
        if self.epochs == 0 || !(self.learning_rate > 0.0) {
            return Err(EngineError::invalid(
                "regressor: epochs and learning rate must be positive",
            ));
        }

        self.weights = vec![1.0 / width as f64; width];
        self.bias = 0.0;

        for _ in 0..self.epochs {
            for (window, &target) in x.iter().zip(y) {
                let err = self.predict_one(window) - target;
                let step = self.learning_rate * err;
                for (w, xi) in self.weights.iter_mut().zip(window) {
                    *w -= step * xi;
                }
                self.bias -= step;
            }
        }

        if self.weights.iter().any(|w| !w.is_finite()) || !self.bias.is_finite() {
            return Err(EngineError::invalid("regressor: training diverged"));
        }
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> EngineResult<Vec<f64>> {
        if !self.is_fitted() {
            return Err(EngineError::invalid("regressor: predict called before fit"));
        }
        if let Some(bad) = x.iter().find(|w| w.len() != self.weights.len()) {
            return Err(EngineError::invalid(format!(
                "regressor: window of length {} (expected {})",
                bad.len(),
                self.weights.len()
            )));
        }
        Ok(x.iter().map(|w| self.predict_one(w)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_before_fit_fails() {
        let m = LinearWindowRegressor::default();
        assert!(m.predict(&[vec![0.5, 0.5]]).is_err());
    }

    #[test]
    fn fit_rejects_mismatched_targets() {
        let mut m = LinearWindowRegressor::default();
        assert!(m.fit(&[vec![0.1, 0.2]], &[0.3, 0.4]).is_err());
        assert!(m.fit(&[], &[]).is_err());
        assert!(m.fit(&[vec![0.1, 0.2], vec![0.1]], &[0.3, 0.4]).is_err());
    }

    #[test]
    fn constant_series_predicts_constant() {
        // Starting as the window mean, a flat series has zero error and the
        // weights never move.
        let x = vec![vec![0.5; 4]; 10];
        let y = vec![0.5; 10];
        let mut m = LinearWindowRegressor::default();
        m.fit(&x, &y).unwrap();
        let p = m.predict(&[vec![0.5; 4]]).unwrap();
        assert!((p[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn training_reduces_error_on_trend() {
        // Next value = last value + 0.01; the mean-of-window start underestimates.
        let series: Vec<f64> = (0..200).map(|i| i as f64 * 0.01).collect();
        let x: Vec<Vec<f64>> = (5..series.len()).map(|i| series[i - 5..i].to_vec()).collect();
        let y: Vec<f64> = (5..series.len()).map(|i| series[i]).collect();

        let untrained_err = {
            let w = &x[100];
            (w.iter().sum::<f64>() / 5.0 - y[100]).abs()
        };

        let mut m = LinearWindowRegressor::new(0.05, 3);
        m.fit(&x, &y).unwrap();
        let p = m.predict(&[x[100].clone()]).unwrap();
        assert!((p[0] - y[100]).abs() < untrained_err);
    }

    #[test]
    fn predict_rejects_wrong_width() {
        let mut m = LinearWindowRegressor::default();
        m.fit(&[vec![0.1, 0.2]], &[0.3]).unwrap();
        assert!(m.predict(&[vec![0.1, 0.2, 0.3]]).is_err());
    }
}
