use crate::errors::{EngineError, EngineResult};

/// Linear rescaling of a series into `[0, 1]`.
///
/// A constant series has zero span; it maps to `0.0` and inverts back to the
/// constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    pub fn fit(values: &[f64]) -> EngineResult<Self> {
        if values.is_empty() {
            return Err(EngineError::invalid("scaler: empty series"));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::invalid("scaler: non-finite value"));
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok(Self { min, max })
    }

    fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn transform(&self, value: f64) -> f64 {
        let span = self.span();
        if span == 0.0 {
            0.0
        } else {
            (value - self.min) / span
        }
    }

    pub fn inverse(&self, scaled: f64) -> f64 {
        scaled * self.span() + self.min
    }

    pub fn transform_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| self.transform(*v)).collect()
    }
}
