// =============================================================================
// Shared types used across the Stock Seeker backend
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One `(date, value)` pair handed to the charting layer.  `value` is `None`
/// during an indicator's warm-up period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl SeriesPoint {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self { date, value }
    }
}

/// Zip a date index with an optional-valued series.
pub fn zip_points(dates: &[NaiveDate], values: &[Option<f64>]) -> Vec<SeriesPoint> {
    dates
        .iter()
        .zip(values)
        .map(|(d, v)| SeriesPoint::new(*d, *v))
        .collect()
}

/// Zip a date index with a fully defined series.
pub fn zip_defined(dates: &[NaiveDate], values: &[f64]) -> Vec<SeriesPoint> {
    dates
        .iter()
        .zip(values)
        .map(|(d, v)| SeriesPoint::new(*d, Some(*v)))
        .collect()
}

/// The analyses a user can request from the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    ClosingPrices,
    Volume,
    MovingAverages,
    DailyReturns,
    CorrelationHeatmap,
    DistributionOfDailyChanges,
    PredictedPrices,
    ChaikinOscillator,
    Rsi,
    Macd,
    StockActions,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 11] = [
        Self::ClosingPrices,
        Self::Volume,
        Self::MovingAverages,
        Self::DailyReturns,
        Self::CorrelationHeatmap,
        Self::DistributionOfDailyChanges,
        Self::PredictedPrices,
        Self::ChaikinOscillator,
        Self::Rsi,
        Self::Macd,
        Self::StockActions,
    ];

    /// Human-readable label used in chart titles.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ClosingPrices => "Closing Prices",
            Self::Volume => "Volume",
            Self::MovingAverages => "Moving Averages",
            Self::DailyReturns => "Daily Returns",
            Self::CorrelationHeatmap => "Correlation Heatmap",
            Self::DistributionOfDailyChanges => "Distribution of Daily Changes",
            Self::PredictedPrices => "Predicted Prices",
            Self::ChaikinOscillator => "Chaikin Oscillator",
            Self::Rsi => "RSI",
            Self::Macd => "MACD",
            Self::StockActions => "Stock Actions",
        }
    }

    /// Analyses that produce one combined panel across all symbols.
    pub fn is_cross_sectional(&self) -> bool {
        matches!(self, Self::CorrelationHeatmap)
    }
}

impl std::fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_type_serde_uses_snake_case() {
        let json = serde_json::to_string(&AnalysisType::DistributionOfDailyChanges).unwrap();
        assert_eq!(json, r#""distribution_of_daily_changes""#);
        let back: AnalysisType = serde_json::from_str(r#""chaikin_oscillator""#).unwrap();
        assert_eq!(back, AnalysisType::ChaikinOscillator);
    }

    #[test]
    fn display_uses_label() {
        assert_eq!(AnalysisType::MovingAverages.to_string(), "Moving Averages");
        assert!(AnalysisType::CorrelationHeatmap.is_cross_sectional());
        assert!(!AnalysisType::Rsi.is_cross_sectional());
        assert!(!AnalysisType::StockActions.is_cross_sectional());
    }

    #[test]
    fn stock_actions_is_listed_last() {
        assert_eq!(AnalysisType::ALL.last(), Some(&AnalysisType::StockActions));
        let json = serde_json::to_string(&AnalysisType::StockActions).unwrap();
        assert_eq!(json, r#""stock_actions""#);
    }

    #[test]
    fn zip_helpers_align_by_position() {
        let d1 = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let pts = zip_points(&[d1, d2], &[None, Some(3.0)]);
        assert_eq!(pts[0], SeriesPoint::new(d1, None));
        assert_eq!(pts[1].value, Some(3.0));
        assert_eq!(zip_defined(&[d1], &[1.5])[0].value, Some(1.5));
    }
}
