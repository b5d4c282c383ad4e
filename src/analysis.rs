// =============================================================================
// Analysis Pipeline: turns a dashboard selection into chart panels
// =============================================================================
//
// One request names a set of symbols, a date range and an analysis type.
// Symbols are fetched and processed one after another in selection order.
// Every symbol gets its own panel; a fetch or computation failure for one
// symbol becomes a message on that panel and never aborts the rest.
//
// The correlation heatmap is the one cross-sectional analysis: all symbols
// are fetched first and a single combined panel is produced.  Stock actions
// skip the bar fetch and tabulate each symbol's dividends and splits.
// =============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{EngineError, EngineResult};
use crate::forecast::{self, LinearWindowRegressor};
use crate::indicators::{
    chaikin_oscillator, correlation_matrix, current_rsi, daily_changes, daily_returns, histogram,
    macd, rolling_mean, rsi, HistogramBin, RsiZone,
};
use crate::market_data::{align_closes, BarSeries, MarketDataProvider, StockAction};
use crate::runtime_config::RuntimeConfig;
use crate::types::{zip_defined, zip_points, AnalysisType, SeriesPoint};

/// Shown when the user submits without choosing a ticker.
pub const NO_SYMBOLS_WARNING: &str = "Please select at least one stock ticker.";
/// Panel message for an empty or failed fetch.
pub const NO_DATA_MESSAGE: &str = "No data available";

// =============================================================================
// Requests
// =============================================================================

/// A dashboard selection: which symbols, which range, which chart.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub symbols: Vec<String>,
    pub analysis_type: AnalysisType,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AnalysisRequest {
    /// Normalised symbol list, or `InvalidInput` when the selection is unusable.
    pub fn validate(&self) -> EngineResult<Vec<String>> {
        validate_selection(&self.symbols, self.start, self.end)
    }
}

/// Symbols and range for the technical summary.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryRequest {
    pub symbols: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SummaryRequest {
    pub fn validate(&self) -> EngineResult<Vec<String>> {
        validate_selection(&self.symbols, self.start, self.end)
    }
}

/// Trim and upper-case tickers, dropping blanks and repeats while keeping the
/// user's order.
fn validate_selection(
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> EngineResult<Vec<String>> {
    let mut cleaned: Vec<String> = Vec::with_capacity(symbols.len());
    for raw in symbols {
        let s = raw.trim().to_ascii_uppercase();
        if !s.is_empty() && !cleaned.contains(&s) {
            cleaned.push(s);
        }
    }
    if cleaned.is_empty() {
        return Err(EngineError::invalid(NO_SYMBOLS_WARNING));
    }
    if start > end {
        return Err(EngineError::invalid(format!(
            "start date {start} is after end date {end}"
        )));
    }
    Ok(cleaned)
}

// =============================================================================
// Chart model
// =============================================================================

/// One named line on a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub name: String,
    pub points: Vec<SeriesPoint>,
}

impl Trace {
    fn new(name: impl Into<String>, points: Vec<SeriesPoint>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }
}

/// Renderer-agnostic chart description.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Chart {
    Line {
        title: String,
        x_title: String,
        y_title: String,
        traces: Vec<Trace>,
    },
    Heatmap {
        title: String,
        labels: Vec<String>,
        matrix: Vec<Vec<Option<f64>>>,
    },
    Histogram {
        title: String,
        bins: Vec<HistogramBin>,
    },
    /// Dividends and splits, one row per date.
    Actions {
        title: String,
        rows: Vec<StockAction>,
    },
}

impl Chart {
    fn line(title: String, y_title: &str, traces: Vec<Trace>) -> Self {
        Self::Line {
            title,
            x_title: "Date".to_string(),
            y_title: y_title.to_string(),
            traces,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelOutcome {
    Chart(Chart),
    Message(String),
}

/// The output slot for one symbol (or, for the heatmap, the whole selection).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub symbol: String,
    pub outcome: PanelOutcome,
}

impl Panel {
    fn chart(symbol: impl Into<String>, chart: Chart) -> Self {
        Self {
            symbol: symbol.into(),
            outcome: PanelOutcome::Chart(chart),
        }
    }

    fn message(symbol: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            outcome: PanelOutcome::Message(message.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub request_id: Uuid,
    pub analysis_type: AnalysisType,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub panels: Vec<Panel>,
}

// =============================================================================
// Pipeline
// =============================================================================

/// Run one analysis over every requested symbol.
///
/// # Errors
/// Only request validation fails the whole call; per-symbol problems are
/// reported inside the panels.
pub async fn run_analysis(
    provider: &dyn MarketDataProvider,
    config: &RuntimeConfig,
    request: &AnalysisRequest,
) -> EngineResult<AnalysisReport> {
    let symbols = request.validate()?;
    let request_id = Uuid::new_v4();

    info!(
        request_id = %request_id,
        analysis = %request.analysis_type,
        symbols = ?symbols,
        start = %request.start,
        end = %request.end,
        "analysis requested"
    );

    let panels = if request.analysis_type.is_cross_sectional() {
        vec![correlation_panel(provider, &symbols, request.start, request.end).await]
    } else {
        let mut panels = Vec::with_capacity(symbols.len());
        for symbol in &symbols {
            let panel = if request.analysis_type == AnalysisType::StockActions {
                actions_panel(provider, symbol, request.start, request.end).await
            } else {
                symbol_panel(provider, config, symbol, request).await
            };
            panels.push(panel);
        }
        panels
    };

    Ok(AnalysisReport {
        request_id,
        analysis_type: request.analysis_type,
        start: request.start,
        end: request.end,
        generated_at: Utc::now(),
        panels,
    })
}

async fn symbol_panel(
    provider: &dyn MarketDataProvider,
    config: &RuntimeConfig,
    symbol: &str,
    request: &AnalysisRequest,
) -> Panel {
    let series = match fetch_non_empty(provider, symbol, request.start, request.end).await {
        Some(series) => series,
        None => return Panel::message(symbol, NO_DATA_MESSAGE),
    };
    match build_chart(&series, request.analysis_type, config) {
        Ok(chart) => Panel::chart(symbol, chart),
        Err(e) => {
            warn!(symbol, analysis = %request.analysis_type, error = %e, "chart failed");
            Panel::message(symbol, e.to_string())
        }
    }
}

/// Dividend and split table for one symbol.  A failed fetch and a symbol
/// without actions in range both read as "no data".
async fn actions_panel(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Panel {
    match provider.fetch_actions(symbol, start, end).await {
        Ok(rows) if !rows.is_empty() => Panel::chart(
            symbol,
            Chart::Actions {
                title: format!("{symbol} Stock Actions"),
                rows,
            },
        ),
        Ok(_) => {
            debug!(symbol, "provider returned no actions");
            Panel::message(symbol, NO_DATA_MESSAGE)
        }
        Err(e) => {
            warn!(symbol, error = %e, "actions fetch failed");
            Panel::message(symbol, NO_DATA_MESSAGE)
        }
    }
}

/// Fetch bars, folding provider errors and empty answers into `None`.
async fn fetch_non_empty(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Option<BarSeries> {
    match provider.fetch_bars(symbol, start, end).await {
        Ok(series) if !series.is_empty() => Some(series),
        Ok(_) => {
            debug!(symbol, "provider returned no bars");
            None
        }
        Err(e) => {
            warn!(symbol, error = %e, "fetch failed");
            None
        }
    }
}

/// Build the per-symbol chart for `analysis`.
pub fn build_chart(
    series: &BarSeries,
    analysis: AnalysisType,
    config: &RuntimeConfig,
) -> EngineResult<Chart> {
    let p = &config.indicators;
    let sym = series.symbol.as_str();
    let dates = series.dates();
    let closes = series.closes();

    let chart = match analysis {
        AnalysisType::ClosingPrices => Chart::line(
            format!("{sym} Closing Prices"),
            "Price",
            vec![Trace::new("Close", zip_defined(&dates, &closes))],
        ),

        AnalysisType::Volume => Chart::line(
            format!("{sym} Volume"),
            "Volume",
            vec![Trace::new("Volume", zip_defined(&dates, &series.volumes()))],
        ),

        AnalysisType::MovingAverages => {
            let short = rolling_mean(&closes, p.ma_short)?;
            let long = rolling_mean(&closes, p.ma_long)?;
            Chart::line(
                format!("{sym} Moving Averages"),
                "Price",
                vec![
                    Trace::new("Close", zip_defined(&dates, &closes)),
                    Trace::new(format!("{}-Day MA", p.ma_short), zip_points(&dates, &short)),
                    Trace::new(format!("{}-Day MA", p.ma_long), zip_points(&dates, &long)),
                ],
            )
        }

        AnalysisType::DailyReturns => Chart::line(
            format!("{sym} Daily Returns"),
            "Daily Return",
            vec![Trace::new(
                "Daily Return",
                zip_points(&dates, &daily_returns(&closes)),
            )],
        ),

        AnalysisType::DistributionOfDailyChanges => Chart::Histogram {
            title: format!("{sym} Distribution of Daily Changes"),
            bins: histogram(&daily_changes(&closes), p.histogram_bins)?,
        },

        AnalysisType::PredictedPrices => {
            let f = &config.forecast;
            let mut model = LinearWindowRegressor::new(f.learning_rate, f.epochs);
            let result = forecast::forecast(&closes, f.lookback, f.train_ratio, &mut model)?;
            let test_dates = &dates[result.first_index..];
            Chart::line(
                format!("{sym} - Predicted Prices"),
                "Price",
                vec![
                    Trace::new(
                        "Actual Price",
                        zip_defined(test_dates, &closes[result.first_index..]),
                    ),
                    Trace::new("Predicted Price", zip_defined(test_dates, &result.predictions)),
                ],
            )
        }

        AnalysisType::ChaikinOscillator => {
            let osc = chaikin_oscillator(&series.bars, p.chaikin_short, p.chaikin_long)?;
            Chart::line(
                format!("{sym} Chaikin Oscillator"),
                "Price/Chaikin Oscillator",
                vec![
                    Trace::new("Close", zip_defined(&dates, &closes)),
                    Trace::new("Chaikin Oscillator", zip_defined(&dates, &osc)),
                ],
            )
        }

        AnalysisType::Rsi => Chart::line(
            format!("{sym} RSI"),
            "RSI",
            vec![Trace::new("RSI", zip_points(&dates, &rsi(&closes, p.rsi_window)?))],
        ),

        AnalysisType::Macd => {
            let m = macd(&closes, p.macd_short, p.macd_long, p.macd_signal)?;
            Chart::line(
                format!("{sym} MACD"),
                "MACD",
                vec![
                    Trace::new("MACD", zip_defined(&dates, &m.macd)),
                    Trace::new("Signal Line", zip_defined(&dates, &m.signal)),
                ],
            )
        }

        AnalysisType::CorrelationHeatmap => {
            return Err(EngineError::invalid(
                "correlation heatmap spans all symbols and has no per-symbol chart",
            ))
        }

        AnalysisType::StockActions => {
            return Err(EngineError::invalid(
                "stock actions are tabulated from provider events, not bars",
            ))
        }
    };

    Ok(chart)
}

/// Fetch every symbol, then correlate closes over the shared dates.
async fn correlation_panel(
    provider: &dyn MarketDataProvider,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Panel {
    let label = symbols.join(", ");

    let mut fetched = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        if let Some(series) = fetch_non_empty(provider, symbol, start, end).await {
            fetched.push(series);
        }
    }
    if fetched.is_empty() {
        return Panel::message(label, NO_DATA_MESSAGE);
    }

    let (_, columns) = align_closes(&fetched);
    match correlation_matrix(&columns) {
        Ok(matrix) => Panel::chart(
            label,
            Chart::Heatmap {
                title: AnalysisType::CorrelationHeatmap.label().to_string(),
                labels: fetched.iter().map(|s| s.symbol.clone()).collect(),
                matrix,
            },
        ),
        Err(e) => Panel::message(label, e.to_string()),
    }
}

// =============================================================================
// Technical summary
// =============================================================================

/// Position of the MACD line relative to its signal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MacdCrossover {
    Bullish,
    Bearish,
}

impl MacdCrossover {
    pub fn from_lines(macd: f64, signal: f64) -> Self {
        if macd > signal {
            Self::Bullish
        } else {
            Self::Bearish
        }
    }
}

/// Latest readings for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalSummary {
    pub as_of: NaiveDate,
    pub close: f64,
    /// `None` until enough history exists for one full RSI window.
    pub rsi: Option<f64>,
    pub rsi_zone: Option<RsiZone>,
    pub macd: f64,
    pub signal: f64,
    pub crossover: MacdCrossover,
    pub chaikin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryOutcome {
    Summary(TechnicalSummary),
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryPanel {
    pub symbol: String,
    pub outcome: SummaryOutcome,
}

pub fn summarize(series: &BarSeries, config: &RuntimeConfig) -> EngineResult<TechnicalSummary> {
    let p = &config.indicators;
    let last = series
        .last()
        .ok_or_else(|| EngineError::invalid(format!("{}: no bars to summarise", series.symbol)))?;
    let closes = series.closes();

    let rsi_now = current_rsi(&closes, p.rsi_window)?;
    let lines = macd(&closes, p.macd_short, p.macd_long, p.macd_signal)?;
    let (macd_now, signal_now) = lines
        .last()
        .ok_or_else(|| EngineError::invalid("macd: empty output"))?;
    let osc = chaikin_oscillator(&series.bars, p.chaikin_short, p.chaikin_long)?;
    let chaikin_now = osc
        .last()
        .copied()
        .ok_or_else(|| EngineError::invalid("chaikin: empty output"))?;

    Ok(TechnicalSummary {
        as_of: last.date,
        close: last.close,
        rsi: rsi_now.map(|(v, _)| v),
        rsi_zone: rsi_now.map(|(_, z)| z),
        macd: macd_now,
        signal: signal_now,
        crossover: MacdCrossover::from_lines(macd_now, signal_now),
        chaikin: chaikin_now,
    })
}

/// Technical summary for every requested symbol, in selection order.
pub async fn run_summary(
    provider: &dyn MarketDataProvider,
    config: &RuntimeConfig,
    request: &SummaryRequest,
) -> EngineResult<Vec<SummaryPanel>> {
    let symbols = request.validate()?;
    info!(
        symbols = ?symbols,
        start = %request.start,
        end = %request.end,
        "summary requested"
    );

    let mut panels = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let outcome = match fetch_non_empty(provider, &symbol, request.start, request.end).await {
            Some(series) => match summarize(&series, config) {
                Ok(summary) => SummaryOutcome::Summary(summary),
                Err(e) => SummaryOutcome::Message(e.to_string()),
            },
            None => SummaryOutcome::Message(NO_DATA_MESSAGE.to_string()),
        };
        panels.push(SummaryPanel { symbol, outcome });
    }
    Ok(panels)
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::market_data::Bar;

    /// Serves canned bars and actions; unknown symbols fail as upstream
    /// errors.
    struct StubProvider {
        data: HashMap<String, Vec<Bar>>,
        actions: HashMap<String, Vec<StockAction>>,
        calls: Mutex<Vec<String>>,
    }

    impl StubProvider {
        fn new(entries: Vec<(&str, Vec<Bar>)>) -> Self {
            Self {
                data: entries
                    .into_iter()
                    .map(|(s, b)| (s.to_string(), b))
                    .collect(),
                actions: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with_actions(mut self, symbol: &str, rows: Vec<StockAction>) -> Self {
            self.actions.insert(symbol.to_string(), rows);
            self
        }
    }

    #[async_trait]
    impl MarketDataProvider for StubProvider {
        async fn fetch_bars(
            &self,
            symbol: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> EngineResult<BarSeries> {
            self.calls.lock().unwrap().push(symbol.to_string());
            match self.data.get(symbol) {
                Some(bars) => Ok(BarSeries::new(
                    symbol,
                    bars.iter()
                        .filter(|b| b.date >= start && b.date <= end)
                        .copied()
                        .collect(),
                )),
                None => Err(EngineError::upstream(symbol, "HTTP 404")),
            }
        }

        async fn fetch_actions(
            &self,
            symbol: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> EngineResult<Vec<StockAction>> {
            self.calls.lock().unwrap().push(symbol.to_string());
            if !self.data.contains_key(symbol) {
                return Err(EngineError::rejected(symbol, "Not Found: delisted"));
            }
            Ok(self
                .actions
                .get(symbol)
                .map(|rows| {
                    rows.iter()
                        .filter(|a| a.date >= start && a.date <= end)
                        .copied()
                        .collect()
                })
                .unwrap_or_default())
        }
    }

    fn day0() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn bars(n: usize, base: f64, slope: f64) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let c = base + slope * i as f64 + (i as f64 * 0.3).sin() * 2.0;
                Bar::new(
                    day0() + chrono::Duration::days(i as i64),
                    c - 0.5,
                    c + 1.5,
                    c - 1.5,
                    c,
                    1_000_000.0 + 1_000.0 * i as f64,
                )
            })
            .collect()
    }

    fn request(symbols: &[&str], analysis_type: AnalysisType) -> AnalysisRequest {
        AnalysisRequest {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            analysis_type,
            start: day0(),
            end: day0() + chrono::Duration::days(365),
        }
    }

    fn line_traces(panel: &Panel) -> &[Trace] {
        match &panel.outcome {
            PanelOutcome::Chart(Chart::Line { traces, .. }) => traces,
            other => panic!("expected line chart, got {other:?}"),
        }
    }

    #[test]
    fn empty_selection_is_rejected_with_warning() {
        let req = request(&["  ", ""], AnalysisType::Volume);
        assert_eq!(
            req.validate().unwrap_err(),
            EngineError::InvalidInput(NO_SYMBOLS_WARNING.into())
        );
    }

    #[test]
    fn selection_is_normalised_in_order() {
        let req = request(&[" nvda", "AAPL", "nvda"], AnalysisType::Volume);
        assert_eq!(req.validate().unwrap(), vec!["NVDA", "AAPL"]);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut req = request(&["AAPL"], AnalysisType::Volume);
        req.end = day0() - chrono::Duration::days(1);
        assert!(matches!(req.validate(), Err(EngineError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn failing_symbol_does_not_abort_others() {
        let provider = StubProvider::new(vec![
            ("AAPL", bars(80, 100.0, 0.2)),
            ("META", bars(80, 300.0, -0.1)),
        ]);
        let cfg = RuntimeConfig::default();
        let req = request(&["AAPL", "ZZZZ", "META"], AnalysisType::ClosingPrices);
        let report = run_analysis(&provider, &cfg, &req).await.unwrap();

        assert_eq!(report.panels.len(), 3);
        assert_eq!(report.panels[0].symbol, "AAPL");
        assert_eq!(report.panels[1], Panel::message("ZZZZ", NO_DATA_MESSAGE));
        assert_eq!(line_traces(&report.panels[2])[0].points.len(), 80);
        assert_eq!(*provider.calls.lock().unwrap(), vec!["AAPL", "ZZZZ", "META"]);
    }

    #[tokio::test]
    async fn empty_range_reports_no_data() {
        let provider = StubProvider::new(vec![("AAPL", bars(10, 100.0, 0.0))]);
        let mut req = request(&["AAPL"], AnalysisType::Rsi);
        req.start = day0() + chrono::Duration::days(100);
        req.end = day0() + chrono::Duration::days(120);
        let report = run_analysis(&provider, &RuntimeConfig::default(), &req).await.unwrap();
        assert_eq!(report.panels, vec![Panel::message("AAPL", NO_DATA_MESSAGE)]);
    }

    #[tokio::test]
    async fn moving_averages_have_warm_up_gaps() {
        let provider = StubProvider::new(vec![("AAPL", bars(60, 100.0, 0.5))]);
        let req = request(&["AAPL"], AnalysisType::MovingAverages);
        let report = run_analysis(&provider, &RuntimeConfig::default(), &req)
            .await
            .unwrap();
        let traces = line_traces(&report.panels[0]);
        assert_eq!(traces[1].name, "20-Day MA");
        assert!(traces[1].points[18].value.is_none());
        assert!(traces[1].points[19].value.is_some());
        assert!(traces[2].points[48].value.is_none());
        assert!(traces[2].points[49].value.is_some());
    }

    #[tokio::test]
    async fn rsi_and_macd_panels_align_with_dates() {
        let provider = StubProvider::new(vec![("NVDA", bars(40, 50.0, 0.3))]);
        let cfg = RuntimeConfig::default();

        let req = request(&["NVDA"], AnalysisType::Rsi);
        let report = run_analysis(&provider, &cfg, &req).await.unwrap();
        let rsi_points = &line_traces(&report.panels[0])[0].points;
        assert_eq!(rsi_points.len(), 40);
        assert!(rsi_points[13].value.is_none());
        assert!(rsi_points[14].value.is_some());

        let req = request(&["NVDA"], AnalysisType::Macd);
        let report = run_analysis(&provider, &cfg, &req).await.unwrap();
        let traces = line_traces(&report.panels[0]);
        assert_eq!(traces[0].name, "MACD");
        assert_eq!(traces[1].name, "Signal Line");
        assert_eq!(traces[0].points[0].value, Some(0.0));
    }

    #[tokio::test]
    async fn chaikin_panel_overlays_close() {
        let provider = StubProvider::new(vec![("NFLX", bars(30, 400.0, 1.0))]);
        let req = request(&["NFLX"], AnalysisType::ChaikinOscillator);
        let report = run_analysis(&provider, &RuntimeConfig::default(), &req)
            .await
            .unwrap();
        match &report.panels[0].outcome {
            PanelOutcome::Chart(Chart::Line { title, y_title, traces, .. }) => {
                assert_eq!(title, "NFLX Chaikin Oscillator");
                assert_eq!(y_title, "Price/Chaikin Oscillator");
                assert_eq!(traces[1].points.len(), 30);
                assert!(traces[1].points.iter().all(|p| p.value.unwrap().is_finite()));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn correlation_heatmap_is_one_panel() {
        let provider = StubProvider::new(vec![
            ("AAPL", bars(50, 100.0, 0.5)),
            ("META", bars(50, 200.0, 1.0)),
        ]);
        let req = request(&["AAPL", "META", "ZZZZ"], AnalysisType::CorrelationHeatmap);
        let report = run_analysis(&provider, &RuntimeConfig::default(), &req)
            .await
            .unwrap();
        assert_eq!(report.panels.len(), 1);
        match &report.panels[0].outcome {
            PanelOutcome::Chart(Chart::Heatmap { labels, matrix, .. }) => {
                assert_eq!(labels, &vec!["AAPL".to_string(), "META".to_string()]);
                assert_eq!(matrix.len(), 2);
                let r = matrix[0][1].unwrap();
                assert!(r > 0.9 && r <= 1.0 + 1e-12);
                assert_eq!(matrix[0][1], matrix[1][0]);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn forecast_needs_enough_history() {
        let provider = StubProvider::new(vec![
            ("AAPL", bars(120, 100.0, 0.2)),
            ("META", bars(30, 100.0, 0.2)),
        ]);
        let req = request(&["AAPL", "META"], AnalysisType::PredictedPrices);
        let report = run_analysis(&provider, &RuntimeConfig::default(), &req)
            .await
            .unwrap();

        let traces = line_traces(&report.panels[0]);
        assert_eq!(traces[0].name, "Actual Price");
        let predicted = traces[1].points.len();
        assert!((6..=7).contains(&predicted));
        assert_eq!(traces[0].points.len(), predicted);
        assert_eq!(traces[0].points[0].date, traces[1].points[0].date);
        assert_eq!(
            traces[1].points.last().unwrap().date,
            day0() + chrono::Duration::days(119)
        );

        assert!(matches!(
            &report.panels[1].outcome,
            PanelOutcome::Message(m) if m.contains("not enough")
        ));
    }

    #[tokio::test]
    async fn distribution_uses_configured_bins() {
        let provider = StubProvider::new(vec![("AAPL", bars(200, 100.0, 0.1))]);
        let mut cfg = RuntimeConfig::default();
        cfg.indicators.histogram_bins = 10;
        let req = request(&["AAPL"], AnalysisType::DistributionOfDailyChanges);
        let report = run_analysis(&provider, &cfg, &req).await.unwrap();
        match &report.panels[0].outcome {
            PanelOutcome::Chart(Chart::Histogram { bins, .. }) => {
                assert_eq!(bins.len(), 10);
                assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 199);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    fn action(days: i64, dividends: f64, stock_splits: f64) -> StockAction {
        StockAction {
            date: day0() + chrono::Duration::days(days),
            dividends,
            stock_splits,
        }
    }

    #[tokio::test]
    async fn stock_actions_are_tabulated_per_symbol() {
        let provider = StubProvider::new(vec![
            ("AAPL", bars(10, 100.0, 0.0)),
            ("NVDA", bars(10, 100.0, 0.0)),
        ])
        .with_actions("AAPL", vec![action(40, 0.24, 0.0), action(130, 0.25, 0.0)])
        .with_actions("NVDA", vec![action(160, 0.0, 10.0)]);

        let req = request(&["AAPL", "NVDA"], AnalysisType::StockActions);
        let report = run_analysis(&provider, &RuntimeConfig::default(), &req)
            .await
            .unwrap();

        assert_eq!(report.panels.len(), 2);
        match &report.panels[0].outcome {
            PanelOutcome::Chart(Chart::Actions { title, rows }) => {
                assert_eq!(title, "AAPL Stock Actions");
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0].dividends, 0.24);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        match &report.panels[1].outcome {
            PanelOutcome::Chart(Chart::Actions { rows, .. }) => {
                assert_eq!(rows[0].stock_splits, 10.0);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_actions_in_range_reports_no_data() {
        let provider = StubProvider::new(vec![
            ("AAPL", bars(10, 100.0, 0.0)),
            ("META", bars(10, 100.0, 0.0)),
        ])
        .with_actions("AAPL", vec![action(400, 0.24, 0.0)]);

        let req = request(&["AAPL", "META", "ZZZZ"], AnalysisType::StockActions);
        let report = run_analysis(&provider, &RuntimeConfig::default(), &req)
            .await
            .unwrap();

        assert_eq!(
            report.panels,
            vec![
                Panel::message("AAPL", NO_DATA_MESSAGE),
                Panel::message("META", NO_DATA_MESSAGE),
                Panel::message("ZZZZ", NO_DATA_MESSAGE),
            ]
        );
        assert_eq!(*provider.calls.lock().unwrap(), vec!["AAPL", "META", "ZZZZ"]);
    }

    #[test]
    fn stock_actions_have_no_bar_chart() {
        let series = BarSeries::new("AAPL", bars(5, 100.0, 1.0));
        let err = build_chart(&series, AnalysisType::StockActions, &RuntimeConfig::default());
        assert!(matches!(err, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn actions_chart_serialises_rows() {
        let chart = Chart::Actions {
            title: "AAPL Stock Actions".into(),
            rows: vec![action(0, 0.24, 0.0)],
        };
        let v = serde_json::to_value(&chart).unwrap();
        assert_eq!(v["kind"], "actions");
        assert_eq!(v["rows"][0]["date"], "2024-01-01");
        assert_eq!(v["rows"][0]["dividends"], 0.24);
        assert_eq!(v["rows"][0]["stock_splits"], 0.0);
    }

    #[tokio::test]
    async fn summary_reports_latest_readings() {
        let provider = StubProvider::new(vec![("AAPL", bars(60, 100.0, 0.5))]);
        let req = SummaryRequest {
            symbols: vec!["AAPL".into(), "ZZZZ".into()],
            start: day0(),
            end: day0() + chrono::Duration::days(365),
        };
        let panels = run_summary(&provider, &RuntimeConfig::default(), &req).await.unwrap();
        assert_eq!(panels.len(), 2);

        match &panels[0].outcome {
            SummaryOutcome::Summary(s) => {
                let series = BarSeries::new("AAPL", bars(60, 100.0, 0.5));
                assert_eq!(s.as_of, series.last().unwrap().date);
                assert_eq!(s.close, series.last().unwrap().close);
                let r = s.rsi.unwrap();
                assert!((0.0..=100.0).contains(&r));
                assert_eq!(s.rsi_zone, Some(RsiZone::from_value(r)));
                assert_eq!(s.crossover, MacdCrossover::from_lines(s.macd, s.signal));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(panels[1].outcome, SummaryOutcome::Message(NO_DATA_MESSAGE.into()));
    }

    #[test]
    fn short_history_summary_has_no_rsi() {
        let series = BarSeries::new("AAPL", bars(5, 100.0, 1.0));
        let s = summarize(&series, &RuntimeConfig::default()).unwrap();
        assert!(s.rsi.is_none());
        assert!(s.rsi_zone.is_none());
    }

    #[test]
    fn crossover_direction() {
        assert_eq!(MacdCrossover::from_lines(1.0, 0.5), MacdCrossover::Bullish);
        assert_eq!(MacdCrossover::from_lines(0.5, 0.5), MacdCrossover::Bearish);
    }

    #[test]
    fn chart_serialises_with_kind_tag() {
        let chart = Chart::Histogram {
            title: "t".into(),
            bins: vec![],
        };
        let v = serde_json::to_value(PanelOutcome::Chart(chart)).unwrap();
        assert_eq!(v["chart"]["kind"], "histogram");
    }
}
