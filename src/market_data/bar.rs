use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// One trading day of OHLCV data.
///
/// `low <= open, close <= high` is expected but not enforced; the indicator
/// engine tolerates bars that violate it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// True when every price and the volume are finite.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }
}

/// Daily bars for one symbol, oldest first, one row per trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }
}

// ---------------------------------------------------------------------------
// Multi-symbol alignment
// ---------------------------------------------------------------------------

/// Outer-join the close columns of several series on date.
///
/// Returns the sorted union of dates and, per input series, a column with
/// `None` wherever that symbol has no bar for the date.
pub fn align_closes(series: &[BarSeries]) -> (Vec<NaiveDate>, Vec<Vec<Option<f64>>>) {
    let mut table: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();

    for (col, s) in series.iter().enumerate() {
        for bar in &s.bars {
            let row = table
                .entry(bar.date)
                .or_insert_with(|| vec![None; series.len()]);
            row[col] = Some(bar.close);
        }
    }

    let dates: Vec<NaiveDate> = table.keys().copied().collect();
    let mut columns = vec![Vec::with_capacity(dates.len()); series.len()];
    for row in table.into_values() {
        for (col, value) in row.into_iter().enumerate() {
            columns[col].push(value);
        }
    }

    (dates, columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn bar(d: u32, close: f64) -> Bar {
        Bar::new(day(d), close, close + 1.0, close - 1.0, close, 1_000.0)
    }

    #[test]
    fn column_accessors_follow_bar_order() {
        let s = BarSeries::new("AAPL", vec![bar(1, 10.0), bar(2, 11.0), bar(4, 12.5)]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.closes(), vec![10.0, 11.0, 12.5]);
        assert_eq!(s.dates(), vec![day(1), day(2), day(4)]);
        assert_eq!(s.volumes(), vec![1_000.0; 3]);
        assert_eq!(s.last().map(|b| b.close), Some(12.5));
    }

    #[test]
    fn non_finite_bar_detected() {
        let mut b = bar(1, 10.0);
        assert!(b.is_finite());
        b.volume = f64::NAN;
        assert!(!b.is_finite());
    }

    #[test]
    fn align_closes_outer_joins_on_date() {
        let a = BarSeries::new("A", vec![bar(1, 1.0), bar(2, 2.0), bar(3, 3.0)]);
        let b = BarSeries::new("B", vec![bar(2, 20.0), bar(4, 40.0)]);

        let (dates, cols) = align_closes(&[a, b]);

        assert_eq!(dates, vec![day(1), day(2), day(3), day(4)]);
        assert_eq!(cols[0], vec![Some(1.0), Some(2.0), Some(3.0), None]);
        assert_eq!(cols[1], vec![None, Some(20.0), None, Some(40.0)]);
    }

    #[test]
    fn align_closes_empty_input() {
        let (dates, cols) = align_closes(&[]);
        assert!(dates.is_empty());
        assert!(cols.is_empty());
    }
}
