// ---------------------------------------------------------------------------
// Corporate actions: cash dividends and stock splits
// ---------------------------------------------------------------------------

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day with a dividend, a split, or both.
///
/// A zero column means "none that day".  `stock_splits` is the split ratio
/// (new shares per old share), so a 4-for-1 split is `4.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockAction {
    pub date: NaiveDate,
    pub dividends: f64,
    pub stock_splits: f64,
}

/// Merge dividend and split events into one row per date, oldest first.
///
/// Several dividends on the same day are summed; a second split on the same
/// day compounds the first.
pub fn merge_actions(
    dividends: impl IntoIterator<Item = (NaiveDate, f64)>,
    splits: impl IntoIterator<Item = (NaiveDate, f64)>,
) -> Vec<StockAction> {
    let mut by_date: BTreeMap<NaiveDate, StockAction> = BTreeMap::new();

    for (date, amount) in dividends {
        by_date.entry(date).or_insert_with(|| empty(date)).dividends += amount;
    }
    for (date, ratio) in splits {
        let row = by_date.entry(date).or_insert_with(|| empty(date));
        row.stock_splits = if row.stock_splits == 0.0 {
            ratio
        } else {
            row.stock_splits * ratio
        };
    }

    by_date.into_values().collect()
}

fn empty(date: NaiveDate) -> StockAction {
    StockAction {
        date,
        dividends: 0.0,
        stock_splits: 0.0,
    }
}
