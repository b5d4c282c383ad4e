pub mod actions;
pub mod bar;
pub mod provider;
pub mod yahoo;

// Re-export the core types for convenient access (e.g. `use crate::market_data::Bar`).
pub use actions::StockAction;
pub use bar::{align_closes, Bar, BarSeries};
pub use provider::{MarketDataProvider, RetryingProvider};
pub use yahoo::YahooChartProvider;
