pub mod metrics;
pub mod provider;
pub mod types;

pub use metrics::{read_price_metrics, MetricParams};
pub use provider::{HttpMarketDataProvider, MarketDataProvider};
pub use types::{DatedSeries, MacdParams, MacdPoint};
