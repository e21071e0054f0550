use serde::{Deserialize, Serialize};

/// Number of sessions the crossover rule looks back over.
pub const LOOKBACK_DAYS: usize = 3;

/// Price and indicator values for one ticker as of one date. Every series
/// is ordered newest first and holds exactly `LOOKBACK_DAYS` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceMetricWindow {
    pub current_price: f64,
    pub sma: [f64; LOOKBACK_DAYS],
    pub macd_line: [f64; LOOKBACK_DAYS],
    pub signal_line: [f64; LOOKBACK_DAYS],
}
