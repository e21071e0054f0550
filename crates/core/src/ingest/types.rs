use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Values keyed by ISO `YYYY-MM-DD` date strings, as the provider returns them.
pub type DatedSeries<T> = BTreeMap<String, T>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdPoint {
    pub macd_line: f64,
    pub signal_line: f64,
    pub macd_histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdParams {
    pub fast_period: u32,
    pub slow_period: u32,
    pub signal_period: u32,
}
