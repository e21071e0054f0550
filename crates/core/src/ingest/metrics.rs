use crate::domain::price_metrics::{PriceMetricWindow, LOOKBACK_DAYS};
use crate::error::AdvisorError;
use crate::ingest::provider::MarketDataProvider;
use crate::ingest::types::{DatedSeries, MacdParams};
use chrono::NaiveDate;
use std::ops::Bound;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricParams {
    pub sma_period: u32,
    pub macd: MacdParams,
}

/// Reads the price on `price_date` plus the `LOOKBACK_DAYS` most recent SMA,
/// MACD and signal values ending on `price_date`. Any gap is a data error
/// for `ticker`.
pub fn read_price_metrics<P: MarketDataProvider + ?Sized>(
    provider: &P,
    ticker: &str,
    start: NaiveDate,
    price_date: NaiveDate,
    params: MetricParams,
) -> Result<PriceMetricWindow, AdvisorError> {
    let date_key = price_date.format("%Y-%m-%d").to_string();

    let prices = provider.get_close_prices(ticker, price_date, price_date)?;
    let current_price = *prices
        .get(&date_key)
        .ok_or_else(|| AdvisorError::data(ticker, format!("no close price for {date_key}")))?;

    let sma_series = provider.get_sma(ticker, start, price_date, params.sma_period)?;
    let sma = latest_window(ticker, "SMA", &sma_series, &date_key, |v| *v)?;

    let macd_series = provider.get_macd(ticker, start, price_date, params.macd)?;
    let macd_line = latest_window(ticker, "MACD", &macd_series, &date_key, |p| p.macd_line)?;
    let signal_line = latest_window(ticker, "signal", &macd_series, &date_key, |p| {
        p.signal_line
    })?;

    Ok(PriceMetricWindow {
        current_price,
        sma,
        macd_line,
        signal_line,
    })
}

fn latest_window<T>(
    ticker: &str,
    series_name: &str,
    series: &DatedSeries<T>,
    date_key: &str,
    value: impl Fn(&T) -> f64,
) -> Result<[f64; LOOKBACK_DAYS], AdvisorError> {
    let newest: Vec<(&String, &T)> = series
        .range::<str, _>((Bound::Unbounded, Bound::Included(date_key)))
        .rev()
        .take(LOOKBACK_DAYS)
        .collect();

    match newest.first() {
        Some((key, _)) if key.as_str() == date_key => {}
        _ => {
            return Err(AdvisorError::data(
                ticker,
                format!("no {series_name} value for {date_key}"),
            ))
        }
    }
    if newest.len() < LOOKBACK_DAYS {
        return Err(AdvisorError::data(
            ticker,
            format!(
                "expected {LOOKBACK_DAYS} {series_name} values up to {date_key}, got {}",
                newest.len()
            ),
        ));
    }

    let mut out = [0.0; LOOKBACK_DAYS];
    for (slot, (_, v)) in out.iter_mut().zip(newest) {
        *slot = value(v);
    }
    Ok(out)
}
