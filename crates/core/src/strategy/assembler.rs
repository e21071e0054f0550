use crate::domain::price_metrics::PriceMetricWindow;
use crate::domain::recommendation::{RecommendationRecord, SecurityRecommendation};
use crate::domain::ticker_list::TickerList;
use crate::error::AdvisorError;
use crate::observe::RunObserver;
use crate::storage::model::StoredModel;
use crate::strategy::classifier::classify_window;
use chrono::{DateTime, NaiveDate, Utc};

/// Timestamps stamped onto a record; resolved by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordDates {
    pub creation_date: DateTime<Utc>,
    pub analysis_start_date: NaiveDate,
    pub analysis_end_date: NaiveDate,
    pub price_date: NaiveDate,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
}

/// Evaluates every ticker in order and keeps the ones classified as buys.
/// The first failing fetch aborts the whole run.
pub fn assemble_recommendation<F>(
    ticker_list: &TickerList,
    strategy_name: &str,
    dates: RecordDates,
    observer: &dyn RunObserver,
    mut fetch: F,
) -> Result<RecommendationRecord, AdvisorError>
where
    F: FnMut(&str) -> Result<PriceMetricWindow, AdvisorError>,
{
    let mut securities_set = Vec::new();
    for ticker in ticker_list.ticker_symbols() {
        let window = fetch(ticker.as_str()).map_err(|e| e.for_ticker(ticker))?;
        let qualifies = classify_window(&window);
        observer.ticker_evaluated(ticker, window.current_price, qualifies);
        if qualifies {
            securities_set.push(SecurityRecommendation {
                ticker_symbol: ticker.clone(),
                price: window.current_price,
            });
        }
    }

    let record = RecommendationRecord {
        creation_date: dates.creation_date,
        analysis_start_date: dates.analysis_start_date,
        analysis_end_date: dates.analysis_end_date,
        valid_from: dates.valid_from,
        valid_to: dates.valid_to,
        price_date: dates.price_date,
        strategy_name: strategy_name.to_string(),
        security_type: ticker_list.list_type.clone(),
        securities_set,
    };
    record.validate()?;
    Ok(record)
}
