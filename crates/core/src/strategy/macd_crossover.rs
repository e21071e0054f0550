use crate::config::MacdCrossoverConfig;
use crate::domain::recommendation::RecommendationRecord;
use crate::domain::ticker_list::TickerList;
use crate::error::AdvisorError;
use crate::ingest::metrics::{read_price_metrics, MetricParams};
use crate::ingest::provider::MarketDataProvider;
use crate::ingest::types::MacdParams;
use crate::observe::{NoopObserver, RunObserver};
use crate::storage::model::StoredModel;
use crate::strategy::assembler::{assemble_recommendation, RecordDates};
use crate::strategy::Strategy;
use crate::time::business_date::CalendarResolver;
use crate::time::calendar::MarketCalendar;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::Arc;

pub const STRATEGY_NAME: &str = "MACD_CROSSOVER";

/// Calendar days of indicator history requested before the price date.
/// Always spans at least `LOOKBACK_DAYS` sessions.
pub const METRIC_FETCH_WINDOW_DAYS: i64 = 14;

pub struct MacdCrossoverStrategy<C, P> {
    config: MacdCrossoverConfig,
    ticker_list: TickerList,
    resolver: CalendarResolver<C>,
    market_data: P,
    price_date_override: Option<NaiveDate>,
    observer: Arc<dyn RunObserver>,
}

impl<C: MarketCalendar, P: MarketDataProvider> MacdCrossoverStrategy<C, P> {
    pub fn new(
        config: MacdCrossoverConfig,
        ticker_list: TickerList,
        calendar: C,
        market_data: P,
    ) -> Result<Self, AdvisorError> {
        config.validate()?;
        ticker_list.validate()?;
        Ok(Self {
            config,
            ticker_list,
            resolver: CalendarResolver::new(calendar),
            market_data,
            price_date_override: None,
            observer: Arc::new(NoopObserver),
        })
    }

    /// Prices against `date` instead of the business date resolved from `now`.
    pub fn with_price_date(mut self, date: Option<NaiveDate>) -> Self {
        self.price_date_override = date;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    fn price_date(&self, now: DateTime<Utc>) -> Result<NaiveDate, AdvisorError> {
        match self.price_date_override {
            Some(date) => Ok(date),
            None => self.resolver.resolve_business_date(
                now,
                self.config.days_offset,
                self.config.cutover_time,
            ),
        }
    }

    fn metric_params(&self) -> MetricParams {
        MetricParams {
            sma_period: self.config.sma_period,
            macd: MacdParams {
                fast_period: self.config.macd_fast_period,
                slow_period: self.config.macd_slow_period,
                signal_period: self.config.macd_signal_period,
            },
        }
    }
}

impl<C: MarketCalendar, P: MarketDataProvider> Strategy for MacdCrossoverStrategy<C, P> {
    fn name(&self) -> &'static str {
        STRATEGY_NAME
    }

    fn recommendation_object_name(&self) -> &str {
        &self.config.recommendation_object_name
    }

    fn generate(&self, now: DateTime<Utc>) -> Result<RecommendationRecord, AdvisorError> {
        let price_date = self.price_date(now)?;
        let (valid_from, valid_to) = self
            .resolver
            .resolve_validity_window(price_date, self.config.cutover_time)?;
        let start = price_date - Duration::days(METRIC_FETCH_WINDOW_DAYS);
        let params = self.metric_params();

        let dates = RecordDates {
            creation_date: now,
            analysis_start_date: start,
            analysis_end_date: price_date,
            price_date,
            valid_from,
            valid_to,
        };

        assemble_recommendation(
            &self.ticker_list,
            STRATEGY_NAME,
            dates,
            self.observer.as_ref(),
            |ticker| read_price_metrics(&self.market_data, ticker, start, price_date, params),
        )
    }

    fn describe(&self, record: &RecommendationRecord) -> String {
        let mut out = format!(
            "{} recommendation for {} ({}), priced {}, valid {} to {}\n",
            record.strategy_name,
            self.ticker_list.list_name,
            record.security_type,
            record.price_date,
            record.valid_from.to_rfc3339(),
            record.valid_to.to_rfc3339(),
        );
        if record.securities_set.is_empty() {
            out.push_str("  no securities qualified\n");
        }
        for security in &record.securities_set {
            out.push_str(&format!(
                "  {:<8} {:>12.2}\n",
                security.ticker_symbol, security.price
            ));
        }
        out
    }
}
