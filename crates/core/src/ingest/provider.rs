use crate::config::Settings;
use crate::error::AdvisorError;
use crate::ingest::types::{DatedSeries, MacdParams, MacdPoint};
use anyhow::Context;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

const RETRY_BASE_BACKOFF: Duration = Duration::from_secs(1);

/// Source of daily close prices and precomputed indicators.
pub trait MarketDataProvider {
    fn provider_name(&self) -> &'static str;

    fn get_close_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DatedSeries<f64>, AdvisorError>;

    fn get_sma(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        period: u32,
    ) -> Result<DatedSeries<f64>, AdvisorError>;

    fn get_macd(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        params: MacdParams,
    ) -> Result<DatedSeries<MacdPoint>, AdvisorError>;
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for &P {
    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }

    fn get_close_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DatedSeries<f64>, AdvisorError> {
        (**self).get_close_prices(ticker, start, end)
    }

    fn get_sma(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        period: u32,
    ) -> Result<DatedSeries<f64>, AdvisorError> {
        (**self).get_sma(ticker, start, end, period)
    }

    fn get_macd(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        params: MacdParams,
    ) -> Result<DatedSeries<MacdPoint>, AdvisorError> {
        (**self).get_macd(ticker, start, end, params)
    }
}

/// Blocking JSON client. Each endpoint answers with a date-keyed object.
#[derive(Debug, Clone)]
pub struct HttpMarketDataProvider {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
    retries: u32,
}

impl HttpMarketDataProvider {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let base_url = settings.require_market_data_base_url()?.to_string();
        let api_key = settings.market_data_api_key.clone();

        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.market_data_timeout_secs))
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            retries: settings.market_data_retries.max(1),
        })
    }

    /// Appends `segments` to the base URL, percent-encoding each one so a
    /// symbol like `BRK/B` stays a single segment.
    fn url(&self, segments: &[&str]) -> Result<Url, AdvisorError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            AdvisorError::validation(format!(
                "MARKET_DATA_BASE_URL {:?} is not a valid URL: {e}",
                self.base_url
            ))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                AdvisorError::validation(format!(
                    "MARKET_DATA_BASE_URL {:?} cannot take a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn headers(&self) -> Result<HeaderMap, AdvisorError> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            let value = HeaderValue::from_str(api_key).map_err(|e| {
                AdvisorError::validation(format!("MARKET_DATA_API_KEY is not a valid header: {e}"))
            })?;
            headers.insert("x-api-key", value);
        }
        Ok(headers)
    }

    fn fetch_once<T: DeserializeOwned>(
        &self,
        url: &Url,
        query: &[(&str, String)],
    ) -> Result<T, FetchFailure> {
        let res = self
            .http
            .get(url.clone())
            .headers(self.headers().map_err(FetchFailure::fatal)?)
            .query(query)
            .send()
            .map_err(|e| FetchFailure::transient(format!("request to {url} failed: {e}")))?;

        let status = res.status();
        let text = res.text().map_err(|e| {
            FetchFailure::transient(format!("failed to read response from {url}: {e}"))
        })?;
        if !status.is_success() {
            let reason = format!("HTTP {status} from {url}: {text}");
            return Err(if is_retryable_status(status) {
                FetchFailure::transient(reason)
            } else {
                FetchFailure::fatal(market_data_error(reason))
            });
        }

        serde_json::from_str::<T>(&text).map_err(|e| {
            FetchFailure::fatal(market_data_error(format!(
                "unexpected response shape from {url}: {e}"
            )))
        })
    }

    fn fetch<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, AdvisorError> {
        let url = self.url(segments)?;
        with_retries(self.retries, RETRY_BASE_BACKOFF, || self.fetch_once(&url, query))
    }
}

/// A failed attempt, tagged with whether repeating it could help.
#[derive(Debug)]
struct FetchFailure {
    error: AdvisorError,
    retryable: bool,
}

impl FetchFailure {
    fn transient(reason: String) -> Self {
        Self {
            error: market_data_error(reason),
            retryable: true,
        }
    }

    fn fatal(error: AdvisorError) -> Self {
        Self {
            error,
            retryable: false,
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Runs `op` up to `attempts` times, backing off exponentially between
/// retryable failures. Non-retryable failures return immediately.
fn with_retries<T>(
    attempts: u32,
    base_backoff: Duration,
    mut op: impl FnMut() -> Result<T, FetchFailure>,
) -> Result<T, AdvisorError> {
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match op() {
            Ok(parsed) => return Ok(parsed),
            Err(failure) if !failure.retryable || attempt >= attempts => {
                return Err(failure.error)
            }
            Err(failure) => {
                let backoff = base_backoff * (1 << (attempt - 1).min(5));
                tracing::warn!(
                    attempt,
                    ?backoff,
                    error = %failure.error,
                    "market data fetch failed; retrying"
                );
                std::thread::sleep(backoff);
            }
        }
    }
}

impl MarketDataProvider for HttpMarketDataProvider {
    fn provider_name(&self) -> &'static str {
        "http_json"
    }

    fn get_close_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DatedSeries<f64>, AdvisorError> {
        self.fetch(&["prices", ticker], &date_range(start, end))
    }

    fn get_sma(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        period: u32,
    ) -> Result<DatedSeries<f64>, AdvisorError> {
        let mut query = date_range(start, end);
        query.push(("period", period.to_string()));
        self.fetch(&["technicals", ticker, "sma"], &query)
    }

    fn get_macd(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        params: MacdParams,
    ) -> Result<DatedSeries<MacdPoint>, AdvisorError> {
        let mut query = date_range(start, end);
        query.push(("fast_period", params.fast_period.to_string()));
        query.push(("slow_period", params.slow_period.to_string()));
        query.push(("signal_period", params.signal_period.to_string()));
        self.fetch(&["technicals", ticker, "macd"], &query)
    }
}

fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<(&'static str, String)> {
    vec![("start_date", start.to_string()), ("end_date", end.to_string())]
}

fn market_data_error(reason: String) -> AdvisorError {
    AdvisorError::MarketData { reason }
}
