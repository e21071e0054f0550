use crate::error::AdvisorError;
use anyhow::Context;
use chrono::NaiveTime;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_OBJECT_STORE_ROOT: &str = "./object-store";
const DEFAULT_SEED_DATA_DIR: &str = "./seed-data";
const DEFAULT_DATA_BUCKET: &str = "{app_ns}-stockadvisor-data";
const DEFAULT_MARKET_DATA_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MARKET_DATA_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct Settings {
    pub sentry_dsn: Option<String>,
    pub market_data_base_url: Option<String>,
    pub market_data_api_key: Option<String>,
    pub market_data_timeout_secs: u64,
    /// Total attempts per request, at least 1.
    pub market_data_retries: u32,
    pub object_store_root: PathBuf,
    pub seed_data_dir: PathBuf,
    pub data_bucket: String,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |key: &str| {
            var(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let market_data_retries =
            parse_value("MARKET_DATA_RETRIES", non_empty("MARKET_DATA_RETRIES"))?
                .unwrap_or(DEFAULT_MARKET_DATA_RETRIES);
        if market_data_retries == 0 {
            return Err(AdvisorError::validation("MARKET_DATA_RETRIES must be >= 1").into());
        }

        Ok(Self {
            sentry_dsn: var("SENTRY_DSN"),
            market_data_base_url: var("MARKET_DATA_BASE_URL"),
            market_data_api_key: var("MARKET_DATA_API_KEY"),
            market_data_timeout_secs: parse_value(
                "MARKET_DATA_TIMEOUT_SECS",
                non_empty("MARKET_DATA_TIMEOUT_SECS"),
            )?
            .unwrap_or(DEFAULT_MARKET_DATA_TIMEOUT_SECS),
            market_data_retries,
            object_store_root: var("OBJECT_STORE_ROOT")
                .unwrap_or_else(|| DEFAULT_OBJECT_STORE_ROOT.to_string())
                .into(),
            seed_data_dir: var("SEED_DATA_DIR")
                .unwrap_or_else(|| DEFAULT_SEED_DATA_DIR.to_string())
                .into(),
            data_bucket: non_empty("DATA_BUCKET")
                .unwrap_or_else(|| DEFAULT_DATA_BUCKET.to_string()),
        })
    }

    pub fn require_market_data_base_url(&self) -> anyhow::Result<&str> {
        self.market_data_base_url
            .as_deref()
            .context("MARKET_DATA_BASE_URL is required")
    }

    /// Bucket holding every persisted model for one application namespace.
    pub fn data_bucket_name(&self, app_ns: &str) -> String {
        self.data_bucket.replace("{app_ns}", app_ns)
    }
}

/// Parameters of the MACD crossover strategy. Built once by the caller and
/// handed to the strategy; the strategy never reads configuration itself.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdCrossoverConfig {
    pub ticker_list_object_name: String,
    pub recommendation_object_name: String,
    /// Positive values look further into the past.
    pub days_offset: i64,
    /// UTC time after which a session's EOD data is considered available.
    pub cutover_time: NaiveTime,
    pub sma_period: u32,
    pub macd_fast_period: u32,
    pub macd_slow_period: u32,
    pub macd_signal_period: u32,
}

impl Default for MacdCrossoverConfig {
    fn default() -> Self {
        Self {
            ticker_list_object_name: "djia30.json".to_string(),
            recommendation_object_name: "macd-crossover-recommendation.json".to_string(),
            days_offset: 0,
            cutover_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or_default(),
            sma_period: 50,
            macd_fast_period: 12,
            macd_slow_period: 26,
            macd_signal_period: 9,
        }
    }
}

impl MacdCrossoverConfig {
    pub fn from_env() -> Result<Self, AdvisorError> {
        let mut out = Self::default();

        if let Some(s) = env_value("MACD_TICKER_LIST") {
            out.ticker_list_object_name = s;
        }
        if let Some(s) = env_value("MACD_RECOMMENDATION_OBJECT") {
            out.recommendation_object_name = s;
        }
        if let Some(n) = env_parsed("MACD_DAYS_OFFSET")? {
            out.days_offset = n;
        }
        if let Some(s) = env_value("MACD_CUTOVER_TIME") {
            out.cutover_time = NaiveTime::parse_from_str(&s, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M:%S"))
                .map_err(|e| {
                    AdvisorError::validation(format!("MACD_CUTOVER_TIME={s:?} is not HH:MM: {e}"))
                })?;
        }
        if let Some(n) = env_parsed("MACD_SMA_PERIOD")? {
            out.sma_period = n;
        }
        if let Some(n) = env_parsed("MACD_FAST_PERIOD")? {
            out.macd_fast_period = n;
        }
        if let Some(n) = env_parsed("MACD_SLOW_PERIOD")? {
            out.macd_slow_period = n;
        }
        if let Some(n) = env_parsed("MACD_SIGNAL_PERIOD")? {
            out.macd_signal_period = n;
        }

        out.validate()?;
        Ok(out)
    }

    pub fn validate(&self) -> Result<(), AdvisorError> {
        if self.ticker_list_object_name.trim().is_empty() {
            return Err(AdvisorError::validation("ticker list object name must be non-empty"));
        }
        if self.recommendation_object_name.trim().is_empty() {
            return Err(AdvisorError::validation(
                "recommendation object name must be non-empty",
            ));
        }
        let periods = [
            ("sma_period", self.sma_period),
            ("macd_fast_period", self.macd_fast_period),
            ("macd_slow_period", self.macd_slow_period),
            ("macd_signal_period", self.macd_signal_period),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(AdvisorError::validation(format!("{name} must be > 0")));
            }
        }
        if self.macd_fast_period >= self.macd_slow_period {
            return Err(AdvisorError::validation(format!(
                "macd_fast_period ({}) must be below macd_slow_period ({})",
                self.macd_fast_period, self.macd_slow_period
            )));
        }
        Ok(())
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parsed<T>(key: &str) -> Result<Option<T>, AdvisorError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, env_value(key))
}

fn parse_value<T>(key: &str, value: Option<String>) -> Result<Option<T>, AdvisorError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|s| {
            s.parse::<T>()
                .map_err(|e| AdvisorError::validation(format!("{key}={s:?}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        MacdCrossoverConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_zero_period() {
        let cfg = MacdCrossoverConfig {
            sma_period: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(AdvisorError::Validation { .. })));
    }

    #[test]
    fn rejects_fast_not_below_slow() {
        let cfg = MacdCrossoverConfig {
            macd_fast_period: 26,
            macd_slow_period: 26,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bucket_name_substitutes_namespace() {
        let settings = Settings {
            sentry_dsn: None,
            market_data_base_url: None,
            market_data_api_key: None,
            market_data_timeout_secs: DEFAULT_MARKET_DATA_TIMEOUT_SECS,
            market_data_retries: DEFAULT_MARKET_DATA_RETRIES,
            object_store_root: PathBuf::from("/tmp/store"),
            seed_data_dir: PathBuf::from("/tmp/seed"),
            data_bucket: DEFAULT_DATA_BUCKET.to_string(),
        };
        assert_eq!(settings.data_bucket_name("sa"), "sa-stockadvisor-data");
    }

    fn settings_from(vars: &[(&str, &str)]) -> anyhow::Result<Settings> {
        let vars: std::collections::HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn market_data_tuning_defaults_when_unset() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.market_data_timeout_secs, 30);
        assert_eq!(settings.market_data_retries, 3);
        assert_eq!(settings.data_bucket, DEFAULT_DATA_BUCKET);
    }

    #[test]
    fn market_data_tuning_reads_numbers() {
        let settings =
            settings_from(&[("MARKET_DATA_TIMEOUT_SECS", " 5 "), ("MARKET_DATA_RETRIES", "1")])
                .unwrap();
        assert_eq!(settings.market_data_timeout_secs, 5);
        assert_eq!(settings.market_data_retries, 1);
    }

    #[test]
    fn rejects_non_numeric_market_data_tuning() {
        for vars in [
            [("MARKET_DATA_RETRIES", "three")],
            [("MARKET_DATA_TIMEOUT_SECS", "abc")],
            [("MARKET_DATA_RETRIES", "0")],
        ] {
            let err = settings_from(&vars).unwrap_err();
            assert!(
                matches!(
                    err.downcast_ref::<AdvisorError>(),
                    Some(AdvisorError::Validation { .. })
                ),
                "{vars:?}: {err}"
            );
        }
    }
}
