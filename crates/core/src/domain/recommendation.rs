use crate::error::AdvisorError;
use crate::storage::model::StoredModel;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Dated output of one strategy run. A later run either replaces it (once
/// stale) or leaves it alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub creation_date: DateTime<Utc>,
    pub analysis_start_date: NaiveDate,
    pub analysis_end_date: NaiveDate,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub price_date: NaiveDate,
    pub strategy_name: String,
    pub security_type: String,
    pub securities_set: Vec<SecurityRecommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityRecommendation {
    pub ticker_symbol: String,
    pub price: f64,
}

impl RecommendationRecord {
    /// True while `now` falls inside the validity window (inclusive).
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && now <= self.valid_to
    }

    pub fn ticker_symbols(&self) -> impl Iterator<Item = &str> {
        self.securities_set.iter().map(|s| s.ticker_symbol.as_str())
    }
}

impl StoredModel for RecommendationRecord {
    const MODEL_NAME: &'static str = "RecommendationRecord";
    const FOLDER_PREFIX: &'static str = "recommendations";

    fn validate(&self) -> Result<(), AdvisorError> {
        if self.valid_from > self.valid_to {
            return Err(AdvisorError::validation(format!(
                "valid_from ({}) is after valid_to ({})",
                self.valid_from, self.valid_to
            )));
        }
        if self.analysis_start_date > self.analysis_end_date {
            return Err(AdvisorError::validation(format!(
                "analysis_start_date ({}) is after analysis_end_date ({})",
                self.analysis_start_date, self.analysis_end_date
            )));
        }
        if self.strategy_name.trim().is_empty() {
            return Err(AdvisorError::validation("strategy_name must be non-empty"));
        }
        if self.security_type.trim().is_empty() {
            return Err(AdvisorError::validation("security_type must be non-empty"));
        }
        for security in &self.securities_set {
            if security.ticker_symbol.trim().is_empty() {
                return Err(AdvisorError::validation("ticker_symbol must be non-empty"));
            }
            if !security.price.is_finite() {
                return Err(AdvisorError::validation(format!(
                    "price for {} must be finite (got {})",
                    security.ticker_symbol, security.price
                )));
            }
        }
        Ok(())
    }
}
