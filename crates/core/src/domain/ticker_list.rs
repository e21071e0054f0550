use crate::error::AdvisorError;
use crate::storage::model::StoredModel;
use serde::{Deserialize, Serialize};

/// Universe of securities a strategy is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerList {
    pub list_name: String,
    pub list_type: String,
    pub comparison_symbol: String,
    pub ticker_symbols: Vec<String>,
}

impl TickerList {
    pub fn ticker_symbols(&self) -> &[String] {
        &self.ticker_symbols
    }
}

impl StoredModel for TickerList {
    const MODEL_NAME: &'static str = "TickerList";
    const FOLDER_PREFIX: &'static str = "ticker-files";

    fn validate(&self) -> Result<(), AdvisorError> {
        if self.ticker_symbols.is_empty() {
            return Err(AdvisorError::validation(format!(
                "ticker list {:?} must contain at least one ticker symbol",
                self.list_name
            )));
        }
        Ok(())
    }
}
