use std::fmt;

/// Failure talking to the object store. `NotFound` is the only variant that
/// allows a local fallback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteStoreError {
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("object store request failed for {bucket}/{key}: {reason}")]
    Request {
        bucket: String,
        key: String,
        reason: String,
    },
}

impl RemoteStoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteStoreError::NotFound { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("validation error: {reason}")]
    Validation { reason: String },

    #[error("data error for {ticker}: {reason}")]
    Data { ticker: String, reason: String },

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("market data request failed: {reason}")]
    MarketData { reason: String },

    #[error("evaluation failed for {ticker}: {source}")]
    TickerFailed {
        ticker: String,
        #[source]
        source: Box<AdvisorError>,
    },

    #[error(transparent)]
    RemoteStore(#[from] RemoteStoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AdvisorError {
    pub fn validation(reason: impl fmt::Display) -> Self {
        AdvisorError::Validation {
            reason: reason.to_string(),
        }
    }

    pub fn data(ticker: &str, reason: impl fmt::Display) -> Self {
        AdvisorError::Data {
            ticker: ticker.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn not_found(what: impl fmt::Display) -> Self {
        AdvisorError::NotFound {
            what: what.to_string(),
        }
    }

    pub fn is_remote_not_found(&self) -> bool {
        matches!(self, AdvisorError::RemoteStore(e) if e.is_not_found())
    }

    /// Attaches the ticker to an error raised while evaluating it. Data
    /// errors already carry one and pass through untouched.
    pub fn for_ticker(self, ticker: &str) -> Self {
        match self {
            err @ AdvisorError::Data { .. } => err,
            err @ AdvisorError::TickerFailed { .. } => err,
            other => AdvisorError::TickerFailed {
                ticker: ticker.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The ticker whose evaluation failed, if this error is attributable to one.
    pub fn ticker(&self) -> Option<&str> {
        match self {
            AdvisorError::Data { ticker, .. } | AdvisorError::TickerFailed { ticker, .. } => {
                Some(ticker.as_str())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_remote_not_found_is_heal_trigger() {
        let nf = AdvisorError::from(RemoteStoreError::NotFound {
            bucket: "b".into(),
            key: "k".into(),
        });
        assert!(nf.is_remote_not_found());

        let denied = AdvisorError::from(RemoteStoreError::Request {
            bucket: "b".into(),
            key: "k".into(),
            reason: "access denied".into(),
        });
        assert!(!denied.is_remote_not_found());
        assert!(!AdvisorError::not_found("business date").is_remote_not_found());
    }

    #[test]
    fn for_ticker_wraps_once_and_keeps_data_errors() {
        let data = AdvisorError::data("AAPL", "missing sma").for_ticker("MSFT");
        assert_eq!(data.ticker(), Some("AAPL"));

        let wrapped = AdvisorError::MarketData {
            reason: "HTTP 500".into(),
        }
        .for_ticker("BA")
        .for_ticker("XOM");
        assert_eq!(wrapped.ticker(), Some("BA"));
        assert!(wrapped.to_string().contains("HTTP 500"));
    }
}
