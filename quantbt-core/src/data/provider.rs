//! Data provider trait, request and row types, and structured errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to fetch: one symbol over an inclusive UTC range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRequest {
    pub symbol: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub interval: String,
    pub adjusted: bool,
}

impl DataRequest {
    /// Daily, adjusted request.
    pub fn daily(symbol: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            start,
            end,
            interval: "1d".to_string(),
            adjusted: true,
        }
    }

    /// `SYMBOL_interval_adj|raw_YYYYMMDD_YYYYMMDD`
    pub fn cache_key(&self) -> String {
        format!(
            "{}_{}_{}_{}_{}",
            self.symbol.to_uppercase(),
            self.interval,
            if self.adjusted { "adj" } else { "raw" },
            self.start.format("%Y%m%d"),
            self.end.format("%Y%m%d"),
        )
    }
}

/// One OHLCV observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceRow {
    pub fn has_nan(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .any(|v| v.is_nan())
    }
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("{provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("All providers failed: {}", causes.join("; "))]
    FetchFailed { causes: Vec<String> },

    #[error("at least one provider must be configured")]
    EmptyProviderChain,

    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl DataError {
    pub fn provider(provider: &str, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// Whether the manager should try the next provider after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DataError::Provider { .. }
                | DataError::Validation(_)
                | DataError::Io(_)
                | DataError::Csv(_)
        )
    }
}

/// A source of price rows.
pub trait DataProvider: Send + Sync {
    fn name(&self) -> &str;

    fn fetch(&self, request: &DataRequest) -> Result<Vec<PriceRow>, DataError>;
}
