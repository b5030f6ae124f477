//! Price records and the source abstraction they are fetched through

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single commodity quote as stored by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    pub commodity: String,
    pub price: f64,
    pub currency: String,
    pub timestamp: DateTime<Utc>,
}

impl PriceRecord {
    pub fn new(
        commodity: impl Into<String>,
        price: f64,
        currency: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            commodity: commodity.into(),
            price,
            currency: currency.into(),
            timestamp,
        }
    }

    /// Only finite, non-negative prices can feed the index.
    pub fn is_usable(&self) -> bool {
        self.price.is_finite() && self.price >= 0.0 && !self.commodity.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Price source unavailable: {0}")]
    Unavailable(String),

    #[error("Price source returned an unreadable payload: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        // Keep query strings (which may carry keys) out of error text
        let msg = e.to_string();
        let sanitized = match msg.find('?') {
            Some(idx) => format!("{}?<query redacted>", &msg[..idx]),
            None => msg,
        };
        SourceError::Unavailable(sanitized)
    }
}

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetches the current set of price records, ordered by timestamp ascending.
    async fn fetch_prices(&self) -> Result<Vec<PriceRecord>, SourceError>;
}
