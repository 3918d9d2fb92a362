// src/price_sample.rs

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::processor;

/// One observed price at a point in time, exactly as the provider reported it.
/// The timestamp keeps the provider's UTC offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub price: f64,
    #[serde(rename = "lastUpdatedAt")]
    pub observed_at: DateTime<FixedOffset>,
}

/// Chronologically ordered samples for one ticker over one request window.
///
/// Order is whatever the provider sent and is never rearranged. There are no
/// mutating accessors.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceSeries(Vec<PriceSample>);

impl PriceSeries {
    pub fn new(samples: Vec<PriceSample>) -> Self {
        PriceSeries(samples)
    }

    pub fn samples(&self) -> &[PriceSample] {
        &self.0
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|sample| sample.price)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First `len` samples, used for positional alignment.
    pub fn truncated(&self, len: usize) -> PriceSeries {
        PriceSeries(self.0.iter().take(len).cloned().collect())
    }
}

impl From<Vec<PriceSample>> for PriceSeries {
    fn from(samples: Vec<PriceSample>) -> Self {
        PriceSeries::new(samples)
    }
}

/// Opaque bearer credential. Reused until the provider rejects it.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        AccessToken(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Display name to ticker symbol, e.g. `"Nvidia Corporation" -> "NVDA"`.
pub type TickerDirectory = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockQuote {
    pub ticker: String,
    #[serde(rename = "averagePrice")]
    pub average_price: f64,
    #[serde(rename = "priceHistory")]
    pub history: PriceSeries,
}

impl StockQuote {
    pub fn from_series(ticker: impl Into<String>, history: PriceSeries) -> Result<Self> {
        let average_price = processor::mean(&history)?;
        Ok(StockQuote {
            ticker: ticker.into(),
            average_price,
            history,
        })
    }
}

/// Pearson coefficient between two quotes. `coefficient` is NaN when either
/// series has zero variance or fewer than two samples.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationResult {
    pub coefficient: f64,
    pub series_a: StockQuote,
    pub series_b: StockQuote,
}
