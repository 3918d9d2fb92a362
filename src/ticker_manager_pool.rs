// src/ticker_manager_pool.rs

use std::sync::Arc;

use futures::future::try_join_all;

use crate::data_extractor::PriceSource;
use crate::error::Result;
use crate::price_sample::{AccessToken, PriceSeries};

/// Fetches several price histories at once and only returns when all of them
/// have arrived. One failure fails the whole batch; no partial results.
pub struct TickerManagerPool {
    source: Arc<dyn PriceSource>,
}

impl TickerManagerPool {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        TickerManagerPool { source }
    }

    pub async fn fetch_concurrently(&self, token: &AccessToken, tickers: &[&str], minutes: u32) -> Result<Vec<PriceSeries>> {
        let futures = tickers
            .iter()
            .map(|ticker| self.source.fetch_history(token, ticker, minutes));
        try_join_all(futures).await
    }
}
