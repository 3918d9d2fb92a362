// src/ticker_manager.rs

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::data_extractor::PriceSource;
use crate::error::{Result, StockError};
use crate::price_sample::{AccessToken, CorrelationResult, StockQuote, TickerDirectory};
use crate::processor;
use crate::session::TokenSession;
use crate::ticker_manager_pool::TickerManagerPool;

/// Entry point for the three read operations. Each one acquires a token,
/// fetches what it needs and runs the statistics; none of them mutate
/// anything except the shared token cache.
pub struct TickerManager {
    session: Arc<TokenSession>,
    source: Arc<dyn PriceSource>,
    pool: TickerManagerPool,
}

impl TickerManager {
    pub fn new(session: Arc<TokenSession>, source: Arc<dyn PriceSource>) -> Self {
        let pool = TickerManagerPool::new(Arc::clone(&source));
        TickerManager { session, source, pool }
    }

    pub async fn list_tickers(&self) -> Result<TickerDirectory> {
        let source = &self.source;
        self.with_auth_retry(|token| async move { source.list_tickers(&token).await })
            .await
    }

    pub async fn get_quote(&self, ticker: &str, minutes: i64) -> Result<StockQuote> {
        let ticker = validate_ticker(ticker)?;
        let minutes = validate_minutes(minutes)?;

        let source = &self.source;
        let history = self
            .with_auth_retry(|token| async move { source.fetch_history(&token, ticker, minutes).await })
            .await?;

        StockQuote::from_series(ticker, history)
    }

    /// Correlation between exactly two distinct tickers. Both histories are
    /// fetched concurrently and both must succeed.
    pub async fn get_correlation<S: AsRef<str>>(&self, tickers: &[S], minutes: i64) -> Result<CorrelationResult> {
        let (ticker_a, ticker_b) = match tickers {
            [a, b] => (validate_ticker(a.as_ref())?, validate_ticker(b.as_ref())?),
            _ => {
                return Err(StockError::Validation(format!(
                    "exactly two tickers are required, got {}",
                    tickers.len()
                )))
            }
        };
        if ticker_a == ticker_b {
            return Err(StockError::Validation(format!("tickers must be distinct, got {ticker_a} twice")));
        }
        let minutes = validate_minutes(minutes)?;

        let pool = &self.pool;
        let mut histories = self
            .with_auth_retry(|token| async move {
                pool.fetch_concurrently(&token, &[ticker_a, ticker_b], minutes).await
            })
            .await?;

        let (history_b, history_a) = match (histories.pop(), histories.pop()) {
            (Some(b), Some(a)) => (b, a),
            _ => return Err(StockError::upstream(None, "concurrent fetch returned fewer series than requested")),
        };

        let coefficient = processor::pearson_correlation(&history_a, &history_b)?;
        debug!(ticker_a, ticker_b, minutes, coefficient, "computed correlation");

        Ok(CorrelationResult {
            coefficient,
            series_a: StockQuote::from_series(ticker_a, history_a)?,
            series_b: StockQuote::from_series(ticker_b, history_b)?,
        })
    }

    /// Runs `operation` with the current token. On `Unauthorized` the rejected
    /// token is invalidated (unless a concurrent caller already replaced it)
    /// and the operation runs exactly once more; a second
    /// `Unauthorized` becomes a terminal `Auth` error.
    async fn with_auth_retry<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn(AccessToken) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let token = self.session.ensure_token().await?;
        match operation(token.clone()).await {
            Err(StockError::Unauthorized) => {
                warn!("upstream rejected access token, re-authenticating once");
                self.session.invalidate_if(&token).await;

                let token = self.session.ensure_token().await?;
                match operation(token).await {
                    Err(StockError::Unauthorized) => Err(StockError::Auth(
                        "upstream still unauthorized after re-authentication".to_string(),
                    )),
                    other => other,
                }
            }
            other => other,
        }
    }
}

fn validate_ticker(ticker: &str) -> Result<&str> {
    let ticker = ticker.trim();
    if ticker.is_empty() {
        return Err(StockError::Validation("ticker must not be empty".to_string()));
    }
    Ok(ticker)
}

fn validate_minutes(minutes: i64) -> Result<u32> {
    if minutes <= 0 {
        return Err(StockError::Validation(format!("minutes must be positive, got {minutes}")));
    }
    u32::try_from(minutes).map_err(|_| StockError::Validation(format!("minutes out of range: {minutes}")))
}
