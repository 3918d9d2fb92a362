// src/data_extractor.rs

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use crate::credentials::Credentials;
use crate::error::{Result, StockError};
use crate::price_sample::{AccessToken, PriceSample, PriceSeries, TickerDirectory};

/// Exchanges credentials for a bearer token.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken>;
}

/// Ticker lists and price-history windows, fetched on behalf of a token holder.
///
/// Implementations must report 401/403 as [`StockError::Unauthorized`] so the
/// caller can refresh the token and retry once.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn list_tickers(&self, token: &AccessToken) -> Result<TickerDirectory>;

    async fn fetch_history(&self, token: &AccessToken, ticker: &str, minutes: u32) -> Result<PriceSeries>;
}

/// HTTP client for the upstream price-history provider.
#[derive(Debug, Clone)]
pub struct StockDataExtractor {
    client: Client,
    base_url: Url,
}

impl StockDataExtractor {
    /// Every request made through the extractor is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| StockError::Config(format!("invalid base url {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StockError::Config(format!("base url {base_url} cannot carry a path")));
        }

        let client = Client::builder()
            .user_agent(concat!("pricecorr/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| StockError::Config(format!("failed to build http client: {e}")))?;

        Ok(StockDataExtractor { client, base_url })
    }
}

#[async_trait]
impl Authenticator for StockDataExtractor {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken> {
        let url = QueryBuilder::auth(&self.base_url);
        debug!(%url, "requesting access token");

        let response = self
            .client
            .post(url)
            .json(credentials)
            .send()
            .await
            .map_err(|e| StockError::Auth(format!("auth request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StockError::Auth(format!("failed to read auth response: {e}")))?;

        if !status.is_success() {
            return Err(StockError::Auth(format!("auth endpoint returned {status}: {body}")));
        }

        ResponseProcessor::access_token(&body)
    }
}

#[async_trait]
impl PriceSource for StockDataExtractor {
    async fn list_tickers(&self, token: &AccessToken) -> Result<TickerDirectory> {
        let url = QueryBuilder::stocks(&self.base_url);
        debug!(%url, "listing tickers");

        let (status, body) = RequestSender::get(&self.client, url, token).await?;
        ResponseProcessor::check_status(status, body, None).and_then(|body| ResponseProcessor::ticker_directory(&body))
    }

    async fn fetch_history(&self, token: &AccessToken, ticker: &str, minutes: u32) -> Result<PriceSeries> {
        let url = QueryBuilder::history(&self.base_url, ticker, minutes);
        debug!(%url, ticker, minutes, "fetching price history");

        let (status, body) = RequestSender::get(&self.client, url, token).await?;
        let body = ResponseProcessor::check_status(status, body, Some(ticker))?;
        ResponseProcessor::price_series(&body, ticker)
    }
}

/// Builds upstream URLs under the configured base.
struct QueryBuilder;

impl QueryBuilder {
    fn auth(base: &Url) -> Url {
        Self::with_segments(base, &["auth"])
    }

    fn stocks(base: &Url) -> Url {
        Self::with_segments(base, &["stocks"])
    }

    fn history(base: &Url, ticker: &str, minutes: u32) -> Url {
        let mut url = Self::with_segments(base, &["stocks", ticker]);
        url.query_pairs_mut().append_pair("minutes", &minutes.to_string());
        url
    }

    fn with_segments(base: &Url, segments: &[&str]) -> Url {
        let mut url = base.clone();
        // cannot_be_a_base is rejected in StockDataExtractor::new
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

struct RequestSender;

impl RequestSender {
    async fn get(client: &Client, url: Url, token: &AccessToken) -> Result<(StatusCode, String)> {
        let response = client
            .get(url)
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(StockError::from_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(StockError::from_transport)?;
        Ok((status, body))
    }
}

#[derive(Deserialize)]
struct AuthResponse {
    access_token: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TickerListing {
    Wrapped { stocks: BTreeMap<String, String> },
    Bare(BTreeMap<String, String>),
}

/// Turns raw upstream bodies into typed values.
struct ResponseProcessor;

impl ResponseProcessor {
    /// 401/403 become `Unauthorized`; a 404 on a ticker lookup becomes `NotFound`.
    fn check_status(status: StatusCode, body: String, ticker: Option<&str>) -> Result<String> {
        match (status, ticker) {
            (s, _) if s.is_success() => Ok(body),
            (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => Err(StockError::Unauthorized),
            (StatusCode::NOT_FOUND, Some(ticker)) => Err(StockError::NotFound(ticker.to_string())),
            (s, _) => Err(StockError::upstream(Some(s.as_u16()), body)),
        }
    }

    fn access_token(body: &str) -> Result<AccessToken> {
        let response: AuthResponse = serde_json::from_str(body)
            .map_err(|e| StockError::Auth(format!("malformed auth response: {e}")))?;
        if response.access_token.is_empty() {
            return Err(StockError::Auth("auth response carried an empty token".to_string()));
        }
        Ok(AccessToken::new(response.access_token))
    }

    fn ticker_directory(body: &str) -> Result<TickerDirectory> {
        let listing: TickerListing = serde_json::from_str(body)
            .map_err(|e| StockError::upstream(None, format!("malformed ticker listing: {e}")))?;
        Ok(match listing {
            TickerListing::Wrapped { stocks } => stocks,
            TickerListing::Bare(stocks) => stocks,
        })
    }

    /// Rejects the whole window if any sample lacks a price or timestamp.
    fn price_series(body: &str, ticker: &str) -> Result<PriceSeries> {
        let samples: Vec<PriceSample> = serde_json::from_str(body)
            .map_err(|e| StockError::upstream(None, format!("malformed price history for {ticker}: {e}")))?;

        if samples.is_empty() {
            return Err(StockError::EmptySeries(ticker.to_string()));
        }
        Ok(PriceSeries::new(samples))
    }
}
