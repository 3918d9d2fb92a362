// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use pricecorr::{
    AccessToken, Authenticator, Credentials, PriceSample, PriceSeries, PriceSource, StockError, TickerDirectory,
    TickerManager, TokenSession,
};

pub fn series(prices: &[f64]) -> PriceSeries {
    let start = Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap().fixed_offset();
    prices
        .iter()
        .enumerate()
        .map(|(i, price)| PriceSample {
            price: *price,
            observed_at: start + Duration::minutes(i as i64),
        })
        .collect::<Vec<_>>()
        .into()
}

pub fn credentials() -> Credentials {
    Credentials {
        email: "dev@example.test".to_string(),
        name: "dev".to_string(),
        roll_no: "42".to_string(),
        access_code: "code".to_string(),
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
    }
}

/// Hands out `token-1`, `token-2`, ... and counts exchanges.
#[derive(Default)]
pub struct CountingAuthenticator {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl CountingAuthenticator {
    pub fn failing() -> Self {
        CountingAuthenticator {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for CountingAuthenticator {
    async fn authenticate(&self, _credentials: &Credentials) -> pricecorr::Result<AccessToken> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail {
            return Err(StockError::Auth("auth endpoint returned 500".to_string()));
        }
        Ok(AccessToken::new(format!("token-{n}")))
    }
}

/// In-memory provider. The first `unauthorized` calls (of any kind) answer
/// `Unauthorized`; every call records the token it was given.
#[derive(Default)]
pub struct ScriptedSource {
    pub histories: HashMap<String, Vec<f64>>,
    pub directory: TickerDirectory,
    pub unauthorized: AtomicUsize,
    pub calls: AtomicUsize,
    pub tokens_seen: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn with(mut self, ticker: &str, prices: &[f64]) -> Self {
        self.histories.insert(ticker.to_string(), prices.to_vec());
        self.directory.insert(format!("{ticker} Inc."), ticker.to_string());
        self
    }

    pub fn rejecting_first(self, calls: usize) -> Self {
        self.unauthorized.store(calls, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens_seen.lock().unwrap().clone()
    }

    fn record(&self, token: &AccessToken) -> pricecorr::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen.lock().unwrap().push(token.as_str().to_string());
        let rejected = self
            .unauthorized
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if rejected {
            Err(StockError::Unauthorized)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PriceSource for ScriptedSource {
    async fn list_tickers(&self, token: &AccessToken) -> pricecorr::Result<TickerDirectory> {
        self.record(token)?;
        Ok(self.directory.clone())
    }

    async fn fetch_history(&self, token: &AccessToken, ticker: &str, _minutes: u32) -> pricecorr::Result<PriceSeries> {
        self.record(token)?;
        match self.histories.get(ticker) {
            None => Err(StockError::NotFound(ticker.to_string())),
            Some(prices) if prices.is_empty() => Err(StockError::EmptySeries(ticker.to_string())),
            Some(prices) => Ok(series(prices)),
        }
    }
}

pub struct Harness {
    pub authenticator: Arc<CountingAuthenticator>,
    pub source: Arc<ScriptedSource>,
    pub manager: TickerManager,
}

pub fn harness(source: ScriptedSource) -> Harness {
    harness_with(CountingAuthenticator::default(), source)
}

pub fn harness_with(authenticator: CountingAuthenticator, source: ScriptedSource) -> Harness {
    let authenticator = Arc::new(authenticator);
    let source = Arc::new(source);
    let session = Arc::new(TokenSession::new(credentials(), authenticator.clone()));
    let manager = TickerManager::new(session, source.clone());
    Harness {
        authenticator,
        source,
        manager,
    }
}
