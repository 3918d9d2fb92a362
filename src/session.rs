// src/session.rs

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::credentials::Credentials;
use crate::data_extractor::Authenticator;
use crate::error::Result;
use crate::price_sample::AccessToken;

/// Owns the single cached upstream access token.
///
/// The token has no known expiry. It is reused until a request comes back
/// unauthorized, at which point the caller invalidates it and the next
/// [`ensure_token`](TokenSession::ensure_token) re-authenticates.
pub struct TokenSession {
    credentials: Credentials,
    authenticator: Arc<dyn Authenticator>,
    token: Mutex<Option<AccessToken>>,
}

impl TokenSession {
    pub fn new(credentials: Credentials, authenticator: Arc<dyn Authenticator>) -> Self {
        TokenSession {
            credentials,
            authenticator,
            token: Mutex::new(None),
        }
    }

    /// Returns the cached token, authenticating first if there is none.
    ///
    /// The lock is held across the exchange so concurrent callers wait for one
    /// authentication instead of racing their own.
    pub async fn ensure_token(&self) -> Result<AccessToken> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let token = self.authenticator.authenticate(&self.credentials).await?;
        info!("acquired upstream access token");
        *cached = Some(token.clone());
        Ok(token)
    }

    pub async fn invalidate(&self) {
        if self.token.lock().await.take().is_some() {
            info!("invalidated upstream access token");
        }
    }

    /// Clears the cache only if it still holds `rejected`. A caller that saw a
    /// stale token must not discard the fresh one another caller already
    /// acquired. Returns whether the cache was cleared.
    pub async fn invalidate_if(&self, rejected: &AccessToken) -> bool {
        let mut cached = self.token.lock().await;
        if cached.as_ref() == Some(rejected) {
            *cached = None;
            info!("invalidated upstream access token");
            true
        } else {
            false
        }
    }

    pub async fn has_token(&self) -> bool {
        self.token.lock().await.is_some()
    }

    /// Best-effort startup authentication. Failure only logs; the first real
    /// request will try again.
    pub async fn warm_up(&self) {
        if let Err(error) = self.ensure_token().await {
            warn!(%error, "startup authentication failed, will retry on first request");
        }
    }
}
