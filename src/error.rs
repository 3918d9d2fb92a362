// src/error.rs

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StockError>;

/// Every failure the engine can surface to a caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StockError {
    /// Bad caller input. Never retried.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Credential exchange failed, or the upstream still refused the token after one re-auth.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Upstream answered 401/403. Consumed by the orchestrator's single re-auth cycle.
    #[error("upstream rejected the access token")]
    Unauthorized,

    #[error("upstream request failed (status {status:?}, timeout {timeout}): {body}")]
    Upstream {
        status: Option<u16>,
        body: String,
        timeout: bool,
    },

    #[error("unknown ticker: {0}")]
    NotFound(String),

    #[error("upstream returned no price samples for {0}")]
    EmptySeries(String),

    #[error("cannot aggregate an empty price series")]
    EmptyInput,

    #[error("insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("configuration error: {0}")]
    Config(String),
}

impl StockError {
    pub fn upstream(status: Option<u16>, body: impl Into<String>) -> Self {
        StockError::Upstream {
            status,
            body: body.into(),
            timeout: false,
        }
    }

    pub fn timeout(body: impl Into<String>) -> Self {
        StockError::Upstream {
            status: None,
            body: body.into(),
            timeout: true,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, StockError::Validation(_))
    }

    /// Map a reqwest transport failure, keeping timeouts distinguishable.
    pub(crate) fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            StockError::timeout(format!("request timed out: {error}"))
        } else if error.is_connect() {
            StockError::upstream(None, format!("connection failed: {error}"))
        } else {
            StockError::upstream(error.status().map(|s| s.as_u16()), format!("request failed: {error}"))
        }
    }
}
