// src/config.rs

use std::env;
use std::time::Duration;

use crate::credentials::Credentials;
use crate::error::{Result, StockError};

pub const DEFAULT_BASE_URL: &str = "http://20.244.56.144/evaluation-service";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MINUTES: i64 = 50;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub credentials: Credentials,
    pub port: u16,
    pub request_timeout: Duration,
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is normal in deployed environments.
        let _ = dotenv::dotenv();

        let credentials = Credentials {
            email: required("EMAIL")?,
            name: required("NAME")?,
            roll_no: required("ROLL_NO")?,
            access_code: required("ACCESS_CODE")?,
            client_id: required("CLIENT_ID")?,
            client_secret: required("CLIENT_SECRET")?,
        };

        let base_url = env::var("STOCK_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let port = match env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|e| StockError::Config(format!("PORT={value}: {e}")))?,
            Err(_) => DEFAULT_PORT,
        };

        let request_timeout = match env::var("REQUEST_TIMEOUT_MS") {
            Ok(value) => value
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| StockError::Config(format!("REQUEST_TIMEOUT_MS={value}: {e}")))?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Config {
            base_url,
            credentials,
            port,
            request_timeout,
        })
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| StockError::Config(format!("missing environment variable {key}")))
}
