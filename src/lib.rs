// src/lib.rs

pub mod config;
pub mod credentials;
pub mod data_extractor;
pub mod error;
pub mod price_sample;
pub mod processor;
pub mod server;
pub mod session;

mod ticker_manager;
mod ticker_manager_pool;

pub use config::Config;
pub use credentials::Credentials;
pub use data_extractor::{Authenticator, PriceSource, StockDataExtractor};
pub use error::{Result, StockError};
pub use price_sample::{AccessToken, CorrelationResult, PriceSample, PriceSeries, StockQuote, TickerDirectory};
pub use session::TokenSession;
pub use ticker_manager::TickerManager;
pub use ticker_manager_pool::TickerManagerPool;
