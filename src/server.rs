// src/server.rs

//! Thin HTTP shell around [`TickerManager`]. Routes, query parsing and the
//! JSON shapes a browser dashboard expects; no logic of its own.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::{Config, DEFAULT_MINUTES};
use crate::data_extractor::StockDataExtractor;
use crate::error::{Result, StockError};
use crate::price_sample::{PriceSeries, StockQuote, TickerDirectory};
use crate::session::TokenSession;
use crate::ticker_manager::TickerManager;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TickerManager>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/stocks-list", get(stocks_list))
        .route("/stocks/:ticker", get(stock_quote))
        .route("/stockcorrelation", get(stock_correlation))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wires the upstream client, token session and orchestrator, warms the token
/// in the background and serves until the process is stopped.
pub async fn run(config: Config) -> Result<()> {
    let extractor = Arc::new(StockDataExtractor::new(&config.base_url, config.request_timeout)?);
    let session = Arc::new(TokenSession::new(config.credentials.clone(), extractor.clone()));
    let manager = Arc::new(TickerManager::new(Arc::clone(&session), extractor));

    tokio::spawn(async move { session.warm_up().await });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| StockError::Config(format!("failed to bind {addr}: {e}")))?;
    info!(%addr, upstream = %config.base_url, "server listening");

    axum::serve(listener, router(AppState { manager }))
        .await
        .map_err(|e| StockError::Config(format!("server error: {e}")))
}

#[derive(Serialize)]
struct StocksListResponse {
    stocks: TickerDirectory,
}

#[derive(Serialize)]
struct QuoteResponse {
    #[serde(rename = "averageStockPrice")]
    average_stock_price: f64,
    #[serde(rename = "priceHistory")]
    price_history: PriceSeries,
}

#[derive(Serialize)]
struct CorrelationResponse {
    correlation: f64,
    stocks: BTreeMap<String, CorrelatedStock>,
}

#[derive(Serialize)]
struct CorrelatedStock {
    #[serde(rename = "averagePrice")]
    average_price: f64,
    #[serde(rename = "priceHistory")]
    price_history: PriceSeries,
}

impl From<StockQuote> for CorrelatedStock {
    fn from(quote: StockQuote) -> Self {
        CorrelatedStock {
            average_price: quote.average_price,
            price_history: quote.history,
        }
    }
}

#[derive(Deserialize)]
struct MinutesParams {
    minutes: Option<String>,
}

async fn stocks_list(State(state): State<AppState>) -> std::result::Result<Json<StocksListResponse>, StockError> {
    let stocks = state.manager.list_tickers().await?;
    Ok(Json(StocksListResponse { stocks }))
}

async fn stock_quote(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(params): Query<MinutesParams>,
) -> std::result::Result<Json<QuoteResponse>, StockError> {
    let minutes = parse_minutes(params.minutes.as_deref())?;
    let quote = state.manager.get_quote(&ticker, minutes).await?;
    Ok(Json(QuoteResponse {
        average_stock_price: quote.average_price,
        price_history: quote.history,
    }))
}

/// `ticker` repeats in the query string, so pairs are read in order rather than
/// into a struct.
async fn stock_correlation(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> std::result::Result<Json<CorrelationResponse>, StockError> {
    let minutes = parse_minutes(pairs.iter().find(|(key, _)| key == "minutes").map(|(_, v)| v.as_str()))?;
    let tickers: Vec<&str> = pairs
        .iter()
        .filter(|(key, _)| key == "ticker")
        .map(|(_, value)| value.as_str())
        .collect();

    let result = state.manager.get_correlation(&tickers, minutes).await?;

    let mut stocks = BTreeMap::new();
    for quote in [result.series_a, result.series_b] {
        stocks.insert(quote.ticker.clone(), CorrelatedStock::from(quote));
    }

    Ok(Json(CorrelationResponse {
        correlation: result.coefficient,
        stocks,
    }))
}

fn parse_minutes(raw: Option<&str>) -> Result<i64> {
    match raw {
        None => Ok(DEFAULT_MINUTES),
        Some(value) => value
            .trim()
            .parse::<i64>()
            .map_err(|_| StockError::Validation(format!("minutes must be an integer, got {value:?}"))),
    }
}

impl IntoResponse for StockError {
    fn into_response(self) -> Response {
        let status = if self.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %self, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
