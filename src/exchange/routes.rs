use axum::extract::rejection::QueryRejection;
use axum::{
    Router,
    extract::{Json, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::exchange::{ExchangeRateSnapshot, ExchangeRates, normalize_currency_code, record_snapshots};

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_exchange_rates))
        .route("/snapshots", get(get_snapshots).post(create_snapshots))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct RatesQuery {
    base: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SnapshotsQuery {
    currency: Option<String>,
}

fn currency_code(code: &str) -> Result<String, ApiError> {
    normalize_currency_code(code)
        .ok_or_else(|| ApiError::Validation(format!("'{code}' is not a currency code")))
}

async fn fetch_rates(state: &AppState, base: Option<String>) -> Result<ExchangeRates, ApiError> {
    let base = currency_code(base.as_deref().unwrap_or(&state.config.exchange.base_currency))?;
    let fetched = state.exchange.fetch_latest(&base).await;
    let mut rates = state.config.exchange.on_failure.resolve(fetched)?;
    if rates.base.is_empty() {
        rates.base = base;
    }
    Ok(rates)
}

/// Latest rates straight from the exchange API. Nothing is stored.
async fn get_exchange_rates(
    State(state): State<AppState>,
    query: Result<Query<RatesQuery>, QueryRejection>,
) -> Result<Json<ExchangeRates>, ApiError> {
    let Query(query) = query?;
    Ok(Json(fetch_rates(&state, query.base).await?))
}

/// Fetch the latest rates and store them as snapshots.
async fn create_snapshots(
    State(state): State<AppState>,
    query: Result<Query<RatesQuery>, QueryRejection>,
) -> Result<(StatusCode, Json<Vec<ExchangeRateSnapshot>>), ApiError> {
    let Query(query) = query?;
    let rates = fetch_rates(&state, query.base).await?;
    let stored = record_snapshots(
        &state.snapshots,
        &rates,
        state.config.exchange.adjustment_threshold,
        Utc::now(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn get_snapshots(
    State(state): State<AppState>,
    query: Result<Query<SnapshotsQuery>, QueryRejection>,
) -> Result<Json<Vec<ExchangeRateSnapshot>>, ApiError> {
    let Query(query) = query?;
    let currency = query.currency.as_deref().map(currency_code).transpose()?;
    Ok(Json(state.snapshots.list(currency.as_deref()).await?))
}
