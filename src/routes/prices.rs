use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::PricePoint;
use crate::services::price_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:symbol", get(get_prices))
        .route("/:symbol/refresh", post(refresh_prices))
}

#[derive(Debug, Deserialize)]
struct PriceQuery {
    start: Option<NaiveDate>,
}

async fn get_prices(
    Path(symbol): Path<String>,
    Query(query): Query<PriceQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<PricePoint>>, AppError> {
    info!("GET /prices/{} - Getting price history", symbol);

    let symbol = known_symbol(&state, &symbol)?;
    let mut points = price_service::history_for(
        &state.history_cache,
        state.price_provider.as_ref(),
        &state.failure_cache,
        state.start_year,
        &symbol,
    )
    .await
    .map_err(|e| {
        error!("Failed to get price history for {}: {}", symbol, e);
        e
    })?;

    if let Some(start) = query.start {
        points.retain(|p| p.date >= start);
    }
    Ok(Json(points))
}

async fn refresh_prices(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    info!("POST /prices/{}/refresh - Refreshing from provider", symbol);

    let symbol = known_symbol(&state, &symbol)?;
    let count = price_service::refresh(
        &state.history_cache,
        state.price_provider.as_ref(),
        &state.failure_cache,
        state.start_year,
        &symbol,
    )
    .await
    .map_err(|e| {
        match &e {
            AppError::RateLimited => warn!("Rate limited when refreshing prices for {}", symbol),
            _ => error!("Failed to refresh prices for {}: {}", symbol, e),
        }
        e
    })?;
    Ok(Json(serde_json::json!({
        "symbol": symbol,
        "points": count,
    })))
}

// Only listed symbols are fetchable; everything else 404s before touching
// the provider.
fn known_symbol(state: &AppState, symbol: &str) -> Result<String, AppError> {
    state
        .listings
        .profile(symbol)
        .map(|p| p.symbol.clone())
        .ok_or_else(|| AppError::NotFound(format!("Unknown symbol {}", symbol)))
}
