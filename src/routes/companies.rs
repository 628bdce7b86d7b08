use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::CompanyProfile;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_companies))
        .route("/sectors", get(list_sectors))
        .route("/:symbol", get(get_company))
}

#[derive(Debug, Deserialize)]
struct CompanyQuery {
    sector: Option<String>,
}

async fn list_companies(
    Query(query): Query<CompanyQuery>,
    State(state): State<AppState>,
) -> Json<Vec<CompanyProfile>> {
    info!(
        "GET /companies - Listing companies (sector: {:?})",
        query.sector
    );
    let companies = match query.sector.as_deref() {
        Some(sector) => state.listings.in_sector(sector).cloned().collect(),
        None => state.listings.all().cloned().collect(),
    };
    Json(companies)
}

async fn list_sectors(State(state): State<AppState>) -> Json<Vec<String>> {
    info!("GET /companies/sectors - Listing sectors");
    Json(state.listings.sectors())
}

async fn get_company(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CompanyProfile>, AppError> {
    info!("GET /companies/{} - Getting profile", symbol);
    state
        .listings
        .profile(&symbol)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Unknown symbol {}", symbol)))
}
