use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{DashboardView, Selection, VisualizationKind};
use crate::services::dashboard_service::{
    self, RenderRequest, DEFAULT_WINDOW, MAX_WINDOW, MIN_WINDOW,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_dashboard))
}

#[derive(Debug, Deserialize)]
struct DashboardQuery {
    symbol: String,
    /// Present = the sector-first picker flow.
    sector: Option<String>,
    start: Option<NaiveDate>,
    window: Option<usize>,
    /// Comma-separated kinds, e.g. `price,moving_average`. Omitted = all.
    viz: Option<String>,
}

async fn get_dashboard(
    Query(query): Query<DashboardQuery>,
    State(state): State<AppState>,
) -> Result<Json<DashboardView>, AppError> {
    info!("GET /dashboard - symbol {}", query.symbol);

    let window = query.window.unwrap_or(DEFAULT_WINDOW);
    if !(MIN_WINDOW..=MAX_WINDOW).contains(&window) {
        return Err(AppError::Validation(format!(
            "window must be between {} and {}",
            MIN_WINDOW, MAX_WINDOW
        )));
    }

    let kinds = parse_kinds(query.viz.as_deref())?;

    let selection = match query.sector {
        Some(sector) => Selection::SectorThenTicker {
            sector,
            symbol: query.symbol,
        },
        None => Selection::Direct {
            symbol: query.symbol,
        },
    };

    let request = RenderRequest {
        selection,
        start: query.start,
        window,
        kinds,
    };

    dashboard_service::render(
        &state.listings,
        &state.history_cache,
        state.price_provider.as_ref(),
        &state.failure_cache,
        state.start_year,
        request,
    )
    .await
    .map(Json)
    .map_err(|e| {
        match &e {
            AppError::RateLimited => warn!("Rate limited while rendering dashboard"),
            _ => error!("Failed to render dashboard: {}", e),
        }
        e
    })
}

fn parse_kinds(raw: Option<&str>) -> Result<Vec<VisualizationKind>, AppError> {
    let Some(raw) = raw else {
        return Ok(VisualizationKind::all().to_vec());
    };

    let mut kinds = Vec::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let kind = match token {
            "price" => VisualizationKind::Price,
            "volume" => VisualizationKind::Volume,
            "moving_average" => VisualizationKind::MovingAverage,
            other => {
                return Err(AppError::Validation(format!(
                    "Unknown visualization kind: {}",
                    other
                )))
            }
        };
        kinds.push(kind);
    }

    if kinds.is_empty() {
        return Ok(VisualizationKind::all().to_vec());
    }
    Ok(kinds)
}
