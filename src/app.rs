use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::routes::{companies, dashboard, health, prices};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/companies", companies::router())
        .nest("/api/prices", prices::router())
        .nest("/api/dashboard", dashboard::router())
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}
