mod app;
mod errors;
mod external;
mod logging;
mod models;
mod routes;
mod services;
mod state;
mod store;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::external::mock::MockProvider;
use crate::external::price_provider::PriceProvider;
use crate::external::yahoo::YahooProvider;
use crate::services::failure_cache::FailureCache;
use crate::services::listings_service::ListingsCatalog;
use crate::state::AppState;
use crate::store::history_cache::HistoryCache;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    logging::init_logging(logging::LoggingConfig::from_env())?;

    let listings_path =
        std::env::var("LISTINGS_PATH").unwrap_or_else(|_| "datasets/companies.csv".to_string());
    let datasets_dir =
        std::env::var("DATASETS_DIR").unwrap_or_else(|_| "datasets/stocks".to_string());
    let start_year: i32 = std::env::var("START_YEAR")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(1980);

    let listings = ListingsCatalog::load_from_csv(Path::new(&listings_path))?;
    tracing::info!(
        "📋 Loaded {} company listings from {}",
        listings.len(),
        listings_path
    );

    let history_cache = HistoryCache::new(&datasets_dir);
    history_cache.ensure_root()?;
    tracing::info!("🗂 Price-history cache at {}", datasets_dir);

    // Select price provider based on PRICE_PROVIDER env var (defaults to yahoo)
    let provider_name =
        std::env::var("PRICE_PROVIDER").unwrap_or_else(|_| "yahoo".to_string());

    let provider: Arc<dyn PriceProvider> = match provider_name.to_lowercase().as_str() {
        "yahoo" => {
            tracing::info!("📊 Using price provider: Yahoo Finance");
            Arc::new(YahooProvider::new())
        }
        "mock" => {
            tracing::info!("📊 Using price provider: mock random walk");
            Arc::new(MockProvider)
        }
        _ => {
            panic!(
                "Invalid PRICE_PROVIDER: {}. Must be 'yahoo' or 'mock'",
                provider_name
            );
        }
    };

    let state = AppState {
        listings: Arc::new(listings),
        price_provider: provider,
        history_cache: Arc::new(history_cache),
        failure_cache: FailureCache::new(),
        start_year,
    };
    let app = app::create_app(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Stockboard backend running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
