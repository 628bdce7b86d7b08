use std::sync::Arc;

use crate::external::price_provider::PriceProvider;
use crate::services::failure_cache::FailureCache;
use crate::services::listings_service::ListingsCatalog;
use crate::store::history_cache::HistoryCache;

#[derive(Clone)]
pub struct AppState {
    pub listings: Arc<ListingsCatalog>,
    pub price_provider: Arc<dyn PriceProvider>,
    pub history_cache: Arc<HistoryCache>,
    pub failure_cache: FailureCache,
    /// Histories are fetched from Jan 1 of this year.
    pub start_year: i32,
}
