use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::PricePoint;

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("ticker not found")]
    NotFound,

    #[error("rate limited")]
    RateLimited,
}

/// Seam to the external price-history source. Implementations return daily
/// bars from `start` through the most recent session, sorted ascending with
/// unique dates.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch_daily_history(
        &self,
        symbol: &str,
        start: NaiveDate,
    ) -> Result<Vec<PricePoint>, PriceProviderError>;
}
