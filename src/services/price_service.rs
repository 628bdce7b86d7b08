use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use tokio::time::{sleep as async_sleep, Duration};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::PricePoint;
use crate::services::failure_cache::{FailureCache, FailureKind};
use crate::store::history_cache::HistoryCache;

/// A cached history whose last bar is at most this old counts as fresh.
/// Four calendar days covers weekends and single-day holidays.
const STALE_AFTER_DAYS: i64 = 4;

const MAX_RETRIES: u32 = 3;

/// Full daily history for `symbol` from Jan 1 of `start_year` through the
/// present: cached copy when fresh, otherwise populated from the provider.
/// Falls back to a stale cached copy when the provider is unavailable.
pub async fn history_for(
    cache: &HistoryCache,
    provider: &dyn PriceProvider,
    failures: &FailureCache,
    start_year: i32,
    symbol: &str,
) -> Result<Vec<PricePoint>, AppError> {
    if let Some(failure) = failures.active_failure(symbol) {
        info!(
            "⚠️ Skipping provider call for {} - recent {:?} failure in cache",
            symbol, failure.kind
        );
        return Err(failure_to_app_error(symbol, failure.kind));
    }

    let cached = if cache.has(symbol) {
        match cache.load(symbol) {
            Ok(points) => Some(points),
            Err(e) => {
                warn!("Discarding unreadable cached history for {}: {}", symbol, e);
                None
            }
        }
    } else {
        None
    };

    if let Some(points) = &cached {
        if is_fresh(points) {
            info!(
                "✓ Serving {} from cache ({} points)",
                symbol,
                points.len()
            );
            return Ok(points.clone());
        }
    }

    match populate(cache, provider, failures, start_year, symbol).await {
        Ok(points) => Ok(points),
        Err(e) => match cached {
            // A stale chart beats no chart; the next render retries anyway.
            Some(points) if !points.is_empty() => {
                warn!(
                    "Provider refresh failed for {} ({}); serving stale cache",
                    symbol, e
                );
                Ok(points)
            }
            _ => Err(e),
        },
    }
}

/// Force a provider fetch and rewrite the cached file, ignoring freshness
/// and any recorded failure.
pub async fn refresh(
    cache: &HistoryCache,
    provider: &dyn PriceProvider,
    failures: &FailureCache,
    start_year: i32,
    symbol: &str,
) -> Result<usize, AppError> {
    failures.clear(symbol);
    let points = populate(cache, provider, failures, start_year, symbol).await?;
    Ok(points.len())
}

/// Fetch from the provider (with rate-limit retries) and persist the result.
async fn populate(
    cache: &HistoryCache,
    provider: &dyn PriceProvider,
    failures: &FailureCache,
    start_year: i32,
    symbol: &str,
) -> Result<Vec<PricePoint>, AppError> {
    let start = history_start(start_year);
    let mut retry_count = 0;

    loop {
        match provider.fetch_daily_history(symbol, start).await {
            Ok(points) => {
                if let Err(e) = cache.store(symbol, &points) {
                    error!("Failed to persist history for {}: {}", symbol, e);
                    return Err(AppError::Cache(e));
                }
                failures.clear(symbol);
                info!("✓ Fetched {} price points for {}", points.len(), symbol);
                return Ok(points);
            }
            Err(PriceProviderError::RateLimited) if retry_count < MAX_RETRIES => {
                retry_count += 1;
                let delay = Duration::from_secs(5 * retry_count as u64);
                warn!(
                    "Rate limited for {}, retrying in {}s (attempt {}/{})",
                    symbol,
                    delay.as_secs(),
                    retry_count,
                    MAX_RETRIES
                );
                async_sleep(delay).await;
            }
            Err(e) => {
                let kind = match &e {
                    PriceProviderError::RateLimited => FailureKind::RateLimited,
                    PriceProviderError::NotFound => FailureKind::NotFound,
                    _ => FailureKind::ApiError,
                };
                failures.record(symbol, kind);
                error!("✗ Failed to fetch price data for {}: {}", symbol, e);

                return Err(match e {
                    PriceProviderError::RateLimited => AppError::RateLimited,
                    PriceProviderError::NotFound => {
                        AppError::NotFound(format!("No price data found for {}", symbol))
                    }
                    other => AppError::External(other.to_string()),
                });
            }
        }
    }
}

fn history_start(start_year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(start_year, 1, 1)
        .unwrap_or_else(|| Utc::now().date_naive() - ChronoDuration::days(365))
}

fn is_fresh(points: &[PricePoint]) -> bool {
    match points.last() {
        Some(last) => {
            let today = Utc::now().date_naive();
            last.date >= today - ChronoDuration::days(STALE_AFTER_DAYS)
        }
        None => false,
    }
}

fn failure_to_app_error(symbol: &str, kind: FailureKind) -> AppError {
    match kind {
        FailureKind::RateLimited => AppError::RateLimited,
        FailureKind::NotFound => {
            AppError::NotFound(format!("No price data found for {}", symbol))
        }
        FailureKind::ApiError => AppError::External(format!(
            "Provider recently failed for {}; retry later",
            symbol
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProvider {
        calls: AtomicUsize,
        result: Result<Vec<PricePoint>, PriceProviderError>,
    }

    impl FixedProvider {
        fn ok(points: Vec<PricePoint>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Ok(points),
            }
        }

        fn not_found() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Err(PriceProviderError::NotFound),
            }
        }
    }

    #[async_trait]
    impl PriceProvider for FixedProvider {
        async fn fetch_daily_history(
            &self,
            _symbol: &str,
            _start: NaiveDate,
        ) -> Result<Vec<PricePoint>, PriceProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(points) => Ok(points.clone()),
                Err(PriceProviderError::NotFound) => Err(PriceProviderError::NotFound),
                Err(_) => Err(PriceProviderError::BadResponse("boom".into())),
            }
        }
    }

    fn temp_cache(tag: &str) -> HistoryCache {
        let root = std::env::temp_dir().join(format!(
            "stockboard-prices-{}-{}",
            tag,
            std::process::id()
        ));
        let cache = HistoryCache::new(&root);
        cache.ensure_root().unwrap();
        cache
    }

    fn bar(date: NaiveDate, close: f64) -> PricePoint {
        PricePoint {
            date,
            open: close,
            high: close,
            low: close,
            close,
            adj_close: close,
            volume: 1000.0,
        }
    }

    fn recent_history() -> Vec<PricePoint> {
        let today = Utc::now().date_naive();
        (0..10)
            .rev()
            .map(|i| bar(today - ChronoDuration::days(i), 100.0 + i as f64))
            .collect()
    }

    #[tokio::test]
    async fn fetches_and_caches_on_first_request() {
        let cache = temp_cache("first");
        let provider = FixedProvider::ok(recent_history());
        let failures = FailureCache::new();

        let points = history_for(&cache, &provider, &failures, 1980, "TEST")
            .await
            .unwrap();
        assert_eq!(points.len(), 10);
        assert!(cache.has("TEST"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        std::fs::remove_dir_all(cache.root()).ok();
    }

    #[tokio::test]
    async fn fresh_cache_skips_the_provider() {
        let cache = temp_cache("fresh");
        cache.store("TEST", &recent_history()).unwrap();
        let provider = FixedProvider::ok(vec![]);
        let failures = FailureCache::new();

        let points = history_for(&cache, &provider, &failures, 1980, "TEST")
            .await
            .unwrap();
        assert_eq!(points.len(), 10);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);

        std::fs::remove_dir_all(cache.root()).ok();
    }

    #[tokio::test]
    async fn stale_cache_is_served_when_provider_fails() {
        let cache = temp_cache("stale");
        let old = vec![
            bar(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(), 50.0),
            bar(NaiveDate::from_ymd_opt(2020, 1, 3).unwrap(), 51.0),
        ];
        cache.store("TEST", &old).unwrap();
        let provider = FixedProvider::not_found();
        let failures = FailureCache::new();

        let points = history_for(&cache, &provider, &failures, 1980, "TEST")
            .await
            .unwrap();
        assert_eq!(points, old);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        std::fs::remove_dir_all(cache.root()).ok();
    }

    #[tokio::test]
    async fn not_found_is_recorded_and_short_circuits() {
        let cache = temp_cache("notfound");
        let provider = FixedProvider::not_found();
        let failures = FailureCache::new();

        let err = history_for(&cache, &provider, &failures, 1980, "GHOST")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        // Second request is answered from the failure cache.
        let err = history_for(&cache, &provider, &failures, 1980, "GHOST")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        std::fs::remove_dir_all(cache.root()).ok();
    }

    #[tokio::test]
    async fn refresh_bypasses_failure_cache() {
        let cache = temp_cache("refresh");
        let provider = FixedProvider::ok(recent_history());
        let failures = FailureCache::new();
        failures.record("TEST", FailureKind::NotFound);

        let count = refresh(&cache, &provider, &failures, 1980, "TEST")
            .await
            .unwrap();
        assert_eq!(count, 10);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        std::fs::remove_dir_all(cache.root()).ok();
    }
}
