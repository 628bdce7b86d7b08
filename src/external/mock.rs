use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc, Weekday};

use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::PricePoint;

/// Random-walk provider for offline development. Emits one bar per weekday
/// from `start` through today; weekends are skipped so histories look like
/// real trading calendars.
pub struct MockProvider;

#[async_trait]
impl PriceProvider for MockProvider {
    async fn fetch_daily_history(
        &self,
        _symbol: &str,
        start: NaiveDate,
    ) -> Result<Vec<PricePoint>, PriceProviderError> {
        let today = Utc::now().date_naive();
        let mut points = Vec::new();

        let mut close = 100.0_f64;
        let mut date = start;

        while date <= today {
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                let open = close;
                close *= 1.0 + (rand::random::<f64>() - 0.5) * 0.02;

                points.push(PricePoint {
                    date,
                    open,
                    high: open.max(close) * 1.005,
                    low: open.min(close) * 0.995,
                    close,
                    adj_close: close,
                    volume: (500_000.0 + rand::random::<f64>() * 1_500_000.0).round(),
                });
            }

            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }

        Ok(points)
    }
}
