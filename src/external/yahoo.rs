use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::PricePoint;

/// Yahoo Finance chart provider. Free, no API key required.
///
/// Uses the v8 chart endpoint with explicit `period1`/`period2` bounds so a
/// history can start at the configured start year instead of one of Yahoo's
/// coarse named ranges.
pub struct YahooProvider {
    client: reqwest::Client,
}

impl YahooProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (compatible; Stockboard/0.1)")
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

// Arrays are index-aligned with `timestamp`; nulls mark holidays and other
// sessions without data.
#[derive(Debug, Deserialize)]
struct Quote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    adjclose: Vec<Option<f64>>,
}

fn column<T: Copy>(col: &[Option<T>], i: usize) -> Option<T> {
    col.get(i).copied().flatten()
}

#[async_trait]
impl PriceProvider for YahooProvider {
    async fn fetch_daily_history(
        &self,
        symbol: &str,
        start: NaiveDate,
    ) -> Result<Vec<PricePoint>, PriceProviderError> {
        let url = format!("https://query1.finance.yahoo.com/v8/finance/chart/{}", symbol);

        let period1 = start
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);
        let period2 = Utc::now().timestamp();

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("interval", "1d".to_string()),
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceProviderError::RateLimited);
        }
        if resp.status().as_u16() == 404 {
            return Err(PriceProviderError::NotFound);
        }
        if !resp.status().is_success() {
            return Err(PriceProviderError::BadResponse(format!(
                "HTTP {}",
                resp.status()
            )));
        }

        let body: ChartResponse = resp
            .json()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        if let Some(error) = body.chart.error {
            if error.description.contains("No data found") {
                return Err(PriceProviderError::NotFound);
            }
            return Err(PriceProviderError::BadResponse(error.description));
        }

        let result = body
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or_else(|| PriceProviderError::BadResponse("no results in response".into()))?;

        let quote = result
            .indicators
            .quote
            .first()
            .ok_or_else(|| PriceProviderError::BadResponse("no quote data in response".into()))?;

        let adjclose = result
            .indicators
            .adjclose
            .as_ref()
            .and_then(|a| a.first());

        let mut points: Vec<PricePoint> = result
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, timestamp)| {
                // A session without a close is a holiday or bad row; skip it.
                let close = column(&quote.close, i)?;
                let date = chrono::DateTime::from_timestamp(*timestamp, 0)
                    .map(|dt| dt.date_naive())?;

                Some(PricePoint {
                    date,
                    open: column(&quote.open, i).unwrap_or(close),
                    high: column(&quote.high, i).unwrap_or(close),
                    low: column(&quote.low, i).unwrap_or(close),
                    close,
                    adj_close: adjclose
                        .and_then(|a| column(&a.adjclose, i))
                        .unwrap_or(close),
                    volume: column(&quote.volume, i).unwrap_or(0) as f64,
                })
            })
            .collect();

        points.sort_by(|a, b| a.date.cmp(&b.date));
        points.dedup_by(|a, b| a.date == b.date);

        if points.is_empty() {
            return Err(PriceProviderError::NotFound);
        }

        Ok(points)
    }
}
