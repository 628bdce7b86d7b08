use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, Utc};
use tracing::debug;

use crate::errors::AppError;
use crate::external::price_provider::PriceProvider;
use crate::models::{
    ChartSeries, CompanyProfile, DashboardView, PricePoint, Selection, TrendOverlay,
    VisualizationKind,
};
use crate::services::failure_cache::FailureCache;
use crate::services::listings_service::ListingsCatalog;
use crate::services::price_service;
use crate::services::series_analytics::{self, SeriesError};
use crate::store::history_cache::HistoryCache;

pub const MIN_WINDOW: usize = 2;
pub const MAX_WINDOW: usize = 200;
pub const DEFAULT_WINDOW: usize = 20;

/// Number of trailing sessions shown in the performance table.
const RECENT_DAYS: usize = 5;

const NOT_ENOUGH_POINTS: &str = "Not enough data points available.";

/// Resolved parameters for one render pass. The HTTP layer owns raw-input
/// validation (window range, known visualization kinds); this controller
/// owns everything from selection resolution to chart assembly.
#[derive(Debug)]
pub struct RenderRequest {
    pub selection: Selection,
    /// Defaults to one year before today.
    pub start: Option<NaiveDate>,
    pub window: usize,
    pub kinds: Vec<VisualizationKind>,
}

/// One dashboard render: resolve the company, load its history, slice from
/// the start date, and build the requested chart series.
///
/// Analytics shortfalls (window longer than the visible history, too few
/// points for a trend) degrade to per-chart notices; only unknown symbols,
/// sector mismatches and provider failures surface as errors.
pub async fn render(
    listings: &ListingsCatalog,
    cache: &HistoryCache,
    provider: &dyn PriceProvider,
    failures: &FailureCache,
    start_year: i32,
    request: RenderRequest,
) -> Result<DashboardView, AppError> {
    let profile = resolve_selection(listings, &request.selection)?;

    let history =
        price_service::history_for(cache, provider, failures, start_year, &profile.symbol)
            .await?;

    let start = request.start.unwrap_or_else(|| one_year_back(Utc::now().date_naive()));
    let visible: Vec<PricePoint> = history.into_iter().filter(|p| p.date >= start).collect();
    debug!(
        "Rendering {} from {} ({} visible points, window {})",
        profile.symbol,
        start,
        visible.len(),
        request.window
    );

    let recent = visible[visible.len().saturating_sub(RECENT_DAYS)..].to_vec();

    // Duplicate kinds collapse; first-mention order wins.
    let mut kinds: Vec<VisualizationKind> = Vec::new();
    for kind in &request.kinds {
        if !kinds.contains(kind) {
            kinds.push(*kind);
        }
    }

    let charts = kinds
        .into_iter()
        .map(|kind| build_chart(kind, &profile, &visible, request.window))
        .collect();

    Ok(DashboardView {
        profile,
        recent,
        charts,
    })
}

fn resolve_selection(
    listings: &ListingsCatalog,
    selection: &Selection,
) -> Result<CompanyProfile, AppError> {
    let profile = listings
        .profile(selection.symbol())
        .ok_or_else(|| AppError::NotFound(format!("Unknown symbol {}", selection.symbol())))?;

    if let Selection::SectorThenTicker { sector, .. } = selection {
        if &profile.sector != sector {
            return Err(AppError::Validation(format!(
                "{} belongs to sector {}, not {}",
                profile.symbol, profile.sector, sector
            )));
        }
    }

    Ok(profile.clone())
}

fn one_year_back(today: NaiveDate) -> NaiveDate {
    today
        .with_year(today.year() - 1)
        .unwrap_or(today - ChronoDuration::days(365))
}

fn build_chart(
    kind: VisualizationKind,
    profile: &CompanyProfile,
    points: &[PricePoint],
    window: usize,
) -> ChartSeries {
    let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
    let adj_close: Vec<f64> = points.iter().map(|p| p.adj_close).collect();

    let (title, y_label, values, mut notice) = match kind {
        VisualizationKind::Price => (
            format!("{} stock price", profile.name),
            "USD ($)".to_string(),
            adj_close.iter().map(|&v| Some(v)).collect(),
            None,
        ),
        VisualizationKind::Volume => (
            format!("{} trading volume", profile.name),
            "shares".to_string(),
            points.iter().map(|p| Some(p.volume)).collect(),
            None,
        ),
        VisualizationKind::MovingAverage => {
            let (values, notice) =
                match series_analytics::compute_moving_average(&adj_close, window) {
                    Ok(values) => (values, None),
                    Err(SeriesError::InvalidWindow { .. }) => (
                        vec![None; points.len()],
                        Some(format!(
                            "Not enough data to compute a {}-day moving average.",
                            window
                        )),
                    ),
                    // Window and series come from this function; nothing
                    // else can fail.
                    Err(_) => (vec![None; points.len()], Some(NOT_ENOUGH_POINTS.into())),
                };
            (
                format!("{} {}-day moving average", profile.name, window),
                "Moving Avg.".to_string(),
                values,
                notice,
            )
        }
    };

    let trend = fit_overlay(&dates, &values, &mut notice);

    ChartSeries {
        kind,
        title,
        y_label,
        dates,
        values,
        trend,
        notice,
    }
}

/// Trend line over the chart's defined points only. Fewer than two defined
/// points means no trend and a notice, mirroring the single-point guard at
/// the original call sites.
fn fit_overlay(
    dates: &[NaiveDate],
    values: &[Option<f64>],
    notice: &mut Option<String>,
) -> Option<TrendOverlay> {
    let (defined_dates, defined_values): (Vec<NaiveDate>, Vec<f64>) = dates
        .iter()
        .zip(values.iter())
        .filter_map(|(d, v)| v.map(|v| (*d, v)))
        .unzip();

    if defined_dates.len() < 2 {
        notice.get_or_insert_with(|| NOT_ENOUGH_POINTS.to_string());
        return None;
    }

    match series_analytics::fit_trend_line(&defined_dates, &defined_values) {
        Ok(line) => Some(TrendOverlay {
            slope: line.slope,
            intercept: line.intercept,
            dates: defined_dates,
            fitted: line.fitted,
        }),
        Err(_) => {
            notice.get_or_insert_with(|| NOT_ENOUGH_POINTS.to_string());
            None
        }
    }
}
