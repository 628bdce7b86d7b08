use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Visualization kinds
// ---------------------------------------------------------------------------

/// The chart families a client can request for one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationKind {
    Price,
    Volume,
    MovingAverage,
}

impl VisualizationKind {
    /// All kinds, in the order the dashboard lays them out.
    pub fn all() -> [VisualizationKind; 3] {
        [
            VisualizationKind::Price,
            VisualizationKind::Volume,
            VisualizationKind::MovingAverage,
        ]
    }
}

// ---------------------------------------------------------------------------
// Chart payloads
// ---------------------------------------------------------------------------

/// Fitted trend line rendered on top of a chart: the regression scalars plus
/// the fitted sequence, parallel to `dates`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendOverlay {
    /// Change in value per day.
    pub slope: f64,
    /// Fitted value at the first date of the span.
    pub intercept: f64,
    pub dates: Vec<NaiveDate>,
    pub fitted: Vec<f64>,
}

/// One renderable series: the (dates, values) pair tagged with a title and
/// y-axis label, an optional trend overlay, and an optional notice when the
/// data was too short for part of the chart.
///
/// `values` is aligned 1:1 with `dates`; a `null` entry means the value is
/// undefined at that date (e.g. insufficient moving-average lookback).
#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub kind: VisualizationKind,
    pub title: String,
    pub y_label: String,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendOverlay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}
