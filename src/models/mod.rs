mod chart;
mod company;
mod dashboard;
mod price_point;

pub use chart::{ChartSeries, TrendOverlay, VisualizationKind};
pub use company::CompanyProfile;
pub use dashboard::{DashboardView, Selection};
pub use price_point::PricePoint;
