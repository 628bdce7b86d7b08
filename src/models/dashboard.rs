use serde::Serialize;

use crate::models::{ChartSeries, CompanyProfile, PricePoint};

/// How the user picked a company. Both flows feed the same render pass; the
/// sector-first flow additionally checks that the symbol belongs to the
/// chosen sector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Direct { symbol: String },
    SectorThenTicker { sector: String, symbol: String },
}

impl Selection {
    pub fn symbol(&self) -> &str {
        match self {
            Selection::Direct { symbol } => symbol,
            Selection::SectorThenTicker { symbol, .. } => symbol,
        }
    }
}

/// Everything one dashboard render needs: the company header, the last five
/// trading days, and one series per requested visualization.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub profile: CompanyProfile,
    /// Last 5 trading days of the sliced history, oldest first.
    pub recent: Vec<PricePoint>,
    pub charts: Vec<ChartSeries>,
}
