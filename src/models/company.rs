use serde::{Deserialize, Serialize};

/// Static company metadata shown next to the charts. Loaded once from the
/// listings CSV; never mutated by the analytics core.
///
/// The listings loader owns the gap pre-fill: `sector`, `industry` and
/// `country` are `"Unknown"` rather than empty, and `ipo_year` is `0` when
/// the listing carries none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub industry: String,
    pub country: String,
    pub ipo_year: i32,
}
