use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// One trading day for a ticker. Dates within a history are unique and
// strictly ascending; volume is never negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: f64,
}
