use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::models::CompanyProfile;

/// Raw listings row as exported by exchange screeners. Header names carry
/// spaces, so every field is renamed explicitly.
#[derive(Debug, Deserialize)]
struct ListingRow {
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Sector")]
    sector: Option<String>,
    #[serde(rename = "Industry")]
    industry: Option<String>,
    #[serde(rename = "Country")]
    country: Option<String>,
    #[serde(rename = "IPO Year")]
    ipo_year: Option<String>,
}

/// In-memory company catalog, loaded once at startup. Downstream consumers
/// never see missing fields: descriptive gaps are pre-filled with "Unknown"
/// and a missing IPO year with 0.
pub struct ListingsCatalog {
    companies: BTreeMap<String, CompanyProfile>,
}

fn fill_or_unknown(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => "Unknown".to_string(),
    }
}

// Screener exports write the year as "1999" or "1999.0"; absent means 0.
fn parse_ipo_year(value: Option<String>) -> i32 {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<f64>().ok())
        .map(|v| v as i32)
        .unwrap_or(0)
}

// Units, warrants and test issues carry '^' or '/' in the symbol; the
// dashboard only deals in common stock.
fn is_plain_symbol(symbol: &str) -> bool {
    !symbol.is_empty() && !symbol.contains('^') && !symbol.contains('/')
}

impl ListingsCatalog {
    pub fn load_from_csv(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open listings file {:?}", path))?;
        Self::from_reader(file)
            .with_context(|| format!("failed to parse listings file {:?}", path))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

        let mut companies = BTreeMap::new();
        for row in csv_reader.deserialize::<ListingRow>() {
            let row = row.context("malformed listings row")?;

            let symbol = row.symbol.trim().to_uppercase();
            if !is_plain_symbol(&symbol) {
                debug!("Skipping non-common-stock symbol {}", row.symbol);
                continue;
            }

            companies.insert(
                symbol.clone(),
                CompanyProfile {
                    symbol,
                    name: row.name.trim().to_string(),
                    sector: fill_or_unknown(row.sector),
                    industry: fill_or_unknown(row.industry),
                    country: fill_or_unknown(row.country),
                    ipo_year: parse_ipo_year(row.ipo_year),
                },
            );
        }

        Ok(Self { companies })
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }

    pub fn profile(&self, symbol: &str) -> Option<&CompanyProfile> {
        self.companies.get(&symbol.trim().to_uppercase())
    }

    /// Sorted distinct sectors, for the sector-first picker.
    pub fn sectors(&self) -> Vec<String> {
        let mut sectors: Vec<String> = self
            .companies
            .values()
            .map(|c| c.sector.clone())
            .collect();
        sectors.sort();
        sectors.dedup();
        sectors
    }

    /// Companies in one sector, sorted by symbol (BTreeMap order).
    pub fn in_sector<'a>(&'a self, sector: &'a str) -> impl Iterator<Item = &'a CompanyProfile> {
        self.companies.values().filter(move |c| c.sector == sector)
    }

    pub fn all(&self) -> impl Iterator<Item = &CompanyProfile> {
        self.companies.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Symbol,Name,Sector,Industry,Country,IPO Year
AAPL,Apple Inc.,Technology,Consumer Electronics,United States,1980
MSFT,Microsoft Corporation,Technology,Software,United States,1986.0
KO,Coca-Cola Company,Consumer Staples,Beverages,United States,
XYZ^A,Preferred Unit,Finance,Banks,United States,2001
BRK/A,Berkshire Class A,Finance,Insurance,United States,1996
ACME,Acme Holdings,,,,
";

    fn catalog() -> ListingsCatalog {
        ListingsCatalog::from_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn loads_plain_symbols_only() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 4);
        assert!(catalog.profile("XYZ^A").is_none());
        assert!(catalog.profile("BRK/A").is_none());
    }

    #[test]
    fn prefills_missing_fields() {
        let catalog = catalog();
        let acme = catalog.profile("ACME").unwrap();
        assert_eq!(acme.sector, "Unknown");
        assert_eq!(acme.industry, "Unknown");
        assert_eq!(acme.country, "Unknown");
        assert_eq!(acme.ipo_year, 0);

        let ko = catalog.profile("KO").unwrap();
        assert_eq!(ko.sector, "Consumer Staples");
        assert_eq!(ko.ipo_year, 0);
    }

    #[test]
    fn parses_float_formatted_ipo_years() {
        let catalog = catalog();
        assert_eq!(catalog.profile("AAPL").unwrap().ipo_year, 1980);
        assert_eq!(catalog.profile("MSFT").unwrap().ipo_year, 1986);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let catalog = catalog();
        assert_eq!(catalog.profile("aapl").unwrap().symbol, "AAPL");
        assert_eq!(catalog.profile(" msft ").unwrap().symbol, "MSFT");
    }

    #[test]
    fn sectors_are_sorted_and_distinct() {
        let catalog = catalog();
        assert_eq!(
            catalog.sectors(),
            vec!["Consumer Staples", "Technology", "Unknown"]
        );
    }

    #[test]
    fn in_sector_filters_companies() {
        let catalog = catalog();
        let tech: Vec<&str> = catalog
            .in_sector("Technology")
            .map(|c| c.symbol.as_str())
            .collect();
        assert_eq!(tech, vec!["AAPL", "MSFT"]);
    }
}
