use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::PricePoint;

/// On-disk price-history cache: one CSV file per symbol under `root`.
///
/// This is the persistent half of the data-fetch layer. A symbol is cached
/// when its file exists; callers decide whether a cached history is fresh
/// enough by looking at its last date.
pub struct HistoryCache {
    root: PathBuf,
}

impl HistoryCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the cache directory if it does not exist yet. Called once at
    /// startup.
    pub fn ensure_root(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.root.join(format!("{}.csv", symbol.to_uppercase()))
    }

    pub fn has(&self, symbol: &str) -> bool {
        self.path_for(symbol).exists()
    }

    pub fn load(&self, symbol: &str) -> Result<Vec<PricePoint>> {
        let path = self.path_for(symbol);
        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("failed to open cached history {:?}", path))?;

        let mut points = Vec::new();
        for row in reader.deserialize::<PricePoint>() {
            let point =
                row.with_context(|| format!("malformed row in cached history {:?}", path))?;
            points.push(point);
        }
        Ok(points)
    }

    pub fn store(&self, symbol: &str, points: &[PricePoint]) -> Result<()> {
        let path = self.path_for(symbol);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to create cached history {:?}", path))?;

        for point in points {
            writer
                .serialize(point)
                .with_context(|| format!("failed to write cached history {:?}", path))?;
        }
        writer
            .flush()
            .with_context(|| format!("failed to flush cached history {:?}", path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn temp_cache(tag: &str) -> HistoryCache {
        let root = std::env::temp_dir().join(format!(
            "stockboard-cache-{}-{}",
            tag,
            std::process::id()
        ));
        let cache = HistoryCache::new(&root);
        cache.ensure_root().unwrap();
        cache
    }

    fn sample_points() -> Vec<PricePoint> {
        (0..5)
            .map(|i| PricePoint {
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
                    + chrono::Duration::days(i),
                open: 10.0 + i as f64,
                high: 11.0 + i as f64,
                low: 9.0 + i as f64,
                close: 10.5 + i as f64,
                adj_close: 10.4 + i as f64,
                volume: 1000.0 * (i + 1) as f64,
            })
            .collect()
    }

    #[test]
    fn store_then_load_round_trips() {
        let cache = temp_cache("roundtrip");
        let points = sample_points();

        assert!(!cache.has("aapl"));
        cache.store("aapl", &points).unwrap();
        assert!(cache.has("aapl"));
        // Symbol lookup is case-insensitive via uppercased filenames.
        assert!(cache.has("AAPL"));

        let loaded = cache.load("AAPL").unwrap();
        assert_eq!(loaded, points);

        fs::remove_dir_all(cache.root()).ok();
    }

    #[test]
    fn missing_symbol_is_absent() {
        let cache = temp_cache("missing");
        assert!(!cache.has("NOPE"));
        assert!(cache.load("NOPE").is_err());
        fs::remove_dir_all(cache.root()).ok();
    }
}
