use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Symbol does not exist at the provider.
    NotFound,
    /// Temporary provider rate limit.
    RateLimited,
    /// Any other provider error.
    ApiError,
}

impl FailureKind {
    /// How long a recorded failure keeps short-circuiting requests.
    fn ttl(self) -> Duration {
        match self {
            FailureKind::NotFound => Duration::hours(24),
            FailureKind::RateLimited => Duration::hours(1),
            FailureKind::ApiError => Duration::hours(6),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FailureEntry {
    pub kind: FailureKind,
    pub recorded_at: DateTime<Utc>,
}

/// Thread-safe memo of recent provider failures, keyed by symbol. Keeps
/// known-bad tickers from triggering a provider call on every request.
#[derive(Clone)]
pub struct FailureCache {
    entries: Arc<DashMap<String, FailureEntry>>,
}

impl FailureCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Returns the active failure for `symbol`, expiring stale entries on
    /// the way.
    pub fn active_failure(&self, symbol: &str) -> Option<FailureEntry> {
        let entry = self.entries.get(symbol)?;
        let info = entry.value().clone();
        drop(entry);

        if Utc::now() < info.recorded_at + info.kind.ttl() {
            Some(info)
        } else {
            self.entries.remove(symbol);
            None
        }
    }

    pub fn record(&self, symbol: &str, kind: FailureKind) {
        self.entries.insert(
            symbol.to_string(),
            FailureEntry {
                kind,
                recorded_at: Utc::now(),
            },
        );
    }

    /// Forget a symbol, e.g. after a successful fetch or a forced refresh.
    pub fn clear(&self, symbol: &str) {
        self.entries.remove(symbol);
    }
}

impl Default for FailureCache {
    fn default() -> Self {
        Self::new()
    }
}
