// Engine counters: cache hits, network fetches, failures, skipped records.
//
// A body that arrives but does not parse counts as a network fetch and a parse
// failure; only transport and status failures land in `failed_fetches`.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub cache_hits: u64,
    pub network_fetches: u64,
    pub failed_fetches: u64,
    pub parse_failures: u64,
    pub skipped_records: u64,
    pub downloaded_bytes: u64,
    pub cached_leaderboards: usize,
    pub cache_hit_rate: f64,
}

pub struct StatsCollector {
    cache_hits: AtomicU64,
    network_fetches: AtomicU64,
    failed_fetches: AtomicU64,
    parse_failures: AtomicU64,
    skipped_records: AtomicU64,
    downloaded_bytes: AtomicU64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            cache_hits: AtomicU64::new(0),
            network_fetches: AtomicU64::new(0),
            failed_fetches: AtomicU64::new(0),
            parse_failures: AtomicU64::new(0),
            skipped_records: AtomicU64::new(0),
            downloaded_bytes: AtomicU64::new(0),
        }
    }

    pub fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a network round trip that returned `bytes` bytes.
    pub fn record_fetch(&self, bytes: u64) {
        self.network_fetches.fetch_add(1, Ordering::Relaxed);
        self.downloaded_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_failure(&self) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self, records: u64) {
        self.skipped_records.fetch_add(records, Ordering::Relaxed);
    }

    pub fn snapshot(&self, cached_leaderboards: usize) -> StatsSnapshot {
        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        let network_fetches = self.network_fetches.load(Ordering::Relaxed);
        let failed_fetches = self.failed_fetches.load(Ordering::Relaxed);

        let lookups = cache_hits + network_fetches + failed_fetches;
        let cache_hit_rate = if lookups > 0 {
            cache_hits as f64 / lookups as f64
        } else {
            0.0
        };

        StatsSnapshot {
            cache_hits,
            network_fetches,
            failed_fetches,
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            skipped_records: self.skipped_records.load(Ordering::Relaxed),
            downloaded_bytes: self.downloaded_bytes.load(Ordering::Relaxed),
            cached_leaderboards,
            cache_hit_rate,
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_basic() {
        let stats = StatsCollector::new();
        stats.record_fetch(1000);
        stats.record_fetch(500);
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_failure();
        stats.record_skipped(2);

        let snap = stats.snapshot(2);
        assert_eq!(snap.network_fetches, 2);
        assert_eq!(snap.downloaded_bytes, 1500);
        assert_eq!(snap.failed_fetches, 1);
        assert_eq!(snap.skipped_records, 2);
        assert_eq!(snap.cached_leaderboards, 2);
        assert!((snap.cache_hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_failure_is_one_lookup() {
        let stats = StatsCollector::new();
        stats.record_hit();
        stats.record_fetch(10);
        stats.record_parse_failure();

        let snap = stats.snapshot(0);
        assert_eq!(snap.parse_failures, 1);
        assert_eq!(snap.failed_fetches, 0);
        assert!((snap.cache_hit_rate - 0.5).abs() < f64::EPSILON);
    }
}
