// In-memory leaderboard cache keyed by url, with per-url request coalescing.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::stats::{StatsCollector, StatsSnapshot};
use crate::error::LoadError;
use crate::model::leaderboard::LevelLeaderboard;
use crate::source::traits::LeaderboardSource;

pub struct FetchCache {
    source: Arc<dyn LeaderboardSource>,
    entries: RwLock<HashMap<String, Arc<LevelLeaderboard>>>,
    inflight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    stats: Arc<StatsCollector>,
}

impl FetchCache {
    pub fn new(source: Arc<dyn LeaderboardSource>) -> Self {
        Self {
            source,
            entries: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
            stats: Arc::new(StatsCollector::new()),
        }
    }

    /// Return the leaderboard for `url`, fetching and parsing it on first use.
    ///
    /// Successful loads are kept for the lifetime of the cache. Failures are
    /// not stored, so a later call retries. Concurrent calls for the same
    /// uncached url share a single request.
    pub async fn get(&self, url: &str) -> Result<Arc<LevelLeaderboard>, LoadError> {
        if let Some(board) = self.lookup(url) {
            return Ok(board);
        }

        let gate = {
            let mut inflight = self.inflight.lock();
            inflight
                .entry(url.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        let _guard = gate.lock().await;
        // Declared after `_guard` so the entry is released while the gate is still held,
        // including when this future is dropped mid-load.
        let _release = InflightRelease {
            inflight: &self.inflight,
            url,
            gate: &gate,
        };

        // Another caller may have finished the load while we waited.
        if let Some(board) = self.lookup(url) {
            return Ok(board);
        }

        let result = self.load(url).await;
        if let Ok(board) = &result {
            self.entries.write().insert(url.to_string(), Arc::clone(board));
        }
        result
    }

    /// Number of urls with a load gate currently registered.
    pub fn pending_loads(&self) -> usize {
        self.inflight.lock().len()
    }

    async fn load(&self, url: &str) -> Result<Arc<LevelLeaderboard>, LoadError> {
        let body = match self.source.fetch(url).await {
            Ok(body) => body,
            Err(e) => {
                self.stats.record_failure();
                warn!("leaderboard fetch failed url={} err={}", url, e);
                return Err(e.into());
            }
        };
        self.stats.record_fetch(body.len() as u64);

        let board = match LevelLeaderboard::parse(&body) {
            Ok(board) => board,
            Err(e) => {
                self.stats.record_parse_failure();
                warn!("leaderboard parse failed url={} err={}", url, e);
                return Err(e.into());
            }
        };
        if board.skipped_records > 0 {
            self.stats.record_skipped(board.skipped_records as u64);
        }

        info!(
            "leaderboard cached url={} runs={} skipped={}",
            url,
            board.len(),
            board.skipped_records
        );
        Ok(Arc::new(board))
    }

    fn lookup(&self, url: &str) -> Option<Arc<LevelLeaderboard>> {
        let board = self.entries.read().get(url).cloned()?;
        self.stats.record_hit();
        debug!("leaderboard cache hit url={}", url);
        Some(board)
    }

    /// Cached leaderboard for `url` without touching the network or counters.
    pub fn peek(&self, url: &str) -> Option<Arc<LevelLeaderboard>> {
        self.entries.read().get(url).cloned()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.read().contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot(self.len())
    }
}

/// Removes a url's load gate from the in-flight table when dropped.
struct InflightRelease<'a> {
    inflight: &'a Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    url: &'a str,
    gate: &'a Arc<tokio::sync::Mutex<()>>,
}

impl Drop for InflightRelease<'_> {
    fn drop(&mut self) {
        let mut inflight = self.inflight.lock();
        // A later caller may already have registered a fresh gate for this url.
        if inflight
            .get(self.url)
            .is_some_and(|current| Arc::ptr_eq(current, self.gate))
        {
            inflight.remove(self.url);
        }
    }
}
