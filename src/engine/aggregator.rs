// Fan-out/fan-in leaderboard fetching and the per-player fold.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::cache::FetchCache;
use crate::config::VIEW_ROW_LIMIT;
use crate::error::{FetchError, LoadError};
use crate::model::aggregate::{PlayerAccumulator, PlayerAggregate};
use crate::model::catalog::Level;
use crate::model::leaderboard::{ArrowVariant, LevelLeaderboard};

pub type LevelFetch = Result<Arc<LevelLeaderboard>, LoadError>;

/// A level that could not be loaded during a pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelFailure {
    pub level_index: usize,
    pub level_name: String,
    pub error: String,
}

/// Result of one aggregation pass over the catalog.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub players: HashMap<String, PlayerAggregate>,
    pub failed_levels: Vec<LevelFailure>,
    /// Number of levels in the catalog, fetched or not.
    pub level_count: usize,
}

/// One row of a player's profile table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileRecord {
    pub level_index: usize,
    pub level_name: String,
    pub rank: u32,
    pub completion_time: f64,
    pub arrow: ArrowVariant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerProfile {
    pub username: String,
    /// Best rank first.
    pub records: Vec<ProfileRecord>,
    /// `None` when the player has no run on any loaded level.
    pub aggregate: Option<PlayerAggregate>,
    pub failed_levels: Vec<LevelFailure>,
}

pub struct Aggregator {
    cache: Arc<FetchCache>,
    semaphore: Arc<Semaphore>,
    fetch_timeout: Duration,
}

impl Aggregator {
    pub fn new(cache: Arc<FetchCache>, max_concurrency: u32, fetch_timeout: Duration) -> Self {
        Self {
            cache,
            semaphore: Arc::new(Semaphore::new(max_concurrency.max(1) as usize)),
            fetch_timeout,
        }
    }

    pub fn cache(&self) -> &Arc<FetchCache> {
        &self.cache
    }

    /// Fetch every level's leaderboard concurrently and wait for all of them.
    ///
    /// Results are returned in level order. A failed, timed-out or panicked
    /// fetch only affects its own slot.
    pub async fn fetch_levels(&self, levels: &[Level]) -> Vec<LevelFetch> {
        let handles: Vec<_> = levels
            .iter()
            .map(|level| {
                let cache = Arc::clone(&self.cache);
                let semaphore = Arc::clone(&self.semaphore);
                let url = level.api.clone();
                let timeout = self.fetch_timeout;
                tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|e| LoadError::Fetch(FetchError::Join(e.to_string())))?;
                    match tokio::time::timeout(timeout, cache.get(&url)).await {
                        Ok(result) => result,
                        Err(_) => {
                            warn!("leaderboard fetch timed out url={}", url);
                            Err(LoadError::Fetch(FetchError::Timeout))
                        }
                    }
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(LoadError::Fetch(FetchError::Join(e.to_string()))),
            };
            results.push(result);
        }
        results
    }

    /// Fetch all levels and fold them into per-player aggregates.
    pub async fn aggregate(&self, levels: &[Level]) -> Aggregation {
        let t0 = Instant::now();
        let results = self.fetch_levels(levels).await;

        let mut failed_levels = Vec::new();
        let mut boards = Vec::with_capacity(results.len());
        for (index, (level, result)) in levels.iter().zip(results).enumerate() {
            match result {
                Ok(board) => boards.push(board),
                Err(e) => failed_levels.push(LevelFailure {
                    level_index: index,
                    level_name: level.name.clone(),
                    error: e.to_string(),
                }),
            }
        }

        let players = fold_leaderboards(levels.len(), boards.iter().map(|b| &**b));

        info!(
            "aggregation done levels={} failed={} players={} elapsed_ms={}",
            levels.len(),
            failed_levels.len(),
            players.len(),
            t0.elapsed().as_millis()
        );

        Aggregation {
            players,
            failed_levels,
            level_count: levels.len(),
        }
    }

    /// Username to aggregate mapping for every player on at least one loaded level.
    pub async fn build_player_stats(&self, levels: &[Level]) -> HashMap<String, PlayerAggregate> {
        self.aggregate(levels).await.players
    }

    /// One level's board for the detail view, cut to the view limit.
    pub async fn level_leaderboard(&self, level: &Level) -> Result<LevelLeaderboard, LoadError> {
        let board = tokio::time::timeout(self.fetch_timeout, self.cache.get(&level.api))
            .await
            .map_err(|_| LoadError::Fetch(FetchError::Timeout))??;
        Ok(board.truncated(VIEW_ROW_LIMIT))
    }

    /// Every run `username` has across the catalog, plus their aggregate.
    pub async fn player_profile(&self, username: &str, levels: &[Level]) -> PlayerProfile {
        let results = self.fetch_levels(levels).await;

        let mut records = Vec::new();
        let mut failed_levels = Vec::new();
        let mut acc = PlayerAccumulator::new(username);
        for (index, (level, result)) in levels.iter().zip(results).enumerate() {
            let board = match result {
                Ok(board) => board,
                Err(e) => {
                    failed_levels.push(LevelFailure {
                        level_index: index,
                        level_name: level.name.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };
            if let Some(entry) = board.find(username) {
                acc.record(entry.rank, entry.run.completion_time);
                records.push(ProfileRecord {
                    level_index: index,
                    level_name: level.name.clone(),
                    rank: entry.rank,
                    completion_time: entry.run.completion_time,
                    arrow: entry.run.arrow_variant(),
                });
            }
        }
        records.sort_by_key(|r| r.rank);

        debug!(
            "profile built username={} records={} failed={}",
            username,
            records.len(),
            failed_levels.len()
        );

        PlayerProfile {
            username: username.to_string(),
            records,
            aggregate: acc.finish(levels.len()),
            failed_levels,
        }
    }
}

/// Fold ranked leaderboards into per-player aggregates.
///
/// `level_count` is the catalog size used for `completed_all_levels`. A
/// username listed twice on one board only counts its first (faster) run.
pub fn fold_leaderboards<'a>(
    level_count: usize,
    boards: impl IntoIterator<Item = &'a LevelLeaderboard>,
) -> HashMap<String, PlayerAggregate> {
    let mut accumulators: HashMap<String, PlayerAccumulator> = HashMap::new();

    for board in boards {
        let mut seen: HashSet<&str> = HashSet::with_capacity(board.len());
        for entry in &board.runs {
            let username = entry.run.username.as_str();
            if !seen.insert(username) {
                continue;
            }
            accumulators
                .entry(username.to_string())
                .or_insert_with(|| PlayerAccumulator::new(username))
                .record(entry.rank, entry.run.completion_time);
        }
    }

    accumulators
        .into_iter()
        .filter_map(|(username, acc)| acc.finish(level_count).map(|agg| (username, agg)))
        .collect()
}
