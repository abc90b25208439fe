// Stats session: owns the catalog, the shared cache and the aggregator for one run of the app.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::aggregator::{Aggregation, Aggregator, PlayerProfile};
use super::cache::FetchCache;
use super::comparator::{self, ComparisonResult};
use super::ranking::{self, Metric, RankedPlayer};
use super::stats::StatsSnapshot;
use crate::config::EngineConfig;
use crate::error::LevelError;
use crate::model::aggregate::PlayerAggregate;
use crate::model::catalog::{Catalog, Level, Profile};
use crate::model::leaderboard::LevelLeaderboard;
use crate::source::http_source::HttpSource;
use crate::source::traits::LeaderboardSource;

pub struct StatsSession {
    catalog: Catalog,
    aggregator: Aggregator,
    aggregation_lock: tokio::sync::Mutex<()>,
}

impl StatsSession {
    /// Build a session over an explicit source.
    pub fn new(
        catalog: Catalog,
        source: Arc<dyn LeaderboardSource>,
        config: &EngineConfig,
    ) -> Self {
        let cache = Arc::new(FetchCache::new(source));
        let aggregator = Aggregator::new(cache, config.max_concurrency, config.fetch_timeout());
        info!(
            "stats session created levels={} concurrency={} timeout_s={}",
            catalog.levels.len(),
            config.max_concurrency,
            config.fetch_timeout().as_secs()
        );
        Self {
            catalog,
            aggregator,
            aggregation_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Load the catalog from the configured paths and fetch over HTTP.
    ///
    /// Any failure here is fatal for the session.
    pub async fn load(config: &EngineConfig) -> Result<Self> {
        let catalog = Catalog::load(
            Path::new(&config.levels_path),
            Path::new(&config.profiles_path),
        )
        .await
        .context("loading static catalog")?;
        let source = HttpSource::new(config.relay_prefix.clone(), config.fetch_timeout())
            .context("building http client")?;
        Ok(Self::new(catalog, Arc::new(source), config))
    }

    pub fn levels(&self) -> &[Level] {
        &self.catalog.levels
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn profile(&self, username: &str) -> Profile {
        self.catalog.profile(username)
    }

    pub async fn level_leaderboard(
        &self,
        index: usize,
    ) -> std::result::Result<LevelLeaderboard, LevelError> {
        let level = self
            .catalog
            .levels
            .get(index)
            .ok_or(LevelError::UnknownLevel(index))?;
        Ok(self.aggregator.level_leaderboard(level).await?)
    }

    pub async fn player_profile(&self, username: &str) -> PlayerProfile {
        self.aggregator
            .player_profile(username, &self.catalog.levels)
            .await
    }

    /// Aggregate the whole catalog. Overlapping calls run one at a time, so
    /// later callers are served from the cache the first one filled.
    pub async fn aggregate(&self) -> Aggregation {
        let _guard = self.aggregation_lock.lock().await;
        debug!("aggregation lock acquired");
        self.aggregator.aggregate(&self.catalog.levels).await
    }

    pub async fn player_stats(&self) -> HashMap<String, PlayerAggregate> {
        self.aggregate().await.players
    }

    pub async fn leaderboard(&self, metric: Metric, filter: Option<&str>) -> Vec<RankedPlayer> {
        let aggregation = self.aggregate().await;
        ranking::rank(&aggregation.players, metric, filter)
    }

    pub async fn compare(&self, first: &str, second: &str) -> ComparisonResult {
        comparator::compare(&self.aggregator, first, second, &self.catalog.levels).await
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.aggregator.cache().snapshot()
    }
}
