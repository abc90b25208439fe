use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Maximum number of rows handed to a view (level board or global board).
pub const VIEW_ROW_LIMIT: usize = 500;

/// Default per-fetch timeout in seconds. A level that does not answer in
/// time is treated as failed for the current pass.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Relay prefix used to reach leaderboard APIs that do not send CORS headers.
pub const DEFAULT_RELAY_PREFIX: &str = "https://corsproxy.io/?";

/// Upper bound on in-flight leaderboard fetches during an aggregation pass.
pub const DEFAULT_MAX_CONCURRENCY: u32 = 16;

/// Top-level configuration for the stats engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path to the static level list (`levels.json`).
    pub levels_path: String,
    /// Path to the static profile metadata (`profiles.json`).
    pub profiles_path: String,
    /// Prefix prepended to the url-encoded API url. `None` fetches directly.
    pub relay_prefix: Option<String>,
    /// Per-fetch timeout in seconds.
    pub fetch_timeout_secs: u64,
    /// Maximum number of concurrent leaderboard fetches.
    pub max_concurrency: u32,
}

impl EngineConfig {
    /// Load overrides from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading engine config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing engine config {}", path.display()))?;
        Ok(config)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            levels_path: "levels.json".to_string(),
            profiles_path: "profiles.json".to_string(),
            relay_prefix: Some(DEFAULT_RELAY_PREFIX.to_string()),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}
