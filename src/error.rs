// Error taxonomy for the data boundary: network and parsing failures, plus session lookups.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(u16),
    #[error("transport: {0}")]
    Transport(String),
    #[error("timed out")]
    Timeout,
    #[error("fetch task failed: {0}")]
    Join(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("leaderboard body is not a JSON array")]
    NotAnArray,
    #[error("record {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

/// Why a leaderboard could not be loaded into the cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Why a session could not show one level's board.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("no level at index {0}")]
    UnknownLevel(usize),
    #[error(transparent)]
    Load(#[from] LoadError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("player {username} has no run on any loaded level")]
pub struct NotFoundError {
    pub username: String,
}
