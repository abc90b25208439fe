// Leaderboard data sources: HTTP (via relay) behind a pluggable trait.

pub mod http_source;
pub mod traits;
