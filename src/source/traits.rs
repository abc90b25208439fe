use async_trait::async_trait;
use bytes::Bytes;

use crate::error::FetchError;

#[async_trait]
pub trait LeaderboardSource: Send + Sync {
    /// Retrieve the raw response body for a leaderboard url.
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}
