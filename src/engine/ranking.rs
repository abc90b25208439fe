// Global leaderboards: one ordering table per metric, decoupled from rendering.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::VIEW_ROW_LIMIT;
use crate::model::aggregate::PlayerAggregate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    BestRank,
    TotalTime,
    AverageTime,
    AverageRank,
}

impl Metric {
    /// Whether only players with a run on every level may appear.
    pub fn requires_all_levels(self) -> bool {
        !matches!(self, Metric::BestRank)
    }

    fn compare(self, a: &PlayerAggregate, b: &PlayerAggregate) -> Ordering {
        let primary = match self {
            Metric::BestRank => a
                .best_rank
                .cmp(&b.best_rank)
                .then_with(|| b.world_record_count.cmp(&a.world_record_count))
                .then_with(|| b.levels_on_leaderboard.cmp(&a.levels_on_leaderboard)),
            Metric::TotalTime => a.total_time.total_cmp(&b.total_time),
            Metric::AverageTime => a.average_time.total_cmp(&b.average_time),
            Metric::AverageRank => a.average_rank.total_cmp(&b.average_rank),
        };
        primary.then_with(|| a.username.cmp(&b.username))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPlayer {
    /// 1-based row number within the filtered board.
    pub position: usize,
    pub aggregate: PlayerAggregate,
}

/// Order `players` by `metric`.
///
/// `filter` (a case-insensitive username substring) narrows the eligible
/// rows before they are numbered, so positions always run 1..N over what is
/// returned. At most `VIEW_ROW_LIMIT` rows are returned.
pub fn rank(
    players: &HashMap<String, PlayerAggregate>,
    metric: Metric,
    filter: Option<&str>,
) -> Vec<RankedPlayer> {
    let mut eligible: Vec<&PlayerAggregate> = players
        .values()
        .filter(|p| !metric.requires_all_levels() || p.completed_all_levels)
        .collect();
    eligible.sort_by(|a, b| metric.compare(a, b));

    let needle = filter
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    eligible
        .into_iter()
        .filter(|p| match &needle {
            Some(q) => p.username.to_lowercase().contains(q.as_str()),
            None => true,
        })
        .take(VIEW_ROW_LIMIT)
        .enumerate()
        .map(|(i, p)| RankedPlayer {
            position: i + 1,
            aggregate: p.clone(),
        })
        .collect()
}
