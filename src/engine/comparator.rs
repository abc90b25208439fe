// Head-to-head comparison of two players across every level.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use super::aggregator::{Aggregator, LevelFailure, LevelFetch};
use crate::error::NotFoundError;
use crate::model::aggregate::{PlayerAccumulator, PlayerAggregate};
use crate::model::catalog::Level;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelStanding {
    pub rank: u32,
    pub completion_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointWinner {
    First,
    Second,
    Tie,
    Nobody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelMatchup {
    pub level_index: usize,
    pub level_name: String,
    pub first: Option<LevelStanding>,
    pub second: Option<LevelStanding>,
    pub winner: PointWinner,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub first: String,
    pub second: String,
    /// Levels that loaded, in catalog order.
    pub levels: Vec<LevelMatchup>,
    pub first_score: u32,
    pub second_score: u32,
    pub first_summary: Option<PlayerAggregate>,
    pub second_summary: Option<PlayerAggregate>,
    /// Usernames with no run on any loaded level.
    pub missing: Vec<NotFoundError>,
    pub failed_levels: Vec<LevelFailure>,
}

impl ComparisonResult {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Score from `username`'s side, if they are one of the two players.
    pub fn score_for(&self, username: &str) -> Option<u32> {
        if username == self.first {
            Some(self.first_score)
        } else if username == self.second {
            Some(self.second_score)
        } else {
            None
        }
    }
}

fn award(first: Option<LevelStanding>, second: Option<LevelStanding>) -> PointWinner {
    match (first, second) {
        (Some(a), Some(b)) => match a.rank.cmp(&b.rank) {
            Ordering::Less => PointWinner::First,
            Ordering::Greater => PointWinner::Second,
            Ordering::Equal => PointWinner::Tie,
        },
        (Some(_), None) => PointWinner::First,
        (None, Some(_)) => PointWinner::Second,
        (None, None) => PointWinner::Nobody,
    }
}

/// Build the comparison from already-fetched per-level results.
pub fn compare_fetched(
    first: &str,
    second: &str,
    levels: &[Level],
    results: Vec<LevelFetch>,
) -> ComparisonResult {
    let mut matchups = Vec::with_capacity(levels.len());
    let mut failed_levels = Vec::new();
    let mut first_acc = PlayerAccumulator::new(first);
    let mut second_acc = PlayerAccumulator::new(second);
    let (mut first_score, mut second_score) = (0u32, 0u32);

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

        let standing = |username: &str| {
            board.find(username).map(|entry| LevelStanding {
                rank: entry.rank,
                completion_time: entry.run.completion_time,
            })
        };
        let a = standing(first);
        let b = standing(second);
        if let Some(s) = a {
            first_acc.record(s.rank, s.completion_time);
        }
        if let Some(s) = b {
            second_acc.record(s.rank, s.completion_time);
        }

        let winner = award(a, b);
        match winner {
            PointWinner::First => first_score += 1,
            PointWinner::Second => second_score += 1,
            PointWinner::Tie | PointWinner::Nobody => {}
        }

        matchups.push(LevelMatchup {
            level_index: index,
            level_name: level.name.clone(),
            first: a,
            second: b,
            winner,
        });
    }

    let mut missing = Vec::new();
    for acc in [&first_acc, &second_acc] {
        if acc.levels() == 0 {
            missing.push(NotFoundError {
                username: acc.username().to_string(),
            });
        }
    }

    ComparisonResult {
        first: first.to_string(),
        second: second.to_string(),
        levels: matchups,
        first_score,
        second_score,
        first_summary: first_acc.finish(levels.len()),
        second_summary: second_acc.finish(levels.len()),
        missing,
        failed_levels,
    }
}

/// Compare two players over `levels`, fetching through the shared cache.
pub async fn compare(
    aggregator: &Aggregator,
    first: &str,
    second: &str,
    levels: &[Level],
) -> ComparisonResult {
    let results = aggregator.fetch_levels(levels).await;
    let result = compare_fetched(first, second, levels, results);
    debug!(
        "comparison {} vs {} score={}-{} complete={}",
        first,
        second,
        result.first_score,
        result.second_score,
        result.is_complete()
    );
    result
}
