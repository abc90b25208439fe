use std::fmt;

use serde::Serialize;

/// Cross-level summary for one player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerAggregate {
    pub username: String,
    pub levels_on_leaderboard: u32,
    pub world_record_count: u32,
    pub best_rank: u32,
    pub total_time: f64,
    pub total_rank: u64,
    pub average_rank: f64,
    pub average_time: f64,
    /// True when the player has a run on every level of the catalog.
    pub completed_all_levels: bool,
}

impl PlayerAggregate {
    pub fn best_rank_display(&self) -> BestRankDisplay {
        if self.world_record_count > 0 {
            BestRankDisplay::WorldRecords(self.world_record_count)
        } else {
            BestRankDisplay::Rank(self.best_rank)
        }
    }
}

/// How a player's best rank is shown: WR count when they hold any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BestRankDisplay {
    WorldRecords(u32),
    Rank(u32),
}

impl fmt::Display for BestRankDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BestRankDisplay::WorldRecords(1) => write!(f, "1 WR"),
            BestRankDisplay::WorldRecords(n) => write!(f, "{} WRs", n),
            BestRankDisplay::Rank(r) => write!(f, "{}", r),
        }
    }
}

/// Running totals for one player while levels are folded in.
#[derive(Debug, Clone)]
pub struct PlayerAccumulator {
    username: String,
    levels: u32,
    world_records: u32,
    best_rank: u32,
    total_time: f64,
    total_rank: u64,
}

impl PlayerAccumulator {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            levels: 0,
            world_records: 0,
            best_rank: u32::MAX,
            total_time: 0.0,
            total_rank: 0,
        }
    }

    pub fn record(&mut self, rank: u32, completion_time: f64) {
        self.levels += 1;
        self.total_time += completion_time;
        self.total_rank += u64::from(rank);
        self.best_rank = self.best_rank.min(rank);
        if rank == 1 {
            self.world_records += 1;
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn levels(&self) -> u32 {
        self.levels
    }

    /// Finalize against the catalog's level count. `None` when nothing was recorded.
    pub fn finish(self, level_count: usize) -> Option<PlayerAggregate> {
        if self.levels == 0 {
            return None;
        }
        let n = f64::from(self.levels);
        Some(PlayerAggregate {
            average_rank: self.total_rank as f64 / n,
            average_time: self.total_time / n,
            completed_all_levels: self.levels as usize == level_count,
            username: self.username,
            levels_on_leaderboard: self.levels,
            world_record_count: self.world_records,
            best_rank: self.best_rank,
            total_time: self.total_time,
            total_rank: self.total_rank,
        })
    }
}
