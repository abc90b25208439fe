// Display-ready rows for the level list, level board, global boards and profiles.

use serde::Serialize;

use crate::engine::aggregator::PlayerProfile;
use crate::engine::ranking::{Metric, RankedPlayer};
use crate::model::catalog::{Catalog, Profile};
use crate::model::leaderboard::LevelLeaderboard;

/// Format seconds as `S.sss` or `M:SS.sss`. Zero and non-finite values show `-`.
pub fn format_time(seconds: f64) -> String {
    if seconds == 0.0 || !seconds.is_finite() {
        return "-".to_string();
    }
    let millis = (seconds * 1000.0).round() as u64;
    let minutes = millis / 60_000;
    let rest = format!("{}.{:03}", millis % 60_000 / 1000, millis % 1000);
    if minutes > 0 {
        format!("{}:{:0>6}", minutes, rest)
    } else {
        rest
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankTier {
    Gold,
    Silver,
    Bronze,
}

impl RankTier {
    pub fn for_position(position: usize) -> Option<Self> {
        match position {
            1 => Some(RankTier::Gold),
            2 => Some(RankTier::Silver),
            3 => Some(RankTier::Bronze),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelCard {
    pub index: usize,
    pub name: String,
    pub byline: String,
    pub thumbnail: String,
}

pub fn level_cards(catalog: &Catalog) -> Vec<LevelCard> {
    catalog
        .levels
        .iter()
        .enumerate()
        .map(|(index, level)| LevelCard {
            index,
            name: level.name.clone(),
            byline: match &level.creator {
                Some(creator) => format!("by {}", creator),
                None => "Official".to_string(),
            },
            thumbnail: level.thumbnail.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelRow {
    pub rank: u32,
    pub tier: Option<RankTier>,
    pub username: String,
    pub arrow_icon: &'static str,
    pub time: String,
}

pub fn level_rows(board: &LevelLeaderboard) -> Vec<LevelRow> {
    board
        .runs
        .iter()
        .map(|entry| LevelRow {
            rank: entry.rank,
            tier: RankTier::for_position(entry.rank as usize),
            username: entry.run.username.clone(),
            arrow_icon: entry.run.arrow_variant().asset_path(),
            time: format_time(entry.run.completion_time),
        })
        .collect()
}

/// Column headers of the global board for `metric`, after rank and player.
pub fn leaderboard_headers(metric: Metric) -> &'static [&'static str] {
    match metric {
        Metric::BestRank => &["World Records", "Best Rank", "Maps on LB"],
        Metric::TotalTime => &["Total Time", "Maps on LB"],
        Metric::AverageTime => &["Average Time", "Maps on LB"],
        Metric::AverageRank => &["Average Rank", "Maps on LB"],
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    pub position: usize,
    pub tier: Option<RankTier>,
    pub username: String,
    /// Values matching `leaderboard_headers(metric)`.
    pub columns: Vec<String>,
}

pub fn leaderboard_rows(metric: Metric, ranked: &[RankedPlayer]) -> Vec<LeaderboardRow> {
    ranked
        .iter()
        .map(|row| {
            let p = &row.aggregate;
            let maps = p.levels_on_leaderboard.to_string();
            let columns = match metric {
                Metric::BestRank => vec![
                    p.world_record_count.to_string(),
                    p.best_rank_display().to_string(),
                    maps,
                ],
                Metric::TotalTime => vec![format_time(p.total_time), maps],
                Metric::AverageTime => vec![format_time(p.average_time), maps],
                Metric::AverageRank => vec![format!("{:.2}", p.average_rank), maps],
            };
            LeaderboardRow {
                position: row.position,
                tier: RankTier::for_position(row.position),
                username: p.username.clone(),
                columns,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileRow {
    pub level_index: usize,
    pub level_name: String,
    pub rank: u32,
    pub tier: Option<RankTier>,
    pub arrow_icon: &'static str,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileView {
    pub username: String,
    pub avatar: String,
    pub banner: String,
    pub maps_on_lb: u32,
    pub best_rank: String,
    pub average_rank: String,
    pub average_time: String,
    pub total_time: String,
    pub rows: Vec<ProfileRow>,
}

pub fn profile_view(profile: &PlayerProfile, metadata: &Profile) -> ProfileView {
    let (maps_on_lb, best_rank, average_rank, average_time, total_time) = match &profile.aggregate
    {
        Some(agg) => (
            agg.levels_on_leaderboard,
            agg.best_rank_display().to_string(),
            format!("{:.2}", agg.average_rank),
            format_time(agg.average_time),
            format_time(agg.total_time),
        ),
        None => (
            0,
            "-".to_string(),
            "-".to_string(),
            "-".to_string(),
            "-".to_string(),
        ),
    };

    ProfileView {
        username: profile.username.clone(),
        avatar: metadata.avatar_url().to_string(),
        banner: metadata.banner_url().to_string(),
        maps_on_lb,
        best_rank,
        average_rank,
        average_time,
        total_time,
        rows: profile
            .records
            .iter()
            .map(|r| ProfileRow {
                level_index: r.level_index,
                level_name: r.level_name.clone(),
                rank: r.rank,
                tier: RankTier::for_position(r.rank as usize),
                arrow_icon: r.arrow.asset_path(),
                time: format_time(r.completion_time),
            })
            .collect(),
    }
}
