// Per-level leaderboards: record validation at the JSON boundary and a
// single stable sort that fixes every run's rank.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::ParseError;

/// One player's best run on one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEntry {
    pub username: String,
    /// Completion time in seconds.
    pub completion_time: f64,
    #[serde(default)]
    pub arrow_name: Option<String>,
}

impl RunEntry {
    pub fn arrow_variant(&self) -> ArrowVariant {
        ArrowVariant::classify(self.arrow_name.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrowVariant {
    Speedy,
    Energy,
    Default,
}

impl ArrowVariant {
    pub fn classify(arrow_name: Option<&str>) -> Self {
        let Some(name) = arrow_name else {
            return ArrowVariant::Default;
        };
        let name = name.to_lowercase();
        if name.contains("speedy") {
            ArrowVariant::Speedy
        } else if name.contains("energy") {
            ArrowVariant::Energy
        } else {
            ArrowVariant::Default
        }
    }

    pub fn asset_path(self) -> &'static str {
        match self {
            ArrowVariant::Speedy => "assets/speedy.png",
            ArrowVariant::Energy => "assets/energy.png",
            ArrowVariant::Default => "assets/narrow.png",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRun {
    /// 1-based position after sorting by completion time.
    pub rank: u32,
    pub run: RunEntry,
}

/// A level's runs, fastest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LevelLeaderboard {
    pub runs: Vec<RankedRun>,
    /// Records dropped during validation.
    pub skipped_records: usize,
}

impl LevelLeaderboard {
    /// Sort by completion time and assign ranks. Equal times keep arrival order.
    pub fn from_runs(mut runs: Vec<RunEntry>) -> Self {
        runs.sort_by(|a, b| a.completion_time.total_cmp(&b.completion_time));
        let runs = runs
            .into_iter()
            .enumerate()
            .map(|(i, run)| RankedRun {
                rank: i as u32 + 1,
                run,
            })
            .collect();
        Self {
            runs,
            skipped_records: 0,
        }
    }

    /// Parse a leaderboard response body.
    ///
    /// The body must be a JSON array. Elements that fail validation are
    /// skipped and counted rather than failing the whole level.
    pub fn parse(body: &[u8]) -> Result<Self, ParseError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
        let Value::Array(items) = value else {
            return Err(ParseError::NotAnArray);
        };

        let mut runs = Vec::with_capacity(items.len());
        let mut skipped = 0usize;
        for (index, item) in items.into_iter().enumerate() {
            match validate_record(index, item) {
                Ok(run) => runs.push(run),
                Err(e) => {
                    warn!("skipping leaderboard record: {}", e);
                    skipped += 1;
                }
            }
        }

        let mut board = Self::from_runs(runs);
        board.skipped_records = skipped;
        Ok(board)
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// First run recorded for `username`. Exact, case-sensitive match.
    pub fn find(&self, username: &str) -> Option<&RankedRun> {
        self.runs.iter().find(|r| r.run.username == username)
    }

    /// Copy of the board cut to at most `limit` rows.
    pub fn truncated(&self, limit: usize) -> Self {
        Self {
            runs: self.runs.iter().take(limit).cloned().collect(),
            skipped_records: self.skipped_records,
        }
    }
}

fn validate_record(index: usize, item: Value) -> Result<RunEntry, ParseError> {
    let invalid = |reason: String| ParseError::InvalidRecord { index, reason };

    let run: RunEntry = serde_json::from_value(item).map_err(|e| invalid(e.to_string()))?;
    if !run.completion_time.is_finite() || run.completion_time < 0.0 {
        return Err(invalid(format!(
            "completion_time {} out of range",
            run.completion_time
        )));
    }
    Ok(run)
}
