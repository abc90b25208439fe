// Data model: static catalog, fetched leaderboards, and derived player aggregates.

pub mod aggregate;
pub mod catalog;
pub mod leaderboard;
