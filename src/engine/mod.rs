// Aggregation engine: cache, fan-out fetching, ranking and head-to-head comparison.

pub mod aggregator;
pub mod cache;
pub mod comparator;
pub mod ranking;
pub mod session;
pub mod stats;
