pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod source;

pub use engine::ranking::Metric;
pub use engine::session::StatsSession;
