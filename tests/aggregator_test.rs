use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use lb_stats_engine::config::EngineConfig;
use lb_stats_engine::engine::aggregator::Aggregator;
use lb_stats_engine::engine::cache::FetchCache;
use lb_stats_engine::engine::ranking::{rank, Metric};
use lb_stats_engine::error::{FetchError, LevelError};
use lb_stats_engine::model::catalog::{Catalog, Level};
use lb_stats_engine::model::leaderboard::ArrowVariant;
use lb_stats_engine::source::traits::LeaderboardSource;
use lb_stats_engine::StatsSession;

enum Reply {
    Body(String),
    Status(u16),
    Hang,
}

struct ScriptedSource {
    replies: HashMap<String, Reply>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn new(replies: Vec<(&str, Reply)>) -> Arc<Self> {
        Arc::new(Self {
            replies: replies
                .into_iter()
                .map(|(u, r)| (u.to_string(), r))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LeaderboardSource for ScriptedSource {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.replies.get(url) {
            Some(Reply::Body(body)) => Ok(Bytes::from(body.clone())),
            Some(Reply::Status(status)) => Err(FetchError::Status(*status)),
            Some(Reply::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(FetchError::Timeout)
            }
            None => Err(FetchError::Status(404)),
        }
    }
}

fn body(runs: &[(&str, f64)]) -> Reply {
    let items: Vec<String> = runs
        .iter()
        .map(|(u, t)| format!(r#"{{"username": "{}", "completion_time": {}}}"#, u, t))
        .collect();
    Reply::Body(format!("[{}]", items.join(",")))
}

fn level(name: &str, api: &str) -> Level {
    Level {
        name: name.to_string(),
        creator: None,
        thumbnail: String::new(),
        api: api.to_string(),
    }
}

fn aggregator(source: Arc<ScriptedSource>) -> Aggregator {
    let cache = Arc::new(FetchCache::new(source));
    Aggregator::new(cache, 4, Duration::from_secs(10))
}

#[tokio::test]
async fn test_single_level_scenario() {
    let source = ScriptedSource::new(vec![("u1", body(&[("alice", 10.0), ("bob", 20.0)]))]);
    let agg = aggregator(source);
    let levels = vec![level("L1", "u1")];

    let players = agg.build_player_stats(&levels).await;
    assert_eq!(players.len(), 2);

    let alice = &players["alice"];
    assert_eq!(alice.best_rank, 1);
    assert_eq!(alice.world_record_count, 1);
    assert!((alice.total_time - 10.0).abs() < 1e-9);
    assert!(alice.completed_all_levels);

    let bob = &players["bob"];
    assert_eq!(bob.best_rank, 2);
    assert_eq!(bob.world_record_count, 0);
    assert!((bob.total_time - 20.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_failed_level_yields_empty_mapping() {
    let source = ScriptedSource::new(vec![("u1", Reply::Status(500))]);
    let agg = aggregator(source);
    let levels = vec![level("L1", "u1")];

    let aggregation = agg.aggregate(&levels).await;
    assert!(aggregation.players.is_empty());
    assert_eq!(aggregation.failed_levels.len(), 1);
    assert_eq!(aggregation.failed_levels[0].level_name, "L1");
    assert_eq!(aggregation.failed_levels[0].error, "HTTP 500");
}

#[tokio::test]
async fn test_partial_failure_keeps_other_levels() {
    let source = ScriptedSource::new(vec![
        ("u1", body(&[("alice", 10.0)])),
        ("u2", Reply::Status(503)),
        ("u3", body(&[("bob", 5.0), ("alice", 6.0)])),
    ]);
    let agg = aggregator(source);
    let levels = vec![level("L1", "u1"), level("L2", "u2"), level("L3", "u3")];

    let aggregation = agg.aggregate(&levels).await;
    assert_eq!(aggregation.level_count, 3);
    assert_eq!(aggregation.failed_levels.len(), 1);
    assert_eq!(aggregation.failed_levels[0].level_index, 1);

    let alice = &aggregation.players["alice"];
    assert_eq!(alice.levels_on_leaderboard, 2);
    assert_eq!(alice.total_rank, 3);
    // A failed level still counts toward the catalog size.
    assert!(!alice.completed_all_levels);
}

#[tokio::test]
async fn test_average_rank_excludes_incomplete_players() {
    let source = ScriptedSource::new(vec![
        ("u1", body(&[("alice", 10.0), ("carol", 11.0)])),
        ("u2", body(&[("carol", 1.0), ("bob", 2.0), ("alice", 3.0)])),
    ]);
    let agg = aggregator(source);
    let levels = vec![level("L1", "u1"), level("L2", "u2")];

    let players = agg.build_player_stats(&levels).await;
    assert!(!players["bob"].completed_all_levels);

    let rows = rank(&players, Metric::AverageRank, None);
    assert!(rows.iter().all(|r| r.aggregate.username != "bob"));
    let alice = rows
        .iter()
        .find(|r| r.aggregate.username == "alice")
        .unwrap();
    assert!((alice.aggregate.average_rank - 2.0).abs() < 1e-9);

    let rows = rank(&players, Metric::AverageTime, None);
    assert!(rows.iter().all(|r| r.aggregate.completed_all_levels));
    assert!(rank(&players, Metric::BestRank, None)
        .iter()
        .any(|r| r.aggregate.username == "bob"));
}

#[tokio::test]
async fn test_build_player_stats_is_idempotent_on_warm_cache() {
    let source = ScriptedSource::new(vec![
        ("u1", body(&[("alice", 10.0), ("bob", 20.0)])),
        ("u2", body(&[("bob", 7.5)])),
    ]);
    let agg = aggregator(source.clone());
    let levels = vec![level("L1", "u1"), level("L2", "u2")];

    let first = agg.build_player_stats(&levels).await;
    let second = agg.build_player_stats(&levels).await;
    assert_eq!(first, second);
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_empty_level_contributes_nothing() {
    let source = ScriptedSource::new(vec![
        ("u1", Reply::Body("[]".to_string())),
        ("u2", body(&[("alice", 4.0)])),
    ]);
    let agg = aggregator(source);
    let levels = vec![level("L1", "u1"), level("L2", "u2")];

    let aggregation = agg.aggregate(&levels).await;
    assert!(aggregation.failed_levels.is_empty());
    assert_eq!(aggregation.players.len(), 1);
    assert_eq!(aggregation.players["alice"].levels_on_leaderboard, 1);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_level_times_out() {
    let source = ScriptedSource::new(vec![
        ("u1", body(&[("alice", 10.0)])),
        ("u2", Reply::Hang),
    ]);
    let agg = aggregator(source);
    let levels = vec![level("L1", "u1"), level("L2", "u2")];

    let aggregation = agg.aggregate(&levels).await;
    assert_eq!(aggregation.failed_levels.len(), 1);
    assert_eq!(aggregation.failed_levels[0].error, "timed out");
    assert_eq!(aggregation.players["alice"].levels_on_leaderboard, 1);
}

#[tokio::test]
async fn test_player_profile_records_sorted_by_rank() {
    let source = ScriptedSource::new(vec![
        ("u1", body(&[("zed", 1.0), ("yan", 2.0), ("alice", 3.0)])),
        ("u2", body(&[("alice", 9.0)])),
        ("u3", Reply::Status(502)),
        (
            "u4",
            Reply::Body(
                r#"[{"username": "zed", "completion_time": 1}, {"username": "alice", "completion_time": 2, "arrow_name": "Speedy"}]"#
                    .to_string(),
            ),
        ),
    ]);
    let agg = aggregator(source);
    let levels = vec![
        level("L1", "u1"),
        level("L2", "u2"),
        level("L3", "u3"),
        level("L4", "u4"),
    ];

    let profile = agg.player_profile("alice", &levels).await;
    let ranks: Vec<(u32, &str)> = profile
        .records
        .iter()
        .map(|r| (r.rank, r.level_name.as_str()))
        .collect();
    assert_eq!(ranks, vec![(1, "L2"), (2, "L4"), (3, "L1")]);
    assert_eq!(profile.records[1].arrow, ArrowVariant::Speedy);
    assert_eq!(profile.failed_levels.len(), 1);

    let summary = profile.aggregate.unwrap();
    assert_eq!(summary.world_record_count, 1);
    assert_eq!(summary.levels_on_leaderboard, 3);

    let nobody = agg.player_profile("nobody", &levels).await;
    assert!(nobody.records.is_empty());
    assert!(nobody.aggregate.is_none());
}

#[tokio::test]
async fn test_session_serializes_overlapping_aggregations() {
    let source = ScriptedSource::new(vec![
        ("u1", body(&[("alice", 10.0), ("bob", 20.0)])),
        ("u2", body(&[("bob", 3.0), ("alice", 4.0)])),
    ]);
    let catalog = Catalog::new(vec![level("L1", "u1"), level("L2", "u2")], HashMap::new());
    let session = StatsSession::new(catalog, source.clone(), &EngineConfig::default());

    let (a, b) = tokio::join!(session.player_stats(), session.player_stats());
    assert_eq!(a, b);
    assert_eq!(source.calls(), 2);

    // alice 14s total, bob 23s total: bob is the only match, so he is row 1.
    let rows = session.leaderboard(Metric::TotalTime, Some("BO")).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].aggregate.username, "bob");
    assert_eq!(rows[0].position, 1);

    let board = session.level_leaderboard(1).await.unwrap();
    assert_eq!(board.runs[0].run.username, "bob");
    assert_eq!(
        session.level_leaderboard(7).await.unwrap_err(),
        LevelError::UnknownLevel(7)
    );
}
