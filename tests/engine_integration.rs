//! End-to-end runs of the metrics engine through the public API

use chrono::{Duration as ChronoDuration, Utc};
use pitch_intel::{
    Dataset, EngineConfig, EngineError, FnSection, MetricsEngine, Record, SectionError,
    SectionMetrics, SectionOutcome, SectionRegistry, SectionStatus, Table, CACHE_HIT_MESSAGE,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const CHANNELS: [&str; 5] = ["wide_left", "half_space_left", "center", "half_space_right", "wide_right"];
const THIRDS: [&str; 3] = ["defensive_third", "middle_third", "attacking_third"];
const PHASES: [&str; 4] = ["build_up", "create", "finish", "transition"];

/// Deterministic synthetic match: `n` events over 90 minutes.
fn events(n: usize) -> Table {
    let rows = (0..n)
        .map(|i| {
            let player = (i % 4) as i64;
            Record::new()
                .with("player_id", 100 + player)
                .with("player_name", format!("Player {}", player))
                .with("player_position", ["LB", "RB", "CM", "CF"][player as usize])
                .with("player_targeted_id", 100 + ((player + 1) % 4))
                .with("team_shape", if i % 3 == 0 { "4-3-3" } else { "4-4-2" })
                .with("phase_index", (i / 10) as i64)
                .with("period", if i < n / 2 { 1_i64 } else { 2_i64 })
                .with("minute_start", (i as f64) * 90.0 / n.max(1) as f64)
                .with("channel_start", CHANNELS[i % 5])
                .with("third_start", THIRDS[i % 3])
                .with("third_end", THIRDS[(i + 1) % 3])
                .with("team_in_possession_phase_type", PHASES[i % 4])
                .with("pass_outcome", if i % 5 == 0 { "unsuccessful" } else { "successful" })
                .with("pass_range", if i % 2 == 0 { "short" } else { "long" })
                .with("xthreat", 0.01 * (i % 7) as f64)
                .with("xloss", 0.1 * (i % 5) as f64)
                .with("lead_to_shot", i % 9 == 0)
                .with("lead_to_goal", i % 45 == 0)
                .with("pressing_chain", i % 6 == 0)
                .with("team_possession_loss_in_phase", i % 8 == 0)
                .with("first_line_break", i % 4 == 0)
                .with("team_score", if i < n / 2 { 0_i64 } else { 1_i64 })
                .with("opponent_team_score", 0_i64)
        })
        .collect();
    Table::from_records(rows)
}

fn phases(n: usize) -> Table {
    let rows = (0..n)
        .map(|i| {
            Record::new()
                .with("phase_index", i as i64)
                .with("duration", 5.0 + i as f64)
                .with("team_in_possession_phase_type", PHASES[i % 4])
                .with("team_possession_lead_to_shot", i % 3 == 0)
        })
        .collect();
    Table::from_records(rows)
}

fn match_001() -> Dataset {
    Dataset::new(events(100), Some(phases(10)), Some("match_001".to_string()))
}

fn cached_config(dir: &TempDir) -> EngineConfig {
    EngineConfig::with_cache_dir(dir.path().join("cache"))
}

fn uncached_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.cache.enabled = false;
    config
}

/// Standard registry with `id` swapped for a section that counts its calls.
fn counting_registry(id: &str, calls: &Arc<AtomicUsize>) -> SectionRegistry {
    let mut registry = SectionRegistry::standard();
    let counter = Arc::clone(calls);
    let replaced = registry.replace(
        id,
        Box::new(FnSection::new(id, "Counted", "#", move |events, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(SectionMetrics::new("Counted").with_group("rows", events.len()))
        })),
    );
    assert!(replaced);
    registry
}

#[test]
fn test_scenario_match_without_cache() {
    let engine = MetricsEngine::with_standard_sections(uncached_config()).expect("engine");
    let bundle = engine.compute_all(&match_001(), false, |_, _, _| {}).expect("bundle");

    assert_eq!(bundle.summary.total_events, 100);
    assert_eq!(bundle.summary.total_phases, 10);
    assert_eq!(bundle.summary.total_sections, 14);
    assert_eq!(bundle.len(), 14);
    assert_eq!(
        bundle.summary.successful_sections + bundle.summary.failed_sections,
        14
    );
    assert!(bundle.summary.finished_at >= bundle.summary.started_at);
}

#[test]
fn test_every_section_succeeds_on_full_data() {
    let engine = MetricsEngine::with_standard_sections(uncached_config()).expect("engine");
    let bundle = engine.compute_all(&match_001(), false, |_, _, _| {}).expect("bundle");

    let failed: Vec<_> = bundle.failed_sections().map(|r| (&r.id, r.error())).collect();
    assert!(failed.is_empty(), "unexpected failures: {:?}", failed);

    let possession = bundle.get("possession").expect("possession");
    match &possession.outcome {
        SectionOutcome::Success(metrics) => {
            assert_eq!(metrics.section, "Possession & Build-Up Play");
            assert!(metrics.group("buildup").is_some_and(|g| !g.is_empty()));
        }
        SectionOutcome::Error { error, .. } => panic!("possession failed: {}", error),
    }
    assert_eq!(possession.name, "Possession & Build-Up");
}

#[test]
fn test_cache_serves_identical_bundle_without_rerun() {
    let dir = TempDir::new().expect("tempdir");
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = MetricsEngine::new(cached_config(&dir), counting_registry("efficiency", &calls))
        .expect("engine");

    let first = engine.compute_all(&match_001(), true, |_, _, _| {}).expect("first");

    let mut progress = Vec::new();
    let second = engine
        .compute_all(&match_001(), true, |done, total, message| {
            progress.push((done, total, message.to_string()));
        })
        .expect("second");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        serde_json::to_string(&first).expect("encode"),
        serde_json::to_string(&second).expect("encode")
    );
    assert_eq!(first, second);
    assert_eq!(progress, vec![(14, 14, CACHE_HIT_MESSAGE.to_string())]);
}

#[test]
fn test_cache_persists_across_engines() {
    let dir = TempDir::new().expect("tempdir");
    let first = {
        let engine = MetricsEngine::with_standard_sections(cached_config(&dir)).expect("engine");
        engine.compute_all(&match_001(), true, |_, _, _| {}).expect("first")
    };

    let calls = Arc::new(AtomicUsize::new(0));
    let engine = MetricsEngine::new(cached_config(&dir), counting_registry("momentum", &calls))
        .expect("engine");
    let second = engine.compute_all(&match_001(), true, |_, _, _| {}).expect("second");

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(first, second);
}

#[test]
fn test_engines_with_different_registries_do_not_share_bundles() {
    let dir = TempDir::new().expect("tempdir");
    let standard = MetricsEngine::with_standard_sections(cached_config(&dir)).expect("engine");
    let full = standard.compute_all(&match_001(), true, |_, _, _| {}).expect("full");
    assert_eq!(full.len(), 14);
    drop(standard);

    let registry = SectionRegistry::empty().with(Box::new(FnSection::new(
        "only",
        "Only",
        "1",
        |events, _| Ok(SectionMetrics::new("Only").with_group("rows", events.len())),
    )));
    let single = MetricsEngine::new(cached_config(&dir), registry).expect("engine");

    let mut progress = Vec::new();
    let bundle = single
        .compute_all(&match_001(), true, |done, total, message| {
            progress.push((done, total, message.to_string()));
        })
        .expect("bundle");

    let ids: Vec<&str> = bundle.sections.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["only"]);
    assert_eq!(bundle.section_order, single.registry().ids());
    assert_eq!(progress, vec![(1, 1, "Completed: Only".to_string())]);

    // Each registry now has its own entry
    assert_eq!(single.cache().expect("cache").len(), 2);
}

#[test]
fn test_threshold_change_misses_cache() {
    let dir = TempDir::new().expect("tempdir");
    let calls = Arc::new(AtomicUsize::new(0));

    let first = MetricsEngine::new(cached_config(&dir), counting_registry("consistency", &calls))
        .expect("engine");
    first.compute_all(&match_001(), true, |_, _, _| {}).expect("first");
    first.compute_all(&match_001(), true, |_, _, _| {}).expect("cached");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    drop(first);

    let mut config = cached_config(&dir);
    config.engine.min_player_actions = 25;
    let stricter =
        MetricsEngine::new(config, counting_registry("consistency", &calls)).expect("engine");
    stricter.compute_all(&match_001(), true, |_, _, _| {}).expect("stricter");
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Worker count alone does not invalidate
    drop(stricter);
    let mut config = cached_config(&dir);
    config.engine.min_player_actions = 25;
    config.engine.workers = 2;
    let narrower =
        MetricsEngine::new(config, counting_registry("consistency", &calls)).expect("engine");
    narrower.compute_all(&match_001(), true, |_, _, _| {}).expect("narrower");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_different_identifier_misses_cache() {
    let dir = TempDir::new().expect("tempdir");
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = MetricsEngine::new(cached_config(&dir), counting_registry("set_pieces", &calls))
        .expect("engine");

    engine.compute_all(&match_001(), true, |_, _, _| {}).expect("first");
    let other = Dataset::new(events(100), Some(phases(10)), Some("match_002".to_string()));
    let bundle = engine.compute_all(&other, true, |_, _, _| {}).expect("second");

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(bundle.identifier.as_deref(), Some("match_002"));
}

#[test]
fn test_failing_section_does_not_affect_siblings() {
    let mut registry = SectionRegistry::standard();
    registry.replace(
        "team_chemistry",
        Box::new(FnSection::new("team_chemistry", "Team Chemistry", "🤝", |_, _| {
            Err(SectionError::Failed("engineered failure".to_string()))
        })),
    );
    let engine = MetricsEngine::new(uncached_config(), registry).expect("engine");
    let bundle = engine.compute_all(&match_001(), false, |_, _, _| {}).expect("bundle");

    assert_eq!(bundle.summary.failed_sections, 1);
    assert_eq!(bundle.summary.successful_sections, 13);
    let failed = bundle.get("team_chemistry").expect("result");
    assert_eq!(failed.status(), SectionStatus::Error);
    assert_eq!(failed.error(), Some("engineered failure"));
    assert!(failed.metrics().is_none());
}

#[test]
fn test_panicking_section_is_recorded() {
    let mut registry = SectionRegistry::standard();
    registry.replace(
        "consistency",
        Box::new(FnSection::new("consistency", "Consistency", "🎯", |_, _| {
            panic!("division by zero in window stats")
        })),
    );
    let engine = MetricsEngine::new(uncached_config(), registry).expect("engine");
    let bundle = engine.compute_all(&match_001(), false, |_, _, _| {}).expect("bundle");

    assert_eq!(bundle.summary.failed_sections, 1);
    assert!(bundle
        .get("consistency")
        .and_then(|r| r.error())
        .is_some_and(|e| e.contains("division by zero")));
}

#[test]
fn test_results_always_cover_full_registry() {
    let engine = MetricsEngine::with_standard_sections(uncached_config()).expect("engine");
    let expected = engine.registry().ids();

    let inputs = [
        match_001(),
        Dataset::new(events(0), None, None),
        Dataset::new(
            Table::from_records(vec![Record::new().with("minute_start", 3.0)]),
            None,
            None,
        ),
    ];
    for dataset in &inputs {
        let bundle = engine.compute_all(dataset, false, |_, _, _| {}).expect("bundle");
        let ids: Vec<String> = bundle.sections.keys().cloned().collect();
        let mut sorted = expected.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert_eq!(bundle.section_order, expected);
    }
}

#[test]
fn test_progress_counts_are_strictly_increasing() {
    let mut config = uncached_config();
    config.engine.workers = 8;
    let engine = MetricsEngine::with_standard_sections(config).expect("engine");

    let mut seen = Vec::new();
    engine
        .compute_all(&match_001(), false, |done, total, _| seen.push((done, total)))
        .expect("bundle");

    assert_eq!(seen.len(), 14);
    assert!(seen.windows(2).all(|w| w[0].0 < w[1].0));
    assert_eq!(seen.last(), Some(&(14, 14)));
}

#[test]
fn test_missing_optional_column_degrades() {
    let full = events(100);
    let rows = full
        .rows()
        .iter()
        .map(|row| {
            let mut stripped = Record::new();
            for column in row.columns().filter(|c| c.as_str() != "pass_outcome") {
                if let Some(value) = row.get(column) {
                    stripped.insert(column, value.clone());
                }
            }
            stripped
        })
        .collect();
    let dataset = Dataset::new(Table::from_records(rows), Some(phases(10)), None);

    let engine = MetricsEngine::with_standard_sections(uncached_config()).expect("engine");
    let bundle = engine.compute_all(&dataset, false, |_, _, _| {}).expect("bundle");
    assert_eq!(bundle.summary.failed_sections, 0);
}

#[test]
fn test_fingerprint_ignores_row_order() {
    let ordered = events(40);
    let mut shuffled: Vec<Record> = ordered.rows().to_vec();
    shuffled.reverse();
    shuffled.rotate_left(7);

    let a = Dataset::new(ordered, Some(phases(5)), Some("m".to_string()));
    let b = Dataset::new(Table::from_records(shuffled), Some(phases(5)), Some("m".to_string()));

    for content_digest in [true, false] {
        assert_eq!(
            pitch_intel::fingerprint(&a, content_digest),
            pitch_intel::fingerprint(&b, content_digest)
        );
    }
}

#[test]
fn test_fingerprint_tracks_shape_and_identifier() {
    let base = Dataset::new(events(40), Some(phases(5)), Some("m".to_string()));
    let renamed = Dataset::new(events(40), Some(phases(5)), Some("n".to_string()));
    let longer = Dataset::new(events(41), Some(phases(5)), Some("m".to_string()));
    let no_phases = Dataset::new(events(40), None, Some("m".to_string()));

    let key = pitch_intel::fingerprint(&base, false);
    assert_ne!(key, pitch_intel::fingerprint(&renamed, false));
    assert_ne!(key, pitch_intel::fingerprint(&longer, false));
    assert_ne!(key, pitch_intel::fingerprint(&no_phases, false));
}

#[test]
fn test_expired_entry_is_recomputed_and_overwritten() {
    let dir = TempDir::new().expect("tempdir");
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = MetricsEngine::new(cached_config(&dir), counting_registry("transitions", &calls))
        .expect("engine");
    let dataset = match_001();

    let first = engine.compute_all(&dataset, true, |_, _, _| {}).expect("first");
    let cache = engine.cache().expect("cache enabled");
    let key = engine.cache_key(&dataset);

    // Age the entry past the TTL
    let ttl = ChronoDuration::from_std(cache.ttl()).expect("ttl");
    let aged = Utc::now() - ttl - ChronoDuration::seconds(1);
    cache.store_at(&key, &first, aged).expect("age entry");
    assert!(cache.lookup(&key).is_none());

    let second = engine.compute_all(&dataset, true, |_, _, _| {}).expect("second");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(second.summary.started_at >= first.summary.started_at);

    let stored = cache.lookup(&key).expect("fresh entry");
    assert_eq!(stored, second);
}

#[test]
fn test_clear_cache_forces_recompute() {
    let dir = TempDir::new().expect("tempdir");
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = MetricsEngine::new(cached_config(&dir), counting_registry("chance_creation", &calls))
        .expect("engine");

    engine.compute_all(&match_001(), true, |_, _, _| {}).expect("first");
    assert_eq!(engine.clear_cache().expect("clear"), 1);
    engine.compute_all(&match_001(), true, |_, _, _| {}).expect("second");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_unusable_tables_are_fatal() {
    let engine = MetricsEngine::with_standard_sections(uncached_config()).expect("engine");

    let malformed = Table::new(
        vec!["player_id".to_string(), "player_id".to_string()],
        vec![Record::new().with("player_id", 1_i64)],
    );
    let result = engine.compute_all(&Dataset::new(malformed, None, None), false, |_, _, _| {});
    assert!(matches!(result, Err(EngineError::Dataset(_))));

    let not_tabular = Table::from_json_str("42", "events");
    assert!(not_tabular.is_err());
}

#[test]
fn test_unopenable_cache_dir_runs_uncached() {
    let dir = TempDir::new().expect("tempdir");
    let blocker = dir.path().join("cache");
    std::fs::write(&blocker, b"not a directory").expect("write blocker");

    let engine = MetricsEngine::with_standard_sections(EngineConfig::with_cache_dir(&blocker))
        .expect("engine");
    assert!(engine.cache().is_none());
    let bundle = engine.compute_all(&match_001(), true, |_, _, _| {}).expect("bundle");
    assert_eq!(bundle.len(), 14);
}
