//! Integration Tests: End-to-End Pattern Flows
//!
//! These tests drive the public API the way the app does: record shots,
//! query scoped patterns, refresh the persisted snapshot, and read it back
//! with decay at fixed offsets.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use caddie_core::aggregation::{aggregate, aggregate_all_scopes};
use caddie_core::clock::ManualClock;
use caddie_core::config::{CaddieConfig, PersistenceConfig, ReaggregationConfig};
use caddie_core::pattern_memory::PatternMemory;
use caddie_core::reaggregation::Reaggregator;
use caddie_core::recorder::ShotRecorder;
use caddie_core::store::{PatternStore, ShotStore, ShotWindow, SqliteStore};
use caddie_core::types::{ClubId, Lie, MissDirection, PatternScope, Shot};
use caddie_core::CaddieEngine;

fn round_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 12, 7, 30, 0).single().expect("valid date")
}

fn shot(minute: i64, club: &str, direction: MissDirection, pressure: bool) -> Shot {
    Shot::new(
        round_start() + Duration::minutes(minute),
        Some(ClubId::new(club)),
        direction,
        Lie::Fairway,
        pressure,
    )
}

/// A round's worth of shots: the 7-iron slices, mostly when it matters.
fn sample_round() -> Vec<Shot> {
    vec![
        shot(0, "driver", MissDirection::Straight, false),
        shot(5, "7-iron", MissDirection::Slice, false),
        shot(12, "driver", MissDirection::Hook, false),
        shot(18, "7-iron", MissDirection::Slice, true),
        shot(25, "driver", MissDirection::Straight, false),
        shot(31, "7-iron", MissDirection::Slice, true),
        shot(40, "pw", MissDirection::Straight, false),
        shot(47, "7-iron", MissDirection::Slice, true),
        shot(55, "driver", MissDirection::Straight, true),
        shot(62, "pw", MissDirection::Fat, false),
    ]
}

// ---------------------------------------------------------------------------
// Full lifecycle: record → scoped query → snapshot → decay on read
// ---------------------------------------------------------------------------

#[test]
fn full_pattern_lifecycle() {
    let clock = Arc::new(ManualClock::new(round_start() + Duration::hours(2)));
    let db = Arc::new(SqliteStore::open_in_memory().expect("open"));

    // 1. Record the round
    let recorder = ShotRecorder::new(db.clone());
    for s in sample_round() {
        recorder.record_shot(s).expect("record");
    }
    assert_eq!(db.shot_count().expect("count"), 10);

    // 2. The 7-iron tendency is visible on a club query
    let memory = PatternMemory::new(db.clone(), db.clone(), clock.clone());
    let seven = memory.patterns_for_club(&ClubId::new("7-iron")).expect("club");
    assert_eq!(seven.len(), 1);
    assert_eq!(seven[0].direction, MissDirection::Slice);
    assert_eq!((seven[0].frequency, seven[0].sample_size), (4, 4));

    // 3. Under pressure, slices dominate (3 of 4)
    let pressure = memory.patterns_for_pressure().expect("pressure");
    assert_eq!(pressure[0].direction, MissDirection::Slice);
    assert_eq!(pressure[0].sample_size, 4);
    assert!((pressure[0].raw_confidence - 0.75).abs() < 1e-12);

    // 4. Refresh the snapshot synchronously
    let reaggregator = Reaggregator::new(db.clone(), db.clone(), clock.clone(), &ReaggregationConfig::default());
    let written = reaggregator.refresh_once().expect("refresh");
    assert_eq!(written, db.persisted_patterns().expect("persisted").len());

    // 5. Two weeks later, everything has halved
    let fresh = memory.current_patterns().expect("fresh");
    clock.advance(Duration::days(14));
    let later = memory.current_patterns().expect("later");
    assert_eq!(fresh.len(), later.len());
    for (a, b) in fresh.iter().zip(&later) {
        assert_eq!(a.direction, b.direction);
        assert!((b.decayed_confidence / a.decayed_confidence - 0.5).abs() < 0.05);
    }

    // 6. Three months on, the snapshot has aged out entirely
    clock.advance(Duration::days(90));
    assert!(memory.current_patterns().expect("stale").is_empty());
}

// ---------------------------------------------------------------------------
// Frequency gates on the unscoped population
// ---------------------------------------------------------------------------

#[test]
fn unscoped_round_keeps_only_qualifying_directions() {
    let now = round_start() + Duration::hours(2);
    let patterns = aggregate(&sample_round(), now, &PatternScope::Unscoped);

    // Straight 4/10 and Slice 4/10 pass; Hook and Fat (1/10 each) do not.
    let directions: Vec<MissDirection> = patterns.iter().map(|p| p.direction).collect();
    assert_eq!(directions.len(), 2);
    assert!(directions.contains(&MissDirection::Slice));
    assert!(directions.contains(&MissDirection::Straight));
    assert!(patterns.iter().all(|p| p.sample_size == 10));

    // Equal frequency; the last straight shot is fresher, so it ranks first.
    assert_eq!(patterns[0].direction, MissDirection::Straight);
    assert_eq!(patterns[0].last_occurrence, round_start() + Duration::minutes(55));
}

#[test]
fn all_scopes_are_unique_per_direction_and_scope() {
    let now = round_start() + Duration::hours(2);
    let patterns = aggregate_all_scopes(&sample_round(), now);

    for (i, a) in patterns.iter().enumerate() {
        for b in &patterns[i + 1..] {
            assert!(
                !(a.direction == b.direction && a.scope == b.scope),
                "duplicate {:?} in {}",
                a.direction,
                a.scope
            );
        }
    }
    // Driver: Straight 3/4 (75%), Hook 1/4 (25%, rejected).
    let driver: Vec<_> = patterns
        .iter()
        .filter(|p| p.scope == PatternScope::ByClub(ClubId::new("driver")))
        .collect();
    assert_eq!(driver.len(), 1);
    assert_eq!(driver[0].direction, MissDirection::Straight);
}

// ---------------------------------------------------------------------------
// File-backed store with the configured window
// ---------------------------------------------------------------------------

#[test]
fn configured_window_limits_refresh() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = CaddieConfig::from_toml(
        r#"
        [reaggregation.window]
        recent_days = 30
        max_shots = 4
        "#,
    )
    .expect("config");

    let db = Arc::new(SqliteStore::open(dir.path().join("caddie.db"), &PersistenceConfig::default()).expect("open"));
    for s in sample_round() {
        db.record_shot(&s).expect("record");
    }

    let now = round_start() + Duration::hours(2);
    let window = config.reaggregation.window.window(now);
    let shots = db.recent_shots(&window).expect("window");
    assert_eq!(shots.len(), 4);
    assert_eq!(shots[3].timestamp, round_start() + Duration::minutes(62));

    let reaggregator = Reaggregator::new(db.clone(), db.clone(), Arc::new(ManualClock::new(now)), &config.reaggregation);
    reaggregator.refresh_once().expect("refresh");

    // Last four shots: Straight, Slice, Straight, Fat.
    let persisted = db.persisted_patterns().expect("persisted");
    assert!(persisted.iter().all(|p| p.sample_size <= 4));
}

#[test]
fn old_history_outside_window_is_ignored() {
    let db = SqliteStore::open_in_memory().expect("open");
    let now = round_start();
    for days in [200, 150, 120] {
        db.record_shot(&Shot::new(now - Duration::days(days), None, MissDirection::Hook, Lie::Tee, false))
            .expect("record");
    }

    let recent = db.recent_shots(&ShotWindow::last_days(now, 90)).expect("recent");
    assert!(recent.is_empty());
    assert!(aggregate(&recent, now, &PatternScope::Unscoped).is_empty());
}

// ---------------------------------------------------------------------------
// Engine wiring
// ---------------------------------------------------------------------------

#[tokio::test]
async fn engine_refreshes_in_background() {
    let now = round_start() + Duration::hours(2);
    let db = Arc::new(SqliteStore::open_in_memory().expect("open"));
    let engine = CaddieEngine::new(
        db.clone(),
        db.clone(),
        db.clone(),
        Arc::new(ManualClock::new(now)),
        &CaddieConfig::default(),
    );

    for s in sample_round() {
        engine.recorder.record_shot(s).expect("record");
    }
    let memory = engine.memory.clone();
    engine.shutdown().await;

    let patterns = memory.patterns_with_decay(now).expect("read");
    assert!(patterns.iter().any(|p| {
        p.direction == MissDirection::Slice && p.scope == PatternScope::ByClub(ClubId::new("7-iron"))
    }));
}

#[test]
fn engine_queries_honour_configured_window() {
    let now = round_start() + Duration::days(320);
    let db = Arc::new(SqliteStore::open_in_memory().expect("open"));
    let config = CaddieConfig::from_toml(
        r#"
        [window]
        recent_days = 1
        max_shots = 1

        [reaggregation]
        enabled = false
        "#,
    )
    .expect("parse");
    let engine = CaddieEngine::new(db.clone(), db.clone(), db.clone(), Arc::new(ManualClock::new(now)), &config);

    // Five pressured 7-iron slices, all more than 300 days old.
    for minute in 0..5 {
        engine
            .recorder
            .record_shot(shot(minute, "7-iron", MissDirection::Slice, true))
            .expect("record");
    }

    assert!(engine.memory.patterns_for_club(&ClubId::new("7-iron")).expect("club").is_empty());
    assert!(engine.memory.patterns_for_pressure().expect("pressure").is_empty());

    // The same history without a window still forms the pattern.
    let unbounded = PatternMemory::new(db.clone(), db.clone(), Arc::new(ManualClock::new(now)));
    assert_eq!(unbounded.patterns_for_club(&ClubId::new("7-iron")).expect("club")[0].sample_size, 5);
}
