//! In-process stores backed by lock-guarded vectors.
//!
//! Shots are kept in chronological order on insert so window queries are a
//! binary search plus a slice.

use parking_lot::RwLock;

use crate::error::Result;
use crate::store::{PatternSink, PatternStore, ShotStore, ShotWindow};
use crate::types::{ClubId, Pattern, Shot};

/// Shot history held in memory.
#[derive(Debug, Default)]
pub struct InMemoryShotStore {
    shots: RwLock<Vec<Shot>>,
}

impl InMemoryShotStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with `shots` (any order).
    #[must_use]
    pub fn with_shots(mut shots: Vec<Shot>) -> Self {
        shots.sort_by_key(|s| s.timestamp);
        Self {
            shots: RwLock::new(shots),
        }
    }

    /// Number of stored shots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shots.read().len()
    }

    /// Whether the store holds no shots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shots.read().is_empty()
    }

    fn filtered(&self, keep: impl Fn(&Shot) -> bool) -> Vec<Shot> {
        self.shots.read().iter().filter(|&s| keep(s)).cloned().collect()
    }
}

impl ShotStore for InMemoryShotStore {
    fn recent_shots(&self, window: &ShotWindow) -> Result<Vec<Shot>> {
        Ok(window.apply(&self.shots.read()).to_vec())
    }

    fn shots_by_club(&self, club: &ClubId) -> Result<Vec<Shot>> {
        Ok(self.filtered(|s| s.is_club(club)))
    }

    fn shots_with_pressure(&self) -> Result<Vec<Shot>> {
        Ok(self.filtered(|s| s.pressure))
    }

    fn record_shot(&self, shot: &Shot) -> Result<()> {
        let mut shots = self.shots.write();
        // Late-arriving shots (synced from another device) still land in order.
        let at = shots.partition_point(|s| s.timestamp <= shot.timestamp);
        shots.insert(at, shot.clone());
        Ok(())
    }
}

/// Pattern snapshot held in memory.
#[derive(Debug, Default)]
pub struct InMemoryPatternStore {
    patterns: RwLock<Vec<Pattern>>,
}

impl InMemoryPatternStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `patterns`.
    #[must_use]
    pub fn with_patterns(patterns: Vec<Pattern>) -> Self {
        Self {
            patterns: RwLock::new(patterns),
        }
    }
}

impl PatternStore for InMemoryPatternStore {
    fn persisted_patterns(&self) -> Result<Vec<Pattern>> {
        Ok(self.patterns.read().clone())
    }
}

impl PatternSink for InMemoryPatternStore {
    fn persist_patterns(&self, patterns: &[Pattern]) -> Result<()> {
        *self.patterns.write() = patterns.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Lie, MissDirection};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).single().expect("valid date") + Duration::days(day)
    }

    #[test]
    fn out_of_order_writes_stay_chronological() {
        let store = InMemoryShotStore::new();
        for day in [5, 1, 3] {
            store
                .record_shot(&Shot::new(at(day), None, MissDirection::Fat, Lie::Rough, false))
                .expect("record");
        }

        let shots = store.recent_shots(&ShotWindow::all()).expect("read");
        let days: Vec<DateTime<Utc>> = shots.iter().map(|s| s.timestamp).collect();
        assert_eq!(days, vec![at(1), at(3), at(5)]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn club_and_pressure_queries() {
        let seven = ClubId::new("7-iron");
        let store = InMemoryShotStore::with_shots(vec![
            Shot::new(at(0), Some(seven.clone()), MissDirection::Slice, Lie::Fairway, true),
            Shot::new(at(1), Some(ClubId::new("driver")), MissDirection::Hook, Lie::Tee, false),
            Shot::new(at(2), None, MissDirection::Thin, Lie::Bunker, true),
        ]);

        assert_eq!(store.shots_by_club(&seven).expect("club").len(), 1);
        assert_eq!(store.shots_with_pressure().expect("pressure").len(), 2);
    }

    #[test]
    fn pattern_snapshot_is_replaced() {
        let store = InMemoryPatternStore::new();
        assert!(store.persisted_patterns().expect("read").is_empty());

        let pattern = Pattern {
            direction: MissDirection::Push,
            frequency: 3,
            sample_size: 5,
            raw_confidence: 0.6,
            decayed_confidence: 0.6,
            last_occurrence: at(0),
            scope: crate::types::PatternScope::Unscoped,
        };
        store.persist_patterns(&[pattern.clone(), pattern.clone()]).expect("write");
        store.persist_patterns(&[pattern]).expect("write");
        assert_eq!(store.persisted_patterns().expect("read").len(), 1);
    }
}
