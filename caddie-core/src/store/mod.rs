//! Collaborator interfaces the engine reads from and writes to.
//!
//! The engine itself holds no shared mutable state. Shot history and the
//! persisted pattern snapshot live behind these traits, and each
//! implementation owns its own concurrency discipline.
//!
//! Two reference implementations ship with the crate:
//! - [`memory`]: lock-guarded vectors, for tests and embedders.
//! - [`sqlite`]: a single-file `SQLite` database.

pub mod memory;
pub mod sqlite;

pub use memory::{InMemoryPatternStore, InMemoryShotStore};
pub use sqlite::SqliteStore;

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::types::{ClubId, Pattern, Shot};

/// Which slice of shot history to read.
///
/// Both bounds are optional and combine: "the last 90 days, but at most the
/// 200 most recent shots".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShotWindow {
    /// Only shots at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Only the N most recent shots.
    pub limit: Option<usize>,
}

impl ShotWindow {
    /// The whole history.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Shots from the `days` days before `now`.
    #[must_use]
    pub fn last_days(now: DateTime<Utc>, days: u32) -> Self {
        Self {
            since: Some(now - Duration::days(i64::from(days))),
            limit: None,
        }
    }

    /// The `n` most recent shots.
    #[must_use]
    pub fn latest(n: usize) -> Self {
        Self {
            since: None,
            limit: Some(n),
        }
    }

    /// Cap the window at the `n` most recent shots.
    #[must_use]
    pub fn with_limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Apply this window to a chronologically sorted slice.
    #[must_use]
    pub fn apply<'a>(&self, chronological: &'a [Shot]) -> &'a [Shot] {
        let start = self
            .since
            .map_or(0, |since| chronological.partition_point(|s| s.timestamp < since));
        let in_range = &chronological[start..];
        match self.limit {
            Some(n) if n < in_range.len() => &in_range[in_range.len() - n..],
            _ => in_range,
        }
    }
}

/// Append-only shot history.
pub trait ShotStore: Send + Sync {
    /// Shots inside `window`, oldest first.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    fn recent_shots(&self, window: &ShotWindow) -> Result<Vec<Shot>>;

    /// Every shot hit with `club`, oldest first.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    fn shots_by_club(&self, club: &ClubId) -> Result<Vec<Shot>>;

    /// Every shot played under pressure, oldest first.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    fn shots_with_pressure(&self) -> Result<Vec<Shot>>;

    /// Append a shot.
    ///
    /// # Errors
    /// Returns an error if the store cannot be written.
    fn record_shot(&self, shot: &Shot) -> Result<()>;
}

/// Previously computed patterns, each carrying its own `last_occurrence`
/// and pre-decay `raw_confidence`.
pub trait PatternStore: Send + Sync {
    /// The persisted snapshot.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    fn persisted_patterns(&self) -> Result<Vec<Pattern>>;
}

/// Write side of the pattern snapshot, used by background re-aggregation.
pub trait PatternSink: Send + Sync {
    /// Replace the persisted snapshot with `patterns`.
    ///
    /// # Errors
    /// Returns an error if the store cannot be written.
    fn persist_patterns(&self, patterns: &[Pattern]) -> Result<()>;
}
