//! Read side of the engine: decayed patterns on demand.
//!
//! [`PatternMemory`] serves two kinds of query:
//!
//! - **Decay-on-read** over the persisted snapshot. Each stored pattern keeps
//!   its raw confidence and `last_occurrence`; decay is recomputed against the
//!   caller's `now` every time and nothing is written back. Patterns whose
//!   decayed confidence falls under [`RETENTION_FLOOR`] are dropped, which is
//!   how stale tendencies disappear without a purge job.
//! - **Scoped re-derivation** from raw shots (by club, under pressure, or over
//!   a recency window), delegating the fetch to the shot store and the math
//!   to [`aggregation::aggregate`]. Club and pressure queries are trimmed to
//!   the configured [`WindowConfig`] when one is set.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::aggregation;
use crate::clock::Clock;
use crate::config::WindowConfig;
use crate::error::Result;
use crate::store::{PatternStore, ShotStore, ShotWindow};
use crate::types::{ClubId, Pattern, PatternScope, Shot};

/// Decayed confidence below which a persisted pattern is considered stale.
///
/// Roughly six half-lives for a pattern that was certain when stored.
pub const RETENTION_FLOOR: f64 = 0.01;

/// Decay-aware view over the shot and pattern stores.
#[derive(Clone)]
pub struct PatternMemory {
    shots: Arc<dyn ShotStore>,
    patterns: Arc<dyn PatternStore>,
    clock: Arc<dyn Clock>,
    window: Option<WindowConfig>,
}

impl std::fmt::Debug for PatternMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternMemory").finish_non_exhaustive()
    }
}

impl PatternMemory {
    /// Build a view over the given collaborators. Club and pressure queries
    /// see the whole history until [`Self::with_window`] is applied.
    #[must_use]
    pub fn new(shots: Arc<dyn ShotStore>, patterns: Arc<dyn PatternStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            shots,
            patterns,
            clock,
            window: None,
        }
    }

    /// Limit club and pressure queries to `window`, evaluated at query time.
    #[must_use]
    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = Some(window);
        self
    }

    /// Persisted patterns with decay reapplied at `now`, minus stale ones,
    /// in canonical rank order.
    ///
    /// Calling this twice with the same `now` gives identical results.
    ///
    /// # Errors
    /// Propagates pattern store failures.
    pub fn patterns_with_decay(&self, now: DateTime<Utc>) -> Result<Vec<Pattern>> {
        let persisted = self.patterns.persisted_patterns()?;
        let total = persisted.len();

        let mut retained: Vec<Pattern> = persisted
            .iter()
            .map(|p| p.redecayed(now))
            .filter(|p| p.decayed_confidence >= RETENTION_FLOOR)
            .collect();
        aggregation::rank(&mut retained);

        debug!(
            retained = retained.len(),
            expired = total - retained.len(),
            "Reapplied decay to persisted patterns"
        );
        Ok(retained)
    }

    /// [`Self::patterns_with_decay`] at the clock's current time.
    ///
    /// # Errors
    /// Propagates pattern store failures.
    pub fn current_patterns(&self) -> Result<Vec<Pattern>> {
        self.patterns_with_decay(self.clock.now())
    }

    /// Patterns for one club, derived fresh from that club's shots.
    ///
    /// # Errors
    /// Propagates shot store failures.
    pub fn patterns_for_club(&self, club: &ClubId) -> Result<Vec<Pattern>> {
        let now = self.clock.now();
        let fetched = self.shots.shots_by_club(club)?;
        let shots = self.windowed(&fetched, now);
        let patterns = aggregation::aggregate(shots, now, &PatternScope::ByClub(club.clone()));
        debug!(club = %club, shots = shots.len(), patterns = patterns.len(), "Club patterns derived");
        Ok(patterns)
    }

    /// Patterns for shots played under pressure.
    ///
    /// # Errors
    /// Propagates shot store failures.
    pub fn patterns_for_pressure(&self) -> Result<Vec<Pattern>> {
        let now = self.clock.now();
        let fetched = self.shots.shots_with_pressure()?;
        let shots = self.windowed(&fetched, now);
        let patterns = aggregation::aggregate(shots, now, &PatternScope::ByPressure);
        debug!(shots = shots.len(), patterns = patterns.len(), "Pressure patterns derived");
        Ok(patterns)
    }

    // Store results are oldest first, which is what `ShotWindow::apply` expects.
    fn windowed<'a>(&self, shots: &'a [Shot], now: DateTime<Utc>) -> &'a [Shot] {
        match &self.window {
            Some(window) => window.window(now).apply(shots),
            None => shots,
        }
    }

    /// Unscoped patterns over a recency window.
    ///
    /// # Errors
    /// Propagates shot store failures.
    pub fn patterns_for_window(&self, window: &ShotWindow) -> Result<Vec<Pattern>> {
        let shots = self.shots.recent_shots(window)?;
        Ok(aggregation::aggregate(&shots, self.clock.now(), &PatternScope::Unscoped))
    }
}
