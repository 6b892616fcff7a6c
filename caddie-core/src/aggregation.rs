//! Pattern aggregation: turning a window of shots into ranked tendencies.
//!
//! The aggregator treats whatever shots it receives as the full population.
//! Picking the window ("last 90 days", "last 200 shots") is the shot store's
//! job. Within a scope:
//!
//! 1. Filter to the scoped population.
//! 2. If fewer than [`MIN_SHOTS_FOR_PATTERN`] shots remain, emit nothing.
//! 3. Bucket by miss direction; `raw = frequency / population`.
//! 4. Drop directions with `raw < FREQUENCY_THRESHOLD`.
//! 5. Decay survivors against their freshest shot.
//! 6. Rank by decayed confidence, then frequency, then direction order.
//!
//! Decay runs after the frequency gate, so it can only weaken a pattern that
//! already qualified.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::decay;
use crate::types::{ClubId, MissDirection, Pattern, PatternScope, Shot};

/// Minimum scoped population before any pattern can be formed.
pub const MIN_SHOTS_FOR_PATTERN: usize = 3;

/// Minimum share of the scoped population a direction needs, before decay.
pub const FREQUENCY_THRESHOLD: f64 = 0.30;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: u32,
    freshest: DateTime<Utc>,
}

/// Aggregate `shots` into ranked patterns for `scope`, decayed against `now`.
///
/// Never fails: empty or tiny input yields an empty list.
#[must_use]
pub fn aggregate(shots: &[Shot], now: DateTime<Utc>, scope: &PatternScope) -> Vec<Pattern> {
    let mut buckets: BTreeMap<MissDirection, Bucket> = BTreeMap::new();
    let mut population: u32 = 0;

    for shot in shots.iter().filter(|s| scope.admits(s)) {
        population += 1;
        buckets
            .entry(shot.direction)
            .and_modify(|b| {
                b.count += 1;
                if shot.timestamp > b.freshest {
                    b.freshest = shot.timestamp;
                }
            })
            .or_insert(Bucket {
                count: 1,
                freshest: shot.timestamp,
            });
    }

    if (population as usize) < MIN_SHOTS_FOR_PATTERN {
        return Vec::new();
    }

    let mut patterns: Vec<Pattern> = buckets
        .into_iter()
        .filter_map(|(direction, bucket)| {
            let raw = f64::from(bucket.count) / f64::from(population);
            if raw < FREQUENCY_THRESHOLD {
                return None;
            }
            Some(Pattern {
                direction,
                frequency: bucket.count,
                sample_size: population,
                raw_confidence: raw,
                decayed_confidence: raw * decay::engine_decay(now, bucket.freshest),
                last_occurrence: bucket.freshest,
                scope: scope.clone(),
            })
        })
        .collect();

    rank(&mut patterns);
    patterns
}

/// Aggregate every scope the shots support: unscoped, pressure, and one
/// club scope per distinct club (in club order). Results are concatenated
/// scope by scope, each block ranked on its own.
#[must_use]
pub fn aggregate_all_scopes(shots: &[Shot], now: DateTime<Utc>) -> Vec<Pattern> {
    let clubs: BTreeSet<&ClubId> = shots.iter().filter_map(|s| s.club.as_ref()).collect();

    let mut scopes = vec![PatternScope::Unscoped, PatternScope::ByPressure];
    scopes.extend(clubs.into_iter().cloned().map(PatternScope::ByClub));

    scopes
        .iter()
        .flat_map(|scope| aggregate(shots, now, scope))
        .collect()
}

/// Sort patterns into canonical order (see [`Pattern::rank_key`]).
pub fn rank(patterns: &mut [Pattern]) {
    patterns.sort_by_key(Pattern::rank_key);
}
