//! Half-life decay of pattern confidence.
//!
//! A tendency observed yesterday matters more than one observed last month.
//! Confidence is scaled by
//!
//!   factor = 0.5 ^ (elapsed / half_life)
//!
//! where `elapsed` is measured in fractional days (not whole days), so the
//! curve is continuous. The engine's half-life is fixed at 14 days.

use chrono::{DateTime, Utc};

/// Half-life of a pattern's confidence, in days. A domain constant.
pub const HALF_LIFE_DAYS: f64 = 14.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Core decay curve: `0.5 ^ (elapsed_days / half_life_days)`.
///
/// Negative elapsed time is clamped to zero, so the factor never exceeds 1.0.
/// A non-positive half-life means "no decay".
///
/// The result lies in `(0, 1]`. Past roughly 1000 half-lives the curve would
/// underflow to zero, so it bottoms out at [`f64::MIN_POSITIVE`] instead; it
/// is strictly decreasing only above that floor.
#[must_use]
pub fn decay_factor(elapsed_days: f64, half_life_days: f64) -> f64 {
    if half_life_days <= 0.0 || elapsed_days <= 0.0 {
        return 1.0;
    }
    0.5_f64.powf(elapsed_days / half_life_days).max(f64::MIN_POSITIVE)
}

/// Decay factor for an event at `event` seen from `reference`.
///
/// An event in the future of `reference` has not decayed yet (factor 1.0).
#[must_use]
pub fn decay(reference: DateTime<Utc>, event: DateTime<Utc>, half_life_days: f64) -> f64 {
    decay_factor(elapsed_days(reference, event), half_life_days)
}

/// [`decay`] with the engine's fixed [`HALF_LIFE_DAYS`].
#[must_use]
pub fn engine_decay(reference: DateTime<Utc>, event: DateTime<Utc>) -> f64 {
    decay(reference, event, HALF_LIFE_DAYS)
}

/// Fractional days from `event` to `reference`, clamped at zero.
#[must_use]
pub fn elapsed_days(reference: DateTime<Utc>, event: DateTime<Utc>) -> f64 {
    let millis = (reference - event).num_milliseconds();
    if millis <= 0 {
        return 0.0;
    }
    millis as f64 / MILLIS_PER_DAY
}
