//! Core type definitions for the caddie pattern engine.
//!
//! Shots are immutable facts. Patterns are derived values that are always
//! rebuilt (from shots, or from a persisted pattern plus fresh decay), never
//! edited in place.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decay;
use crate::error::CaddieError;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier for a recorded shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShotId(pub Uuid);

impl ShotId {
    /// Create a new random shot ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ShotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ShotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a club in the player's bag ("7-iron", "driver", ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClubId(pub String);

impl ClubId {
    /// Create a club identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClubId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Shot classification
// ---------------------------------------------------------------------------

/// How a shot deviated from its intended line.
///
/// Declaration order is the final tiebreak when ranking patterns, so it must
/// stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissDirection {
    /// On the intended line.
    Straight,
    /// Starts right and stays right (right-handed player).
    Push,
    /// Starts left and stays left.
    Pull,
    /// Curves hard left-to-right.
    Slice,
    /// Curves hard right-to-left.
    Hook,
    /// Ground contacted before the ball.
    Fat,
    /// Ball struck low on the face.
    Thin,
}

impl MissDirection {
    /// Every direction, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Straight,
        Self::Push,
        Self::Pull,
        Self::Slice,
        Self::Hook,
        Self::Fat,
        Self::Thin,
    ];

    /// Stable lowercase name, used for storage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Straight => "straight",
            Self::Push => "push",
            Self::Pull => "pull",
            Self::Slice => "slice",
            Self::Hook => "hook",
            Self::Fat => "fat",
            Self::Thin => "thin",
        }
    }
}

impl fmt::Display for MissDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissDirection {
    type Err = CaddieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CaddieError::InvalidShot(format!("unknown miss direction '{s}'")))
    }
}

/// Course surface the shot was played from. Recorded, but not used by the
/// engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lie {
    /// Teed up.
    Tee,
    /// Short grass.
    Fairway,
    /// Long grass.
    Rough,
    /// Sand.
    Bunker,
    /// Collar around the green.
    Fringe,
    /// Putting surface.
    Green,
    /// Anything else (pine straw, hardpan, recovery).
    Other,
}

impl Lie {
    /// Every lie, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Tee,
        Self::Fairway,
        Self::Rough,
        Self::Bunker,
        Self::Fringe,
        Self::Green,
        Self::Other,
    ];

    /// Stable lowercase name, used for storage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tee => "tee",
            Self::Fairway => "fairway",
            Self::Rough => "rough",
            Self::Bunker => "bunker",
            Self::Fringe => "fringe",
            Self::Green => "green",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Lie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lie {
    type Err = CaddieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CaddieError::InvalidShot(format!("unknown lie '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Shot
// ---------------------------------------------------------------------------

/// A single recorded shot. Created once by the recording flow and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    /// Unique shot ID.
    pub id: ShotId,
    /// When the shot was struck.
    pub timestamp: DateTime<Utc>,
    /// Club used, when known.
    pub club: Option<ClubId>,
    /// How the shot missed (or `Straight`).
    pub direction: MissDirection,
    /// Surface the shot was played from.
    pub lie: Lie,
    /// Whether the shot was played under self-reported or inferred pressure.
    pub pressure: bool,
}

impl Shot {
    /// Create a new shot with a fresh ID.
    #[must_use]
    pub fn new(
        timestamp: DateTime<Utc>,
        club: Option<ClubId>,
        direction: MissDirection,
        lie: Lie,
        pressure: bool,
    ) -> Self {
        Self {
            id: ShotId::new(),
            timestamp,
            club,
            direction,
            lie,
            pressure,
        }
    }

    /// Whether this shot was hit with `club`.
    #[must_use]
    pub fn is_club(&self, club: &ClubId) -> bool {
        self.club.as_ref() == Some(club)
    }
}

// ---------------------------------------------------------------------------
// Pattern
// ---------------------------------------------------------------------------

/// The population a pattern was computed over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "club", rename_all = "snake_case")]
pub enum PatternScope {
    /// Every shot in the window.
    #[default]
    Unscoped,
    /// Only shots hit with this club.
    ByClub(ClubId),
    /// Only shots played under pressure.
    ByPressure,
}

impl PatternScope {
    /// Whether `shot` belongs to this scope's population.
    #[must_use]
    pub fn admits(&self, shot: &Shot) -> bool {
        match self {
            Self::Unscoped => true,
            Self::ByClub(club) => shot.is_club(club),
            Self::ByPressure => shot.pressure,
        }
    }

    /// Club this scope is restricted to, if any.
    #[must_use]
    pub fn club(&self) -> Option<&ClubId> {
        match self {
            Self::ByClub(club) => Some(club),
            Self::Unscoped | Self::ByPressure => None,
        }
    }

    /// Whether this is the pressure scope.
    #[must_use]
    pub fn is_pressure(&self) -> bool {
        matches!(self, Self::ByPressure)
    }
}

impl fmt::Display for PatternScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unscoped => f.write_str("all shots"),
            Self::ByClub(club) => write!(f, "club {club}"),
            Self::ByPressure => f.write_str("under pressure"),
        }
    }
}

/// A tendency derived from a window of shots: "slices the 7-iron 40% of
/// the time, last seen three days ago".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// The miss this pattern describes.
    pub direction: MissDirection,
    /// Shots of `direction` in the scoped window.
    pub frequency: u32,
    /// All shots in the scoped window.
    pub sample_size: u32,
    /// `frequency / sample_size`, before decay.
    pub raw_confidence: f64,
    /// `raw_confidence` scaled by the age of `last_occurrence`.
    pub decayed_confidence: f64,
    /// Timestamp of the freshest shot contributing to this pattern.
    pub last_occurrence: DateTime<Utc>,
    /// Population the pattern was computed over.
    pub scope: PatternScope,
}

impl Pattern {
    /// Return a copy of this pattern with `decayed_confidence` recomputed
    /// against `now`. The stored raw confidence is never touched, so calling
    /// this repeatedly at the same `now` cannot drift.
    #[must_use]
    pub fn redecayed(&self, now: DateTime<Utc>) -> Self {
        Self {
            decayed_confidence: self.raw_confidence * decay::engine_decay(now, self.last_occurrence),
            ..self.clone()
        }
    }

    /// Ranking key: decayed confidence desc, frequency desc, direction order.
    ///
    /// Sorting ascending by this key yields the canonical result order.
    #[must_use]
    pub fn rank_key(&self) -> (std::cmp::Reverse<OrderedFloat<f64>>, std::cmp::Reverse<u32>, MissDirection) {
        (
            std::cmp::Reverse(OrderedFloat(self.decayed_confidence)),
            std::cmp::Reverse(self.frequency),
            self.direction,
        )
    }
}
