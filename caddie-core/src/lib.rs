//! # Caddie Core Library
//!
//! Miss-pattern memory for a golf caddy. Every recorded [`Shot`] carries a
//! club, a miss direction, a lie and a pressure tag; the engine turns a window
//! of them into ranked, time-decayed [`Pattern`]s such as "slices the 7-iron
//! under pressure".
//!
//! - [`decay`]: half-life decay (14 days), continuous in time
//! - [`aggregation`]: scoped bucketing, frequency gates, ranking
//! - [`pattern_memory`]: decay-on-read over persisted patterns, scoped queries
//! - [`recorder`]: the write path
//! - [`reaggregation`]: background snapshot refresh after writes
//! - [`store`]: collaborator traits plus in-memory and `SQLite` stores
//!
//! Decay and aggregation are pure functions: no I/O, no locks, safe to call
//! from any thread. Shared mutable state lives only in the stores.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod aggregation;
pub mod clock;
pub mod config;
pub mod decay;
pub mod engine;
pub mod error;
pub mod pattern_memory;
pub mod reaggregation;
pub mod recorder;
pub mod store;
pub mod telemetry;
pub mod types;

pub use aggregation::{aggregate, FREQUENCY_THRESHOLD, MIN_SHOTS_FOR_PATTERN};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CaddieConfig;
pub use engine::CaddieEngine;
pub use error::CaddieError;
pub use pattern_memory::{PatternMemory, RETENTION_FLOOR};
pub use recorder::ShotRecorder;
pub use types::*;
