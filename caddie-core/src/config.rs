//! Configuration for the caddie pattern engine.
//!
//! Maps directly to `caddie.toml`. Every field has a default, so an empty
//! file is a valid configuration. The decay half-life, the frequency
//! threshold and the retention floor are domain constants and deliberately
//! absent here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::ShotWindow;

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaddieConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Which shots the engine's club and pressure queries aggregate over.
    #[serde(default)]
    pub window: WindowConfig,
    /// Persistence settings for the `SQLite` store.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Background re-aggregation settings.
    #[serde(default)]
    pub reaggregation: ReaggregationConfig,
}

impl CaddieConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `CaddieError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::CaddieError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error. `RUST_LOG` wins if set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// A recency window expressed relative to "now".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Only shots from the last N days.
    #[serde(default = "default_90")]
    pub recent_days: u32,
    /// At most this many of the most recent shots. `None` means no cap
    /// (TOML has no null, so that is only reachable from code).
    #[serde(default = "default_max_shots")]
    pub max_shots: Option<usize>,
}

impl WindowConfig {
    /// The concrete window ending at `now`.
    #[must_use]
    pub fn window(&self, now: DateTime<Utc>) -> ShotWindow {
        let window = ShotWindow::last_days(now, self.recent_days);
        match self.max_shots {
            Some(n) => window.with_limit(n),
            None => window,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            recent_days: 90,
            max_shots: default_max_shots(),
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Use WAL mode so UI reads don't block the recorder.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// How long a connection waits on a locked database, in milliseconds.
    #[serde(default = "default_5000")]
    pub busy_timeout_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            wal_mode: true,
            busy_timeout_ms: 5000,
        }
    }
}

/// Background re-aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaggregationConfig {
    /// Whether recording a shot schedules a background refresh.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Window the refreshed snapshot is computed over.
    #[serde(default)]
    pub window: WindowConfig,
}

impl Default for ReaggregationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: WindowConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_90() -> u32 { 90 }
fn default_max_shots() -> Option<usize> { Some(200) }
fn default_5000() -> u64 { 5000 }
