//! `SQLite` store for shot history and the pattern snapshot.
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS shots (
//!     id           TEXT PRIMARY KEY,
//!     struck_at_ms INTEGER NOT NULL,
//!     club         TEXT,
//!     direction    TEXT NOT NULL,
//!     lie          TEXT NOT NULL,
//!     pressure     INTEGER NOT NULL
//! );
//! CREATE TABLE IF NOT EXISTS patterns (
//!     position     INTEGER PRIMARY KEY,
//!     data         BLOB NOT NULL
//! );
//! ```
//!
//! Shots are one row each so club, pressure and time windows are plain
//! indexed queries. Patterns are JSON inside a BLOB, which keeps the schema
//! stable if the pattern shape grows. Timestamps are stored as epoch
//! milliseconds, so sub-millisecond precision is dropped on write.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags};
use tracing::{debug, info};

use crate::config::PersistenceConfig;
use crate::error::{CaddieError, Result};
use crate::store::{PatternSink, PatternStore, ShotStore, ShotWindow};
use crate::types::{ClubId, Pattern, Shot, ShotId};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS shots (
        id           TEXT PRIMARY KEY,
        struck_at_ms INTEGER NOT NULL,
        club         TEXT,
        direction    TEXT NOT NULL,
        lie          TEXT NOT NULL,
        pressure     INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_shots_time ON shots (struck_at_ms);
    CREATE INDEX IF NOT EXISTS idx_shots_club ON shots (club, struck_at_ms);
    CREATE INDEX IF NOT EXISTS idx_shots_pressure ON shots (pressure, struck_at_ms);
    CREATE TABLE IF NOT EXISTS patterns (
        position     INTEGER PRIMARY KEY,
        data         BLOB NOT NULL
    );
";

const SHOT_COLUMNS: &str = "id, struck_at_ms, club, direction, lie, pressure";

/// A shot row as stored, before parsing back into domain types.
struct ShotRow {
    id: String,
    struck_at_ms: i64,
    club: Option<String>,
    direction: String,
    lie: String,
    pressure: bool,
}

impl ShotRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            struck_at_ms: row.get(1)?,
            club: row.get(2)?,
            direction: row.get(3)?,
            lie: row.get(4)?,
            pressure: row.get(5)?,
        })
    }

    fn into_shot(self) -> Result<Shot> {
        let id = uuid::Uuid::parse_str(&self.id)
            .map_err(|e| CaddieError::Serialization(format!("shot id '{}': {e}", self.id)))?;
        let timestamp = DateTime::<Utc>::from_timestamp_millis(self.struck_at_ms).ok_or_else(|| {
            CaddieError::Serialization(format!("shot timestamp out of range: {}", self.struck_at_ms))
        })?;
        Ok(Shot {
            id: ShotId(id),
            timestamp,
            club: self.club.map(ClubId),
            direction: self.direction.parse()?,
            lie: self.lie.parse()?,
            pressure: self.pressure,
        })
    }
}

/// Handle to an open `SQLite` database holding shots and patterns.
///
/// # Usage
///
/// ```no_run
/// # use caddie_core::config::PersistenceConfig;
/// # use caddie_core::store::{ShotStore, SqliteStore, ShotWindow};
/// let store = SqliteStore::open("caddie.db", &PersistenceConfig::default())?;
/// let shots = store.recent_shots(&ShotWindow::latest(200))?;
/// # Ok::<(), caddie_core::CaddieError>(())
/// ```
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) a database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CaddieError::Database`] on `SQLite` failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))?;
        conn.execute_batch(SCHEMA)?;

        info!(
            path = %db_path.display(),
            wal = config.wal_mode,
            "Caddie store opened"
        );

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`CaddieError::Database`] on `SQLite` failures.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Path to the database file (or `:memory:`).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Total number of stored shots.
    ///
    /// # Errors
    ///
    /// Returns [`CaddieError::Database`] on `SQLite` failures.
    pub fn shot_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM shots", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Run `PRAGMA integrity_check`. `Ok(false)` means corruption.
    ///
    /// # Errors
    ///
    /// Returns [`CaddieError::Database`] if the check itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .lock()
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }

    fn query_shots(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Shot>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(sql)?;
        let rows = stmt
            .query_map(params, ShotRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(ShotRow::into_shot).collect()
    }
}

impl ShotStore for SqliteStore {
    fn recent_shots(&self, window: &ShotWindow) -> Result<Vec<Shot>> {
        let start = Instant::now();
        let since = window.since.map_or(i64::MIN, |t| t.timestamp_millis());
        // LIMIT -1 is "no limit" in SQLite.
        let limit = window.limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));

        let mut shots = self.query_shots(
            &format!(
                "SELECT {SHOT_COLUMNS} FROM shots WHERE struck_at_ms >= ?1
                 ORDER BY struck_at_ms DESC, rowid DESC LIMIT ?2"
            ),
            params![since, limit],
        )?;
        shots.reverse();

        debug!(
            shots = shots.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Loaded shot window"
        );
        Ok(shots)
    }

    fn shots_by_club(&self, club: &ClubId) -> Result<Vec<Shot>> {
        self.query_shots(
            &format!("SELECT {SHOT_COLUMNS} FROM shots WHERE club = ?1 ORDER BY struck_at_ms, rowid"),
            params![club.as_str()],
        )
    }

    fn shots_with_pressure(&self) -> Result<Vec<Shot>> {
        self.query_shots(
            &format!("SELECT {SHOT_COLUMNS} FROM shots WHERE pressure = 1 ORDER BY struck_at_ms, rowid"),
            [],
        )
    }

    fn record_shot(&self, shot: &Shot) -> Result<()> {
        self.conn.lock().execute(
            "INSERT INTO shots (id, struck_at_ms, club, direction, lie, pressure)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                shot.id.to_string(),
                shot.timestamp.timestamp_millis(),
                shot.club.as_ref().map(ClubId::as_str),
                shot.direction.as_str(),
                shot.lie.as_str(),
                shot.pressure,
            ],
        )?;
        Ok(())
    }
}

impl PatternStore for SqliteStore {
    fn persisted_patterns(&self) -> Result<Vec<Pattern>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT data FROM patterns ORDER BY position")?;
        let blobs = stmt
            .query_map([], |row| row.get::<_, Vec<u8>>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        blobs
            .iter()
            .map(|data| {
                serde_json::from_slice(data).map_err(|e| CaddieError::Serialization(e.to_string()))
            })
            .collect()
    }
}

impl PatternSink for SqliteStore {
    fn persist_patterns(&self, patterns: &[Pattern]) -> Result<()> {
        let start = Instant::now();
        let encoded = patterns
            .iter()
            .map(|p| serde_json::to_vec(p).map_err(|e| CaddieError::Serialization(e.to_string())))
            .collect::<Result<Vec<_>>>()?;

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM patterns", [])?;
        {
            let mut stmt =
                tx.prepare_cached("INSERT INTO patterns (position, data) VALUES (?1, ?2)")?;
            for (position, data) in encoded.iter().enumerate() {
                stmt.execute(params![i64::try_from(position).unwrap_or(i64::MAX), data])?;
            }
        }
        tx.commit()?;

        debug!(
            patterns = patterns.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Persisted pattern snapshot"
        );
        Ok(())
    }
}
