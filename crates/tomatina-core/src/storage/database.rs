//! SQLite-backed session history.
//!
//! Stores the append-only session log plus a small key-value table used
//! for the persisted stats snapshot. History is capped at the
//! [`HISTORY_CAP`] most recent records; appends drop the oldest rows.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::StorageError;
use crate::timer::SessionMode;

/// Maximum number of session records retained in history.
pub const HISTORY_CAP: usize = 1000;

/// One finished session. Immutable once stored; `id` is assigned by the
/// store and increases in completion order. JSON field names match the
/// desktop app's export format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: SessionMode,
    #[serde(rename = "duration")]
    pub duration_min: u32,
    pub completed: bool,
    #[serde(default)]
    pub interruptions: u32,
    #[serde(rename = "startTime", default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "timestamp")]
    pub completed_at: DateTime<Utc>,
}

/// A finished session before the store assigns its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub date: NaiveDate,
    pub kind: SessionMode,
    pub duration_min: u32,
    pub completed: bool,
    pub interruptions: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: DateTime<Utc>,
}

/// SQLite database for the session log and the stats snapshot.
pub struct Database {
    conn: Connection,
}

fn mode_to_str(mode: SessionMode) -> &'static str {
    match mode {
        SessionMode::Focus => "focus",
        SessionMode::ShortBreak => "shortBreak",
        SessionMode::LongBreak => "longBreak",
    }
}

fn mode_from_str(s: &str) -> SessionMode {
    match s {
        "shortBreak" => SessionMode::ShortBreak,
        "longBreak" => SessionMode::LongBreak,
        _ => SessionMode::Focus,
    }
}

impl Database {
    /// Open the database at the given path, creating the schema if needed.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests and scratch use).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id            INTEGER PRIMARY KEY AUTOINCREMENT,
                    date          TEXT NOT NULL,
                    kind          TEXT NOT NULL,
                    duration_min  INTEGER NOT NULL,
                    completed     INTEGER NOT NULL,
                    interruptions INTEGER NOT NULL DEFAULT 0,
                    started_at    TEXT,
                    completed_at  TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_date ON sessions(date);
                CREATE INDEX IF NOT EXISTS idx_sessions_date_kind ON sessions(date, kind);",
            )
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    /// Append a session, trim history beyond [`HISTORY_CAP`], and return
    /// the full updated history.
    pub fn append_session(&self, session: &NewSession) -> Result<Vec<SessionRecord>, StorageError> {
        self.conn.execute(
            "INSERT INTO sessions (date, kind, duration_min, completed, interruptions, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                session.date.format("%Y-%m-%d").to_string(),
                mode_to_str(session.kind),
                session.duration_min,
                session.completed,
                session.interruptions,
                session.started_at.map(|t| t.to_rfc3339()),
                session.completed_at.to_rfc3339(),
            ],
        )?;
        self.conn.execute(
            "DELETE FROM sessions WHERE id NOT IN
             (SELECT id FROM sessions ORDER BY id DESC LIMIT ?1)",
            params![HISTORY_CAP as i64],
        )?;
        self.history()
    }

    /// Full history, oldest first (insertion order = completion order).
    pub fn history(&self) -> Result<Vec<SessionRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, kind, duration_min, completed, interruptions, started_at, completed_at
             FROM sessions ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RawRow {
                id: row.get(0)?,
                date: row.get(1)?,
                kind: row.get(2)?,
                duration_min: row.get(3)?,
                completed: row.get(4)?,
                interruptions: row.get(5)?,
                started_at: row.get(6)?,
                completed_at: row.get(7)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.decode()?);
        }
        Ok(records)
    }

    pub fn clear_sessions(&self) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM sessions", [])?;
        Ok(())
    }

    /// Replace the whole history (used by data import). Record ids are
    /// preserved as given.
    pub fn replace_sessions(&self, records: &[SessionRecord]) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM sessions", [])?;
        let mut stmt = self.conn.prepare(
            "INSERT INTO sessions (id, date, kind, duration_min, completed, interruptions, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for record in records {
            stmt.execute(params![
                record.id,
                record.date.format("%Y-%m-%d").to_string(),
                mode_to_str(record.kind),
                record.duration_min,
                record.completed,
                record.interruptions,
                record.started_at.map(|t| t.to_rfc3339()),
                record.completed_at.to_rfc3339(),
            ])?;
        }
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        match stmt.query_row(params![key], |row| row.get::<_, String>(0)) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

struct RawRow {
    id: i64,
    date: String,
    kind: String,
    duration_min: u32,
    completed: bool,
    interruptions: u32,
    started_at: Option<String>,
    completed_at: String,
}

impl RawRow {
    fn decode(self) -> Result<SessionRecord, StorageError> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").map_err(|e| {
            StorageError::CorruptValue {
                key: "sessions.date".into(),
                message: e.to_string(),
            }
        })?;
        let completed_at = DateTime::parse_from_rfc3339(&self.completed_at)
            .map_err(|e| StorageError::CorruptValue {
                key: "sessions.completed_at".into(),
                message: e.to_string(),
            })?
            .with_timezone(&Utc);
        let started_at = match self.started_at {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(&raw)
                    .map_err(|e| StorageError::CorruptValue {
                        key: "sessions.started_at".into(),
                        message: e.to_string(),
                    })?
                    .with_timezone(&Utc),
            ),
            None => None,
        };
        Ok(SessionRecord {
            id: self.id,
            date,
            kind: mode_from_str(&self.kind),
            duration_min: self.duration_min,
            completed: self.completed,
            interruptions: self.interruptions,
            started_at,
            completed_at,
        })
    }
}
