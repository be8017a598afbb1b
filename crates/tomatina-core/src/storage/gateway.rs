//! Persistence gateway consumed by the timer core.
//!
//! The engine talks to an abstract [`StorageGateway`] so it never blocks on
//! or unwinds from persistence problems; call sites log failures and keep
//! going. [`FileStore`] is the production implementation (TOML settings
//! next to a SQLite session database); [`MemoryStore`] backs tests.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{ConfigError, CoreError};
use crate::settings::Settings;
use crate::stats::StatsSnapshot;

use super::database::{Database, NewSession, SessionRecord, HISTORY_CAP};
use super::data_dir;

const STATS_KEY: &str = "stats";

pub trait StorageGateway {
    fn load_settings(&self) -> Result<Settings, CoreError>;
    fn save_settings(&self, settings: &Settings) -> Result<(), CoreError>;
    fn load_stats(&self) -> Result<StatsSnapshot, CoreError>;
    fn save_stats(&self, stats: &StatsSnapshot) -> Result<(), CoreError>;
    /// Full session history, oldest first.
    fn load_history(&self) -> Result<Vec<SessionRecord>, CoreError>;
    /// Append a finished session and return the updated history. Retains
    /// at most [`HISTORY_CAP`] records, dropping the oldest.
    fn append_session(&self, session: NewSession) -> Result<Vec<SessionRecord>, CoreError>;
    /// Drop all history, returning the (empty) history.
    fn clear_history(&self) -> Result<Vec<SessionRecord>, CoreError>;
    /// Replace the whole history wholesale (data import).
    fn replace_history(&self, records: &[SessionRecord]) -> Result<(), CoreError>;
}

/// On-disk store: `config.toml` + `tomatina.db` in one directory.
pub struct FileStore {
    config_path: PathBuf,
    db: Database,
}

impl FileStore {
    /// Open the store in the default data directory.
    pub fn open() -> Result<Self, CoreError> {
        let dir = data_dir()?;
        Self::open_at(&dir)
    }

    /// Open the store in an explicit directory (tests, portable setups).
    pub fn open_at(dir: &Path) -> Result<Self, CoreError> {
        let db = Database::open(&dir.join("tomatina.db"))?;
        Ok(Self {
            config_path: dir.join("config.toml"),
            db,
        })
    }
}

impl StorageGateway for FileStore {
    fn load_settings(&self) -> Result<Settings, CoreError> {
        match std::fs::read_to_string(&self.config_path) {
            Ok(content) => {
                let settings =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: self.config_path.clone(),
                        message: e.to_string(),
                    })?;
                Ok(settings)
            }
            Err(_) => {
                // First run: write the defaults so the file exists to edit.
                let settings = Settings::default();
                self.save_settings(&settings)?;
                Ok(settings)
            }
        }
    }

    fn save_settings(&self, settings: &Settings) -> Result<(), CoreError> {
        let content = toml::to_string_pretty(settings).map_err(|e| ConfigError::SaveFailed {
            path: self.config_path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&self.config_path, content).map_err(|e| ConfigError::SaveFailed {
            path: self.config_path.clone(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    fn load_stats(&self) -> Result<StatsSnapshot, CoreError> {
        match self.db.kv_get(STATS_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(StatsSnapshot::default()),
        }
    }

    fn save_stats(&self, stats: &StatsSnapshot) -> Result<(), CoreError> {
        let json = serde_json::to_string(stats)?;
        self.db.kv_set(STATS_KEY, &json)?;
        Ok(())
    }

    fn load_history(&self) -> Result<Vec<SessionRecord>, CoreError> {
        Ok(self.db.history()?)
    }

    fn append_session(&self, session: NewSession) -> Result<Vec<SessionRecord>, CoreError> {
        Ok(self.db.append_session(&session)?)
    }

    fn clear_history(&self) -> Result<Vec<SessionRecord>, CoreError> {
        self.db.clear_sessions()?;
        Ok(Vec::new())
    }

    fn replace_history(&self, records: &[SessionRecord]) -> Result<(), CoreError> {
        Ok(self.db.replace_sessions(records)?)
    }
}

#[derive(Default)]
struct MemoryInner {
    settings: Settings,
    stats: StatsSnapshot,
    history: Vec<SessionRecord>,
    next_id: i64,
}

/// In-memory store for tests. Clones share state, so a test can hold one
/// handle while the engine owns another.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current history length without going through the gateway interface.
    pub fn history_len(&self) -> usize {
        self.inner.borrow().history.len()
    }
}

impl StorageGateway for MemoryStore {
    fn load_settings(&self) -> Result<Settings, CoreError> {
        Ok(self.inner.borrow().settings.clone())
    }

    fn save_settings(&self, settings: &Settings) -> Result<(), CoreError> {
        self.inner.borrow_mut().settings = settings.clone();
        Ok(())
    }

    fn load_stats(&self) -> Result<StatsSnapshot, CoreError> {
        Ok(self.inner.borrow().stats.clone())
    }

    fn save_stats(&self, stats: &StatsSnapshot) -> Result<(), CoreError> {
        self.inner.borrow_mut().stats = stats.clone();
        Ok(())
    }

    fn load_history(&self) -> Result<Vec<SessionRecord>, CoreError> {
        Ok(self.inner.borrow().history.clone())
    }

    fn append_session(&self, session: NewSession) -> Result<Vec<SessionRecord>, CoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let record = SessionRecord {
            id: inner.next_id,
            date: session.date,
            kind: session.kind,
            duration_min: session.duration_min,
            completed: session.completed,
            interruptions: session.interruptions,
            started_at: session.started_at,
            completed_at: session.completed_at,
        };
        inner.history.push(record);
        if inner.history.len() > HISTORY_CAP {
            let excess = inner.history.len() - HISTORY_CAP;
            inner.history.drain(..excess);
        }
        Ok(inner.history.clone())
    }

    fn clear_history(&self) -> Result<Vec<SessionRecord>, CoreError> {
        self.inner.borrow_mut().history.clear();
        Ok(Vec::new())
    }

    fn replace_history(&self, records: &[SessionRecord]) -> Result<(), CoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.history = records.to_vec();
        inner.next_id = records.iter().map(|r| r.id).max().unwrap_or(0);
        Ok(())
    }
}
