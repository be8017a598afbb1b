//! Cumulative statistics counters.

use serde::{Deserialize, Serialize};

/// Persisted counters plus the user's goals. Counters advance only when a
/// focus session runs down to zero; goals are edited directly.
///
/// Kept deliberately independent of the session log: a counter reset does
/// not rewrite history (see `clear_history` for that).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsSnapshot {
    pub completed_sessions: u64,
    pub total_minutes: u64,
    pub streak_count: u64,
    pub daily_goal: u32,
    pub weekly_goal: u32,
}

impl Default for StatsSnapshot {
    fn default() -> Self {
        Self {
            completed_sessions: 0,
            total_minutes: 0,
            streak_count: 0,
            daily_goal: 8,
            weekly_goal: 40,
        }
    }
}

/// Partial update merged into the snapshot; `None` fields are untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsUpdate {
    pub completed_sessions: Option<u64>,
    pub total_minutes: Option<u64>,
    pub streak_count: Option<u64>,
    pub daily_goal: Option<u32>,
    pub weekly_goal: Option<u32>,
}

/// Owns the snapshot and applies the accumulate/merge/reset operations.
/// Persistence is the caller's concern; the aggregator only mutates the
/// in-memory snapshot.
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    snapshot: StatsSnapshot,
}

impl StatsAggregator {
    pub fn new(snapshot: StatsSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &StatsSnapshot {
        &self.snapshot
    }

    /// Account for one naturally completed focus session of the configured
    /// length.
    pub fn record_completed_focus(&mut self, focus_minutes: u32) {
        self.snapshot.completed_sessions += 1;
        self.snapshot.total_minutes += u64::from(focus_minutes);
        self.snapshot.streak_count += 1;
    }

    /// Merge a partial update into the snapshot.
    pub fn merge(&mut self, update: &StatsUpdate) {
        if let Some(v) = update.completed_sessions {
            self.snapshot.completed_sessions = v;
        }
        if let Some(v) = update.total_minutes {
            self.snapshot.total_minutes = v;
        }
        if let Some(v) = update.streak_count {
            self.snapshot.streak_count = v;
        }
        if let Some(v) = update.daily_goal {
            self.snapshot.daily_goal = v;
        }
        if let Some(v) = update.weekly_goal {
            self.snapshot.weekly_goal = v;
        }
    }

    /// Zero the counters while preserving the goals.
    pub fn reset_counters(&mut self) {
        self.snapshot.completed_sessions = 0;
        self.snapshot.total_minutes = 0;
        self.snapshot.streak_count = 0;
    }
}
