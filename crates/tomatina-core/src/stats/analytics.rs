//! Derived analytics over the session log.
//!
//! Every view is recomputed on demand from the immutable record sequence
//! plus an explicit `today`; there is no cache to invalidate. Date
//! arithmetic is calendar-day based, matching the desktop app's string
//! comparisons on `YYYY-MM-DD` keys.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::storage::SessionRecord;
use crate::timer::SessionMode;

use super::snapshot::StatsSnapshot;

/// Progress against a session goal (daily or weekly).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub completed_sessions: u32,
    pub total_minutes: u32,
    pub goal: u32,
    /// Percent of the goal reached, capped at 100.
    pub progress: f64,
    /// Sessions still needed to reach the goal.
    pub remaining: u32,
}

/// One day of the activity pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayActivity {
    pub date: NaiveDate,
    /// Short weekday name ("Mon".."Sun").
    pub day: String,
    pub sessions: u32,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityInsights {
    pub today: GoalProgress,
    pub week: GoalProgress,
    /// Mean sessions per day over days with at least one session,
    /// rounded to one decimal.
    pub average_daily_sessions: f64,
    pub most_productive_day: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_sessions: u64,
    pub total_minutes: u64,
    pub total_hours: f64,
}

/// Completed/interrupted tallies for one session kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeTally {
    pub completed: u32,
    pub interrupted: u32,
    pub total_minutes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTypeBreakdown {
    pub focus: TypeTally,
    pub short_break: TypeTally,
    pub long_break: TypeTally,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Read-only view over the log and the persisted snapshot.
pub struct Analytics<'a> {
    history: &'a [SessionRecord],
    stats: &'a StatsSnapshot,
}

impl<'a> Analytics<'a> {
    pub fn new(history: &'a [SessionRecord], stats: &'a StatsSnapshot) -> Self {
        Self { history, stats }
    }

    fn completed_focus(&self) -> impl Iterator<Item = &SessionRecord> {
        self.history
            .iter()
            .filter(|r| r.kind == SessionMode::Focus && r.completed)
    }

    fn goal_progress(&self, sessions: u32, minutes: u32, goal: u32) -> GoalProgress {
        let progress = if goal == 0 {
            100.0
        } else {
            (f64::from(sessions) / f64::from(goal) * 100.0).min(100.0)
        };
        GoalProgress {
            completed_sessions: sessions,
            total_minutes: minutes,
            goal,
            progress,
            remaining: goal.saturating_sub(sessions),
        }
    }

    /// Completed focus sessions on `today`, against the daily goal.
    pub fn today_stats(&self, today: NaiveDate) -> GoalProgress {
        let (sessions, minutes) = self
            .completed_focus()
            .filter(|r| r.date == today)
            .fold((0u32, 0u32), |(n, m), r| (n + 1, m + r.duration_min));
        self.goal_progress(sessions, minutes, self.stats.daily_goal)
    }

    /// Completed focus sessions since a week ago (inclusive), against the
    /// weekly goal.
    pub fn week_stats(&self, today: NaiveDate) -> GoalProgress {
        let week_ago = today - Duration::days(7);
        let (sessions, minutes) = self
            .completed_focus()
            .filter(|r| r.date >= week_ago)
            .fold((0u32, 0u32), |(n, m), r| (n + 1, m + r.duration_min));
        self.goal_progress(sessions, minutes, self.stats.weekly_goal)
    }

    /// Per-day activity for the trailing `days` window, oldest first,
    /// ending on `today`. Lazy and restartable: each call rescans the log.
    pub fn daily_pattern(
        &self,
        days: u32,
        today: NaiveDate,
    ) -> impl Iterator<Item = DayActivity> + '_ {
        (0..days).map(move |i| {
            let date = today - Duration::days(i64::from(days - 1 - i));
            let (sessions, minutes) = self
                .completed_focus()
                .filter(|r| r.date == date)
                .fold((0u32, 0u32), |(n, m), r| (n + 1, m + r.duration_min));
            DayActivity {
                date,
                day: date.format("%a").to_string(),
                sessions,
                minutes,
            }
        })
    }

    /// Combined view over today, the week, and a 30-day pattern.
    ///
    /// The streak scan preserves the desktop app's exact algorithm,
    /// including its known quirk: a zero-session day resets the running
    /// streak whenever the temp counter has caught up with it, so
    /// `current_streak` ends up describing the run at the oldest edge of
    /// the window rather than the run ending today. Kept verbatim for
    /// compatibility with historical numbers.
    pub fn productivity_insights(&self, today: NaiveDate) -> ProductivityInsights {
        let pattern: Vec<DayActivity> = self.daily_pattern(30, today).collect();

        let active: Vec<&DayActivity> = pattern.iter().filter(|d| d.sessions > 0).collect();
        let average_daily_sessions = if active.is_empty() {
            0.0
        } else {
            let sum: u32 = active.iter().map(|d| d.sessions).sum();
            round1(f64::from(sum) / active.len() as f64)
        };

        // Per-weekday totals in first-seen order (oldest day first).
        let mut weekday_totals: Vec<(String, u32, u32)> = Vec::new();
        for day in &pattern {
            match weekday_totals.iter_mut().find(|(name, _, _)| *name == day.day) {
                Some((_, sessions, count)) => {
                    *sessions += day.sessions;
                    *count += 1;
                }
                None => weekday_totals.push((day.day.clone(), day.sessions, 1)),
            }
        }
        let mut most_productive_day = String::from("Monday");
        let mut highest_average = 0.0;
        for (name, sessions, count) in &weekday_totals {
            let average = f64::from(*sessions) / f64::from(*count);
            if average > highest_average {
                highest_average = average;
                most_productive_day = name.clone();
            }
        }

        let mut current_streak = 0u32;
        let mut longest_streak = 0u32;
        let mut temp_streak = 0u32;
        for day in pattern.iter().rev() {
            if day.sessions > 0 {
                if temp_streak == current_streak {
                    current_streak += 1;
                }
                temp_streak += 1;
                longest_streak = longest_streak.max(temp_streak);
            } else {
                if temp_streak == current_streak {
                    current_streak = 0;
                }
                temp_streak = 0;
            }
        }

        ProductivityInsights {
            today: self.today_stats(today),
            week: self.week_stats(today),
            average_daily_sessions,
            most_productive_day,
            current_streak,
            longest_streak,
            total_sessions: self.stats.completed_sessions,
            total_minutes: self.stats.total_minutes,
            total_hours: round1(self.stats.total_minutes as f64 / 60.0),
        }
    }

    /// Completed vs interrupted counts and summed minutes per session kind
    /// over the trailing `days` window.
    pub fn session_type_breakdown(&self, days: u32, today: NaiveDate) -> SessionTypeBreakdown {
        let cutoff = today - Duration::days(i64::from(days));
        let mut breakdown = SessionTypeBreakdown::default();
        for record in self.history.iter().filter(|r| r.date >= cutoff) {
            let tally = match record.kind {
                SessionMode::Focus => &mut breakdown.focus,
                SessionMode::ShortBreak => &mut breakdown.short_break,
                SessionMode::LongBreak => &mut breakdown.long_break,
            };
            if record.completed {
                tally.completed += 1;
            } else {
                tally.interrupted += 1;
            }
            tally.total_minutes += record.duration_min;
        }
        breakdown
    }
}
