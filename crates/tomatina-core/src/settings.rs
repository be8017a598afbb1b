//! User-facing timer settings.
//!
//! Settings are a flat struct serialized with the camelCase field names the
//! desktop app uses, so exported data bundles remain interchangeable.
//! Durations are minutes. Out-of-range values are clamped rather than
//! rejected; each clamp is reported as a [`ValidationIssue`] so callers can
//! log or display it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive valid range for focus duration (minutes).
pub const FOCUS_RANGE: (u32, u32) = (1, 120);
/// Inclusive valid range for short break duration (minutes).
pub const SHORT_BREAK_RANGE: (u32, u32) = (1, 60);
/// Inclusive valid range for long break duration (minutes).
pub const LONG_BREAK_RANGE: (u32, u32) = (1, 120);
/// Inclusive valid range for focus sessions per long-break cycle.
pub const SESSIONS_RANGE: (u32, u32) = (2, 20);

/// Timer configuration.
///
/// Serialized to/from TOML at `~/.config/tomatina/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Focus session length in minutes.
    #[serde(default = "default_focus_time")]
    pub focus_time: u32,
    /// Short break length in minutes.
    #[serde(default = "default_short_break_time")]
    pub short_break_time: u32,
    /// Long break length in minutes.
    #[serde(default = "default_long_break_time")]
    pub long_break_time: u32,
    /// Focus sessions completed before a long break.
    #[serde(default = "default_sessions_before_long_break")]
    pub sessions_before_long_break: u32,
    #[serde(default)]
    pub auto_start_breaks: bool,
    #[serde(default)]
    pub auto_start_pomodoros: bool,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
}

fn default_focus_time() -> u32 {
    25
}
fn default_short_break_time() -> u32 {
    5
}
fn default_long_break_time() -> u32 {
    15
}
fn default_sessions_before_long_break() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            focus_time: default_focus_time(),
            short_break_time: default_short_break_time(),
            long_break_time: default_long_break_time(),
            sessions_before_long_break: default_sessions_before_long_break(),
            auto_start_breaks: false,
            auto_start_pomodoros: false,
            sound_enabled: true,
            notifications_enabled: true,
        }
    }
}

/// A partial settings update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub focus_time: Option<u32>,
    pub short_break_time: Option<u32>,
    pub long_break_time: Option<u32>,
    pub sessions_before_long_break: Option<u32>,
    pub auto_start_breaks: Option<bool>,
    pub auto_start_pomodoros: Option<bool>,
    pub sound_enabled: Option<bool>,
    pub notifications_enabled: Option<bool>,
}

/// A field that was clamped into its valid range during an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub given: u32,
    pub clamped_to: u32,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {} out of range, clamped to {}",
            self.field, self.given, self.clamped_to
        )
    }
}

fn clamp_field(
    field: &'static str,
    value: u32,
    (min, max): (u32, u32),
    issues: &mut Vec<ValidationIssue>,
) -> u32 {
    let clamped = value.clamp(min, max);
    if clamped != value {
        issues.push(ValidationIssue {
            field,
            given: value,
            clamped_to: clamped,
        });
    }
    clamped
}

impl Settings {
    /// Merge a partial update, clamping numeric fields into their valid
    /// ranges. Returns one issue per clamped field.
    pub fn apply(&mut self, patch: &SettingsPatch) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if let Some(v) = patch.focus_time {
            self.focus_time = clamp_field("focusTime", v, FOCUS_RANGE, &mut issues);
        }
        if let Some(v) = patch.short_break_time {
            self.short_break_time = clamp_field("shortBreakTime", v, SHORT_BREAK_RANGE, &mut issues);
        }
        if let Some(v) = patch.long_break_time {
            self.long_break_time = clamp_field("longBreakTime", v, LONG_BREAK_RANGE, &mut issues);
        }
        if let Some(v) = patch.sessions_before_long_break {
            self.sessions_before_long_break =
                clamp_field("sessionsBeforeLongBreak", v, SESSIONS_RANGE, &mut issues);
        }
        if let Some(v) = patch.auto_start_breaks {
            self.auto_start_breaks = v;
        }
        if let Some(v) = patch.auto_start_pomodoros {
            self.auto_start_pomodoros = v;
        }
        if let Some(v) = patch.sound_enabled {
            self.sound_enabled = v;
        }
        if let Some(v) = patch.notifications_enabled {
            self.notifications_enabled = v;
        }
        issues
    }

    /// Check the current values without mutating. Returns the issues an
    /// equivalent [`apply`](Self::apply) would have reported.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut probe = self.clone();
        probe.apply(&SettingsPatch {
            focus_time: Some(self.focus_time),
            short_break_time: Some(self.short_break_time),
            long_break_time: Some(self.long_break_time),
            sessions_before_long_break: Some(self.sessions_before_long_break),
            ..SettingsPatch::default()
        })
    }
}
