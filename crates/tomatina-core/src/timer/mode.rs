use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// The three interval kinds the timer cycles through. The same enum is
/// stored on session records, serialized with the desktop app's names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionMode {
    Focus,
    ShortBreak,
    LongBreak,
}

/// Display metadata for a mode, for tray tooltips and status lines.
#[derive(Debug, Clone, Serialize)]
pub struct ModeInfo {
    pub icon: &'static str,
    pub title: &'static str,
    pub description: String,
}

impl SessionMode {
    /// Configured length of this interval in seconds.
    pub fn duration_secs(&self, settings: &Settings) -> u32 {
        let minutes = match self {
            SessionMode::Focus => settings.focus_time,
            SessionMode::ShortBreak => settings.short_break_time,
            SessionMode::LongBreak => settings.long_break_time,
        };
        minutes.saturating_mul(60)
    }

    pub fn is_focus(&self) -> bool {
        matches!(self, SessionMode::Focus)
    }

    pub fn icon(&self) -> &'static str {
        match self {
            SessionMode::Focus => "\u{1f3af}",
            SessionMode::ShortBreak => "\u{2615}",
            SessionMode::LongBreak => "\u{1f31f}",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SessionMode::Focus => "Focus Session",
            SessionMode::ShortBreak => "Short Break",
            SessionMode::LongBreak => "Long Break",
        }
    }

    /// Short label used in tray tooltips.
    pub fn tray_label(&self) -> &'static str {
        match self {
            SessionMode::Focus => "Focus",
            SessionMode::ShortBreak => "Break",
            SessionMode::LongBreak => "Long Break",
        }
    }

    /// Full display metadata. `session_index`/`sessions_per_cycle` feed the
    /// "Session N of M" line shown during focus intervals.
    pub fn info(&self, session_index: u32, sessions_per_cycle: u32) -> ModeInfo {
        let description = match self {
            SessionMode::Focus => {
                format!("Session {session_index} of {sessions_per_cycle}")
            }
            SessionMode::ShortBreak => "Take a short break!".to_string(),
            SessionMode::LongBreak => "Enjoy your long break!".to_string(),
        };
        ModeInfo {
            icon: self.icon(),
            title: self.title(),
            description,
        }
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionMode::Focus => write!(f, "focus"),
            SessionMode::ShortBreak => write!(f, "shortBreak"),
            SessionMode::LongBreak => write!(f, "longBreak"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_come_from_settings() {
        let settings = Settings {
            focus_time: 25,
            short_break_time: 5,
            long_break_time: 15,
            ..Settings::default()
        };
        assert_eq!(SessionMode::Focus.duration_secs(&settings), 25 * 60);
        assert_eq!(SessionMode::ShortBreak.duration_secs(&settings), 5 * 60);
        assert_eq!(SessionMode::LongBreak.duration_secs(&settings), 15 * 60);
    }

    #[test]
    fn serializes_with_desktop_names() {
        assert_eq!(
            serde_json::to_string(&SessionMode::ShortBreak).unwrap(),
            "\"shortBreak\""
        );
        assert_eq!(
            serde_json::to_string(&SessionMode::Focus).unwrap(),
            "\"focus\""
        );
    }

    #[test]
    fn focus_description_counts_within_cycle() {
        let info = SessionMode::Focus.info(3, 4);
        assert_eq!(info.description, "Session 3 of 4");
        assert_eq!(info.title, "Focus Session");
    }
}
