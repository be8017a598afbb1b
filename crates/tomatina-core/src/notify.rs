//! Notification gateway.
//!
//! The engine hands finished-session notices to an injected
//! [`NotificationGateway`]; delivery failures are logged by the caller and
//! never surface to the state machine. When notifications are disabled in
//! settings the engine skips the gateway entirely.

use thiserror::Error;

use crate::settings::Settings;
use crate::timer::SessionMode;

/// A notification to deliver to the desktop shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub urgent: bool,
}

#[derive(Error, Debug)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

pub trait NotificationGateway {
    fn notify(&self, notice: &Notice) -> Result<(), NotifyError>;
}

/// Discards all notifications. Used where no shell is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl NotificationGateway for NullNotifier {
    fn notify(&self, _notice: &Notice) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// The notice shown when a session of the given mode runs out.
pub fn completion_notice(mode: SessionMode, settings: &Settings) -> Notice {
    let (title, body) = match mode {
        SessionMode::Focus => (
            "\u{1f3af} Focus Session Complete!".to_string(),
            format!(
                "Great work! You completed a {}-minute focus session. Time for a break!",
                settings.focus_time
            ),
        ),
        SessionMode::ShortBreak => (
            "\u{2615} Short Break Complete!".to_string(),
            "Break time is over. Ready for your next focus session?".to_string(),
        ),
        SessionMode::LongBreak => (
            "\u{1f31f} Long Break Complete!".to_string(),
            "Long break finished! Time to start a new cycle of focus sessions.".to_string(),
        ),
    };
    Notice {
        title,
        body,
        urgent: true,
    }
}
