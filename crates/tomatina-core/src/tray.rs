//! Tray/display gateway.
//!
//! Purely observational: the engine pushes a [`TrayStatus`] on every tick
//! and state change and never reads anything back.

use serde::{Deserialize, Serialize};

/// Compact status for a tray icon or status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrayStatus {
    /// `MM:SS` while the timer is running or paused, empty when idle.
    pub title: String,
    pub tooltip: String,
}

pub trait TrayGateway {
    fn update(&self, status: &TrayStatus);
}

/// Ignores all updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTray;

impl TrayGateway for NullTray {
    fn update(&self, _status: &TrayStatus) {}
}
