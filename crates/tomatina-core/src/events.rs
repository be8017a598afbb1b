//! Timer events and the observer bus.
//!
//! Every state change in the engine produces an [`Event`]. Interested
//! parties (CLI output, tray glue, tests) register observers on the
//! [`EventBus`] instead of the engine holding UI-specific callback slots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::Settings;
use crate::storage::SessionRecord;
use crate::timer::SessionMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: SessionMode,
        session_index: u32,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: SessionMode,
        remaining_secs: u32,
        interruptions: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// One second elapsed on a running timer.
    TimerTicked {
        mode: SessionMode,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// A session ran down to zero and was recorded.
    SessionCompleted {
        record: SessionRecord,
        at: DateTime<Utc>,
    },
    /// The engine moved to the next interval in the cycle.
    SessionAdvanced {
        mode: SessionMode,
        session_index: u32,
        duration_secs: u32,
        /// Present when an automatic start was scheduled for the new interval.
        auto_start_in_secs: Option<u32>,
        at: DateTime<Utc>,
    },
    SettingsUpdated {
        settings: Settings,
        at: DateTime<Utc>,
    },
    /// Full state snapshot for pollers.
    StateSnapshot {
        mode: SessionMode,
        session_index: u32,
        running: bool,
        paused: bool,
        remaining_secs: u32,
        total_secs: u32,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
}

/// Observer registry. Single-threaded by design: observers run to
/// completion inside the engine call that published the event.
#[derive(Default)]
pub struct EventBus {
    observers: Vec<Box<dyn Fn(&Event)>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: impl Fn(&Event) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn publish(&self, event: &Event) {
        for observer in &self.observers {
            observer(event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}
