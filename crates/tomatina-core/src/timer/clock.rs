//! Time sources for the timer engine.
//!
//! Wall time is injected through the [`Clock`] trait so tests can drive the
//! engine with a manually advanced clock instead of sleeping. The
//! per-second cadence is modelled by [`Ticker`]: the engine arms it while
//! counting down and the host delivers `tick()` calls at one-second
//! intervals while it stays armed. A disarmed ticker makes `tick()` a
//! no-op, so pause/reset/completion quench stray ticks immediately and at
//! most one cadence is ever armed per engine.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test clock advanced by hand. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock poisoned");
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().expect("clock poisoned") = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock poisoned")
    }
}

/// Armed/disarmed state of the one-second cadence.
///
/// The engine owns exactly one of these; arming an armed ticker is a no-op,
/// which is what makes a second `start()` on a running timer harmless.
#[derive(Debug, Default)]
pub struct Ticker {
    armed: bool,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}
