//! The Pomodoro session state machine.
//!
//! A single engine instance owns the countdown for one process. It is
//! caller-driven: the host delivers `tick()` once per second while the
//! engine's ticker is armed, and `poll_deferred()` alongside it to fire
//! scheduled auto-starts. No threads, no internal timers.
//!
//! ## State transitions
//!
//! ```text
//! Focus -> ShortBreak -> Focus -> ... -> Focus -> LongBreak -> Focus
//! ```
//!
//! within each mode: Idle -> Running -> (Paused -> Running)* -> Idle
//!
//! Collaborators (storage, notifications, tray) are injected capabilities.
//! Their failures are logged and swallowed; the countdown never aborts
//! because a collaborator misbehaved.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::events::{Event, EventBus};
use crate::notify::{completion_notice, NotificationGateway};
use crate::settings::{Settings, SettingsPatch};
use crate::stats::{StatsAggregator, StatsSnapshot};
use crate::storage::{NewSession, SessionRecord, StorageGateway};
use crate::tray::{TrayGateway, TrayStatus};

use super::clock::{Clock, SystemClock, Ticker};
use super::mode::{ModeInfo, SessionMode};

/// Delay before an automatic start after a session transition, giving the
/// display a moment to show the completed state.
const AUTO_START_DELAY_SECS: i64 = 2;

/// The timer core. See the module docs for the driving contract.
pub struct PomodoroTimer {
    settings: Settings,
    mode: SessionMode,
    /// Focus sessions counted within the current long-break cycle, 1-based.
    session_index: u32,
    time_left_secs: u32,
    total_secs: u32,
    running: bool,
    paused: bool,
    interruptions: u32,
    session_started_at: Option<DateTime<Utc>>,
    /// Instant at which a scheduled auto-start becomes due. Never cancelled
    /// by manual action; `start()` idempotence makes the race harmless.
    auto_start_due: Option<DateTime<Utc>>,
    ticker: Ticker,
    clock: Box<dyn Clock>,
    storage: Box<dyn StorageGateway>,
    notifier: Box<dyn NotificationGateway>,
    tray: Box<dyn TrayGateway>,
    bus: EventBus,
    stats: StatsAggregator,
}

impl PomodoroTimer {
    pub fn new(
        settings: Settings,
        stats: StatsSnapshot,
        storage: Box<dyn StorageGateway>,
        notifier: Box<dyn NotificationGateway>,
        tray: Box<dyn TrayGateway>,
    ) -> Self {
        let mode = SessionMode::Focus;
        let total_secs = mode.duration_secs(&settings);
        Self {
            settings,
            mode,
            session_index: 1,
            time_left_secs: total_secs,
            total_secs,
            running: false,
            paused: false,
            interruptions: 0,
            session_started_at: None,
            auto_start_due: None,
            ticker: Ticker::new(),
            clock: Box::new(SystemClock),
            storage,
            notifier,
            tray,
            bus: EventBus::new(),
            stats: StatsAggregator::new(stats),
        }
    }

    /// Build a timer from persisted settings and stats. Load failures are
    /// logged and replaced with defaults; the timer always comes up.
    pub fn from_storage(
        storage: Box<dyn StorageGateway>,
        notifier: Box<dyn NotificationGateway>,
        tray: Box<dyn TrayGateway>,
    ) -> Self {
        let settings = storage.load_settings().unwrap_or_else(|e| {
            warn!(error = %e, "failed to load settings, using defaults");
            Settings::default()
        });
        let stats = storage.load_stats().unwrap_or_else(|e| {
            warn!(error = %e, "failed to load stats, starting fresh");
            StatsSnapshot::default()
        });
        Self::new(settings, stats, storage, notifier, tray)
    }

    /// Replace the wall-time source (tests inject a manual clock).
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register a state-change observer.
    pub fn observe(&mut self, observer: impl Fn(&Event) + 'static) {
        self.bus.subscribe(observer);
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn session_index(&self) -> u32 {
        self.session_index
    }

    pub fn time_left_secs(&self) -> u32 {
        self.time_left_secs
    }

    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// True while the one-second cadence is armed (running and not paused).
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_armed()
    }

    pub fn interruptions(&self) -> u32 {
        self.interruptions
    }

    pub fn has_pending_auto_start(&self) -> bool {
        self.auto_start_due.is_some()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stats(&self) -> &StatsSnapshot {
        self.stats.snapshot()
    }

    /// Remaining time as `MM:SS`.
    pub fn formatted_time(&self) -> String {
        let minutes = self.time_left_secs / 60;
        let seconds = self.time_left_secs % 60;
        format!("{minutes:02}:{seconds:02}")
    }

    /// Elapsed share of the current session, 0..=100.
    pub fn progress_percent(&self) -> f64 {
        if self.total_secs == 0 {
            return 0.0;
        }
        f64::from(self.total_secs - self.time_left_secs) / f64::from(self.total_secs) * 100.0
    }

    pub fn mode_info(&self) -> ModeInfo {
        self.mode
            .info(self.session_index, self.settings.sessions_before_long_break)
    }

    /// Current tray status; also pushed to the tray gateway on every tick
    /// and state change.
    pub fn tray_status(&self) -> TrayStatus {
        let state = if self.running && !self.paused {
            "Running"
        } else {
            "Paused"
        };
        let title = if self.running {
            self.formatted_time()
        } else {
            String::new()
        };
        let tooltip = format!(
            "Pomodoro Timer - {} {} - {}",
            self.mode.icon(),
            self.mode.tray_label(),
            state
        );
        TrayStatus { title, tooltip }
    }

    /// Full state snapshot event for pollers.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            mode: self.mode,
            session_index: self.session_index,
            running: self.running,
            paused: self.paused,
            remaining_secs: self.time_left_secs,
            total_secs: self.total_secs,
            progress_pct: self.progress_percent(),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin or resume the countdown. A second `start()` on a timer that
    /// is already running unpaused is a no-op, so a deferred auto-start
    /// arriving after a manual start cannot double the cadence.
    pub fn start(&mut self) {
        if self.running && !self.paused {
            return;
        }
        if self.paused {
            self.paused = false;
        } else {
            self.running = true;
            self.session_started_at = Some(self.clock.now());
        }
        self.ticker.arm();
        self.push_tray();
        self.bus.publish(&Event::TimerStarted {
            mode: self.mode,
            session_index: self.session_index,
            remaining_secs: self.time_left_secs,
            at: self.clock.now(),
        });
    }

    /// Pause a running countdown, counting one interruption. No-op when
    /// idle or already paused.
    pub fn pause(&mut self) {
        if !self.running || self.paused {
            return;
        }
        self.paused = true;
        self.interruptions += 1;
        self.ticker.disarm();
        self.push_tray();
        self.bus.publish(&Event::TimerPaused {
            mode: self.mode,
            remaining_secs: self.time_left_secs,
            interruptions: self.interruptions,
            at: self.clock.now(),
        });
    }

    pub fn toggle(&mut self) {
        if self.running && !self.paused {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Abort whatever is in flight and return to a fresh focus session.
    /// Nothing is recorded: an abandoned session leaves no history entry.
    pub fn reset(&mut self) {
        self.running = false;
        self.paused = false;
        self.interruptions = 0;
        self.ticker.disarm();

        self.mode = SessionMode::Focus;
        self.session_index = 1;
        self.total_secs = self.mode.duration_secs(&self.settings);
        self.time_left_secs = self.total_secs;
        self.session_started_at = None;

        self.push_tray();
        self.bus.publish(&Event::TimerReset {
            at: self.clock.now(),
        });
    }

    /// Advance the countdown by one second. Delivered by the host while
    /// the ticker is armed; a tick arriving after a disarm is dropped
    /// here, which is what makes pause/reset cancellation immediate.
    pub fn tick(&mut self) {
        if !self.ticker.is_armed() {
            return;
        }
        self.time_left_secs = self.time_left_secs.saturating_sub(1);
        self.push_tray();
        self.bus.publish(&Event::TimerTicked {
            mode: self.mode,
            remaining_secs: self.time_left_secs,
            at: self.clock.now(),
        });
        if self.time_left_secs == 0 {
            self.complete_session();
        }
    }

    /// Fire a scheduled auto-start once its delay has elapsed. Called by
    /// the host loop alongside `tick()`.
    pub fn poll_deferred(&mut self) {
        if let Some(due) = self.auto_start_due {
            if self.clock.now() >= due {
                self.auto_start_due = None;
                self.start();
            }
        }
    }

    /// Merge a settings update. Out-of-range fields are clamped and
    /// logged. An idle timer picks up the new duration for its current
    /// mode immediately; a running countdown is left alone.
    pub fn update_settings(&mut self, patch: &SettingsPatch) {
        for issue in self.settings.apply(patch) {
            warn!(%issue, "settings value clamped");
        }
        if let Err(e) = self.storage.save_settings(&self.settings) {
            warn!(error = %e, "failed to save settings");
        }
        if !self.running {
            self.total_secs = self.mode.duration_secs(&self.settings);
            self.time_left_secs = self.total_secs;
        }
        self.push_tray();
        self.bus.publish(&Event::SettingsUpdated {
            settings: self.settings.clone(),
            at: self.clock.now(),
        });
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_session(&mut self) {
        self.ticker.disarm();
        self.running = false;
        self.paused = false;

        let now = self.clock.now();
        let finished = self.mode;
        let session = NewSession {
            date: now.date_naive(),
            kind: finished,
            duration_min: (self.total_secs - self.time_left_secs) / 60,
            completed: self.time_left_secs == 0,
            interruptions: self.interruptions,
            started_at: self.session_started_at,
            completed_at: now,
        };

        let record = match self.storage.append_session(session.clone()) {
            Ok(history) => history.last().cloned(),
            Err(e) => {
                warn!(error = %e, "failed to record session");
                None
            }
        };
        // Fall back to an unpersisted record so observers still see the
        // completed session when storage is down.
        let record = record.unwrap_or(SessionRecord {
            id: 0,
            date: session.date,
            kind: session.kind,
            duration_min: session.duration_min,
            completed: session.completed,
            interruptions: session.interruptions,
            started_at: session.started_at,
            completed_at: session.completed_at,
        });

        if finished.is_focus() && session.completed {
            self.stats.record_completed_focus(self.settings.focus_time);
            if let Err(e) = self.storage.save_stats(self.stats.snapshot()) {
                warn!(error = %e, "failed to persist stats");
            }
        }

        if self.settings.notifications_enabled {
            let notice = completion_notice(finished, &self.settings);
            if let Err(e) = self.notifier.notify(&notice) {
                warn!(error = %e, "failed to deliver notification");
            }
        }

        self.transition_to_next_session();

        self.bus.publish(&Event::SessionCompleted {
            record,
            at: self.clock.now(),
        });
    }

    fn transition_to_next_session(&mut self) {
        let auto_start = match self.mode {
            SessionMode::Focus => {
                if self.session_index % self.settings.sessions_before_long_break == 0 {
                    self.mode = SessionMode::LongBreak;
                } else {
                    self.mode = SessionMode::ShortBreak;
                }
                self.settings.auto_start_breaks
            }
            SessionMode::ShortBreak | SessionMode::LongBreak => {
                if self.mode == SessionMode::LongBreak {
                    self.session_index = 1;
                } else {
                    self.session_index += 1;
                }
                self.mode = SessionMode::Focus;
                self.settings.auto_start_pomodoros
            }
        };

        self.total_secs = self.mode.duration_secs(&self.settings);
        self.time_left_secs = self.total_secs;
        self.interruptions = 0;
        self.session_started_at = None;

        let auto_start_in_secs = if auto_start {
            self.auto_start_due =
                Some(self.clock.now() + Duration::seconds(AUTO_START_DELAY_SECS));
            Some(AUTO_START_DELAY_SECS as u32)
        } else {
            None
        };

        debug!(mode = %self.mode, session_index = self.session_index, "session advanced");
        self.push_tray();
        self.bus.publish(&Event::SessionAdvanced {
            mode: self.mode,
            session_index: self.session_index,
            duration_secs: self.total_secs,
            auto_start_in_secs,
            at: self.clock.now(),
        });
    }

    fn push_tray(&self) {
        self.tray.update(&self.tray_status());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, StorageError};
    use crate::notify::{Notice, NotifyError, NullNotifier};
    use crate::storage::MemoryStore;
    use crate::timer::clock::ManualClock;
    use crate::tray::NullTray;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn manual_clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap())
    }

    fn timer_with(settings: Settings) -> (PomodoroTimer, MemoryStore, ManualClock) {
        let store = MemoryStore::new();
        let clock = manual_clock();
        let timer = PomodoroTimer::new(
            settings,
            StatsSnapshot::default(),
            Box::new(store.clone()),
            Box::new(NullNotifier),
            Box::new(NullTray),
        )
        .with_clock(Box::new(clock.clone()));
        (timer, store, clock)
    }

    fn short_settings() -> Settings {
        Settings {
            focus_time: 1,
            short_break_time: 1,
            long_break_time: 1,
            sessions_before_long_break: 4,
            ..Settings::default()
        }
    }

    /// Drive the current session to completion.
    fn run_out(timer: &mut PomodoroTimer) {
        let ticks = timer.time_left_secs();
        for _ in 0..ticks {
            timer.tick();
        }
    }

    struct FailingStore;

    impl StorageGateway for FailingStore {
        fn load_settings(&self) -> Result<Settings, CoreError> {
            Err(StorageError::QueryFailed("down".into()).into())
        }
        fn save_settings(&self, _: &Settings) -> Result<(), CoreError> {
            Err(StorageError::QueryFailed("down".into()).into())
        }
        fn load_stats(&self) -> Result<StatsSnapshot, CoreError> {
            Err(StorageError::QueryFailed("down".into()).into())
        }
        fn save_stats(&self, _: &StatsSnapshot) -> Result<(), CoreError> {
            Err(StorageError::QueryFailed("down".into()).into())
        }
        fn load_history(&self) -> Result<Vec<SessionRecord>, CoreError> {
            Err(StorageError::QueryFailed("down".into()).into())
        }
        fn append_session(&self, _: NewSession) -> Result<Vec<SessionRecord>, CoreError> {
            Err(StorageError::QueryFailed("down".into()).into())
        }
        fn clear_history(&self) -> Result<Vec<SessionRecord>, CoreError> {
            Err(StorageError::QueryFailed("down".into()).into())
        }
        fn replace_history(&self, _: &[SessionRecord]) -> Result<(), CoreError> {
            Err(StorageError::QueryFailed("down".into()).into())
        }
    }

    struct RecordingNotifier(Rc<RefCell<Vec<Notice>>>);

    impl NotificationGateway for RecordingNotifier {
        fn notify(&self, notice: &Notice) -> Result<(), NotifyError> {
            self.0.borrow_mut().push(notice.clone());
            Ok(())
        }
    }

    #[test]
    fn starts_idle_with_focus_duration() {
        let (timer, _, _) = timer_with(Settings::default());
        assert_eq!(timer.mode(), SessionMode::Focus);
        assert_eq!(timer.session_index(), 1);
        assert_eq!(timer.time_left_secs(), 25 * 60);
        assert_eq!(timer.total_secs(), 25 * 60);
        assert!(!timer.is_running());
        assert!(!timer.is_paused());
        assert_eq!(timer.progress_percent(), 0.0);
        assert_eq!(timer.formatted_time(), "25:00");
    }

    #[test]
    fn reset_returns_fresh_focus_state() {
        let (mut timer, store, _) = timer_with(short_settings());
        timer.start();
        for _ in 0..30 {
            timer.tick();
        }
        timer.pause();
        timer.reset();

        assert_eq!(timer.mode(), SessionMode::Focus);
        assert_eq!(timer.session_index(), 1);
        assert_eq!(timer.time_left_secs(), 60);
        assert_eq!(timer.total_secs(), 60);
        assert!(!timer.is_running());
        assert!(!timer.is_paused());
        assert_eq!(timer.interruptions(), 0);
        // Abandoned sessions are never logged.
        assert_eq!(store.history_len(), 0);
    }

    #[test]
    fn second_start_while_running_is_noop() {
        let (mut timer, _, _) = timer_with(Settings::default());
        let starts = Rc::new(RefCell::new(0u32));
        {
            let starts = Rc::clone(&starts);
            timer.observe(move |event| {
                if matches!(event, Event::TimerStarted { .. }) {
                    *starts.borrow_mut() += 1;
                }
            });
        }
        timer.start();
        timer.tick();
        timer.start();
        assert_eq!(*starts.borrow(), 1);
        assert_eq!(timer.time_left_secs(), 25 * 60 - 1);
    }

    #[test]
    fn pause_stops_countdown_and_counts_interruption() {
        let (mut timer, _, _) = timer_with(Settings::default());
        timer.start();
        for _ in 0..3 {
            timer.tick();
        }
        timer.pause();
        let frozen = timer.time_left_secs();
        for _ in 0..5 {
            timer.tick();
        }
        assert_eq!(timer.time_left_secs(), frozen);
        assert_eq!(timer.interruptions(), 1);
        assert!(timer.is_running());
        assert!(timer.is_paused());

        // Pausing again is a no-op.
        timer.pause();
        assert_eq!(timer.interruptions(), 1);

        // Resume keeps the remaining time.
        timer.start();
        assert!(!timer.is_paused());
        timer.tick();
        assert_eq!(timer.time_left_secs(), frozen - 1);
    }

    #[test]
    fn pause_when_idle_is_noop() {
        let (mut timer, _, _) = timer_with(Settings::default());
        timer.pause();
        assert!(!timer.is_paused());
        assert_eq!(timer.interruptions(), 0);
    }

    #[test]
    fn toggle_alternates_between_run_and_pause() {
        let (mut timer, _, _) = timer_with(Settings::default());
        timer.toggle();
        assert!(timer.is_ticking());
        timer.toggle();
        assert!(timer.is_paused());
        timer.toggle();
        assert!(timer.is_ticking());
    }

    #[test]
    fn tick_when_idle_is_dropped() {
        let (mut timer, _, _) = timer_with(Settings::default());
        timer.tick();
        assert_eq!(timer.time_left_secs(), 25 * 60);
    }

    #[test]
    fn completion_appends_record_and_updates_stats() {
        let (mut timer, store, _) = timer_with(short_settings());
        timer.start();
        run_out(&mut timer);

        let history = store.load_history().unwrap();
        assert_eq!(history.len(), 1);
        let record = &history[0];
        assert_eq!(record.kind, SessionMode::Focus);
        assert_eq!(record.duration_min, 1);
        assert!(record.completed);
        assert_eq!(record.interruptions, 0);
        assert!(record.started_at.is_some());

        assert_eq!(timer.stats().completed_sessions, 1);
        assert_eq!(timer.stats().total_minutes, 1);
        assert_eq!(timer.stats().streak_count, 1);
        // Snapshot persisted through the gateway too.
        assert_eq!(store.load_stats().unwrap().completed_sessions, 1);

        assert_eq!(timer.mode(), SessionMode::ShortBreak);
        assert_eq!(timer.session_index(), 1);
        assert!(!timer.is_running());
        assert_eq!(timer.time_left_secs(), 60);
    }

    #[test]
    fn break_completion_leaves_stats_untouched() {
        let (mut timer, store, _) = timer_with(short_settings());
        timer.start();
        run_out(&mut timer); // focus
        timer.start();
        run_out(&mut timer); // short break

        assert_eq!(store.history_len(), 2);
        assert_eq!(timer.stats().completed_sessions, 1);
        assert_eq!(timer.mode(), SessionMode::Focus);
        assert_eq!(timer.session_index(), 2);
    }

    #[test]
    fn interruptions_recorded_then_cleared_on_transition() {
        let (mut timer, store, _) = timer_with(short_settings());
        timer.start();
        timer.tick();
        timer.pause();
        timer.start();
        timer.pause();
        timer.start();
        run_out(&mut timer);

        let history = store.load_history().unwrap();
        assert_eq!(history[0].interruptions, 2);
        assert_eq!(timer.interruptions(), 0);
    }

    #[test]
    fn full_cycle_matches_classic_pomodoro_accounting() {
        let settings = Settings {
            focus_time: 25,
            short_break_time: 5,
            long_break_time: 15,
            sessions_before_long_break: 4,
            ..Settings::default()
        };
        let (mut timer, store, _) = timer_with(settings);

        // 4 focus sessions, 3 short breaks in between, then the long break.
        for _ in 0..8 {
            timer.start();
            run_out(&mut timer);
        }

        let history = store.load_history().unwrap();
        assert_eq!(history.len(), 8);
        let kinds: Vec<SessionMode> = history.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SessionMode::Focus,
                SessionMode::ShortBreak,
                SessionMode::Focus,
                SessionMode::ShortBreak,
                SessionMode::Focus,
                SessionMode::ShortBreak,
                SessionMode::Focus,
                SessionMode::LongBreak,
            ]
        );
        assert_eq!(timer.stats().completed_sessions, 4);
        assert_eq!(timer.stats().total_minutes, 100);
        assert_eq!(timer.mode(), SessionMode::Focus);
        assert_eq!(timer.session_index(), 1);
    }

    #[test]
    fn session_index_cycles_with_two_sessions_per_round() {
        let settings = Settings {
            sessions_before_long_break: 2,
            ..short_settings()
        };
        let (mut timer, _, _) = timer_with(settings);

        timer.start();
        run_out(&mut timer);
        assert_eq!(timer.mode(), SessionMode::ShortBreak);

        timer.start();
        run_out(&mut timer);
        assert_eq!(timer.mode(), SessionMode::Focus);
        assert_eq!(timer.session_index(), 2);

        timer.start();
        run_out(&mut timer);
        assert_eq!(timer.mode(), SessionMode::LongBreak);

        timer.start();
        run_out(&mut timer);
        assert_eq!(timer.mode(), SessionMode::Focus);
        assert_eq!(timer.session_index(), 1);
    }

    #[test]
    fn countdown_is_monotone_and_progress_bounded() {
        let (mut timer, _, _) = timer_with(short_settings());
        timer.start();
        let mut previous = timer.time_left_secs();
        while timer.is_ticking() {
            timer.tick();
            assert!(timer.time_left_secs() <= previous);
            previous = timer.time_left_secs();
            let progress = timer.progress_percent();
            assert!((0.0..=100.0).contains(&progress));
        }
        // Transitioned into the break at zero.
        assert_eq!(timer.mode(), SessionMode::ShortBreak);
        assert_eq!(timer.progress_percent(), 0.0);
    }

    #[test]
    fn progress_hits_hundred_at_the_final_tick() {
        let (mut timer, _, _) = timer_with(short_settings());
        let final_progress = Rc::new(RefCell::new(0.0f64));
        {
            let final_progress = Rc::clone(&final_progress);
            timer.observe(move |event| {
                if let Event::TimerTicked {
                    remaining_secs: 0, ..
                } = event
                {
                    *final_progress.borrow_mut() = 100.0;
                }
            });
        }
        timer.start();
        run_out(&mut timer);
        assert_eq!(*final_progress.borrow(), 100.0);
    }

    #[test]
    fn auto_start_breaks_fires_after_delay() {
        let settings = Settings {
            auto_start_breaks: true,
            ..short_settings()
        };
        let (mut timer, _, clock) = timer_with(settings);
        timer.start();
        run_out(&mut timer);

        assert_eq!(timer.mode(), SessionMode::ShortBreak);
        assert!(!timer.is_ticking());
        assert!(timer.has_pending_auto_start());

        // Not due yet.
        timer.poll_deferred();
        assert!(!timer.is_ticking());

        clock.advance(Duration::seconds(2));
        timer.poll_deferred();
        assert!(timer.is_ticking());
        assert!(!timer.has_pending_auto_start());
    }

    #[test]
    fn manual_start_beats_deferred_auto_start() {
        let settings = Settings {
            auto_start_breaks: true,
            ..short_settings()
        };
        let (mut timer, _, clock) = timer_with(settings);
        timer.start();
        run_out(&mut timer);

        timer.start();
        timer.tick();
        let remaining = timer.time_left_secs();

        // The stale deferred start arrives and must not disturb anything.
        clock.advance(Duration::seconds(5));
        timer.poll_deferred();
        assert!(timer.is_ticking());
        assert_eq!(timer.time_left_secs(), remaining);
    }

    #[test]
    fn auto_start_pomodoros_applies_after_breaks() {
        let settings = Settings {
            auto_start_pomodoros: true,
            ..short_settings()
        };
        let (mut timer, _, clock) = timer_with(settings);
        timer.start();
        run_out(&mut timer); // focus done, no auto-start for breaks
        assert!(!timer.has_pending_auto_start());

        timer.start();
        run_out(&mut timer); // break done -> focus scheduled
        assert!(timer.has_pending_auto_start());
        clock.advance(Duration::seconds(2));
        timer.poll_deferred();
        assert!(timer.is_ticking());
        assert_eq!(timer.mode(), SessionMode::Focus);
    }

    #[test]
    fn update_settings_refreshes_idle_timer() {
        let (mut timer, store, _) = timer_with(Settings::default());
        timer.update_settings(&SettingsPatch {
            focus_time: Some(50),
            ..SettingsPatch::default()
        });
        assert_eq!(timer.time_left_secs(), 50 * 60);
        assert_eq!(timer.total_secs(), 50 * 60);
        assert_eq!(store.load_settings().unwrap().focus_time, 50);
    }

    #[test]
    fn update_settings_leaves_running_countdown_alone() {
        let (mut timer, _, _) = timer_with(Settings::default());
        timer.start();
        for _ in 0..10 {
            timer.tick();
        }
        timer.update_settings(&SettingsPatch {
            focus_time: Some(50),
            ..SettingsPatch::default()
        });
        assert_eq!(timer.time_left_secs(), 25 * 60 - 10);
        assert_eq!(timer.total_secs(), 25 * 60);
        // The next session picks up the new duration.
        run_out(&mut timer);
        timer.start();
        run_out(&mut timer);
        assert_eq!(timer.total_secs(), 50 * 60);
    }

    #[test]
    fn update_settings_clamps_out_of_range_values() {
        let (mut timer, _, _) = timer_with(Settings::default());
        timer.update_settings(&SettingsPatch {
            focus_time: Some(999),
            sessions_before_long_break: Some(1),
            ..SettingsPatch::default()
        });
        assert_eq!(timer.settings().focus_time, 120);
        assert_eq!(timer.settings().sessions_before_long_break, 2);
    }

    #[test]
    fn storage_failures_never_stall_the_state_machine() {
        let clock = manual_clock();
        let mut timer = PomodoroTimer::new(
            short_settings(),
            StatsSnapshot::default(),
            Box::new(FailingStore),
            Box::new(NullNotifier),
            Box::new(NullTray),
        )
        .with_clock(Box::new(clock));

        timer.start();
        run_out(&mut timer);

        // Persistence was down, but the transition and the in-memory
        // accounting still happened.
        assert_eq!(timer.mode(), SessionMode::ShortBreak);
        assert_eq!(timer.stats().completed_sessions, 1);
    }

    #[test]
    fn completion_event_still_fires_when_storage_is_down() {
        let clock = manual_clock();
        let mut timer = PomodoroTimer::new(
            short_settings(),
            StatsSnapshot::default(),
            Box::new(FailingStore),
            Box::new(NullNotifier),
            Box::new(NullTray),
        )
        .with_clock(Box::new(clock));

        let completions = Rc::new(RefCell::new(Vec::new()));
        {
            let completions = Rc::clone(&completions);
            timer.observe(move |event| {
                if let Event::SessionCompleted { record, .. } = event {
                    completions.borrow_mut().push(record.clone());
                }
            });
        }
        timer.start();
        run_out(&mut timer);
        let completions = completions.borrow();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].kind, SessionMode::Focus);
        assert!(completions[0].completed);
    }

    #[test]
    fn notifications_respect_the_enabled_flag() {
        let notices = Rc::new(RefCell::new(Vec::new()));

        let settings = Settings {
            notifications_enabled: false,
            ..short_settings()
        };
        let store = MemoryStore::new();
        let mut timer = PomodoroTimer::new(
            settings,
            StatsSnapshot::default(),
            Box::new(store),
            Box::new(RecordingNotifier(Rc::clone(&notices))),
            Box::new(NullTray),
        )
        .with_clock(Box::new(manual_clock()));
        timer.start();
        run_out(&mut timer);
        assert!(notices.borrow().is_empty());

        timer.update_settings(&SettingsPatch {
            notifications_enabled: Some(true),
            ..SettingsPatch::default()
        });
        timer.start();
        run_out(&mut timer);
        assert_eq!(notices.borrow().len(), 1);
        assert!(notices.borrow()[0].title.contains("Short Break Complete"));
    }

    #[test]
    fn events_follow_the_session_lifecycle() {
        let (mut timer, _, _) = timer_with(short_settings());
        let names = Rc::new(RefCell::new(Vec::new()));
        {
            let names = Rc::clone(&names);
            timer.observe(move |event| {
                let name = match event {
                    Event::TimerStarted { .. } => "started",
                    Event::TimerPaused { .. } => "paused",
                    Event::SessionCompleted { .. } => "completed",
                    Event::SessionAdvanced { .. } => "advanced",
                    Event::TimerReset { .. } => "reset",
                    _ => return,
                };
                names.borrow_mut().push(name);
            });
        }
        timer.start();
        timer.pause();
        timer.start();
        run_out(&mut timer);
        timer.reset();
        assert_eq!(
            *names.borrow(),
            vec!["started", "paused", "started", "advanced", "completed", "reset"]
        );
    }

    #[test]
    fn from_storage_picks_up_persisted_state() {
        let store = MemoryStore::new();
        let mut settings = Settings::default();
        settings.focus_time = 30;
        store.save_settings(&settings).unwrap();
        let mut stats = StatsSnapshot::default();
        stats.completed_sessions = 4;
        store.save_stats(&stats).unwrap();

        let timer = PomodoroTimer::from_storage(
            Box::new(store),
            Box::new(NullNotifier),
            Box::new(NullTray),
        );
        assert_eq!(timer.settings().focus_time, 30);
        assert_eq!(timer.stats().completed_sessions, 4);
        assert_eq!(timer.time_left_secs(), 30 * 60);
    }

    #[test]
    fn tray_status_reflects_run_state() {
        let (mut timer, _, _) = timer_with(Settings::default());
        let idle = timer.tray_status();
        assert_eq!(idle.title, "");
        assert!(idle.tooltip.contains("Focus"));

        timer.start();
        let running = timer.tray_status();
        assert_eq!(running.title, "25:00");
        assert!(running.tooltip.ends_with("Running"));

        timer.pause();
        assert!(timer.tray_status().tooltip.ends_with("Paused"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// One full cycle always produces alternating focus/break records
        /// ending in a long break, and returns to session 1.
        #[test]
        fn cycle_structure_holds_for_any_settings(
            focus in 1u32..=3,
            short_break in 1u32..=2,
            long_break in 1u32..=2,
            cycle_len in 2u32..=5,
        ) {
            let settings = Settings {
                focus_time: focus,
                short_break_time: short_break,
                long_break_time: long_break,
                sessions_before_long_break: cycle_len,
                ..Settings::default()
            };
            let (mut timer, store, _) = timer_with(settings);

            for _ in 0..cycle_len * 2 {
                timer.start();
                run_out(&mut timer);
            }

            let history = store.load_history().unwrap();
            prop_assert_eq!(history.len() as u32, cycle_len * 2);
            for (i, record) in history.iter().enumerate() {
                if i % 2 == 0 {
                    prop_assert_eq!(record.kind, SessionMode::Focus);
                    prop_assert_eq!(record.duration_min, focus);
                } else if i as u32 == cycle_len * 2 - 1 {
                    prop_assert_eq!(record.kind, SessionMode::LongBreak);
                } else {
                    prop_assert_eq!(record.kind, SessionMode::ShortBreak);
                }
                prop_assert!(record.completed);
            }
            prop_assert_eq!(timer.mode(), SessionMode::Focus);
            prop_assert_eq!(timer.session_index(), 1);
            prop_assert_eq!(timer.stats().completed_sessions, u64::from(cycle_len));
            prop_assert_eq!(timer.stats().total_minutes, u64::from(cycle_len * focus));
        }
    }
}
