//! # Tomatina Core Library
//!
//! Core business logic for the Tomatina Pomodoro timer. The library is
//! CLI-first: everything here runs headless behind the `tomatina-cli`
//! binary, and a desktop shell is just another host for the same engine.
//!
//! ## Architecture
//!
//! - **Timer engine**: a caller-driven state machine; the host delivers
//!   `tick()` once per second while the engine's cadence is armed
//! - **Stats**: cumulative counters plus on-demand analytics over the
//!   append-only session log
//! - **Storage**: SQLite session history and TOML settings behind the
//!   [`StorageGateway`] capability trait
//! - **Gateways**: notification and tray surfaces as injected traits;
//!   their failures never stall the countdown
//!
//! ## Key components
//!
//! - [`PomodoroTimer`]: the session state machine
//! - [`Analytics`]: daily/weekly progress, patterns, streaks, insights
//! - [`FileStore`]: production persistence
//! - [`Event`]: state-change notifications published to observers

pub mod error;
pub mod events;
pub mod notify;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod timer;
pub mod tray;

pub use error::{ConfigError, CoreError, StorageError};
pub use events::{Event, EventBus};
pub use notify::{completion_notice, Notice, NotificationGateway, NotifyError, NullNotifier};
pub use settings::{Settings, SettingsPatch, ValidationIssue};
pub use stats::{
    Analytics, DayActivity, GoalProgress, ProductivityInsights, SessionTypeBreakdown,
    StatsAggregator, StatsSnapshot, StatsUpdate,
};
pub use storage::{
    export_data, import_data, DataBundle, Database, FileStore, MemoryStore, NewSession,
    SessionRecord, StorageGateway, HISTORY_CAP,
};
pub use timer::{Clock, ManualClock, ModeInfo, PomodoroTimer, SessionMode, SystemClock, Ticker};
pub use tray::{NullTray, TrayGateway, TrayStatus};
