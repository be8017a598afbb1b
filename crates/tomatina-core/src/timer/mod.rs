mod clock;
mod engine;
mod mode;

pub use clock::{Clock, ManualClock, SystemClock, Ticker};
pub use engine::PomodoroTimer;
pub use mode::{ModeInfo, SessionMode};
