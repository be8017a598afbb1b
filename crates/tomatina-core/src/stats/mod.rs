//! Statistics for completed sessions.
//!
//! [`StatsAggregator`] maintains the cumulative counters persisted across
//! runs; [`Analytics`] derives views (daily/weekly progress, patterns,
//! streaks, insights) by scanning the session log on demand.

mod analytics;
mod snapshot;

pub use analytics::{
    Analytics, DayActivity, GoalProgress, ProductivityInsights, SessionTypeBreakdown, TypeTally,
};
pub use snapshot::{StatsAggregator, StatsSnapshot, StatsUpdate};
