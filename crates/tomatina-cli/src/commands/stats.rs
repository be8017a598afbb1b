use chrono::Utc;
use clap::Subcommand;
use tomatina_core::{Analytics, DayActivity, FileStore, StatsAggregator, StatsUpdate, StorageGateway};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's progress against the daily goal
    Today,
    /// Trailing-week progress against the weekly goal
    Week,
    /// All-time counters and goals
    All,
    /// Combined productivity insights
    Insights,
    /// Per-day activity pattern
    Pattern {
        #[arg(long, default_value = "7")]
        days: u32,
    },
    /// Completed/interrupted breakdown per session type
    Breakdown {
        #[arg(long, default_value = "30")]
        days: u32,
    },
    /// Update the daily/weekly session goals
    SetGoals {
        #[arg(long)]
        daily: Option<u32>,
        #[arg(long)]
        weekly: Option<u32>,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::open()?;
    let history = store.load_history()?;
    let stats = store.load_stats()?;
    let today = Utc::now().date_naive();
    let analytics = Analytics::new(&history, &stats);

    match action {
        StatsAction::Today => {
            println!("{}", serde_json::to_string_pretty(&analytics.today_stats(today))?);
        }
        StatsAction::Week => {
            println!("{}", serde_json::to_string_pretty(&analytics.week_stats(today))?);
        }
        StatsAction::All => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Insights => {
            println!(
                "{}",
                serde_json::to_string_pretty(&analytics.productivity_insights(today))?
            );
        }
        StatsAction::Pattern { days } => {
            let pattern: Vec<DayActivity> = analytics.daily_pattern(days, today).collect();
            println!("{}", serde_json::to_string_pretty(&pattern)?);
        }
        StatsAction::Breakdown { days } => {
            println!(
                "{}",
                serde_json::to_string_pretty(&analytics.session_type_breakdown(days, today))?
            );
        }
        StatsAction::SetGoals { daily, weekly } => {
            let mut aggregator = StatsAggregator::new(stats.clone());
            aggregator.merge(&StatsUpdate {
                daily_goal: daily,
                weekly_goal: weekly,
                ..StatsUpdate::default()
            });
            store.save_stats(aggregator.snapshot())?;
            println!("{}", serde_json::to_string_pretty(aggregator.snapshot())?);
        }
    }
    Ok(())
}
