use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use tomatina_core::{Event, FileStore, NullTray, PomodoroTimer, SessionMode};

use crate::notifier::DesktopNotifier;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the timer in the foreground, printing JSON events
    Run {
        /// Stop after this many completed focus sessions
        #[arg(long)]
        cycles: Option<u32>,
        /// Also print one event line per tick
        #[arg(long)]
        ticks: bool,
    },
    /// Print the timer state as JSON
    Status,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Status => {
            let timer = open_timer()?;
            println!("{}", serde_json::to_string_pretty(&timer.snapshot())?);
            Ok(())
        }
        TimerAction::Run { cycles, ticks } => run_foreground(cycles, ticks),
    }
}

fn open_timer() -> Result<PomodoroTimer, Box<dyn std::error::Error>> {
    let store = FileStore::open()?;
    Ok(PomodoroTimer::from_storage(
        Box::new(store),
        Box::new(DesktopNotifier),
        Box::new(NullTray),
    ))
}

fn run_foreground(cycles: Option<u32>, print_ticks: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut timer = open_timer()?;

    let completed_focus = Rc::new(Cell::new(0u32));
    {
        let completed_focus = Rc::clone(&completed_focus);
        timer.observe(move |event| {
            if let Event::TimerTicked { .. } = event {
                if !print_ticks {
                    return;
                }
            }
            if let Event::SessionCompleted { record, .. } = event {
                if record.kind == SessionMode::Focus && record.completed {
                    completed_focus.set(completed_focus.get() + 1);
                }
            }
            match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(e) => eprintln!("error: {e}"),
            }
        });
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))?;
    }

    timer.start();
    while !stop.load(Ordering::SeqCst) {
        if let Some(target) = cycles {
            if completed_focus.get() >= target {
                break;
            }
        }
        if timer.is_ticking() {
            std::thread::sleep(Duration::from_secs(1));
            timer.tick();
        } else if timer.has_pending_auto_start() {
            std::thread::sleep(Duration::from_millis(250));
            timer.poll_deferred();
        } else {
            // Auto-start is off for this transition; in the foreground
            // loop the operator wants continuous cycling, so start the
            // next session directly.
            timer.start();
        }
    }
    Ok(())
}
