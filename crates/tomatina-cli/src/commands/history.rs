use clap::Subcommand;
use tomatina_core::{FileStore, SessionRecord, StorageGateway};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List recorded sessions, newest first
    List {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Delete all recorded sessions
    Clear,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::open()?;

    match action {
        HistoryAction::List { limit } => {
            let history = store.load_history()?;
            let newest_first: Vec<&SessionRecord> = history
                .iter()
                .rev()
                .take(limit.unwrap_or(usize::MAX))
                .collect();
            println!("{}", serde_json::to_string_pretty(&newest_first)?);
        }
        HistoryAction::Clear => {
            let emptied = store.clear_history()?;
            println!("{}", serde_json::to_string_pretty(&emptied)?);
        }
    }
    Ok(())
}
