use std::path::PathBuf;

use chrono::Utc;
use clap::Subcommand;
use serde::Serialize;
use tomatina_core::{export_data, import_data, DataBundle, FileStore};

#[derive(Subcommand)]
pub enum DataAction {
    /// Write a full data bundle (settings, stats, history) as JSON
    Export {
        /// Destination file; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replace local stores from a bundle file
    Import { file: PathBuf },
}

#[derive(Serialize)]
struct ImportOutcome {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn run(action: DataAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::open()?;

    match action {
        DataAction::Export { output } => {
            let bundle = export_data(&store, Utc::now())?;
            let json = serde_json::to_string_pretty(&bundle)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    eprintln!("exported to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        DataAction::Import { file } => {
            let content = std::fs::read_to_string(&file)?;
            let bundle: DataBundle = serde_json::from_str(&content)?;
            let outcome = match import_data(&store, &bundle) {
                Ok(()) => ImportOutcome {
                    success: true,
                    error: None,
                },
                Err(e) => ImportOutcome {
                    success: false,
                    error: Some(e.to_string()),
                },
            };
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if !outcome.success {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
