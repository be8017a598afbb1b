pub mod bundle;
pub mod database;
pub mod gateway;

pub use bundle::{export_data, import_data, DataBundle};
pub use database::{Database, NewSession, SessionRecord, HISTORY_CAP};
pub use gateway::{FileStore, MemoryStore, StorageGateway};

use std::path::PathBuf;

use crate::error::CoreError;

/// Returns `~/.config/tomatina[-dev]/` based on TOMATINA_ENV.
///
/// Set TOMATINA_ENV=dev to use a separate development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, CoreError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TOMATINA_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("tomatina-dev")
    } else {
        base_dir.join("tomatina")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
