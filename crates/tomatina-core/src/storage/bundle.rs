//! Bulk data export/import.
//!
//! The bundle shape matches the desktop app's export payload, so bundles
//! written by either side import cleanly into the other. Import replaces
//! each store wholesale, but only for the sections present in the payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::settings::Settings;
use crate::stats::StatsSnapshot;

use super::database::SessionRecord;
use super::gateway::StorageGateway;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_history: Option<Vec<SessionRecord>>,
    pub export_date: DateTime<Utc>,
}

/// Snapshot all three stores into a bundle.
pub fn export_data(
    storage: &dyn StorageGateway,
    exported_at: DateTime<Utc>,
) -> Result<DataBundle, CoreError> {
    Ok(DataBundle {
        settings: Some(storage.load_settings()?),
        stats: Some(storage.load_stats()?),
        session_history: Some(storage.load_history()?),
        export_date: exported_at,
    })
}

/// Replace each store present in the bundle. Absent sections leave the
/// corresponding store untouched.
pub fn import_data(storage: &dyn StorageGateway, bundle: &DataBundle) -> Result<(), CoreError> {
    if let Some(ref settings) = bundle.settings {
        storage.save_settings(settings)?;
    }
    if let Some(ref stats) = bundle.stats {
        storage.save_stats(stats)?;
    }
    if let Some(ref history) = bundle.session_history {
        storage.replace_history(history)?;
    }
    Ok(())
}
