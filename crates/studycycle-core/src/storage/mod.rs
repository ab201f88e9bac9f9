mod config;
pub mod database;
mod plan;

pub use config::{Config, CycleSection, SyncSection};
pub use database::{Database, PLAN_KEY, PROGRESS_KEY};
pub use plan::PlanRecord;

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns the data directory, creating it if needed.
///
/// `STUDYCYCLE_HOME` names the directory outright. Otherwise it is
/// `~/.config/studycycle`, or `~/.config/studycycle-dev` when
/// `STUDYCYCLE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("STUDYCYCLE_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("STUDYCYCLE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("studycycle-dev")
            } else {
                base_dir.join("studycycle")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
