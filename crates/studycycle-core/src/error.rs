//! Core error types for studycycle-core.
//!
//! Each concern (ledger, sync, timer, storage, config) has its own
//! thiserror enum; [`CoreError`] unifies them for callers that do not care
//! which layer failed.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studycycle-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Progress ledger errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Ledger seeding errors
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Session timer errors
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// Persistence errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A task rejected by ledger validation. Never fatal: the task is dropped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("task has no id")]
    MissingId,

    #[error("task '{task_id}' has no subject")]
    MissingSubject { task_id: String },

    #[error("task '{task_id}' has non-positive planned hours ({hours})")]
    NonPositiveHours { task_id: String, hours: f64 },
}

/// Progress ledger errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// No valid task survived validation, so no entry was created.
    #[error("no valid tasks for {date}")]
    EmptyDay { date: NaiveDate },

    #[error("no daily log for {date}")]
    DayNotFound { date: NaiveDate },

    #[error("task '{task_id}' not found in daily log for {date}")]
    TaskNotFound { date: NaiveDate, task_id: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl LedgerError {
    /// True for the not-found family (unknown date or task).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LedgerError::DayNotFound { .. } | LedgerError::TaskNotFound { .. }
        )
    }
}

/// Ledger seeding errors.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The retry budget ran out with some rotation days still missing.
    #[error("plan could not be initialized after {attempts} attempts; {} day(s) missing", missing.len())]
    InitializationFailed {
        attempts: u32,
        missing: Vec<NaiveDate>,
    },
}

/// Session timer errors.
#[derive(Error, Debug)]
pub enum TimerError {
    #[error("cannot start a session without a subject")]
    EmptySubject,

    #[error("timer is already running ({state})")]
    NotIdle { state: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Persistence errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Failed to encode or decode stored record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::QueryFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_errors_convert_into_core_error() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let err: CoreError = LedgerError::DayNotFound { date }.into();
        assert!(matches!(err, CoreError::Ledger(ref e) if e.is_not_found()));
        assert_eq!(err.to_string(), "Ledger error: no daily log for 2026-06-01");

        let err: CoreError = StorageError::QueryFailed("disk full".into()).into();
        assert!(matches!(err, CoreError::Storage(_)));
    }
}
