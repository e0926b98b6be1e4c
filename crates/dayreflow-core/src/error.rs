//! Core error types for dayreflow-core.
//!
//! Computation errors (`InvalidEvent`, `EmptyBudget`, `NothingToCompact`,
//! `BudgetTooSmall`) are raised before anything is sent to the remote
//! calendar. Remote failures during a write batch are not errors at this
//! level; they are collected per event in a [`crate::apply::BatchReport`].

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for dayreflow-core.
#[derive(Error, Debug)]
pub enum ReflowError {
    /// An event (or an urgent request) has a non-positive duration or is
    /// otherwise unusable.
    #[error("Invalid event '{event}': {reason}")]
    InvalidEvent { event: String, reason: String },

    /// The time budget to redistribute into is zero or negative.
    #[error("Empty budget: {budget_secs}s available, need a positive budget")]
    EmptyBudget { budget_secs: i64 },

    /// Nothing occupies the timeline, so there is no duration to redistribute.
    #[error("Nothing to compact: timeline has no occupied time")]
    NothingToCompact,

    /// A proportional share rounded down to a zero-length event.
    #[error("Budget too small: event '{event}' would shrink to zero length")]
    BudgetTooSmall { event: String },

    /// A computed boundary does not fit in the representable time range.
    #[error("Computed boundary out of range for event '{event}'")]
    OutOfRange { event: String },

    /// The remote calendar could not be read.
    #[error("Remote calendar unavailable: {0}")]
    RemoteUnavailable(#[from] RemoteError),

    /// A restore was requested but there is no capture to restore from.
    #[error("Nothing to restore: no snapshot found")]
    SnapshotMissing,

    /// Snapshot storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReflowError {
    pub(crate) fn invalid_event(event: impl Into<String>, reason: impl Into<String>) -> Self {
        ReflowError::InvalidEvent {
            event: event.into(),
            reason: reason.into(),
        }
    }
}

/// Errors reported by a remote calendar collaborator.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The remote answered with a non-success status.
    #[error("Calendar API returned {status}: {message}")]
    Http { status: u16, message: String },

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body could not be understood.
    #[error("Could not decode calendar response: {0}")]
    Decode(String),

    /// The event does not exist on the remote.
    #[error("Event not found: {0}")]
    NotFound(String),

    /// The remote refused to serve the request.
    #[error("Calendar unavailable: {0}")]
    Unavailable(String),
}

/// Snapshot storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open snapshot database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// A stored record could not be decoded.
    #[error("Corrupt record in snapshot {snapshot}: {message}")]
    CorruptRecord { snapshot: i64, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The data directory could not be resolved or created.
    #[error("Could not prepare data directory {path}: {message}")]
    DataDir { path: PathBuf, message: String },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for ReflowError {
    fn from(err: rusqlite::Error) -> Self {
        ReflowError::Storage(err.into())
    }
}

/// Result type alias for ReflowError
pub type Result<T, E = ReflowError> = std::result::Result<T, E>;
