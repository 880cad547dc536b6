//! Core error types for daybell-core.
//!
//! Every failure class the reminder engine can hit is named here. Most of
//! them are recovered locally by the orchestrator (logged, then the operation
//! continues on in-memory state); only validation and not-found errors are
//! returned to callers as hard failures.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for daybell-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Blob store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Platform capability errors
    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    /// No task with the given id
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Blob store errors. Surfaced as a persistence failure: logged, never fatal
/// to an in-flight session.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Read or write failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Stored blob could not be decoded
    #[error("Corrupt value under '{key}': {message}")]
    Corrupt { key: String, message: String },

    /// Database is locked
    #[error("Store is locked")]
    Locked,

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
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

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Platform capability errors.
///
/// Covers both permission-unavailable (unsupported or denied) and
/// asset-unavailable failures. The notifier always degrades to the next
/// weaker modality on any of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// Capability not present on this platform
    #[error("{capability} is not supported on this platform")]
    Unsupported { capability: &'static str },

    /// User denied the permission backing this capability
    #[error("permission for {capability} was denied")]
    Denied { capability: &'static str },

    /// A sound or other resource could not be found
    #[error("asset unavailable: {0}")]
    AssetMissing(String),

    /// The platform backend reported a failure
    #[error("platform backend failed: {0}")]
    Backend(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Time of day not in 24h HH:MM form
    #[error("Invalid time '{0}': expected HH:MM (00:00-23:59)")]
    InvalidTime(String),

    /// Weekday index outside 0..=6
    #[error("Invalid weekday index {0}: expected 0 (Sunday) to 6 (Saturday)")]
    InvalidWeekday(u8),

    /// Unknown recurrence keyword on input
    #[error("Unknown recurrence '{0}': expected daily, weekly, one-time or tomorrow")]
    InvalidRecurrence(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
