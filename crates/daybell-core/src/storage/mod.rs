//! Persistence: the blob store, its typed repository, and the config file.

mod config;
mod memory;
mod repository;
mod sqlite;

pub use config::{AlarmConfig, Config, LoggingConfig, PlatformConfig, SchedulerConfig};
pub use memory::MemoryStore;
pub use repository::ReminderRepository;
pub use sqlite::SqliteStore;

use std::path::PathBuf;

use crate::error::StoreError;

/// Task list, JSON array.
pub const KEY_TASKS: &str = "tasks";
/// Settings singleton, JSON object.
pub const KEY_SETTINGS: &str = "settings";
/// Calendar day of the last completion reset, `YYYY-MM-DD`.
pub const KEY_LAST_RESET_DATE: &str = "last-reset-date";
/// Occurrence ledger, JSON array of `{taskId, day}`.
pub const KEY_FIRED_OCCURRENCES: &str = "fired-occurrences";
/// User-uploaded sounds, JSON array.
pub const KEY_CUSTOM_SOUNDS: &str = "custom-sounds";
/// Write counter bumped with every task, settings or sound write. Lets a
/// long-running session notice changes made by other processes.
pub const KEY_REVISION: &str = "revision";

/// Get/set string blobs by key.
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<S: BlobStore + ?Sized> BlobStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

/// Returns `~/.config/daybell[-dev]/` based on DAYBELL_ENV.
///
/// Set DAYBELL_ENV=dev to use the development data directory, or
/// DAYBELL_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let dir = match std::env::var_os("DAYBELL_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("DAYBELL_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("daybell-dev")
            } else {
                base_dir.join("daybell")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| StoreError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
