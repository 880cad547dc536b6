//! Typed access to the blobs the reminder engine persists.
//!
//! Reads never fail: a missing or undecodable blob is logged and replaced by
//! its default, so a damaged store degrades to an empty session instead of
//! blocking startup. Writes return the store error for the caller to log.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{
    BlobStore, KEY_CUSTOM_SOUNDS, KEY_FIRED_OCCURRENCES, KEY_LAST_RESET_DATE, KEY_REVISION, KEY_SETTINGS,
    KEY_TASKS,
};
use crate::error::StoreError;
use crate::notify::CustomSound;
use crate::scheduler::OccurrenceLedger;
use crate::settings::Settings;
use crate::task::Task;

pub struct ReminderRepository<S> {
    store: S,
}

impl<S: BlobStore> ReminderRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Tasks in stored order. Entries that fail to decode are dropped
    /// individually.
    pub fn load_tasks(&self) -> Vec<Task> {
        let Some(raw) = self.read_raw(KEY_TASKS) else {
            return Vec::new();
        };
        let entries: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key = KEY_TASKS, error = %e, "task list unreadable; starting empty");
                return Vec::new();
            }
        };
        entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<Task>(entry) {
                Ok(task) => Some(task),
                Err(e) => {
                    tracing::warn!(error = %e, "dropping undecodable task");
                    None
                }
            })
            .collect()
    }

    pub fn save_tasks(&mut self, tasks: &[Task]) -> Result<(), StoreError> {
        self.write_json(KEY_TASKS, tasks)?;
        self.bump_revision()
    }

    pub fn load_settings(&self) -> Settings {
        self.read_json(KEY_SETTINGS)
    }

    pub fn save_settings(&mut self, settings: &Settings) -> Result<(), StoreError> {
        self.write_json(KEY_SETTINGS, settings)?;
        self.bump_revision()
    }

    pub fn last_reset_date(&self) -> Option<String> {
        self.read_raw(KEY_LAST_RESET_DATE)
    }

    pub fn set_last_reset_date(&mut self, day: &str) -> Result<(), StoreError> {
        self.store.set(KEY_LAST_RESET_DATE, day)
    }

    pub fn load_ledger(&self) -> OccurrenceLedger {
        self.read_json(KEY_FIRED_OCCURRENCES)
    }

    pub fn save_ledger(&mut self, ledger: &OccurrenceLedger) -> Result<(), StoreError> {
        self.write_json(KEY_FIRED_OCCURRENCES, ledger)
    }

    pub fn load_custom_sounds(&self) -> Vec<CustomSound> {
        self.read_json(KEY_CUSTOM_SOUNDS)
    }

    pub fn save_custom_sounds(&mut self, sounds: &[CustomSound]) -> Result<(), StoreError> {
        self.write_json(KEY_CUSTOM_SOUNDS, sounds)?;
        self.bump_revision()
    }

    /// Current write counter; 0 for a fresh or unreadable store.
    pub fn revision(&self) -> u64 {
        self.read_raw(KEY_REVISION)
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0)
    }

    fn bump_revision(&mut self) -> Result<(), StoreError> {
        let next = self.revision().wrapping_add(1);
        self.store.set(KEY_REVISION, &next.to_string())
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "store read failed");
                None
            }
        }
    }

    fn read_json<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let Some(raw) = self.read_raw(key) else {
            return T::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "stored value unreadable; using default");
            T::default()
        })
    }

    fn write_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.store.set(key, &json)
    }
}
