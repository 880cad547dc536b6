//! Idempotency keys for fired occurrences.
//!
//! A key is `(task id, calendar day)`. Every path that can fire a regular
//! occurrence (single-shot timer, polling sweep, missed-notification sweep)
//! records the key first and skips the fire when it was already present, so
//! one occurrence notifies at most once per day.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceKey {
    pub task_id: String,
    pub day: NaiveDate,
}

impl OccurrenceKey {
    pub fn new(task_id: impl Into<String>, day: NaiveDate) -> Self {
        Self {
            task_id: task_id.into(),
            day,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OccurrenceLedger {
    keys: BTreeSet<OccurrenceKey>,
}

impl OccurrenceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &OccurrenceKey) -> bool {
        self.keys.contains(key)
    }

    /// Record a fire. Returns `false` when the occurrence already fired.
    pub fn record(&mut self, key: OccurrenceKey) -> bool {
        self.keys.insert(key)
    }

    /// Drop keys for days before `day`. Returns how many were removed.
    pub fn prune_before(&mut self, day: NaiveDate) -> usize {
        let before = self.keys.len();
        self.keys.retain(|k| k.day >= day);
        before - self.keys.len()
    }

    pub fn forget_task(&mut self, task_id: &str) {
        self.keys.retain(|k| k.task_id != task_id);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
