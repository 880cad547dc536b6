use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notify::{PermissionOutcome, SoundOutcome};
use crate::scheduler::TimerKind;

/// Every state change in the reminder service produces an Event.
/// Front ends render them; the CLI prints them as JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A timer was set for a task's next occurrence or a snooze.
    TaskArmed {
        task_id: String,
        fire_at: DateTime<Utc>,
        kind: TimerKind,
    },
    /// The task went idle: disabled, completed, or no future occurrence.
    TaskDisarmed {
        task_id: String,
        at: DateTime<Utc>,
    },
    /// A reminder was delivered.
    ReminderFired {
        task_id: String,
        /// What triggered it.
        source: FireSource,
        visual: bool,
        vibrated: bool,
        sound: SoundOutcome,
        at: DateTime<Utc>,
    },
    TaskAdded {
        task_id: String,
        at: DateTime<Utc>,
    },
    TaskUpdated {
        task_id: String,
        at: DateTime<Utc>,
    },
    TaskCompleted {
        task_id: String,
        at: DateTime<Utc>,
    },
    TaskReopened {
        task_id: String,
        at: DateTime<Utc>,
    },
    TaskEnabled {
        task_id: String,
        enabled: bool,
        at: DateTime<Utc>,
    },
    TaskDeleted {
        task_id: String,
        at: DateTime<Utc>,
    },
    TaskSnoozed {
        task_id: String,
        until: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    SettingsChanged {
        rearmed: bool,
        at: DateTime<Utc>,
    },
    /// Completion flags were cleared for a new day.
    DailyReset {
        day: String,
        cleared: Vec<String>,
        at: DateTime<Utc>,
    },
    PlaybackStopped {
        sound_id: String,
        task_id: Option<String>,
        at: DateTime<Utc>,
    },
    PermissionChanged {
        outcome: PermissionOutcome,
        at: DateTime<Utc>,
    },
    /// Another process wrote the store; tasks and settings were re-read.
    StoreReloaded {
        revision: u64,
        tasks: usize,
        at: DateTime<Utc>,
    },
}

/// Path that produced a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FireSource {
    /// Armed single-shot timer.
    Timer,
    /// Snoozed re-fire.
    Snooze,
    /// Foreground polling sweep.
    Poll,
    /// Startup/resume catch-up inside the grace window.
    Missed,
}

impl Event {
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Event::TaskArmed { task_id, .. }
            | Event::TaskDisarmed { task_id, .. }
            | Event::ReminderFired { task_id, .. }
            | Event::TaskAdded { task_id, .. }
            | Event::TaskUpdated { task_id, .. }
            | Event::TaskCompleted { task_id, .. }
            | Event::TaskReopened { task_id, .. }
            | Event::TaskEnabled { task_id, .. }
            | Event::TaskDeleted { task_id, .. }
            | Event::TaskSnoozed { task_id, .. } => Some(task_id),
            Event::PlaybackStopped { task_id, .. } => task_id.as_deref(),
            Event::SettingsChanged { .. }
            | Event::DailyReset { .. }
            | Event::PermissionChanged { .. }
            | Event::StoreReloaded { .. } => None,
        }
    }
}

impl From<TimerKind> for FireSource {
    fn from(kind: TimerKind) -> Self {
        match kind {
            TimerKind::Occurrence => FireSource::Timer,
            TimerKind::Snooze => FireSource::Snooze,
        }
    }
}
