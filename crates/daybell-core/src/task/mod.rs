//! Task model for recurring and one-time reminders.
//!
//! A task carries a time of day but no date; which days it applies to is
//! decided by its [`Recurrence`]. Field names serialize in camelCase to match
//! the persisted `tasks` blob.

mod time_of_day;

pub use time_of_day::{TaskTime, WeekDays};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::settings::Settings;

/// How often a task recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Recurrence {
    /// Every day.
    Daily,
    /// On the days listed in `weekDays`.
    Weekly,
    /// Until completed; archived the day after completion.
    OneTime,
    /// Only on the day after the task was created.
    Tomorrow,
    /// Any value this version does not recognise. Treated as visible.
    #[serde(other)]
    Unknown,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::OneTime => "one-time",
            Recurrence::Tomorrow => "tomorrow",
            Recurrence::Unknown => "unknown",
        }
    }

    /// Whether a fired occurrence is followed by another one.
    pub fn repeats(&self) -> bool {
        matches!(self, Recurrence::Daily | Recurrence::Weekly)
    }
}

impl FromStr for Recurrence {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            "one-time" | "onetime" | "once" => Ok(Recurrence::OneTime),
            "tomorrow" => Ok(Recurrence::Tomorrow),
            other => Err(ValidationError::InvalidRecurrence(other.to_string())),
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_alarm_sound() -> String {
    crate::notify::DEFAULT_SOUND_ID.to_string()
}

fn default_true() -> bool {
    true
}

/// A reminder task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub time: TaskTime,
    pub recurrence: Recurrence,
    /// Present only for weekly tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_days: Option<WeekDays>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub notification_sound: bool,
    #[serde(default)]
    pub vibration: bool,
    #[serde(default = "default_alarm_sound")]
    pub alarm_sound: String,
    #[serde(default)]
    pub alarm_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Build a task from user input. Assigns the id and both timestamps.
    ///
    /// Modalities left unset in `new` take their values from `settings`.
    pub fn create(new: NewTask, settings: &Settings, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let title = new.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "title".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        let week_days = normalize_week_days(new.recurrence, new.week_days)?;

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            time: new.time,
            recurrence: new.recurrence,
            week_days,
            enabled: true,
            completed: false,
            completed_at: None,
            notes: new.notes.filter(|n| !n.trim().is_empty()),
            notification_sound: new.notification_sound.unwrap_or(settings.default_sound),
            vibration: new.vibration.unwrap_or(settings.default_vibration),
            alarm_sound: new
                .alarm_sound
                .unwrap_or_else(|| settings.default_alarm_sound.clone()),
            alarm_enabled: new.alarm_enabled,
            created_at: now,
            updated_at: now,
        })
    }

    /// Mark this occurrence done.
    pub fn mark_completed(&mut self, at: DateTime<Utc>) {
        self.completed = true;
        self.completed_at = Some(at);
        self.updated_at = at;
    }

    /// Clear completion without touching `updatedAt` (used by daily resets).
    pub fn clear_completion(&mut self) {
        self.completed = false;
        self.completed_at = None;
    }

    /// Flip completion the way the task list checkbox does.
    pub fn toggle_completed(&mut self, at: DateTime<Utc>) {
        if self.completed {
            self.clear_completion();
            self.updated_at = at;
        } else {
            self.mark_completed(at);
        }
    }

    pub fn toggle_enabled(&mut self, at: DateTime<Utc>) {
        self.enabled = !self.enabled;
        self.updated_at = at;
    }

    /// Notification body: the notes when present, otherwise a default line.
    pub fn reminder_body(&self) -> String {
        match self.notes.as_deref().map(str::trim) {
            Some(notes) if !notes.is_empty() => notes.to_string(),
            _ => format!("Time for: {}", self.title),
        }
    }
}

/// Weekly tasks need a weekday set; every other recurrence drops it.
fn normalize_week_days(
    recurrence: Recurrence,
    week_days: Option<WeekDays>,
) -> Result<Option<WeekDays>, ValidationError> {
    match recurrence {
        Recurrence::Weekly => match week_days {
            Some(days) if !days.is_empty() => Ok(Some(days)),
            _ => Err(ValidationError::InvalidValue {
                field: "weekDays".to_string(),
                message: "weekly tasks need at least one weekday".to_string(),
            }),
        },
        _ => Ok(None),
    }
}

/// User input for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub time: TaskTime,
    pub recurrence: Recurrence,
    #[serde(default)]
    pub week_days: Option<WeekDays>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub notification_sound: Option<bool>,
    #[serde(default)]
    pub vibration: Option<bool>,
    #[serde(default)]
    pub alarm_sound: Option<String>,
    #[serde(default)]
    pub alarm_enabled: bool,
}

impl NewTask {
    pub fn new(title: impl Into<String>, time: TaskTime, recurrence: Recurrence) -> Self {
        Self {
            title: title.into(),
            time,
            recurrence,
            week_days: None,
            notes: None,
            notification_sound: None,
            vibration: None,
            alarm_sound: None,
            alarm_enabled: false,
        }
    }

    pub fn with_week_days(mut self, days: WeekDays) -> Self {
        self.week_days = Some(days);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_alarm(mut self, sound_id: impl Into<String>) -> Self {
        self.alarm_enabled = true;
        self.alarm_sound = Some(sound_id.into());
        self
    }
}

/// Partial edit of an existing task. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    pub time: Option<TaskTime>,
    pub recurrence: Option<Recurrence>,
    pub week_days: Option<WeekDays>,
    /// Empty string clears the notes.
    pub notes: Option<String>,
    pub notification_sound: Option<bool>,
    pub vibration: Option<bool>,
    pub alarm_sound: Option<String>,
    pub alarm_enabled: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.time.is_none()
            && self.recurrence.is_none()
            && self.week_days.is_none()
            && self.notes.is_none()
            && self.notification_sound.is_none()
            && self.vibration.is_none()
            && self.alarm_sound.is_none()
            && self.alarm_enabled.is_none()
    }

    /// Apply the patch. `id`, `createdAt` and completion are preserved.
    pub fn apply(self, task: &mut Task, now: DateTime<Utc>) -> Result<(), ValidationError> {
        let recurrence = self.recurrence.unwrap_or(task.recurrence);
        let week_days = normalize_week_days(recurrence, self.week_days.or_else(|| task.week_days.clone()))?;

        if let Some(title) = self.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: "title".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
            task.title = title;
        }
        if let Some(time) = self.time {
            task.time = time;
        }
        task.recurrence = recurrence;
        task.week_days = week_days;
        if let Some(notes) = self.notes {
            task.notes = Some(notes).filter(|n| !n.trim().is_empty());
        }
        if let Some(v) = self.notification_sound {
            task.notification_sound = v;
        }
        if let Some(v) = self.vibration {
            task.vibration = v;
        }
        if let Some(sound) = self.alarm_sound {
            task.alarm_sound = sound;
        }
        if let Some(v) = self.alarm_enabled {
            task.alarm_enabled = v;
        }
        task.updated_at = now;
        Ok(())
    }
}
