//! Reminder scheduler.
//!
//! Holds at most one armed timer per task id. Like the rest of the engine it
//! owns no threads: the caller invokes [`Scheduler::tick`] with the current
//! time and receives every timer that has come due.
//!
//! ## Per-task states
//!
//! ```text
//! Idle -> Armed -> Fired -> (Armed | Idle)
//! ```
//!
//! `Fired` is transient: [`Scheduler::tick`] removes the timer and hands it to
//! the caller, who decides whether the task re-arms for its next occurrence.

mod ledger;
mod next_fire;

pub use ledger::{OccurrenceKey, OccurrenceLedger};
pub use next_fire::{compute_last_due, compute_next_fire, resolve_local};

use std::collections::HashMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::AlarmBackend;
use crate::settings::Settings;
use crate::task::Task;

/// Why a timer was armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    /// The task's own next occurrence.
    Occurrence,
    /// One-shot re-arm requested by the user from an alert.
    Snooze,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmedTimer {
    pub task_id: String,
    pub fire_at: DateTime<Utc>,
    pub kind: TimerKind,
}

/// Whether a task participates in arming at all.
pub fn is_eligible(task: &Task, settings: &Settings) -> bool {
    settings.notifications_enabled && task.enabled && !task.completed
}

/// Tasks whose most recent occurrence lies within `grace` before `now` and
/// whose idempotency key has not been recorded yet.
///
/// Shared by the startup/resume missed-notification sweep and the foreground
/// polling sweep; the caller records each returned key when it fires.
pub fn sweep_due<'a, Tz: TimeZone>(
    tasks: &'a [Task],
    settings: &Settings,
    now: &DateTime<Tz>,
    grace: Duration,
    ledger: &OccurrenceLedger,
) -> Vec<(&'a Task, OccurrenceKey)> {
    tasks
        .iter()
        .filter(|task| is_eligible(task, settings))
        .filter_map(|task| {
            let due = compute_last_due(task, now)?;
            if now.clone().signed_duration_since(due.clone()) > grace {
                return None;
            }
            let key = OccurrenceKey::new(task.id.clone(), due.date_naive());
            (!ledger.contains(&key)).then_some((task, key))
        })
        .collect()
}

/// Registry of armed timers.
pub struct Scheduler {
    armed: HashMap<String, ArmedTimer>,
    backend: Option<Box<dyn AlarmBackend>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            armed: HashMap::new(),
            backend: None,
        }
    }

    /// Mirror every arm/cancel to a platform alarm registry as well.
    pub fn with_backend(backend: Box<dyn AlarmBackend>) -> Self {
        Self {
            armed: HashMap::new(),
            backend: Some(backend),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn armed(&self, task_id: &str) -> Option<&ArmedTimer> {
        self.armed.get(task_id)
    }

    pub fn is_armed(&self, task_id: &str) -> bool {
        self.armed.contains_key(task_id)
    }

    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    /// Armed timers ordered by fire time.
    pub fn timers(&self) -> Vec<&ArmedTimer> {
        let mut timers: Vec<&ArmedTimer> = self.armed.values().collect();
        timers.sort_by(|a, b| a.fire_at.cmp(&b.fire_at).then_with(|| a.task_id.cmp(&b.task_id)));
        timers
    }

    /// Earliest armed fire time; the runtime sleeps until then.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.armed.values().map(|t| t.fire_at).min()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Arm a timer, replacing whatever the task held before.
    pub fn arm(&mut self, task_id: &str, fire_at: DateTime<Utc>, kind: TimerKind) {
        self.cancel(task_id);
        if let Some(backend) = self.backend.as_mut() {
            if let Err(e) = backend.register(task_id, fire_at) {
                tracing::warn!(task_id, error = %e, "platform alarm registration failed; relying on in-process timer");
            }
        }
        tracing::debug!(task_id, %fire_at, ?kind, "armed");
        self.armed.insert(
            task_id.to_string(),
            ArmedTimer {
                task_id: task_id.to_string(),
                fire_at,
                kind,
            },
        );
    }

    /// Arm the task's next occurrence after `now`. Returns the fire time, or
    /// `None` when the task went back to idle.
    pub fn arm_next<Tz: TimeZone>(&mut self, task: &Task, settings: &Settings, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
        if !is_eligible(task, settings) {
            self.cancel(&task.id);
            return None;
        }
        match compute_next_fire(task, now) {
            Some(next) => {
                let fire_at = next.with_timezone(&Utc);
                self.arm(&task.id, fire_at, TimerKind::Occurrence);
                Some(fire_at)
            }
            None => {
                self.cancel(&task.id);
                None
            }
        }
    }

    /// One-shot re-arm at `at`. The task's configured time is not touched.
    pub fn snooze(&mut self, task_id: &str, at: DateTime<Utc>) {
        self.arm(task_id, at, TimerKind::Snooze);
    }

    /// Re-arm everything from scratch.
    ///
    /// Clears every timer first, so repeated calls never leave duplicates.
    /// A pending snooze survives when its task is still eligible. Returns the
    /// number of armed timers.
    pub fn schedule_all<Tz: TimeZone>(&mut self, tasks: &[Task], settings: &Settings, now: &DateTime<Tz>) -> usize {
        let snoozed: Vec<ArmedTimer> = self
            .armed
            .values()
            .filter(|t| t.kind == TimerKind::Snooze)
            .cloned()
            .collect();
        self.cancel_all();

        for task in tasks {
            if !is_eligible(task, settings) {
                continue;
            }
            match snoozed.iter().find(|s| s.task_id == task.id) {
                Some(snooze) => self.arm(&task.id, snooze.fire_at, TimerKind::Snooze),
                None => {
                    self.arm_next(task, settings, now);
                }
            }
        }
        self.armed.len()
    }

    /// Cancel one task's timer. No-op when none is held.
    pub fn cancel(&mut self, task_id: &str) -> bool {
        let removed = self.armed.remove(task_id).is_some();
        if removed {
            if let Some(backend) = self.backend.as_mut() {
                if let Err(e) = backend.cancel(task_id) {
                    tracing::warn!(task_id, error = %e, "platform alarm cancel failed");
                }
            }
        }
        removed
    }

    /// Cancel every timer. Safe on an empty registry.
    pub fn cancel_all(&mut self) {
        let ids: Vec<String> = self.armed.keys().cloned().collect();
        for id in ids {
            self.cancel(&id);
        }
    }

    /// Remove and return every timer due at or before `now`, earliest first.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<ArmedTimer> {
        let due_ids: Vec<String> = self
            .armed
            .values()
            .filter(|t| t.fire_at <= now)
            .map(|t| t.task_id.clone())
            .collect();
        let mut fired: Vec<ArmedTimer> = due_ids.iter().filter_map(|id| self.armed.remove(id)).collect();
        fired.sort_by(|a, b| a.fire_at.cmp(&b.fire_at).then_with(|| a.task_id.cmp(&b.task_id)));
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CapabilityError;
    use crate::task::{Recurrence, WeekDays};
    use std::sync::{Arc, Mutex};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn task(id: &str, recurrence: Recurrence, time: &str) -> Task {
        Task {
            id: id.to_string(),
            title: id.to_string(),
            time: time.parse().unwrap(),
            recurrence,
            week_days: None,
            enabled: true,
            completed: false,
            completed_at: None,
            notes: None,
            notification_sound: true,
            vibration: true,
            alarm_sound: "default".to_string(),
            alarm_enabled: false,
            created_at: at(2024, 1, 1, 8, 0),
            updated_at: at(2024, 1, 1, 8, 0),
        }
    }

    #[derive(Default)]
    struct RecordingBackend {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl AlarmBackend for RecordingBackend {
        fn register(&mut self, task_id: &str, _at: DateTime<Utc>) -> Result<(), CapabilityError> {
            self.log.lock().unwrap().push(format!("register:{task_id}"));
            Ok(())
        }

        fn cancel(&mut self, task_id: &str) -> Result<(), CapabilityError> {
            self.log.lock().unwrap().push(format!("cancel:{task_id}"));
            Ok(())
        }
    }

    #[test]
    fn schedule_all_twice_arms_once_per_task() {
        let tasks = vec![
            task("a", Recurrence::Daily, "09:00"),
            task("b", Recurrence::Daily, "18:00"),
        ];
        let settings = Settings::default();
        let now = at(2024, 1, 1, 8, 0);
        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.schedule_all(&tasks, &settings, &now), 2);
        assert_eq!(scheduler.schedule_all(&tasks, &settings, &now), 2);
        assert_eq!(scheduler.armed_count(), 2);

        let fired = scheduler.tick(at(2024, 1, 1, 9, 0));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].task_id, "a");
        assert!(scheduler.tick(at(2024, 1, 1, 9, 1)).is_empty());
    }

    #[test]
    fn ineligible_tasks_stay_idle() {
        let mut disabled = task("a", Recurrence::Daily, "09:00");
        disabled.enabled = false;
        let mut done = task("b", Recurrence::Daily, "09:00");
        done.mark_completed(at(2024, 1, 1, 7, 0));
        let mut empty_weekly = task("c", Recurrence::Weekly, "09:00");
        empty_weekly.week_days = Some(WeekDays::default());
        let tasks = vec![disabled, done, empty_weekly];

        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.schedule_all(&tasks, &Settings::default(), &at(2024, 1, 1, 8, 0)), 0);
    }

    #[test]
    fn master_switch_disarms_everything() {
        let tasks = vec![task("a", Recurrence::Daily, "09:00")];
        let settings = Settings {
            notifications_enabled: false,
            ..Settings::default()
        };
        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.schedule_all(&tasks, &settings, &at(2024, 1, 1, 8, 0)), 0);
    }

    #[test]
    fn cancel_one_leaves_others() {
        let tasks = vec![
            task("a", Recurrence::Daily, "09:00"),
            task("b", Recurrence::Daily, "10:00"),
        ];
        let mut scheduler = Scheduler::new();
        scheduler.schedule_all(&tasks, &Settings::default(), &at(2024, 1, 1, 8, 0));
        assert!(scheduler.cancel("a"));
        assert!(!scheduler.cancel("a"));
        assert!(scheduler.is_armed("b"));
        scheduler.cancel_all();
        scheduler.cancel_all();
        assert_eq!(scheduler.armed_count(), 0);
    }

    #[test]
    fn snooze_replaces_occurrence_and_survives_rearm() {
        let tasks = vec![task("a", Recurrence::Daily, "09:00")];
        let settings = Settings::default();
        let mut scheduler = Scheduler::new();
        scheduler.schedule_all(&tasks, &settings, &at(2024, 1, 1, 8, 0));
        scheduler.snooze("a", at(2024, 1, 1, 9, 5));
        assert_eq!(scheduler.armed_count(), 1);

        scheduler.schedule_all(&tasks, &settings, &at(2024, 1, 1, 9, 1));
        let timer = scheduler.armed("a").unwrap();
        assert_eq!(timer.kind, TimerKind::Snooze);
        assert_eq!(timer.fire_at, at(2024, 1, 1, 9, 5));
        assert_eq!(tasks[0].time.to_string(), "09:00");
    }

    #[test]
    fn backend_mirrors_arm_and_cancel() {
        let backend = RecordingBackend::default();
        let log = backend.log.clone();
        let mut scheduler = Scheduler::with_backend(Box::new(backend));
        scheduler.arm("a", at(2024, 1, 1, 9, 0), TimerKind::Occurrence);
        scheduler.arm("a", at(2024, 1, 2, 9, 0), TimerKind::Occurrence);
        scheduler.cancel("a");
        assert_eq!(
            *log.lock().unwrap(),
            vec!["register:a", "cancel:a", "register:a", "cancel:a"]
        );
    }

    #[test]
    fn next_deadline_is_earliest_timer() {
        let mut scheduler = Scheduler::new();
        assert!(scheduler.next_deadline().is_none());
        scheduler.arm("late", at(2024, 1, 1, 20, 0), TimerKind::Occurrence);
        scheduler.arm("early", at(2024, 1, 1, 6, 0), TimerKind::Occurrence);
        assert_eq!(scheduler.next_deadline(), Some(at(2024, 1, 1, 6, 0)));
    }

    #[test]
    fn sweep_fires_within_grace_once() {
        let tasks = vec![task("a", Recurrence::Daily, "09:00")];
        let settings = Settings::default();
        let grace = Duration::minutes(5);
        let mut ledger = OccurrenceLedger::new();

        let due = sweep_due(&tasks, &settings, &at(2024, 1, 1, 9, 3), grace, &ledger);
        assert_eq!(due.len(), 1);
        ledger.record(due[0].1.clone());

        assert!(sweep_due(&tasks, &settings, &at(2024, 1, 1, 9, 4), grace, &ledger).is_empty());
        // outside the grace window nothing is due either
        let fresh = OccurrenceLedger::new();
        assert!(sweep_due(&tasks, &settings, &at(2024, 1, 1, 9, 6), grace, &fresh).is_empty());
    }
}
