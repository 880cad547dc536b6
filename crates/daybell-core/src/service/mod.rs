//! Reminder service: owns the task list and wires store, recurrence rules,
//! scheduler and notifier together at each lifecycle point.
//!
//! The service is tick-driven and never spawns threads. State changes are
//! queued as [`Event`]s; call [`ReminderService::drain_events`] after each
//! operation.
//!
//! ## Lifecycle
//!
//! ```text
//! load -> (tick | mutate | resume)* -> shutdown
//! ```
//!
//! Several processes may share one store. Before each tick and mutation the
//! service compares the store's revision counter with the one it last saw
//! and re-reads tasks and settings when another process wrote in between.

mod clock;
mod driver;

pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::run;

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result, ValidationError};
use crate::events::{Event, FireSource};
use crate::notify::{
    ForegroundMessage, NotificationAction, Notifier, NotifierOptions, PermissionOutcome, PermissionState,
    SoundInfo, SoundLibrary, SoundOutcome,
};
use crate::platform::{Platform, PlatformKind};
use crate::recurrence::{
    reset_daily_tasks, should_reset_completed_tasks, visible_tasks, WeeklyResetPolicy,
};
use crate::scheduler::{is_eligible, sweep_due, OccurrenceKey, OccurrenceLedger, Scheduler, TimerKind};
use crate::settings::Settings;
use crate::storage::{BlobStore, Config, ReminderRepository};
use crate::task::{NewTask, Recurrence, Task, TaskPatch};

/// Runtime knobs, usually derived from [`Config`].
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub grace_window: Duration,
    pub poll_interval: Duration,
    pub reset_check_interval: Duration,
    pub weekly_reset: WeeklyResetPolicy,
    pub sound_dir: Option<PathBuf>,
    pub notifier: NotifierOptions,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            grace_window: Duration::minutes(5),
            poll_interval: Duration::seconds(30),
            reset_check_interval: Duration::seconds(60),
            weekly_reset: WeeklyResetPolicy::default(),
            sound_dir: None,
            notifier: NotifierOptions::default(),
        }
    }
}

impl ServiceOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            grace_window: config.grace_window(),
            poll_interval: config.poll_interval(),
            reset_check_interval: config.reset_check_interval(),
            weekly_reset: config.scheduler.weekly_reset,
            sound_dir: config.sound_dir(),
            notifier: config.notifier_options(),
        }
    }
}

/// Tick spacing while a looping alarm plays, so a finished loop restarts
/// promptly.
const LOOP_CHECK_MILLIS: i64 = 250;

/// Header counters for today's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

pub struct ReminderService<S, C> {
    repo: ReminderRepository<S>,
    clock: C,
    scheduler: Scheduler,
    notifier: Notifier,
    options: ServiceOptions,
    platform_kind: PlatformKind,

    tasks: Vec<Task>,
    settings: Settings,
    ledger: OccurrenceLedger,
    last_reset_date: Option<String>,
    revision: u64,

    next_poll: Option<DateTime<Utc>>,
    next_reset_check: Option<DateTime<Utc>>,
    delivered: usize,
    events: Vec<Event>,
}

impl<S: BlobStore, C: Clock> ReminderService<S, C> {
    pub fn new(store: S, clock: C, platform: Platform, options: ServiceOptions) -> Self {
        let scheduler = match platform.alarms {
            Some(backend) => Scheduler::with_backend(backend),
            None => Scheduler::new(),
        };
        let notifier = Notifier::new(
            platform.surface,
            platform.haptics,
            platform.audio,
            SoundLibrary::new(options.sound_dir.clone()),
            options.notifier.clone(),
        );
        Self {
            repo: ReminderRepository::new(store),
            clock,
            scheduler,
            notifier,
            options,
            platform_kind: platform.kind,
            tasks: Vec::new(),
            settings: Settings::default(),
            ledger: OccurrenceLedger::new(),
            last_reset_date: None,
            revision: 0,
            next_poll: None,
            next_reset_check: None,
            delivered: 0,
            events: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now_utc(&self) -> DateTime<Utc> {
        self.clock.now_utc()
    }

    pub fn platform_kind(&self) -> PlatformKind {
        self.platform_kind
    }

    pub fn ledger(&self) -> &OccurrenceLedger {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        self.repo.store()
    }

    /// Today's list: visible tasks ordered by time of day.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        visible_tasks(&self.tasks, &self.clock.now())
    }

    pub fn stats(&self) -> TaskStats {
        let visible = self.visible_tasks();
        let completed = visible.iter().filter(|t| t.completed).count();
        TaskStats {
            total: visible.len(),
            completed,
            pending: visible.len() - completed,
        }
    }

    /// When the next `tick` has work to do.
    pub fn next_wakeup(&self) -> Option<DateTime<Utc>> {
        // A looping alarm is restarted on tick, so it needs frequent ones.
        let loop_check = self
            .notifier
            .playing()
            .filter(|p| p.looping)
            .map(|_| self.clock.now_utc() + Duration::milliseconds(LOOP_CHECK_MILLIS));
        [
            self.scheduler.next_deadline(),
            self.next_poll,
            self.next_reset_check,
            self.notifier.playing().map(|p| p.stop_at),
            loop_check,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start a session: read the store, run the daily reset, catch up on
    /// reminders missed within the grace window, and arm everything.
    pub fn load(&mut self) {
        let now = self.read_store();
        self.check_reset(&now);
        self.sweep(&now, FireSource::Missed);
        self.arm_all(&now);

        let now_utc = now.with_timezone(&Utc);
        self.next_poll = Some(now_utc + self.options.poll_interval);
        self.next_reset_check = Some(now_utc + self.options.reset_check_interval);
    }

    /// Read the store and run the daily reset without catching up on missed
    /// reminders and without polling. For short-lived front ends that exit
    /// after one command; delivery is left to the session that called
    /// [`load`](Self::load).
    pub fn load_passive(&mut self) {
        let now = self.read_store();
        self.check_reset(&now);
        self.arm_all(&now);
        self.next_poll = None;
        self.next_reset_check = None;
    }

    /// Re-read tasks, settings and custom sounds if another process wrote
    /// the store since this session last read or wrote it. Returns whether
    /// anything was reloaded.
    pub fn refresh(&mut self) -> bool {
        let revision = self.repo.revision();
        if revision == self.revision {
            return false;
        }
        let now = self.clock.now();
        let now_utc = now.with_timezone(&Utc);
        let tasks = self.repo.load_tasks();

        let mut silenced = Vec::new();
        for old in &self.tasks {
            match tasks.iter().find(|t| t.id == old.id) {
                Some(new) => {
                    // A moved occurrence may fire again today.
                    if new.time != old.time || new.recurrence != old.recurrence || new.week_days != old.week_days {
                        self.ledger.forget_task(&old.id);
                    }
                    if new.completed || !new.enabled {
                        silenced.push(old.id.clone());
                    }
                }
                None => {
                    self.ledger.forget_task(&old.id);
                    silenced.push(old.id.clone());
                }
            }
        }
        for id in &silenced {
            self.stop_playback_for(id, now_utc);
        }

        self.tasks = tasks;
        self.settings = self.repo.load_settings();
        self.last_reset_date = self.repo.last_reset_date();
        let custom = self.repo.load_custom_sounds();
        *self.notifier.sounds_mut() = SoundLibrary::new(self.options.sound_dir.clone()).with_custom(custom);
        self.revision = revision;
        tracing::info!(revision, tasks = self.tasks.len(), "store changed by another process; reloaded");
        self.events.push(Event::StoreReloaded {
            revision,
            tasks: self.tasks.len(),
            at: now_utc,
        });
        self.arm_all(&now);
        true
    }

    /// Advance the service to the clock's current time. Returns the number
    /// of reminders delivered.
    pub fn tick(&mut self) -> usize {
        self.refresh();
        let now = self.clock.now();
        let now_utc = now.with_timezone(&Utc);
        let before = self.delivered;

        if self.next_reset_check.is_some_and(|at| now_utc >= at) {
            if self.check_reset(&now) {
                self.arm_all(&now);
            }
            self.next_reset_check = Some(now_utc + self.options.reset_check_interval);
        }

        for timer in self.scheduler.tick(now_utc) {
            self.fire_timer(&now, timer.task_id, timer.fire_at, timer.kind);
        }

        if self.next_poll.is_some_and(|at| now_utc >= at) {
            self.sweep(&now, FireSource::Poll);
            self.next_poll = Some(now_utc + self.options.poll_interval);
        }

        self.tick_playback();
        self.delivered - before
    }

    /// Only the playback half of [`tick`](Self::tick): auto-stop and loop
    /// restart. Never fires a reminder.
    pub fn tick_playback(&mut self) {
        let now_utc = self.clock.now_utc();
        if let Some(stopped) = self.notifier.tick(now_utc) {
            self.events.push(Event::PlaybackStopped {
                sound_id: stopped.sound_id,
                task_id: stopped.task_id,
                at: now_utc,
            });
        }
    }

    /// Returning to the foreground after a suspension.
    pub fn resume(&mut self) {
        self.refresh();
        let now = self.clock.now();
        tracing::info!("resumed");
        self.check_reset(&now);
        self.sweep(&now, FireSource::Missed);
        self.arm_all(&now);
        let now_utc = now.with_timezone(&Utc);
        self.next_poll = Some(now_utc + self.options.poll_interval);
    }

    /// Cancel every timer and stop playback.
    pub fn shutdown(&mut self) {
        self.scheduler.cancel_all();
        let now_utc = self.clock.now_utc();
        if let Some(stopped) = self.notifier.stop_alarm() {
            self.events.push(Event::PlaybackStopped {
                sound_id: stopped.sound_id,
                task_id: stopped.task_id,
                at: now_utc,
            });
        }
        self.persist_ledger();
        tracing::info!("reminder service stopped");
    }

    // ── Task mutations ───────────────────────────────────────────────

    pub fn add_task(&mut self, new: NewTask) -> Result<Task> {
        self.refresh();
        let now = self.clock.now();
        let task = Task::create(new, &self.settings, now.with_timezone(&Utc))?;
        tracing::info!(task_id = %task.id, title = %task.title, time = %task.time, recurrence = %task.recurrence, "task added");
        self.tasks.push(task.clone());
        self.persist_tasks();
        self.events.push(Event::TaskAdded {
            task_id: task.id.clone(),
            at: now.with_timezone(&Utc),
        });
        self.rearm(&task.id, &now);
        Ok(task)
    }

    pub fn edit_task(&mut self, id: &str, patch: TaskPatch) -> Result<Task> {
        self.refresh();
        let now = self.clock.now();
        let now_utc = now.with_timezone(&Utc);
        let index = self.index_of(id)?;
        // Validate on a copy so a rejected patch leaves the task untouched.
        let mut edited = self.tasks[index].clone();
        patch.apply(&mut edited, now_utc)?;
        self.tasks[index] = edited.clone();
        // A new time is a new occurrence.
        self.ledger.forget_task(id);
        self.persist_tasks();
        self.events.push(Event::TaskUpdated {
            task_id: id.to_string(),
            at: now_utc,
        });
        self.rearm(id, &now);
        Ok(edited)
    }

    /// Checkbox semantics: complete an open task, reopen a completed one.
    pub fn toggle_complete(&mut self, id: &str) -> Result<Task> {
        self.refresh();
        let now = self.clock.now();
        let now_utc = now.with_timezone(&Utc);
        let index = self.index_of(id)?;
        self.tasks[index].toggle_completed(now_utc);
        let completed = self.tasks[index].completed;
        self.after_completion_change(id, completed, &now);
        Ok(self.tasks[index].clone())
    }

    /// Mark done. No-op when already completed.
    pub fn complete(&mut self, id: &str) -> Result<Task> {
        self.refresh();
        let now = self.clock.now();
        let index = self.index_of(id)?;
        if !self.tasks[index].completed {
            self.tasks[index].mark_completed(now.with_timezone(&Utc));
            self.after_completion_change(id, true, &now);
        }
        Ok(self.tasks[index].clone())
    }

    pub fn toggle_enabled(&mut self, id: &str) -> Result<Task> {
        self.refresh();
        let now = self.clock.now();
        let now_utc = now.with_timezone(&Utc);
        let index = self.index_of(id)?;
        self.tasks[index].toggle_enabled(now_utc);
        let enabled = self.tasks[index].enabled;
        if !enabled {
            self.stop_playback_for(id, now_utc);
        }
        self.persist_tasks();
        self.events.push(Event::TaskEnabled {
            task_id: id.to_string(),
            enabled,
            at: now_utc,
        });
        self.rearm(id, &now);
        Ok(self.tasks[index].clone())
    }

    pub fn delete_task(&mut self, id: &str) -> Result<Task> {
        self.refresh();
        let now_utc = self.clock.now_utc();
        let index = self.index_of(id)?;
        let removed = self.tasks.remove(index);
        self.scheduler.cancel(id);
        self.stop_playback_for(id, now_utc);
        self.ledger.forget_task(id);
        self.persist_tasks();
        self.persist_ledger();
        tracing::info!(task_id = id, "task deleted");
        self.events.push(Event::TaskDeleted {
            task_id: id.to_string(),
            at: now_utc,
        });
        Ok(removed)
    }

    /// Re-arm `id` one-shot at now + `minutes` (default: the snooze setting).
    /// The task's configured time does not change.
    pub fn snooze(&mut self, id: &str, minutes: Option<u32>) -> Result<DateTime<Utc>> {
        self.refresh();
        let now_utc = self.clock.now_utc();
        self.index_of(id)?;
        let minutes = minutes.unwrap_or(self.settings.snooze_minutes);
        if minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "minutes".to_string(),
                message: "snooze must be at least 1 minute".to_string(),
            }
            .into());
        }
        let until = now_utc + Duration::minutes(i64::from(minutes));
        self.stop_playback_for(id, now_utc);
        self.scheduler.snooze(id, until);
        tracing::info!(task_id = id, %until, "snoozed");
        self.events.push(Event::TaskSnoozed {
            task_id: id.to_string(),
            until,
            at: now_utc,
        });
        self.events.push(Event::TaskArmed {
            task_id: id.to_string(),
            fire_at: until,
            kind: TimerKind::Snooze,
        });
        Ok(until)
    }

    // ── Settings ─────────────────────────────────────────────────────

    /// Replace the settings. Re-arms everything when a scheduling-relevant
    /// field changed. Returns whether it re-armed.
    pub fn update_settings(&mut self, settings: Settings) -> Result<bool> {
        let settings = settings.normalized();
        settings.validate()?;
        self.refresh();
        let now = self.clock.now();
        let rearm = settings.requires_rearm(&self.settings);
        self.settings = settings;
        match self.repo.save_settings(&self.settings) {
            Ok(()) => self.revision = self.repo.revision(),
            Err(e) => tracing::warn!(error = %e, "settings not persisted; keeping in memory"),
        }
        if rearm {
            self.arm_all(&now);
        }
        self.events.push(Event::SettingsChanged {
            rearmed: rearm,
            at: now.with_timezone(&Utc),
        });
        Ok(rearm)
    }

    /// Set one settings field by its camelCase name.
    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<bool> {
        self.refresh();
        let mut next = self.settings.clone();
        next.set_field(key, value)?;
        self.update_settings(next)
    }

    // ── Notification actions ─────────────────────────────────────────

    pub fn handle_action(&mut self, task_id: &str, action: NotificationAction) -> Result<()> {
        tracing::debug!(task_id, %action, "notification action");
        match action {
            NotificationAction::Complete => self.complete(task_id).map(|_| ()),
            NotificationAction::Snooze => self.snooze(task_id, None).map(|_| ()),
        }
    }

    pub fn handle_message(&mut self, message: ForegroundMessage) -> Result<()> {
        match message {
            ForegroundMessage::TaskComplete { task_id } => self.complete(&task_id).map(|_| ()),
            ForegroundMessage::TaskSnooze { task_id, minutes } => self.snooze(&task_id, minutes).map(|_| ()),
        }
    }

    // ── Permission & sounds ──────────────────────────────────────────

    pub fn permission(&self) -> PermissionState {
        self.notifier.permission()
    }

    pub fn request_permission(&mut self) -> PermissionOutcome {
        let outcome = self.notifier.request_permission();
        self.events.push(Event::PermissionChanged {
            outcome,
            at: self.clock.now_utc(),
        });
        outcome
    }

    pub fn test_notification(&mut self) -> bool {
        self.notifier.test_notification()
    }

    /// Preview a sound at the configured volume.
    pub fn test_alarm(&mut self, sound_id: &str) -> SoundOutcome {
        let now_utc = self.clock.now_utc();
        self.notifier.test_alarm(sound_id, self.settings.volume(), now_utc)
    }

    pub fn stop_alarm(&mut self) -> bool {
        let now_utc = self.clock.now_utc();
        match self.notifier.stop_alarm() {
            Some(stopped) => {
                self.events.push(Event::PlaybackStopped {
                    sound_id: stopped.sound_id,
                    task_id: stopped.task_id,
                    at: now_utc,
                });
                true
            }
            None => false,
        }
    }

    pub fn sounds(&self) -> Vec<SoundInfo> {
        self.notifier.sounds().list()
    }

    pub fn add_custom_sound(&mut self, file_name: &str, bytes: &[u8]) -> Result<SoundInfo> {
        self.refresh();
        let now_utc = self.clock.now_utc();
        let info = self.notifier.sounds_mut().add_custom(file_name, bytes, now_utc)?;
        self.persist_custom_sounds();
        Ok(info)
    }

    /// Tasks that used the sound fall back to the tone when it fires.
    pub fn remove_custom_sound(&mut self, id: &str) -> bool {
        self.refresh();
        let removed = self.notifier.sounds_mut().remove_custom(id);
        if removed {
            self.persist_custom_sounds();
        }
        removed
    }

    // ── Internals ────────────────────────────────────────────────────

    fn read_store(&mut self) -> DateTime<C::Zone> {
        self.revision = self.repo.revision();
        self.tasks = self.repo.load_tasks();
        self.settings = self.repo.load_settings();
        self.ledger = self.repo.load_ledger();
        self.last_reset_date = self.repo.last_reset_date();
        let custom = self.repo.load_custom_sounds();
        *self.notifier.sounds_mut() = SoundLibrary::new(self.options.sound_dir.clone()).with_custom(custom);
        tracing::info!(tasks = self.tasks.len(), platform = %self.platform_kind, "reminder service loaded");
        self.clock.now()
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CoreError::TaskNotFound(id.to_string()))
    }

    fn after_completion_change(&mut self, id: &str, completed: bool, now: &DateTime<C::Zone>) {
        let now_utc = now.with_timezone(&Utc);
        if completed {
            self.stop_playback_for(id, now_utc);
            tracing::info!(task_id = id, "task completed");
            self.events.push(Event::TaskCompleted {
                task_id: id.to_string(),
                at: now_utc,
            });
        } else {
            self.events.push(Event::TaskReopened {
                task_id: id.to_string(),
                at: now_utc,
            });
        }
        self.persist_tasks();
        self.rearm(id, now);
    }

    fn stop_playback_for(&mut self, id: &str, now_utc: DateTime<Utc>) {
        if let Some(stopped) = self.notifier.stop_alarm_for(id) {
            self.events.push(Event::PlaybackStopped {
                sound_id: stopped.sound_id,
                task_id: stopped.task_id,
                at: now_utc,
            });
        }
    }

    /// Re-arm one task after it changed.
    fn rearm(&mut self, id: &str, now: &DateTime<C::Zone>) {
        let Some(task) = self.tasks.iter().find(|t| t.id == id) else {
            return;
        };
        let was_armed = self.scheduler.is_armed(id);
        match self.scheduler.arm_next(task, &self.settings, now) {
            Some(fire_at) => self.events.push(Event::TaskArmed {
                task_id: id.to_string(),
                fire_at,
                kind: TimerKind::Occurrence,
            }),
            None if was_armed => self.events.push(Event::TaskDisarmed {
                task_id: id.to_string(),
                at: now.with_timezone(&Utc),
            }),
            None => {}
        }
    }

    fn arm_all(&mut self, now: &DateTime<C::Zone>) {
        let armed = self.scheduler.schedule_all(&self.tasks, &self.settings, now);
        tracing::debug!(armed, "armed all tasks");
        for timer in self.scheduler.timers() {
            self.events.push(Event::TaskArmed {
                task_id: timer.task_id.clone(),
                fire_at: timer.fire_at,
                kind: timer.kind,
            });
        }
    }

    /// Daily reset when the calendar day changed since the last one.
    /// Returns whether any completion was cleared.
    fn check_reset(&mut self, now: &DateTime<C::Zone>) -> bool {
        if !should_reset_completed_tasks(self.last_reset_date.as_deref(), now) {
            return false;
        }
        let outcome = reset_daily_tasks(std::mem::take(&mut self.tasks), now, self.options.weekly_reset);
        self.tasks = outcome.tasks;
        // Yesterday's keys stay: a late-evening occurrence is still inside
        // the poll sweep's grace window just after midnight.
        if let Some(yesterday) = now.date_naive().pred_opt() {
            self.ledger.prune_before(yesterday);
        }
        self.last_reset_date = Some(outcome.reset_date.clone());

        if let Err(e) = self.repo.set_last_reset_date(&outcome.reset_date) {
            tracing::warn!(error = %e, "reset marker not persisted");
        }
        self.persist_tasks();
        self.persist_ledger();
        tracing::info!(day = %outcome.reset_date, cleared = outcome.cleared.len(), "daily reset");

        let had_cleared = !outcome.cleared.is_empty();
        self.events.push(Event::DailyReset {
            day: outcome.reset_date,
            cleared: outcome.cleared,
            at: now.with_timezone(&Utc),
        });
        had_cleared
    }

    /// Fire every task whose last occurrence lies inside the grace window
    /// and has not fired yet.
    fn sweep(&mut self, now: &DateTime<C::Zone>, source: FireSource) {
        let due: Vec<(String, OccurrenceKey)> =
            sweep_due(&self.tasks, &self.settings, now, self.options.grace_window, &self.ledger)
                .into_iter()
                .map(|(task, key)| (task.id.clone(), key))
                .collect();
        if due.is_empty() {
            return;
        }
        let now_utc = now.with_timezone(&Utc);
        for (id, key) in due {
            if self.ledger.record(key) {
                self.deliver(&id, source, now_utc);
            }
        }
        self.persist_ledger();
    }

    fn fire_timer(&mut self, now: &DateTime<C::Zone>, id: String, fire_at: DateTime<Utc>, kind: TimerKind) {
        let now_utc = now.with_timezone(&Utc);
        let Some(task) = self.tasks.iter().find(|t| t.id == id) else {
            return;
        };
        let recurrence = task.recurrence;
        let eligible = is_eligible(task, &self.settings);

        let late = now_utc.signed_duration_since(fire_at);
        if late > self.options.grace_window {
            tracing::info!(task_id = %id, late_secs = late.num_seconds(), "timer fired past grace window; skipped");
        } else if eligible {
            let fresh = match kind {
                // Snoozes are explicit requests and bypass the ledger.
                TimerKind::Snooze => true,
                TimerKind::Occurrence => {
                    let day = fire_at.with_timezone(&now.timezone()).date_naive();
                    self.ledger.record(OccurrenceKey::new(id.clone(), day))
                }
            };
            if fresh {
                self.deliver(&id, kind.into(), now_utc);
                if kind == TimerKind::Occurrence {
                    self.persist_ledger();
                }
            }
        }

        // One-time and tomorrow tasks go idle after their fire.
        if matches!(recurrence, Recurrence::OneTime | Recurrence::Tomorrow) {
            self.events.push(Event::TaskDisarmed {
                task_id: id,
                at: now_utc,
            });
        } else {
            self.rearm(&id, now);
        }
    }

    fn deliver(&mut self, id: &str, source: FireSource, now_utc: DateTime<Utc>) {
        let Some(task) = self.tasks.iter().find(|t| t.id == id) else {
            return;
        };
        let effect = self.notifier.notify(task, &self.settings, now_utc);
        self.delivered += 1;
        self.events.push(Event::ReminderFired {
            task_id: effect.task_id,
            source,
            visual: effect.visual,
            vibrated: effect.vibrated,
            sound: effect.sound,
            at: now_utc,
        });
    }

    fn persist_tasks(&mut self) {
        match self.repo.save_tasks(&self.tasks) {
            Ok(()) => self.revision = self.repo.revision(),
            Err(e) => tracing::warn!(error = %e, "tasks not persisted; keeping in memory"),
        }
    }

    fn persist_ledger(&mut self) {
        if let Err(e) = self.repo.save_ledger(&self.ledger) {
            tracing::warn!(error = %e, "fired-occurrence ledger not persisted");
        }
    }

    fn persist_custom_sounds(&mut self) {
        let sounds = self.notifier.sounds().custom_sounds();
        match self.repo.save_custom_sounds(&sounds) {
            Ok(()) => self.revision = self.repo.revision(),
            Err(e) => tracing::warn!(error = %e, "custom sounds not persisted"),
        }
    }
}
