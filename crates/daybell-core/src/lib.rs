//! # Daybell Core Library
//!
//! This library provides the core logic for Daybell, a personal daily-task
//! reminder. Users keep a list of recurring or one-time tasks with a time of
//! day and are alerted (visual alert, sound, vibration) when each is due.
//! Every operation is available through the standalone `daybell` CLI, which
//! is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Recurrence**: pure functions deciding which tasks show today and
//!   when completion flags reset
//! - **Scheduler**: next-fire computation and a tick-driven registry holding
//!   one armed timer per task, guarded by per-day idempotency keys
//! - **Notifier**: alert, sound and haptic delivery through capability
//!   traits, with a sound fallback ladder
//! - **Storage**: blob store (SQLite or in-memory) and TOML configuration
//! - **Service**: the orchestrator tying the above together
//!
//! ## Key Components
//!
//! - [`ReminderService`]: lifecycle entry point
//! - [`Scheduler`]: armed-timer registry
//! - [`Notifier`]: effect delivery
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod notify;
pub mod platform;
pub mod recurrence;
pub mod scheduler;
pub mod service;
pub mod settings;
pub mod storage;
pub mod task;

pub use error::{CapabilityError, ConfigError, CoreError, Result, StoreError, ValidationError};
pub use events::{Event, FireSource};
pub use notify::{ForegroundMessage, NotificationAction, NotificationPayload, Notifier, PermissionOutcome, PermissionState};
pub use platform::{Platform, PlatformChoice, PlatformKind};
pub use recurrence::WeeklyResetPolicy;
pub use scheduler::{compute_next_fire, Scheduler};
pub use service::{Clock, ManualClock, ReminderService, ServiceOptions, SystemClock, TaskStats};
pub use settings::Settings;
pub use storage::{BlobStore, Config, MemoryStore, SqliteStore};
pub use task::{NewTask, Recurrence, Task, TaskPatch, TaskTime, WeekDays};
