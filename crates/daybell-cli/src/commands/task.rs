//! Task management commands for CLI.

use clap::Subcommand;
use daybell_core::{NewTask, Recurrence, Task, TaskPatch, TaskTime, WeekDays};

use super::{open_service, CliResult, Context};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task title
        title: String,
        /// Time of day (HH:MM)
        #[arg(long)]
        time: TaskTime,
        /// Recurrence: daily, weekly, one-time or tomorrow
        #[arg(long, default_value = "daily")]
        repeat: Recurrence,
        /// Weekdays for weekly tasks, 0=Sunday (e.g. "1,3,5")
        #[arg(long)]
        days: Option<WeekDays>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
        /// Enable the alarm with this sound id
        #[arg(long)]
        alarm: Option<String>,
        /// Chime when the reminder fires (default: from settings)
        #[arg(long)]
        sound: Option<bool>,
        /// Vibrate when the reminder fires (default: from settings)
        #[arg(long)]
        vibrate: Option<bool>,
    },
    /// List today's tasks
    List {
        /// Include tasks not shown today
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Get task details
    Get {
        /// Task ID
        id: String,
    },
    /// Update a task
    Edit {
        /// Task ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        /// Time of day (HH:MM)
        #[arg(long)]
        time: Option<TaskTime>,
        #[arg(long)]
        repeat: Option<Recurrence>,
        #[arg(long)]
        days: Option<WeekDays>,
        /// New notes; an empty string clears them
        #[arg(long)]
        notes: Option<String>,
        /// Alarm sound id
        #[arg(long)]
        alarm_sound: Option<String>,
        #[arg(long)]
        alarm: Option<bool>,
        #[arg(long)]
        sound: Option<bool>,
        #[arg(long)]
        vibrate: Option<bool>,
    },
    /// Toggle completion
    Done {
        /// Task ID
        id: String,
    },
    /// Toggle whether the task is enabled
    Enable {
        /// Task ID
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
}

pub fn run(ctx: &Context, action: TaskAction) -> CliResult {
    let mut service = open_service(ctx);

    match action {
        TaskAction::Add {
            title,
            time,
            repeat,
            days,
            notes,
            alarm,
            sound,
            vibrate,
        } => {
            let mut new = NewTask::new(title, time, repeat);
            new.week_days = days;
            new.notes = notes;
            new.notification_sound = sound;
            new.vibration = vibrate;
            if let Some(sound_id) = alarm {
                new = new.with_alarm(sound_id);
            }
            let task = service.add_task(new)?;
            println!("Task created: {}", task.id);
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::List { all, json } => {
            let tasks: Vec<&Task> = if all {
                service.tasks().iter().collect()
            } else {
                service.visible_tasks()
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks.");
            } else {
                for task in tasks {
                    println!("{}", format_task(task));
                }
            }
        }
        TaskAction::Get { id } => {
            let task = service.task(&id).ok_or_else(|| format!("Task not found: {id}"))?;
            println!("{}", serde_json::to_string_pretty(task)?);
        }
        TaskAction::Edit {
            id,
            title,
            time,
            repeat,
            days,
            notes,
            alarm_sound,
            alarm,
            sound,
            vibrate,
        } => {
            let patch = TaskPatch {
                title,
                time,
                recurrence: repeat,
                week_days: days,
                notes,
                notification_sound: sound,
                vibration: vibrate,
                alarm_sound,
                alarm_enabled: alarm,
            };
            if patch.is_empty() {
                return Err("nothing to change".into());
            }
            let task = service.edit_task(&id, patch)?;
            println!("Task updated: {}", task.id);
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::Done { id } => {
            let task = service.toggle_complete(&id)?;
            if task.completed {
                println!("Task completed: {}", task.title);
            } else {
                println!("Task reopened: {}", task.title);
            }
        }
        TaskAction::Enable { id } => {
            let task = service.toggle_enabled(&id)?;
            let state = if task.enabled { "enabled" } else { "disabled" };
            println!("Task {state}: {}", task.title);
        }
        TaskAction::Delete { id } => {
            let task = service.delete_task(&id)?;
            println!("Task deleted: {}", task.id);
        }
    }
    Ok(())
}

fn format_task(task: &Task) -> String {
    let check = if task.completed { "x" } else { " " };
    let mut line = format!("[{check}] {}  {}  ({})", task.time, task.title, task.recurrence);
    if let Some(days) = &task.week_days {
        let days: Vec<String> = days.iter().map(|d| d.to_string()).collect();
        line.push_str(&format!(" days={}", days.join(",")));
    }
    if task.alarm_enabled {
        line.push_str(&format!(" alarm={}", task.alarm_sound));
    }
    if !task.enabled {
        line.push_str(" [disabled]");
    }
    line.push_str(&format!("  {}", task.id));
    line
}
