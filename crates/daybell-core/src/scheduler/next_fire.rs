//! Occurrence arithmetic: when a task fires next, and when it was last due.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone};

use crate::recurrence::tomorrow_target_day;
use crate::task::{Recurrence, Task};

/// Days to scan forward or back. Covers "passed today" plus a full week.
const SCAN_DAYS: u32 = 8;

/// Longest DST gap we step over when a wall-clock time does not exist.
const MAX_GAP_MINUTES: i64 = 180;

/// `date` at `time` in `zone`. Ambiguous times take the earlier instant;
/// times skipped by a DST jump resolve to the first valid minute after the gap.
pub fn resolve_local<Tz: TimeZone>(zone: &Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Tz>> {
    let naive = date.and_time(time);
    zone.from_local_datetime(&naive).earliest().or_else(|| {
        (1..=MAX_GAP_MINUTES).find_map(|m| zone.from_local_datetime(&(naive + Duration::minutes(m))).earliest())
    })
}

/// Whether `day` is an occurrence day for the task, ignoring time of day.
fn occurs_on<Tz: TimeZone>(task: &Task, day: NaiveDate, zone: &Tz) -> bool {
    match task.recurrence {
        Recurrence::Weekly => match &task.week_days {
            Some(days) => days.contains(day.weekday()),
            None => true,
        },
        Recurrence::Tomorrow => tomorrow_target_day(task, zone) == Some(day),
        Recurrence::OneTime => !task.completed,
        Recurrence::Daily | Recurrence::Unknown => true,
    }
}

/// Next instant strictly after `from` at which the task is due.
///
/// Starts from `from`'s day at the task's time, moves to the next day once
/// that has passed, and keeps stepping day by day until the recurrence
/// allows the day. Returns `None` when there is no future occurrence: a
/// completed one-time task, a `tomorrow` task whose day is over, or a weekly
/// task with no weekdays.
pub fn compute_next_fire<Tz: TimeZone>(task: &Task, from: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    if task.recurrence == Recurrence::OneTime && task.completed {
        return None;
    }
    let zone = from.timezone();
    let time = task.time.to_naive();
    let mut day = from.date_naive();

    let target = match task.recurrence {
        Recurrence::Tomorrow => Some(tomorrow_target_day(task, &zone)?),
        _ => None,
    };
    if let Some(target) = target {
        if day > target {
            return None;
        }
        day = target;
    }

    for _ in 0..SCAN_DAYS {
        let candidate = resolve_local(&zone, day, time)?;
        if candidate > *from && occurs_on(task, day, &zone) {
            return Some(candidate);
        }
        if target.is_some() {
            return None;
        }
        day = day.succ_opt()?;
    }
    None
}

/// Most recent occurrence instant at or before `now`.
pub fn compute_last_due<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    if task.recurrence == Recurrence::OneTime && task.completed {
        return None;
    }
    let zone = now.timezone();
    let time = task.time.to_naive();
    let mut day = now.date_naive();

    for _ in 0..SCAN_DAYS {
        let candidate = resolve_local(&zone, day, time)?;
        if candidate <= *now && occurs_on(task, day, &zone) {
            return Some(candidate);
        }
        day = day.pred_opt()?;
    }
    None
}
