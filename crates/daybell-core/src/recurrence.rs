//! Recurrence evaluation: task visibility and the daily completion reset.
//!
//! Everything here is a pure function of the task list and "now". A calendar
//! day is always the date of an instant in `now`'s time zone, so passing a
//! `DateTime<Local>` gives the user's wall-clock days and tests can pin any
//! zone they like.

use std::borrow::Borrow;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{Recurrence, Task};

/// Calendar-day string format used for the `last-reset-date` marker.
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// What the daily reset does with completed weekly tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeeklyResetPolicy {
    /// Never clear weekly completion automatically.
    #[default]
    Retain,
    /// Clear once one of the task's weekdays has come round again after the
    /// day it was completed.
    NextOccurrence,
}

/// Result of a daily reset pass.
#[derive(Debug, Clone)]
pub struct ResetOutcome {
    pub tasks: Vec<Task>,
    /// New value for the `last-reset-date` marker.
    pub reset_date: String,
    /// Ids whose completion was cleared.
    pub cleared: Vec<String>,
}

/// The `YYYY-MM-DD` key of `now`'s calendar day.
pub fn day_key<Tz: TimeZone>(now: &DateTime<Tz>) -> String {
    now.date_naive().format(DAY_KEY_FORMAT).to_string()
}

/// Calendar day of a stored UTC timestamp, seen from `zone`.
pub fn local_day<Tz: TimeZone>(at: &DateTime<Utc>, zone: &Tz) -> NaiveDate {
    at.with_timezone(zone).date_naive()
}

/// The only day a `tomorrow` task is live: the day after it was created.
pub fn tomorrow_target_day<Tz: TimeZone>(task: &Task, zone: &Tz) -> Option<NaiveDate> {
    local_day(&task.created_at, zone).succ_opt()
}

/// Whether the task belongs in today's list.
pub fn should_show_task<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> bool {
    let zone = now.timezone();
    let today = now.date_naive();

    match task.recurrence {
        Recurrence::OneTime => {
            if !task.completed {
                return true;
            }
            // completed without a timestamp counts as "not today"
            task.completed_at
                .map(|at| local_day(&at, &zone) == today)
                .unwrap_or(false)
        }
        Recurrence::Tomorrow => tomorrow_target_day(task, &zone) == Some(today),
        Recurrence::Daily => true,
        Recurrence::Weekly => match &task.week_days {
            Some(days) => days.contains(now.weekday()),
            None => true,
        },
        Recurrence::Unknown => true,
    }
}

/// True when the reset marker is missing or names a different day.
pub fn should_reset_completed_tasks<Tz: TimeZone>(last_reset_date: Option<&str>, now: &DateTime<Tz>) -> bool {
    match last_reset_date {
        Some(last) => last.trim() != day_key(now),
        None => true,
    }
}

/// Clear completion flags for a new day.
///
/// The caller gates this with [`should_reset_completed_tasks`] and persists
/// `reset_date`; once the marker equals today the gate stays closed, which
/// makes a second pass on the same day a no-op.
pub fn reset_daily_tasks<Tz: TimeZone>(
    tasks: Vec<Task>,
    now: &DateTime<Tz>,
    weekly_policy: WeeklyResetPolicy,
) -> ResetOutcome {
    let zone = now.timezone();
    let today = now.date_naive();
    let mut cleared = Vec::new();

    let tasks = tasks
        .into_iter()
        .map(|mut task| {
            if !task.completed {
                return task;
            }
            let clear = match task.recurrence {
                Recurrence::Daily => true,
                // archived: stays completed, hidden by should_show_task
                Recurrence::OneTime => false,
                Recurrence::Tomorrow => tomorrow_target_day(&task, &zone) == Some(today),
                Recurrence::Weekly => match weekly_policy {
                    WeeklyResetPolicy::Retain => false,
                    WeeklyResetPolicy::NextOccurrence => weekly_occurrence_since_completion(&task, today, &zone),
                },
                Recurrence::Unknown => false,
            };
            if clear {
                task.clear_completion();
                cleared.push(task.id.clone());
            }
            task
        })
        .collect();

    ResetOutcome {
        tasks,
        reset_date: today.format(DAY_KEY_FORMAT).to_string(),
        cleared,
    }
}

fn weekly_occurrence_since_completion<Tz: TimeZone>(task: &Task, today: NaiveDate, zone: &Tz) -> bool {
    let Some(completed_at) = task.completed_at else {
        return true;
    };
    let done_day = local_day(&completed_at, zone);
    let span = (today - done_day).num_days().clamp(0, 7);
    (1..=span).any(|offset| {
        let day = done_day + Duration::days(offset);
        match &task.week_days {
            Some(days) => days.contains(day.weekday()),
            None => true,
        }
    })
}

/// Stable sort by time of day; equal times keep their relative order.
pub fn sort_tasks_by_time<T: Borrow<Task>>(tasks: &mut [T]) {
    tasks.sort_by_key(|t| t.borrow().time.minutes_of_day());
}

/// Today's list: visible tasks in time order.
pub fn visible_tasks<'a, Tz: TimeZone>(tasks: &'a [Task], now: &DateTime<Tz>) -> Vec<&'a Task> {
    let mut visible: Vec<&Task> = tasks.iter().filter(|t| should_show_task(t, now)).collect();
    sort_tasks_by_time(&mut visible);
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskTime, WeekDays};
    use chrono::{TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn task(recurrence: Recurrence, time: &str) -> Task {
        Task {
            id: format!("{recurrence}-{time}"),
            title: "t".to_string(),
            time: time.parse().unwrap(),
            recurrence,
            week_days: None,
            enabled: true,
            completed: false,
            completed_at: None,
            notes: None,
            notification_sound: true,
            vibration: false,
            alarm_sound: "default".to_string(),
            alarm_enabled: false,
            created_at: at(2024, 1, 1, 8, 0),
            updated_at: at(2024, 1, 1, 8, 0),
        }
    }

    #[test]
    fn weekly_visibility_follows_weekdays() {
        let mut t = task(Recurrence::Weekly, "09:00");
        t.week_days = Some(WeekDays::new([1, 3, 5]).unwrap());
        // 2024-01-01 is a Monday
        let expected = [true, false, true, false, true, false, false];
        for (offset, want) in expected.iter().enumerate() {
            let now = at(2024, 1, 1 + offset as u32, 12, 0);
            assert_eq!(should_show_task(&t, &now), *want, "day offset {offset}");
        }
    }

    #[test]
    fn weekly_with_empty_set_is_hidden() {
        let mut t = task(Recurrence::Weekly, "09:00");
        t.week_days = Some(WeekDays::default());
        assert!(!should_show_task(&t, &at(2024, 1, 1, 12, 0)));
    }

    #[test]
    fn one_time_completed_is_visible_only_that_day() {
        let mut t = task(Recurrence::OneTime, "09:00");
        t.mark_completed(at(2024, 1, 1, 10, 0));
        assert!(should_show_task(&t, &at(2024, 1, 1, 23, 59)));
        assert!(!should_show_task(&t, &at(2024, 1, 2, 0, 1)));
    }

    #[test]
    fn one_time_completed_without_timestamp_is_hidden() {
        let mut t = task(Recurrence::OneTime, "09:00");
        t.completed = true;
        assert!(!should_show_task(&t, &at(2024, 1, 1, 12, 0)));
    }

    #[test]
    fn tomorrow_task_lives_exactly_one_day() {
        let t = task(Recurrence::Tomorrow, "09:00");
        assert!(!should_show_task(&t, &at(2024, 1, 1, 12, 0)));
        assert!(should_show_task(&t, &at(2024, 1, 2, 12, 0)));
        assert!(!should_show_task(&t, &at(2024, 1, 3, 12, 0)));
    }

    #[test]
    fn days_follow_the_zone_of_now() {
        // Completed 23:30 UTC on Jan 1 is already Jan 2 in UTC+2.
        let mut t = task(Recurrence::OneTime, "09:00");
        t.mark_completed(at(2024, 1, 1, 23, 30));
        let plus_two = chrono::FixedOffset::east_opt(2 * 3600).unwrap();
        let now = plus_two.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        assert!(should_show_task(&t, &now));
    }

    #[test]
    fn reset_gate_compares_day_strings() {
        let now = at(2024, 1, 2, 0, 0);
        assert!(should_reset_completed_tasks(None, &now));
        assert!(should_reset_completed_tasks(Some("2024-01-01"), &now));
        assert!(!should_reset_completed_tasks(Some("2024-01-02"), &now));
    }

    #[test]
    fn reset_clears_daily_and_keeps_one_time() {
        let mut daily = task(Recurrence::Daily, "09:00");
        daily.mark_completed(at(2024, 1, 1, 9, 5));
        let mut once = task(Recurrence::OneTime, "10:00");
        once.mark_completed(at(2024, 1, 1, 10, 5));

        let out = reset_daily_tasks(vec![daily, once], &at(2024, 1, 2, 0, 1), WeeklyResetPolicy::Retain);
        assert_eq!(out.reset_date, "2024-01-02");
        assert!(!out.tasks[0].completed);
        assert!(out.tasks[0].completed_at.is_none());
        assert!(out.tasks[1].completed);
        assert_eq!(out.cleared, vec!["daily-09:00".to_string()]);
    }

    #[test]
    fn reset_clears_tomorrow_task_on_its_day_only() {
        let mut t = task(Recurrence::Tomorrow, "09:00");
        t.mark_completed(at(2024, 1, 1, 20, 0));
        let on_day = reset_daily_tasks(vec![t.clone()], &at(2024, 1, 2, 0, 0), WeeklyResetPolicy::Retain);
        assert!(!on_day.tasks[0].completed);
        let later = reset_daily_tasks(vec![t], &at(2024, 1, 3, 0, 0), WeeklyResetPolicy::Retain);
        assert!(later.tasks[0].completed);
    }

    #[test]
    fn weekly_reset_policy_retain_vs_next_occurrence() {
        let mut t = task(Recurrence::Weekly, "09:00");
        t.week_days = Some(WeekDays::new([1, 3]).unwrap());
        t.mark_completed(at(2024, 1, 1, 9, 30)); // Monday

        // Tuesday: no new occurrence yet
        let tue = at(2024, 1, 2, 0, 0);
        let out = reset_daily_tasks(vec![t.clone()], &tue, WeeklyResetPolicy::NextOccurrence);
        assert!(out.tasks[0].completed);

        // Wednesday: occurrence arrived
        let wed = at(2024, 1, 3, 0, 0);
        let out = reset_daily_tasks(vec![t.clone()], &wed, WeeklyResetPolicy::NextOccurrence);
        assert!(!out.tasks[0].completed);

        let out = reset_daily_tasks(vec![t], &wed, WeeklyResetPolicy::Retain);
        assert!(out.tasks[0].completed);
    }

    #[test]
    fn reset_twice_same_day_is_gated() {
        let mut t = task(Recurrence::Daily, "09:00");
        t.mark_completed(at(2024, 1, 1, 9, 1));
        let first = reset_daily_tasks(vec![t], &at(2024, 1, 2, 0, 1), WeeklyResetPolicy::Retain);
        assert!(!first.tasks[0].completed);

        // Completed again later that day: the gate stays closed, so it survives.
        let mut tasks = first.tasks;
        tasks[0].mark_completed(at(2024, 1, 2, 9, 2));
        let later = at(2024, 1, 2, 10, 0);
        assert!(!should_reset_completed_tasks(Some(&first.reset_date), &later));
        assert!(tasks[0].completed);
    }

    #[test]
    fn sort_is_stable_for_equal_times() {
        let mut a = task(Recurrence::Daily, "23:00");
        a.id = "a".into();
        let mut b = task(Recurrence::Daily, "01:00");
        b.id = "b".into();
        let mut c = task(Recurrence::Daily, "01:00");
        c.id = "c".into();
        let mut tasks = vec![a, b, c];
        sort_tasks_by_time(&mut tasks);
        let ids: Vec<_> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
        let times: Vec<TaskTime> = tasks.iter().map(|t| t.time).collect();
        assert_eq!(times[0].to_string(), "01:00");
        assert_eq!(times[2].to_string(), "23:00");
    }

    #[test]
    fn visible_tasks_filters_and_sorts() {
        let late = task(Recurrence::Daily, "20:00");
        let early = task(Recurrence::Daily, "06:00");
        let tomorrow = task(Recurrence::Tomorrow, "07:00");
        let tasks = vec![late, tomorrow, early];
        let today = visible_tasks(&tasks, &at(2024, 1, 1, 12, 0));
        let times: Vec<String> = today.iter().map(|t| t.time.to_string()).collect();
        assert_eq!(times, ["06:00", "20:00"]);
    }
}
