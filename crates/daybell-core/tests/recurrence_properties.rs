//! Property tests for the visibility and ordering rules.

use chrono::{Datelike, Duration, TimeZone, Utc};
use daybell_core::recurrence::{reset_daily_tasks, should_show_task, sort_tasks_by_time};
use daybell_core::{NewTask, Recurrence, Settings, Task, TaskTime, WeekDays, WeeklyResetPolicy};
use proptest::prelude::*;

fn task(title: String, hour: u8, minute: u8, recurrence: Recurrence, days: Option<Vec<u8>>) -> Task {
    let mut new = NewTask::new(title, TaskTime::new(hour, minute).unwrap(), recurrence);
    if let Some(days) = days {
        new = new.with_week_days(WeekDays::new(days).unwrap());
    }
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 7, 0, 0).unwrap();
    Task::create(new, &Settings::default(), created).unwrap()
}

proptest! {
    #[test]
    fn sort_is_ordered_and_stable(times in prop::collection::vec((0u8..24, 0u8..60), 0..30)) {
        let mut tasks: Vec<Task> = times
            .iter()
            .enumerate()
            .map(|(i, (h, m))| task(format!("t{i}"), *h, *m, Recurrence::Daily, None))
            .collect();
        sort_tasks_by_time(&mut tasks);

        for pair in tasks.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(a.time.minutes_of_day() <= b.time.minutes_of_day());
            if a.time == b.time {
                // insertion order kept for equal times
                let ia: usize = a.title[1..].parse().unwrap();
                let ib: usize = b.title[1..].parse().unwrap();
                prop_assert!(ia < ib);
            }
        }
    }

    #[test]
    fn weekly_task_shows_only_on_its_days(
        days in prop::collection::btree_set(0u8..7, 1..7),
        offset in 0i64..14,
    ) {
        let t = task("gym".to_string(), 18, 0, Recurrence::Weekly, Some(days.iter().copied().collect()));
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + Duration::days(offset);
        let weekday = now.weekday().num_days_from_sunday() as u8;
        prop_assert_eq!(should_show_task(&t, &now), days.contains(&weekday));
    }

    #[test]
    fn daily_reset_clears_every_daily_completion(count in 1usize..10, hour in 0u32..24) {
        let done_at = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();
        let tasks: Vec<Task> = (0..count)
            .map(|i| {
                let mut t = task(format!("t{i}"), 9, 0, Recurrence::Daily, None);
                t.mark_completed(done_at);
                t
            })
            .collect();
        let next_day = Utc.with_ymd_and_hms(2024, 1, 2, hour, 0, 0).unwrap();
        let outcome = reset_daily_tasks(tasks, &next_day, WeeklyResetPolicy::Retain);
        prop_assert_eq!(outcome.cleared.len(), count);
        prop_assert!(outcome.tasks.iter().all(|t| !t.completed && t.completed_at.is_none()));
    }
}

