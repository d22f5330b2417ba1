//! Dashboard statistics over a user's whole task history.
//!
//! Pure and read-only: the snapshot is rebuilt from the task rows on every call.

use serde::Serialize;
use time::{Date, Duration, OffsetDateTime};

use super::iso_date;
use super::repo_types::{Priority, Task, TaskStatus};

pub const WINDOW_DAYS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analytics {
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub pending_tasks: u32,
    pub high_priority: u32,
    pub medium_priority: u32,
    pub low_priority: u32,
    pub overdue_tasks: u32,
    pub on_time_tasks: u32,
    pub late_tasks: u32,
    /// First calendar day of `weekly_completed`.
    #[serde(with = "iso_date")]
    pub window_start: Date,
    /// Index `i` counts tasks completed on `window_start + i` days.
    pub weekly_completed: [u32; WINDOW_DAYS],
}

/// First day of the rolling window: seven calendar days before `today`.
pub fn window_start(today: Date) -> Date {
    today
        .checked_sub(Duration::days(WINDOW_DAYS as i64))
        .unwrap_or(Date::MIN)
}

/// Builds the snapshot; `now` is taken in UTC and its date is "today".
pub fn summarize(tasks: &[Task], now: OffsetDateTime) -> Analytics {
    let today = now.date();
    let start = window_start(today);

    let mut a = Analytics {
        total_tasks: 0,
        completed_tasks: 0,
        pending_tasks: 0,
        high_priority: 0,
        medium_priority: 0,
        low_priority: 0,
        overdue_tasks: 0,
        on_time_tasks: 0,
        late_tasks: 0,
        window_start: start,
        weekly_completed: [0; WINDOW_DAYS],
    };

    for task in tasks {
        a.total_tasks += 1;

        match task.priority {
            Priority::High => a.high_priority += 1,
            Priority::Medium => a.medium_priority += 1,
            Priority::Low => a.low_priority += 1,
        }

        if task.is_overdue(today) {
            a.overdue_tasks += 1;
        }

        if task.status != TaskStatus::Completed {
            continue;
        }
        a.completed_tasks += 1;

        let Some(done_on) = task.completed_at.map(|at| at.date()) else {
            continue;
        };

        // no due date: neither on time nor late
        match task.due_date {
            Some(due) if done_on <= due => a.on_time_tasks += 1,
            Some(_) => a.late_tasks += 1,
            None => {}
        }

        let offset = (done_on - start).whole_days();
        if (0..WINDOW_DAYS as i64).contains(&offset) {
            a.weekly_completed[offset as usize] += 1;
        }
    }

    a.pending_tasks = a.total_tasks - a.completed_tasks;
    a
}
