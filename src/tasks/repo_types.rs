use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

pub const DEFAULT_POINTS: i32 = 5;
/// Largest reward a single task may carry.
pub const POINTS_MAX: i32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    Pending,
    Completed,
}

/// Declaration order is the sort order: High < Medium < Low.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_priority")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

/// Task record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid, // owner, never changes
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due_date: Option<Date>,
    pub points: i32,
    pub created_at: OffsetDateTime,
    pub completed_at: Option<OffsetDateTime>, // set iff status is Completed
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    pub fn is_overdue(&self, today: Date) -> bool {
        self.status == TaskStatus::Pending && self.due_date.is_some_and(|due| due < today)
    }

    pub fn is_due_today(&self, today: Date) -> bool {
        self.status == TaskStatus::Pending && self.due_date == Some(today)
    }
}

/// Fields of a task about to be inserted.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<Date>,
    pub points: i32,
}

/// Editable fields; points are fixed at creation.
#[derive(Debug, Clone)]
pub struct TaskEdit {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<Date>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn task(status: TaskStatus, due: Option<Date>) -> Task {
        Task {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "t".into(),
            description: None,
            status,
            priority: Priority::default(),
            due_date: due,
            points: DEFAULT_POINTS,
            created_at: datetime!(2024-01-01 0:00 UTC),
            completed_at: None,
        }
    }

    #[test]
    fn overdue_only_for_pending_tasks_past_due() {
        let today = date!(2024 - 01 - 10);
        assert!(task(TaskStatus::Pending, Some(date!(2024 - 01 - 09))).is_overdue(today));
        assert!(!task(TaskStatus::Pending, Some(today)).is_overdue(today));
        assert!(!task(TaskStatus::Pending, None).is_overdue(today));
        assert!(!task(TaskStatus::Completed, Some(date!(2024 - 01 - 01))).is_overdue(today));
    }

    #[test]
    fn due_today_only_for_pending() {
        let today = date!(2024 - 01 - 10);
        assert!(task(TaskStatus::Pending, Some(today)).is_due_today(today));
        assert!(!task(TaskStatus::Completed, Some(today)).is_due_today(today));
    }

    #[test]
    fn priority_orders_high_first() {
        let mut all = vec![Priority::Low, Priority::High, Priority::Medium];
        all.sort();
        assert_eq!(all, vec![Priority::High, Priority::Medium, Priority::Low]);
        assert_eq!(Priority::default(), Priority::Medium);
    }
}
