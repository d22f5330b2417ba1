use time::{macros::datetime, Date, OffsetDateTime};
use uuid::Uuid;

use super::repo_types::{Priority, Task, TaskStatus};
use crate::auth::repo_types::User;

pub fn user(total_points: i32) -> User {
    User {
        id: Uuid::new_v4(),
        username: "tester".into(),
        email: "tester@example.com".into(),
        password_hash: String::new(),
        total_points,
        created_at: datetime!(2024-01-01 0:00 UTC),
    }
}

pub fn task_for(owner: &User, points: i32) -> Task {
    Task {
        id: Uuid::new_v4(),
        user_id: owner.id,
        title: "write tests".into(),
        description: None,
        status: TaskStatus::Pending,
        priority: Priority::Medium,
        due_date: None,
        points,
        created_at: datetime!(2024-01-01 0:00 UTC),
        completed_at: None,
    }
}

pub fn pending(priority: Priority, due: Option<Date>) -> Task {
    Task {
        priority,
        due_date: due,
        ..task_for(&user(0), 5)
    }
}

pub fn completed(due: Option<Date>, at: OffsetDateTime) -> Task {
    Task {
        status: TaskStatus::Completed,
        completed_at: Some(at),
        due_date: due,
        ..task_for(&user(0), 5)
    }
}
