//! Demo fixtures for local setups. Not used by the request path.

use anyhow::Context;
use sqlx::PgPool;
use time::{Date, Duration, OffsetDateTime};
use tracing::info;

use crate::auth::{password::hash_password, repo_types::User};
use crate::tasks::repo;
use crate::tasks::repo_types::{NewTask, Priority, DEFAULT_POINTS};

pub const DEMO_PASSWORD: &str = "password123";

pub struct DemoTask {
    pub task: NewTask,
    pub completed_at: Option<OffsetDateTime>,
}

pub struct DemoUser {
    pub username: &'static str,
    pub email: &'static str,
    pub tasks: Vec<DemoTask>,
}

impl DemoUser {
    /// Settled total for the seeded history.
    pub fn total_points(&self) -> i32 {
        self.tasks
            .iter()
            .filter(|t| t.completed_at.is_some())
            .map(|t| t.task.points)
            .sum()
    }
}

fn demo(
    title: &str,
    description: &str,
    priority: Priority,
    due_date: Date,
    completed_at: Option<OffsetDateTime>,
) -> DemoTask {
    DemoTask {
        task: NewTask {
            title: title.into(),
            description: Some(description.into()),
            priority,
            due_date: Some(due_date),
            points: DEFAULT_POINTS,
        },
        completed_at,
    }
}

pub fn demo_users(now: OffsetDateTime) -> Vec<DemoUser> {
    let today = now.date();
    let day = Duration::days;

    vec![
        DemoUser {
            username: "demo_user",
            email: "demo@example.com",
            tasks: vec![
                demo(
                    "Complete project documentation",
                    "Write comprehensive documentation for the project",
                    Priority::High,
                    today - day(2),
                    Some(now - day(1)),
                ),
                demo(
                    "Review code submissions",
                    "Review and provide feedback on team code submissions",
                    Priority::High,
                    today,
                    None,
                ),
                demo(
                    "Update website content",
                    "Update the company website with latest information",
                    Priority::Medium,
                    today + day(3),
                    None,
                ),
                demo(
                    "Organize team meeting",
                    "Schedule and organize weekly team meeting",
                    Priority::Medium,
                    today - day(5),
                    Some(now - day(4)),
                ),
                demo(
                    "Clean up old files",
                    "Remove unnecessary files from project directory",
                    Priority::Low,
                    today + day(7),
                    None,
                ),
                demo(
                    "Research new technologies",
                    "Research and evaluate new development tools",
                    Priority::Low,
                    today - day(1),
                    None,
                ),
            ],
        },
        DemoUser {
            username: "john_doe",
            email: "john@example.com",
            tasks: vec![
                demo(
                    "Prepare presentation",
                    "Prepare slides for client presentation",
                    Priority::High,
                    today + day(1),
                    None,
                ),
                demo(
                    "Update resume",
                    "Update resume with recent projects",
                    Priority::Medium,
                    today - day(3),
                    Some(now - day(2)),
                ),
                demo(
                    "Learn new framework",
                    "Study documentation for React framework",
                    Priority::Low,
                    today + day(10),
                    None,
                ),
            ],
        },
    ]
}

/// Loads the demo users once. Returns `false` when they already exist.
pub async fn load_demo(db: &PgPool, now: OffsetDateTime) -> anyhow::Result<bool> {
    let users = demo_users(now);
    if let Some(first) = users.first() {
        if User::find_by_username(db, first.username).await?.is_some() {
            info!(username = first.username, "demo data already present");
            return Ok(false);
        }
    }

    let hash = hash_password(DEMO_PASSWORD)?;
    let mut tx = db.begin().await.context("begin tx")?;
    for demo_user in &users {
        let user = User::create_tx(
            &mut tx,
            demo_user.username,
            demo_user.email,
            &hash,
            demo_user.total_points(),
        )
        .await?;
        for t in &demo_user.tasks {
            repo::insert(&mut *tx, user.id, &t.task, t.completed_at).await?;
        }
        info!(
            username = demo_user.username,
            tasks = demo_user.tasks.len(),
            total_points = user.total_points,
            "demo user seeded"
        );
    }
    tx.commit().await.context("commit tx")?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn seeded_totals_match_completed_tasks() {
        let users = demo_users(datetime!(2024-06-15 12:00 UTC));
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].total_points(), 10);
        assert_eq!(users[1].total_points(), 5);
    }

    #[test]
    fn demo_history_has_one_overdue_task() {
        let now = datetime!(2024-06-15 12:00 UTC);
        let today = now.date();
        let overdue = demo_users(now)[0]
            .tasks
            .iter()
            .filter(|t| t.completed_at.is_none() && t.task.due_date.is_some_and(|d| d < today))
            .count();
        assert_eq!(overdue, 1);
    }
}
