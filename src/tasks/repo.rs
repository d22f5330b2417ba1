use anyhow::Context;
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::query::TaskQuery;
use super::repo_types::{NewTask, Task, TaskEdit, TaskStatus};

const TASK_COLUMNS: &str = "id, user_id, title, description, status, priority, due_date, points, created_at, completed_at";

/// Inserts a task. Status follows `completed_at`: set means Completed.
pub async fn insert<'e, E: PgExecutor<'e>>(
    exec: E,
    user_id: Uuid,
    new: &NewTask,
    completed_at: Option<OffsetDateTime>,
) -> anyhow::Result<Task> {
    let status = match completed_at {
        Some(_) => TaskStatus::Completed,
        None => TaskStatus::Pending,
    };
    let task = sqlx::query_as::<_, Task>(&format!(
        r#"
        INSERT INTO tasks (user_id, title, description, status, priority, due_date, points, completed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {TASK_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(status)
    .bind(new.priority)
    .bind(new.due_date)
    .bind(new.points)
    .bind(completed_at)
    .fetch_one(exec)
    .await
    .context("insert task")?;
    Ok(task)
}

/// Owner-scoped lookup: another user's task reads as missing.
pub async fn get(db: &PgPool, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<Task>> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get task")?;
    Ok(task)
}

pub async fn list(
    db: &PgPool,
    user_id: Uuid,
    query: &TaskQuery,
    today: Date,
) -> anyhow::Result<Vec<Task>> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks {}", query.tail_sql());
    let mut q = sqlx::query_as::<_, Task>(&sql).bind(user_id);
    if query.filter.needs_today() {
        q = q.bind(today);
    }
    let rows = q.fetch_all(db).await.context("list tasks")?;
    Ok(rows)
}

/// Whole history of a user, in no particular order.
pub async fn list_all<'e, E: PgExecutor<'e>>(exec: E, user_id: Uuid) -> anyhow::Result<Vec<Task>> {
    let rows = sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_all(exec)
    .await
    .context("list all tasks")?;
    Ok(rows)
}

/// Edits descriptive fields. Status, points and timestamps are left alone.
pub async fn update(
    db: &PgPool,
    id: Uuid,
    user_id: Uuid,
    edit: &TaskEdit,
) -> anyhow::Result<Option<Task>> {
    let task = sqlx::query_as::<_, Task>(&format!(
        r#"
        UPDATE tasks
           SET title = $3, description = $4, priority = $5, due_date = $6
         WHERE id = $1 AND user_id = $2
        RETURNING {TASK_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(user_id)
    .bind(&edit.title)
    .bind(&edit.description)
    .bind(edit.priority)
    .bind(edit.due_date)
    .fetch_optional(db)
    .await
    .context("update task")?;
    Ok(task)
}

/// Row-locks a task by id regardless of owner; ownership is checked by the caller.
pub async fn lock_tx(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> anyhow::Result<Option<Task>> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .context("lock task")?;
    Ok(task)
}

pub async fn update_status_tx(tx: &mut Transaction<'_, Postgres>, task: &Task) -> anyhow::Result<()> {
    sqlx::query("UPDATE tasks SET status = $2, completed_at = $3 WHERE id = $1")
        .bind(task.id)
        .bind(task.status)
        .bind(task.completed_at)
        .execute(&mut **tx)
        .await
        .context("update task status")?;
    Ok(())
}

pub async fn delete_tx(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await
        .context("delete task")?;
    Ok(())
}
