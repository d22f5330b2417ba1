//! Task operations against the store.
//!
//! State-changing operations run inside a caller-owned transaction: the caller
//! begins it, and commits only on `Ok`. Dropping it on `Err` rolls back, so a task
//! status and its owner's points are always written together or not at all.

use sqlx::{PgPool, Postgres, Transaction};
use time::{Date, OffsetDateTime};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::analytics::{self, Analytics};
use super::dto::PointsAudit;
use super::error::{TaskError, TaskResult};
use super::points::{self, Settlement};
use super::query::TaskQuery;
use super::repo;
use super::repo_types::{NewTask, Task, TaskEdit};
use crate::auth::repo_types::User;

#[instrument(skip(db, new), fields(title = %new.title))]
pub async fn create_task(db: &PgPool, user_id: Uuid, new: &NewTask) -> TaskResult<Task> {
    let task = repo::insert(db, user_id, new, None).await?;
    info!(task_id = %task.id, points = task.points, "task created");
    Ok(task)
}

pub async fn get_task(db: &PgPool, user_id: Uuid, task_id: Uuid) -> TaskResult<Task> {
    repo::get(db, task_id, user_id)
        .await?
        .ok_or(TaskError::NotFound)
}

#[instrument(skip(db))]
pub async fn list_tasks(
    db: &PgPool,
    user_id: Uuid,
    query: TaskQuery,
    today: Date,
) -> TaskResult<Vec<Task>> {
    Ok(repo::list(db, user_id, &query, today).await?)
}

#[instrument(skip(db, edit))]
pub async fn update_task(
    db: &PgPool,
    user_id: Uuid,
    task_id: Uuid,
    edit: &TaskEdit,
) -> TaskResult<Task> {
    let task = repo::update(db, task_id, user_id, edit)
        .await?
        .ok_or(TaskError::NotFound)?;
    info!(task_id = %task.id, "task updated");
    Ok(task)
}

/// Locks the acting user, then the task, in that order.
async fn lock_pair(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    task_id: Uuid,
) -> TaskResult<(User, Task)> {
    let user = User::lock_by_id_tx(tx, user_id)
        .await?
        .ok_or(TaskError::NotFound)?;
    let task = repo::lock_tx(tx, task_id)
        .await?
        .ok_or(TaskError::NotFound)?;
    Ok((user, task))
}

async fn settle<F>(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    task_id: Uuid,
    op: F,
) -> TaskResult<Settlement>
where
    F: FnOnce(&mut Task, &mut User) -> TaskResult<Settlement>,
{
    let (mut user, mut task) = lock_pair(tx, user_id, task_id).await?;

    let settlement = op(&mut task, &mut user).map_err(|e| {
        warn!(error = %e, %user_id, %task_id, "settlement rejected");
        e
    })?;

    repo::update_status_tx(tx, &task).await?;
    User::update_points_tx(tx, &user).await?;

    info!(
        %user_id,
        %task_id,
        kind = ?settlement.kind,
        delta = settlement.points_delta,
        total = settlement.total_points,
        "points settled"
    );
    Ok(settlement)
}

#[instrument(skip(tx))]
pub async fn complete_task(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    task_id: Uuid,
    now: OffsetDateTime,
) -> TaskResult<Settlement> {
    settle(tx, user_id, task_id, |task, user| points::complete(task, user, now)).await
}

#[instrument(skip(tx))]
pub async fn revert_task(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    task_id: Uuid,
) -> TaskResult<Settlement> {
    settle(tx, user_id, task_id, points::revert).await
}

#[instrument(skip(tx))]
pub async fn toggle_task(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    task_id: Uuid,
    now: OffsetDateTime,
) -> TaskResult<Settlement> {
    settle(tx, user_id, task_id, |task, user| points::toggle(task, user, now)).await
}

#[instrument(skip(tx))]
pub async fn delete_task(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    task_id: Uuid,
) -> TaskResult<Settlement> {
    let (mut user, task) = lock_pair(tx, user_id, task_id).await?;

    let settlement = points::release(&task, &mut user).map_err(|e| {
        warn!(error = %e, %user_id, %task_id, "delete rejected");
        e
    })?;

    if settlement.points_delta != 0 {
        User::update_points_tx(tx, &user).await?;
    }
    repo::delete_tx(tx, task.id).await?;

    info!(
        %user_id,
        %task_id,
        delta = settlement.points_delta,
        total = settlement.total_points,
        "task deleted"
    );
    Ok(settlement)
}

#[instrument(skip(db))]
pub async fn dashboard(db: &PgPool, user_id: Uuid, now: OffsetDateTime) -> TaskResult<(User, Analytics)> {
    let user = User::find_by_id(db, user_id)
        .await?
        .ok_or(TaskError::NotFound)?;
    let tasks = repo::list_all(db, user_id).await?;
    Ok((user, analytics::summarize(&tasks, now)))
}

/// Compares the stored total with one rebuilt from completed tasks. Read-only.
#[instrument(skip(db))]
pub async fn audit_points(db: &PgPool, user_id: Uuid) -> TaskResult<PointsAudit> {
    let mut tx = db.begin().await?;
    let user = User::lock_by_id_tx(&mut tx, user_id)
        .await?
        .ok_or(TaskError::NotFound)?;
    let tasks = repo::list_all(&mut *tx, user_id).await?;
    tx.rollback().await?;

    let recomputed = points::recompute_total(&tasks);
    let consistent = i64::from(user.total_points) == recomputed;
    if !consistent {
        warn!(%user_id, stored = user.total_points, recomputed, "points drift detected");
    }
    Ok(PointsAudit {
        stored: user.total_points,
        recomputed,
        consistent,
    })
}
