//! Settlement of task status transitions against the owner's point total.
//!
//! Every function here mutates a `Task`/`User` pair in memory only; persisting
//! both rows inside one transaction is the caller's job (see `services`).

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::{TaskError, TaskResult};
use super::repo_types::{Task, TaskStatus};
use crate::auth::repo_types::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementKind {
    Awarded,
    Revoked,
    Deleted,
}

/// Result of one settlement: signed point change actually applied and the new total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub task_id: Uuid,
    pub kind: SettlementKind,
    pub points_delta: i32,
    pub total_points: i32,
}

fn ensure_owner(task: &Task, user: &User) -> TaskResult<()> {
    if task.user_id != user.id {
        return Err(TaskError::NotOwner);
    }
    Ok(())
}

/// Removes up to `points` from the user, never going below zero. Returns what was removed.
fn deduct(user: &mut User, points: i32) -> i32 {
    let before = user.total_points;
    user.total_points = before.saturating_sub(points).max(0);
    before - user.total_points
}

/// Pending -> Completed, awarding the task's points. An award that would overflow the
/// total is refused and leaves both records untouched.
pub fn complete(task: &mut Task, user: &mut User, now: OffsetDateTime) -> TaskResult<Settlement> {
    ensure_owner(task, user)?;
    if task.status == TaskStatus::Completed {
        return Err(TaskError::AlreadyCompleted);
    }
    let total = user
        .total_points
        .checked_add(task.points)
        .ok_or(TaskError::PointsOverflow)?;

    task.status = TaskStatus::Completed;
    task.completed_at = Some(now);
    user.total_points = total;

    Ok(Settlement {
        task_id: task.id,
        kind: SettlementKind::Awarded,
        points_delta: task.points,
        total_points: user.total_points,
    })
}

/// Completed -> Pending, taking the task's points back (floored at zero).
pub fn revert(task: &mut Task, user: &mut User) -> TaskResult<Settlement> {
    ensure_owner(task, user)?;
    if task.status == TaskStatus::Pending {
        return Err(TaskError::AlreadyPending);
    }

    task.status = TaskStatus::Pending;
    task.completed_at = None;
    let removed = deduct(user, task.points);

    Ok(Settlement {
        task_id: task.id,
        kind: SettlementKind::Revoked,
        points_delta: -removed,
        total_points: user.total_points,
    })
}

/// Complete if pending, revert if completed.
pub fn toggle(task: &mut Task, user: &mut User, now: OffsetDateTime) -> TaskResult<Settlement> {
    match task.status {
        TaskStatus::Pending => complete(task, user, now),
        TaskStatus::Completed => revert(task, user),
    }
}

/// Point side effect of deleting `task`. The task itself is left untouched.
pub fn release(task: &Task, user: &mut User) -> TaskResult<Settlement> {
    ensure_owner(task, user)?;
    let removed = match task.status {
        TaskStatus::Completed => deduct(user, task.points),
        TaskStatus::Pending => 0,
    };
    Ok(Settlement {
        task_id: task.id,
        kind: SettlementKind::Deleted,
        points_delta: -removed,
        total_points: user.total_points,
    })
}

/// Sum of points over completed tasks; what an incrementally kept total should equal.
pub fn recompute_total(tasks: &[Task]) -> i64 {
    tasks
        .iter()
        .filter(|t| t.is_completed())
        .map(|t| i64::from(t.points))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::fixtures::{task_for, user};
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-03-01 12:00 UTC);

    #[test]
    fn complete_then_revert_restores_zero() {
        let mut u = user(0);
        let mut t = task_for(&u, 5);

        let s = complete(&mut t, &mut u, NOW).unwrap();
        assert_eq!(s.kind, SettlementKind::Awarded);
        assert_eq!(s.points_delta, 5);
        assert_eq!(u.total_points, 5);
        assert_eq!(t.status, TaskStatus::Completed);
        assert_eq!(t.completed_at, Some(NOW));
        assert_eq!(crate::tasks::badge::badge_for(u.total_points), crate::tasks::badge::Badge::Bronze);

        let s = revert(&mut t, &mut u).unwrap();
        assert_eq!(s.points_delta, -5);
        assert_eq!(u.total_points, 0);
        assert_eq!(t.status, TaskStatus::Pending);
        assert_eq!(t.completed_at, None);
    }

    #[test]
    fn double_complete_is_rejected_without_double_award() {
        let mut u = user(0);
        let mut t = task_for(&u, 5);
        complete(&mut t, &mut u, NOW).unwrap();
        let err = complete(&mut t, &mut u, NOW).unwrap_err();
        assert!(matches!(err, TaskError::AlreadyCompleted));
        assert_eq!(u.total_points, 5);
    }

    #[test]
    fn reverting_pending_task_is_rejected() {
        let mut u = user(3);
        let mut t = task_for(&u, 5);
        assert!(matches!(revert(&mut t, &mut u), Err(TaskError::AlreadyPending)));
        assert_eq!(u.total_points, 3);
    }

    #[test]
    fn revert_clamps_at_zero() {
        let mut u = user(0);
        let mut t = task_for(&u, 10);
        complete(&mut t, &mut u, NOW).unwrap();
        // points adjusted downward out of band
        u.total_points = 4;
        let s = revert(&mut t, &mut u).unwrap();
        assert_eq!(u.total_points, 0);
        assert_eq!(s.points_delta, -4);
    }

    #[test]
    fn foreign_task_is_rejected_and_untouched() {
        let owner = user(0);
        let mut other = user(0);
        let mut t = task_for(&owner, 5);
        assert!(matches!(complete(&mut t, &mut other, NOW), Err(TaskError::NotOwner)));
        assert!(matches!(release(&t, &mut other), Err(TaskError::NotOwner)));
        assert_eq!(t.status, TaskStatus::Pending);
        assert_eq!(other.total_points, 0);
    }

    #[test]
    fn release_only_charges_completed_tasks() {
        let mut u = user(7);
        let pending = task_for(&u, 5);
        let s = release(&pending, &mut u).unwrap();
        assert_eq!((s.points_delta, u.total_points), (0, 7));

        let mut done = task_for(&u, 5);
        complete(&mut done, &mut u, NOW).unwrap();
        assert_eq!(u.total_points, 12);
        let s = release(&done, &mut u).unwrap();
        assert_eq!(s.kind, SettlementKind::Deleted);
        assert_eq!((s.points_delta, u.total_points), (-5, 7));
        // task row is the caller's to remove
        assert_eq!(done.status, TaskStatus::Completed);
    }

    #[test]
    fn release_floors_at_zero() {
        let mut u = user(0);
        let mut t = task_for(&u, 8);
        complete(&mut t, &mut u, NOW).unwrap();
        u.total_points = 2;
        release(&t, &mut u).unwrap();
        assert_eq!(u.total_points, 0);
    }

    #[test]
    fn toggle_alternates() {
        let mut u = user(0);
        let mut t = task_for(&u, 5);
        assert_eq!(toggle(&mut t, &mut u, NOW).unwrap().kind, SettlementKind::Awarded);
        assert_eq!(toggle(&mut t, &mut u, NOW).unwrap().kind, SettlementKind::Revoked);
        assert_eq!(u.total_points, 0);
    }

    #[test]
    fn incremental_total_matches_recompute_after_mixed_sequence() {
        let mut u = user(0);
        let mut tasks: Vec<Task> = [5, 3, 10, 1].iter().map(|&p| task_for(&u, p)).collect();

        // deterministic walk over complete/revert/rejected calls
        let script = [0, 1, 2, 0, 3, 1, 1, 2, 0, 3, 3, 2];
        for (step, &i) in script.iter().enumerate() {
            let res = if step % 3 == 2 {
                revert(&mut tasks[i], &mut u)
            } else {
                toggle(&mut tasks[i], &mut u, NOW)
            };
            let _ = res;

            for t in &tasks {
                assert_eq!(t.completed_at.is_some(), t.is_completed());
            }
            assert!(u.total_points >= 0);
            assert_eq!(i64::from(u.total_points), recompute_total(&tasks));
        }
    }

    #[test]
    fn award_past_integer_range_is_refused_untouched() {
        let mut u = user(i32::MAX - 3);
        let mut t = task_for(&u, 5);
        let err = complete(&mut t, &mut u, NOW).unwrap_err();
        assert!(matches!(err, TaskError::PointsOverflow));
        assert_eq!(u.total_points, i32::MAX - 3);
        assert_eq!(t.status, TaskStatus::Pending);
        assert_eq!(t.completed_at, None);
    }

    #[test]
    fn large_awards_keep_total_recoverable() {
        let mut u = user(0);
        let mut tasks: Vec<Task> = (0..3).map(|_| task_for(&u, 2_000_000_000)).collect();

        complete(&mut tasks[0], &mut u, NOW).unwrap();
        assert!(matches!(
            complete(&mut tasks[1], &mut u, NOW),
            Err(TaskError::PointsOverflow)
        ));
        assert_eq!(i64::from(u.total_points), recompute_total(&tasks));

        revert(&mut tasks[0], &mut u).unwrap();
        complete(&mut tasks[2], &mut u, NOW).unwrap();
        assert_eq!(i64::from(u.total_points), recompute_total(&tasks));
        assert_eq!(u.total_points, 2_000_000_000);
    }

    #[test]
    fn reverts_beyond_award_history_never_go_negative() {
        let mut u = user(0);
        let mut t = task_for(&u, 5);
        for _ in 0..5 {
            complete(&mut t, &mut u, NOW).unwrap();
            u.total_points = 0;
            revert(&mut t, &mut u).unwrap();
            assert_eq!(u.total_points, 0);
        }
    }
}
