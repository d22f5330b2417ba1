use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use super::badge::badge_for;
use super::dto::{
    CreateTaskRequest, DashboardResponse, ListQuery, PointsAudit, SettlementResponse,
    TaskResponse, UpdateTaskRequest,
};
use super::error::{reject, TaskError};
use super::query::TaskQuery;
use super::services;
use crate::{auth::jwt::AuthUser, state::AppState};

type ApiResult<T> = Result<T, (StatusCode, String)>;

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/tasks/:id/complete", post(complete_task))
        .route("/tasks/:id/revert", post(revert_task))
        .route("/tasks/:id/toggle", post(toggle_task))
}

pub fn stats_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/points/audit", get(audit_points))
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

fn internal(e: sqlx::Error) -> (StatusCode, String) {
    error!(error = %e, "transaction failed");
    reject(TaskError::from(e))
}

fn rejected(e: TaskError) -> (StatusCode, String) {
    if e.is_precondition() {
        warn!(error = %e, "task request refused");
    } else if let TaskError::Store(inner) = &e {
        error!(error = %inner, "store failure");
    }
    reject(e)
}

#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ListQuery>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let query = TaskQuery::from_keywords(q.filter.as_deref(), q.sort.as_deref());
    let today = now().date();
    let tasks = services::list_tasks(&state.db, user_id, query, today)
        .await
        .map_err(rejected)?;
    Ok(Json(
        tasks
            .into_iter()
            .map(|t| TaskResponse::from_task(t, today))
            .collect(),
    ))
}

#[instrument(skip(state, body))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let new = body.validate().map_err(rejected)?;
    let task = services::create_task(&state.db, user_id, &new)
        .await
        .map_err(rejected)?;
    Ok((
        StatusCode::CREATED,
        Json(TaskResponse::from_task(task, now().date())),
    ))
}

#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = services::get_task(&state.db, user_id, id)
        .await
        .map_err(rejected)?;
    Ok(Json(TaskResponse::from_task(task, now().date())))
}

#[instrument(skip(state, body))]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let edit = body.validate().map_err(rejected)?;
    let task = services::update_task(&state.db, user_id, id, &edit)
        .await
        .map_err(rejected)?;
    Ok(Json(TaskResponse::from_task(task, now().date())))
}

#[instrument(skip(state))]
pub async fn complete_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SettlementResponse>> {
    let mut tx = state.db.begin().await.map_err(internal)?;
    let settlement = services::complete_task(&mut tx, user_id, id, now())
        .await
        .map_err(rejected)?;
    tx.commit().await.map_err(internal)?;
    Ok(Json(SettlementResponse {
        badge: badge_for(settlement.total_points),
        settlement,
    }))
}

#[instrument(skip(state))]
pub async fn revert_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SettlementResponse>> {
    let mut tx = state.db.begin().await.map_err(internal)?;
    let settlement = services::revert_task(&mut tx, user_id, id)
        .await
        .map_err(rejected)?;
    tx.commit().await.map_err(internal)?;
    Ok(Json(SettlementResponse {
        badge: badge_for(settlement.total_points),
        settlement,
    }))
}

#[instrument(skip(state))]
pub async fn toggle_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SettlementResponse>> {
    let mut tx = state.db.begin().await.map_err(internal)?;
    let settlement = services::toggle_task(&mut tx, user_id, id, now())
        .await
        .map_err(rejected)?;
    tx.commit().await.map_err(internal)?;
    Ok(Json(SettlementResponse {
        badge: badge_for(settlement.total_points),
        settlement,
    }))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SettlementResponse>> {
    let mut tx = state.db.begin().await.map_err(internal)?;
    let settlement = services::delete_task(&mut tx, user_id, id)
        .await
        .map_err(rejected)?;
    tx.commit().await.map_err(internal)?;
    Ok(Json(SettlementResponse {
        badge: badge_for(settlement.total_points),
        settlement,
    }))
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<DashboardResponse>> {
    let (user, analytics) = services::dashboard(&state.db, user_id, now())
        .await
        .map_err(rejected)?;
    Ok(Json(DashboardResponse {
        badge: badge_for(user.total_points),
        username: user.username,
        total_points: user.total_points,
        analytics,
    }))
}

#[instrument(skip(state))]
pub async fn audit_points(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<PointsAudit>> {
    let audit = services::audit_points(&state.db, user_id)
        .await
        .map_err(rejected)?;
    Ok(Json(audit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_keep_the_client_facing_shape() {
        assert_eq!(
            rejected(TaskError::AlreadyCompleted),
            (StatusCode::CONFLICT, "Task is already completed".to_string())
        );
        assert_eq!(rejected(TaskError::NotOwner).0, StatusCode::NOT_FOUND);
        let (status, msg) = rejected(TaskError::Store(anyhow::anyhow!("pool timed out")));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(msg, "Internal server error");
        assert_eq!(
            rejected(TaskError::Validation("Title is required".into())),
            (StatusCode::BAD_REQUEST, "Title is required".to_string())
        );
    }
}
