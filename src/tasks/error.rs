use axum::http::StatusCode;
use thiserror::Error;

pub type TaskResult<T> = Result<T, TaskError>;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task not found")]
    NotFound,
    #[error("Task belongs to another user")]
    NotOwner,
    #[error("Task is already completed")]
    AlreadyCompleted,
    #[error("Task is already pending")]
    AlreadyPending,
    #[error("Point total limit reached")]
    PointsOverflow,
    #[error("{0}")]
    Validation(String),
    #[error("store failure: {0}")]
    Store(#[from] anyhow::Error),
}

impl TaskError {
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotFound
                | Self::NotOwner
                | Self::AlreadyCompleted
                | Self::AlreadyPending
                | Self::PointsOverflow
        )
    }

    pub fn status(&self) -> StatusCode {
        match self {
            // Someone else's task is reported the same as a missing one.
            Self::NotFound | Self::NotOwner => StatusCode::NOT_FOUND,
            Self::AlreadyCompleted | Self::AlreadyPending | Self::PointsOverflow => {
                StatusCode::CONFLICT
            }
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for TaskError {
    fn from(e: sqlx::Error) -> Self {
        Self::Store(e.into())
    }
}

/// Handler-side rejection, in the `(StatusCode, String)` shape every route returns.
pub fn reject(e: TaskError) -> (StatusCode, String) {
    let status = e.status();
    let msg = match &e {
        TaskError::NotOwner => TaskError::NotFound.to_string(),
        TaskError::Store(_) => "Internal server error".to_string(),
        other => other.to_string(),
    };
    (status, msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_failures_map_to_client_errors() {
        assert_eq!(reject(TaskError::NotFound).0, StatusCode::NOT_FOUND);
        assert_eq!(reject(TaskError::AlreadyCompleted).0, StatusCode::CONFLICT);
        assert_eq!(reject(TaskError::AlreadyPending).0, StatusCode::CONFLICT);
        assert_eq!(reject(TaskError::PointsOverflow).0, StatusCode::CONFLICT);
        assert!(TaskError::AlreadyPending.is_precondition());
        assert!(TaskError::PointsOverflow.is_precondition());
        assert!(!TaskError::Validation("x".into()).is_precondition());
        assert!(!TaskError::Store(anyhow::anyhow!("down")).is_precondition());
    }

    #[test]
    fn foreign_task_is_indistinguishable_from_missing() {
        assert_eq!(reject(TaskError::NotOwner), reject(TaskError::NotFound));
    }

    #[test]
    fn store_errors_hide_details() {
        let (status, msg) = reject(TaskError::Store(anyhow::anyhow!("connection refused")));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!msg.contains("refused"));
    }
}
