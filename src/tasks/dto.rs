use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date, OffsetDateTime};
use uuid::Uuid;

use super::analytics::Analytics;
use super::badge::Badge;
use super::error::TaskError;
use super::iso_date;
use super::points::Settlement;
use super::repo_types::{NewTask, Priority, Task, TaskEdit, TaskStatus, DEFAULT_POINTS, POINTS_MAX};

const TITLE_MAX: usize = 200;

/// Parses a `YYYY-MM-DD` due date; blank input means no due date.
pub fn parse_due_date(raw: Option<&str>) -> Result<Option<Date>, TaskError> {
    let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    Date::parse(s, format_description!("[year]-[month]-[day]"))
        .map(Some)
        .map_err(|_| TaskError::Validation("Invalid date format".into()))
}

fn clean_title(raw: &str) -> Result<String, TaskError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(TaskError::Validation("Title is required".into()));
    }
    if title.chars().count() > TITLE_MAX {
        return Err(TaskError::Validation("Title too long".into()));
    }
    Ok(title.to_string())
}

fn clean_description(raw: Option<String>) -> Option<String> {
    raw.map(|d| d.trim().to_string()).filter(|d| !d.is_empty())
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<String>,
    pub points: Option<i32>,
}

impl CreateTaskRequest {
    pub fn validate(self) -> Result<NewTask, TaskError> {
        let points = self.points.unwrap_or(DEFAULT_POINTS);
        if points <= 0 {
            return Err(TaskError::Validation("Points must be positive".into()));
        }
        if points > POINTS_MAX {
            return Err(TaskError::Validation(format!(
                "Points must be at most {POINTS_MAX}"
            )));
        }
        Ok(NewTask {
            title: clean_title(&self.title)?,
            description: clean_description(self.description),
            priority: self.priority.unwrap_or_default(),
            due_date: parse_due_date(self.due_date.as_deref())?,
            points,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<String>,
}

impl UpdateTaskRequest {
    pub fn validate(self) -> Result<TaskEdit, TaskError> {
        Ok(TaskEdit {
            title: clean_title(&self.title)?,
            description: clean_description(self.description),
            priority: self.priority.unwrap_or_default(),
            due_date: parse_due_date(self.due_date.as_deref())?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub filter: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(with = "iso_date::option")]
    pub due_date: Option<Date>,
    pub points: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub overdue: bool,
    pub due_today: bool,
}

impl TaskResponse {
    pub fn from_task(t: Task, today: Date) -> Self {
        Self {
            overdue: t.is_overdue(today),
            due_today: t.is_due_today(today),
            id: t.id,
            title: t.title,
            description: t.description,
            status: t.status,
            priority: t.priority,
            due_date: t.due_date,
            points: t.points,
            created_at: t.created_at,
            completed_at: t.completed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    #[serde(flatten)]
    pub settlement: Settlement,
    pub badge: Badge,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub username: String,
    pub total_points: i32,
    pub badge: Badge,
    pub analytics: Analytics,
}

#[derive(Debug, Serialize)]
pub struct PointsAudit {
    pub stored: i32,
    pub recomputed: i64,
    pub consistent: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn create(title: &str, due: Option<&str>, points: Option<i32>) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.into(),
            description: None,
            priority: None,
            due_date: due.map(Into::into),
            points,
        }
    }

    #[test]
    fn due_date_parsing() {
        assert_eq!(parse_due_date(Some("2024-01-05")).unwrap(), Some(date!(2024 - 01 - 05)));
        assert_eq!(parse_due_date(Some("  ")).unwrap(), None);
        assert_eq!(parse_due_date(None).unwrap(), None);
        assert!(matches!(
            parse_due_date(Some("05/01/2024")),
            Err(TaskError::Validation(_))
        ));
        assert!(parse_due_date(Some("2024-02-30")).is_err());
    }

    #[test]
    fn create_applies_defaults() {
        let t = create("  Write report ", None, None).validate().unwrap();
        assert_eq!(t.title, "Write report");
        assert_eq!(t.priority, Priority::Medium);
        assert_eq!(t.points, DEFAULT_POINTS);
        assert_eq!(t.due_date, None);
    }

    #[test]
    fn create_rejects_blank_title_and_non_positive_points() {
        assert!(create("   ", None, None).validate().is_err());
        assert!(create("ok", None, Some(0)).validate().is_err());
        assert!(create("ok", None, Some(-3)).validate().is_err());
        assert!(create("ok", Some("tomorrow"), None).validate().is_err());
    }

    #[test]
    fn create_caps_points() {
        assert_eq!(create("ok", None, Some(POINTS_MAX)).validate().unwrap().points, POINTS_MAX);
        let err = create("ok", None, Some(POINTS_MAX + 1)).validate().unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));

        let req: CreateTaskRequest =
            serde_json::from_str(r#"{"title":"x","points":2000000000}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn request_accepts_priority_names() {
        let req: CreateTaskRequest = serde_json::from_str(
            r#"{"title":"x","priority":"High","due_date":"2024-03-01","points":8}"#,
        )
        .unwrap();
        let t = req.validate().unwrap();
        assert_eq!(t.priority, Priority::High);
        assert_eq!(t.points, 8);
        assert_eq!(t.due_date, Some(date!(2024 - 03 - 01)));
    }

    #[test]
    fn response_formats_dates() {
        let mut task = crate::tasks::fixtures::pending(Priority::High, Some(date!(2024 - 01 - 09)));
        task.description = Some("d".into());
        let json = serde_json::to_value(TaskResponse::from_task(task, date!(2024 - 01 - 10))).unwrap();
        assert_eq!(json["due_date"], "2024-01-09");
        assert_eq!(json["overdue"], true);
        assert_eq!(json["due_today"], false);
        assert_eq!(json["status"], "Pending");
        assert!(json["completed_at"].is_null());
    }
}
