//! Filter and sort keywords for the task list, and the SQL they turn into.

use std::cmp::Ordering;

use serde::Serialize;
use time::Date;

use super::repo_types::{Task, TaskStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFilter {
    #[default]
    All,
    Overdue,
    Upcoming,
    Completed,
    Pending,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSort {
    #[default]
    CreatedDate,
    DueDate,
    Priority,
}

impl TaskFilter {
    /// Unknown keywords fall back to `all`.
    pub fn from_keyword(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "overdue" => Self::Overdue,
            "upcoming" => Self::Upcoming,
            "completed" => Self::Completed,
            "pending" => Self::Pending,
            _ => Self::All,
        }
    }

    /// Whether `sql` references today's date as `$2`.
    pub fn needs_today(self) -> bool {
        matches!(self, Self::Overdue | Self::Upcoming)
    }

    /// Predicate appended after `WHERE user_id = $1`.
    pub fn sql(self) -> &'static str {
        match self {
            Self::All => "",
            Self::Overdue => " AND status = 'Pending' AND due_date < $2",
            Self::Upcoming => " AND status = 'Pending' AND due_date >= $2",
            Self::Completed => " AND status = 'Completed'",
            Self::Pending => " AND status = 'Pending'",
        }
    }

    /// In-memory twin of `sql`.
    pub fn matches(self, task: &Task, today: Date) -> bool {
        match self {
            Self::All => true,
            Self::Overdue => task.is_overdue(today),
            Self::Upcoming => {
                task.status == TaskStatus::Pending && task.due_date.is_some_and(|d| d >= today)
            }
            Self::Completed => task.status == TaskStatus::Completed,
            Self::Pending => task.status == TaskStatus::Pending,
        }
    }
}

impl TaskSort {
    /// Unknown keywords fall back to `created_date`.
    pub fn from_keyword(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "due_date" => Self::DueDate,
            "priority" => Self::Priority,
            _ => Self::CreatedDate,
        }
    }

    /// Always a total order; tasks without a due date go last under `due_date`.
    pub fn sql(self) -> &'static str {
        match self {
            Self::CreatedDate => " ORDER BY created_at DESC, id ASC",
            Self::DueDate => " ORDER BY due_date ASC NULLS LAST, created_at DESC, id ASC",
            // task_priority enum is declared High, Medium, Low
            Self::Priority => " ORDER BY priority ASC, created_at DESC, id ASC",
        }
    }

    /// In-memory twin of `sql`.
    pub fn compare(self, a: &Task, b: &Task) -> Ordering {
        let newest_first = || b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id));
        match self {
            Self::CreatedDate => newest_first(),
            Self::DueDate => match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
            .then_with(newest_first),
            Self::Priority => a.priority.cmp(&b.priority).then_with(newest_first),
        }
    }
}

/// Query shape for `repo::list`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskQuery {
    pub filter: TaskFilter,
    pub sort: TaskSort,
}

impl TaskQuery {
    pub fn from_keywords(filter: Option<&str>, sort: Option<&str>) -> Self {
        Self {
            filter: filter.map(TaskFilter::from_keyword).unwrap_or_default(),
            sort: sort.map(TaskSort::from_keyword).unwrap_or_default(),
        }
    }

    /// Everything after the `FROM tasks` clause.
    pub fn tail_sql(&self) -> String {
        format!("WHERE user_id = $1{}{}", self.filter.sql(), self.sort.sql())
    }

    /// Applies filter and ordering to tasks already in memory.
    pub fn apply(&self, mut tasks: Vec<Task>, today: Date) -> Vec<Task> {
        tasks.retain(|t| self.filter.matches(t, today));
        tasks.sort_by(|a, b| self.sort.compare(a, b));
        tasks
    }
}
