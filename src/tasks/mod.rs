pub mod analytics;
pub mod badge;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod points;
pub mod query;
pub mod repo;
pub mod repo_types;
pub mod services;

#[cfg(test)]
mod fixtures;

use crate::state::AppState;
use axum::Router;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::task_routes())
        .merge(handlers::stats_routes())
}
