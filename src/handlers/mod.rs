pub mod auth;
pub mod chat;
pub mod daily_logs;
pub mod daily_tasks;
pub mod health;
pub mod notifications;
pub mod stats;
pub mod timetable;

use crate::error::{AppError, AppResult};

/// Unwrap a required request field, reporting it by its wire name.
pub(crate) fn present<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::Validation(format!("Missing {field}")))
}
