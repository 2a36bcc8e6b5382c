use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::auth::access::{ensure_student_access, resolve_student};
use crate::auth::middleware::AuthUser;
use crate::db;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::handlers::present;
use crate::models::daily_task::{CreateDailyTaskRequest, DailyTask, DailyTaskQuery};
use crate::services::reconcile::parse_date;
use crate::AppState;

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppQuery(query): AppQuery<DailyTaskQuery>,
) -> AppResult<Json<Vec<DailyTask>>> {
    let raw_date = query
        .date
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Date is required".into()))?;
    let date = parse_date(raw_date, "date")?;

    let student_id = resolve_student(&state.db, &auth_user, query.student_id).await?;
    let tasks = db::tasks::find_by_date(&state.db, student_id, date).await?;

    Ok(Json(tasks))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<CreateDailyTaskRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    body.validate()?;
    body.validate_title().map_err(AppError::Validation)?;
    let student_id = present(body.student_id, "studentId")?;
    let title = present(body.title, "title")?;
    let date = parse_date(&present(body.date, "date")?, "date")?;

    ensure_student_access(&state.db, &auth_user, student_id).await?;

    let task = db::tasks::create_task(&state.db, student_id, title.trim(), date).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Task created", "id": task.id })),
    ))
}

/// Load a task the caller may act on. Tasks belonging to students the
/// caller has no access to are reported as missing.
async fn find_accessible_task(
    state: &AppState,
    auth_user: &AuthUser,
    task_id: Uuid,
) -> AppResult<DailyTask> {
    let task = db::tasks::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    match ensure_student_access(&state.db, auth_user, task.student_id).await {
        Ok(()) => Ok(task),
        Err(AppError::Forbidden) => Err(AppError::NotFound("Task not found".into())),
        Err(e) => Err(e),
    }
}

pub async fn toggle_task(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppPath(task_id): AppPath<Uuid>,
) -> AppResult<Json<Value>> {
    let task = find_accessible_task(&state, &auth_user, task_id).await?;

    let is_completed = db::tasks::toggle_completed(&state.db, task.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(Json(json!({
        "message": "Task updated",
        "isCompleted": is_completed,
    })))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppPath(task_id): AppPath<Uuid>,
) -> AppResult<Json<Value>> {
    let task = find_accessible_task(&state, &auth_user, task_id).await?;

    if db::tasks::delete_task(&state.db, task.id).await? == 0 {
        return Err(AppError::NotFound("Task not found".into()));
    }

    Ok(Json(json!({ "message": "Task deleted" })))
}
