use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use validator::Validate;

use crate::auth::access::{ensure_student_access, resolve_student};
use crate::auth::middleware::AuthUser;
use crate::db;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery};
use crate::handlers::present;
use crate::models::daily_log::{CreateDailyLogRequest, DailyLog, DailyLogQuery};
use crate::models::timetable::StudentQuery;
use crate::services::reconcile;
use crate::AppState;

pub async fn create_log(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<CreateDailyLogRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    body.validate()?;
    body.validate_hours().map_err(AppError::Validation)?;
    let student_id = present(body.student_id, "studentId")?;
    let subject_id = present(body.subject_id, "subjectId")?;
    let date = reconcile::parse_date(&present(body.date, "date")?, "date")?;
    let hours_spent = present(body.hours_spent, "hoursSpent")?;

    ensure_student_access(&state.db, &auth_user, student_id).await?;

    let log = db::logs::create_log(
        &state.db,
        db::logs::NewLog {
            student_id,
            subject_id: subject_id.trim(),
            date,
            hours_spent,
            notes: body.notes.as_deref().unwrap_or(""),
        },
    )
    .await?;

    tracing::info!(
        student_id = %student_id,
        subject_id = %log.subject_id,
        date = %log.log_date,
        hours = log.hours_spent,
        "Study log created"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Log created", "id": log.id })),
    ))
}

/// Logs between `startDate` and `endDate`, defaulting to the last 30 days.
pub async fn list_logs(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppQuery(query): AppQuery<DailyLogQuery>,
) -> AppResult<Json<Vec<DailyLog>>> {
    let today = Utc::now().date_naive();
    let end = match query.end_date.as_deref() {
        Some(d) => reconcile::parse_date(d, "endDate")?,
        None => today,
    };
    let start = match query.start_date.as_deref() {
        Some(d) => reconcile::parse_date(d, "startDate")?,
        None => end - Duration::days(30),
    };
    if start > end {
        return Err(AppError::Validation(
            "startDate must not be after endDate".into(),
        ));
    }

    let student_id = resolve_student(&state.db, &auth_user, query.student_id).await?;
    let logs = db::logs::find_in_range(&state.db, student_id, start, end).await?;

    Ok(Json(logs))
}

pub async fn reset_logs(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppQuery(query): AppQuery<StudentQuery>,
) -> AppResult<Json<Value>> {
    let student_id = resolve_student(&state.db, &auth_user, query.student_id).await?;

    let deleted = db::logs::delete_all_for_student(&state.db, student_id).await?;
    tracing::info!(student_id = %student_id, deleted = deleted, "Study logs reset");

    Ok(Json(json!({
        "message": format!("Deleted {} logs and reset usage.", deleted),
        "deletedCount": deleted,
    })))
}
