use axum::{extract::State, Extension, Json};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::auth::access::{ensure_student_access, resolve_student};
use crate::auth::middleware::AuthUser;
use crate::db;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::handlers::present;
use crate::models::timetable::{StudentQuery, TimetableQuery, TimetableSlot, UpsertTimetableRequest};
use crate::services::reconcile::{self, DateWindow};
use crate::AppState;

/// Plan and actual hours for the week containing `?date=` (default today).
pub async fn get_week(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppPath(student_id): AppPath<Uuid>,
    AppQuery(query): AppQuery<TimetableQuery>,
) -> AppResult<Json<Vec<TimetableSlot>>> {
    let reference =
        reconcile::reference_date(query.date.as_deref(), Utc::now().date_naive())?;
    ensure_student_access(&state.db, &auth_user, student_id).await?;

    let week = DateWindow::week_of(reference);
    let plan = db::timetable::find_for_student(&state.db, student_id).await?;
    let logs = db::logs::find_in_dates(&state.db, student_id, &week.dates()).await?;

    Ok(Json(reconcile::merge_week(&week, &plan, &logs)))
}

pub async fn upsert_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<UpsertTimetableRequest>,
) -> AppResult<Json<Value>> {
    body.validate()?;
    let student_id = present(body.student_id, "studentId")?;
    let subject_id = present(body.subject_id, "subjectId")?;
    let day_of_week = present(body.day_of_week, "dayOfWeek")?;
    let planned_hours = present(body.planned_hours, "plannedHours")?;

    let start_date = body
        .start_date
        .as_deref()
        .map(|d| reconcile::parse_date(d, "startDate"))
        .transpose()?;
    let end_date = body
        .end_date
        .as_deref()
        .map(|d| reconcile::parse_date(d, "endDate"))
        .transpose()?;
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(AppError::Validation(
                "startDate must not be after endDate".into(),
            ));
        }
    }

    ensure_student_access(&state.db, &auth_user, student_id).await?;

    let entry = db::timetable::upsert_entry(
        &state.db,
        db::timetable::PlanSlot {
            student_id,
            subject_id: subject_id.trim(),
            day_of_week,
            planned_hours,
            start_date,
            end_date,
        },
    )
    .await?;

    Ok(Json(json!({ "message": "Timetable updated", "id": entry.id })))
}

pub async fn reset(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppQuery(query): AppQuery<StudentQuery>,
) -> AppResult<Json<Value>> {
    let student_id = resolve_student(&state.db, &auth_user, query.student_id).await?;

    let deleted = db::timetable::delete_for_student(&state.db, student_id).await?;
    tracing::info!(student_id = %student_id, deleted = deleted, "Timetable reset");

    Ok(Json(json!({
        "message": "Timetable reset successfully",
        "deletedCount": deleted,
    })))
}
