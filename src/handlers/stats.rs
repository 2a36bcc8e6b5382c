use axum::{extract::State, Extension, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::access::ensure_student_access;
use crate::auth::middleware::AuthUser;
use crate::db;
use crate::error::AppResult;
use crate::extract::{AppPath, AppQuery};
use crate::models::stats::{StatsQuery, StatsSummary};
use crate::services::reconcile::{self, DateWindow};
use crate::AppState;

pub async fn get_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppPath(student_id): AppPath<Uuid>,
    AppQuery(query): AppQuery<StatsQuery>,
) -> AppResult<Json<StatsSummary>> {
    let reference =
        reconcile::reference_date(query.date.as_deref(), Utc::now().date_naive())?;
    ensure_student_access(&state.db, &auth_user, student_id).await?;

    let window = DateWindow::for_period(query.period, reference);
    let plan = db::timetable::find_for_student(&state.db, student_id).await?;
    let logs = db::logs::find_in_dates(&state.db, student_id, &window.dates()).await?;

    Ok(Json(reconcile::aggregate_stats(
        student_id,
        query.period,
        reference,
        &plan,
        &logs,
    )))
}
