use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// One planned slot: `planned_hours` of `subject_id` on every `day_of_week`
/// (0 = Monday .. 6 = Sunday) inside the optional validity window.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TimetableEntry {
    pub id: Uuid,
    pub student_id: Uuid,
    pub subject_id: String,
    pub day_of_week: i16,
    pub planned_hours: f64,
    pub actual_hours: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertTimetableRequest {
    #[validate(required(message = "Missing studentId"))]
    pub student_id: Option<Uuid>,

    #[validate(required(message = "Missing subjectId"), length(min = 1, max = 100))]
    pub subject_id: Option<String>,

    #[validate(
        required(message = "Missing dayOfWeek"),
        range(min = 0, max = 6, message = "dayOfWeek must be between 0 (Monday) and 6 (Sunday)")
    )]
    pub day_of_week: Option<i16>,

    #[validate(
        required(message = "Missing plannedHours"),
        range(min = 0.0, max = 24.0, message = "plannedHours must be between 0 and 24")
    )]
    pub planned_hours: Option<f64>,

    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentQuery {
    pub student_id: Option<Uuid>,
}

/// A reconciled (weekday, subject) slot in the weekly timetable view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableSlot {
    /// The plan entry's id, or the first contributing log's id when the
    /// slot has no plan behind it.
    pub id: Uuid,
    pub day_of_week: i16,
    pub subject_id: String,
    pub planned_hours: f64,
    pub actual_hours: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
