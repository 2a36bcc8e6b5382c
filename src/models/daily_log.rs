use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub id: Uuid,
    pub student_id: Uuid,
    pub subject_id: String,
    #[serde(rename = "date")]
    pub log_date: NaiveDate,
    pub hours_spent: f64,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDailyLogRequest {
    #[validate(required(message = "Missing studentId"))]
    pub student_id: Option<Uuid>,

    #[validate(required(message = "Missing subjectId"), length(min = 1, max = 100))]
    pub subject_id: Option<String>,

    #[validate(required(message = "Missing date"))]
    pub date: Option<String>,

    #[validate(
        required(message = "Missing hoursSpent"),
        range(max = 24.0, message = "hoursSpent must be at most 24")
    )]
    pub hours_spent: Option<f64>,

    pub notes: Option<String>,
}

impl CreateDailyLogRequest {
    /// `hoursSpent` must be strictly positive; an absent value is left to
    /// the `required` rule.
    pub fn validate_hours(&self) -> Result<(), String> {
        match self.hours_spent {
            Some(hours) if hours <= 0.0 => Err("hoursSpent must be greater than 0".into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogQuery {
    pub student_id: Option<Uuid>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}
