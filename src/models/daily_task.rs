use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyTask {
    pub id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    #[serde(rename = "date")]
    pub task_date: NaiveDate,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDailyTaskRequest {
    #[validate(required(message = "Missing studentId"))]
    pub student_id: Option<Uuid>,

    #[validate(required(message = "Missing title"), length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(required(message = "Missing date"))]
    pub date: Option<String>,
}

impl CreateDailyTaskRequest {
    /// A title made only of whitespace would be stored empty after trimming.
    pub fn validate_title(&self) -> Result<(), String> {
        match self.title.as_deref() {
            Some(title) if title.trim().is_empty() => Err("Title must not be blank".into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTaskQuery {
    pub student_id: Option<Uuid>,
    pub date: Option<String>,
}
