use axum::{extract::State, Extension, Json};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::db;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::handlers::present;
use crate::services::assistant::{system_prompt, StudentContext};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct AskRequest {
    #[validate(
        required(message = "Message is required"),
        length(min = 1, max = 2000, message = "Message must be 1-2000 characters")
    )]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub response: String,
}

pub async fn ask(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<AskRequest>,
) -> AppResult<Json<AskResponse>> {
    if !state.assistant.is_configured() {
        return Err(AppError::Unavailable(
            "Server configuration error: AI API Key missing".into(),
        ));
    }

    body.validate()?;
    let question = present(body.message, "message")?;

    let user = db::users::find_by_id(&state.db, auth_user.id)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    let today = Utc::now().date_naive();
    let recent_logs =
        db::logs::find_in_range(&state.db, user.id, today - Duration::days(7), today).await?;
    let has_timetable = db::timetable::has_entries(&state.db, user.id).await?;

    let prompt = system_prompt(&StudentContext {
        name: &user.name,
        recent_logs: &recent_logs,
        has_timetable,
    });

    match state.assistant.ask(&prompt, &question).await {
        Ok(response) => Ok(Json(AskResponse { response })),
        Err(e) => {
            tracing::warn!(user_id = %user.id, error = %e, "Chat assistant request failed");
            Err(AppError::Unavailable(
                "Failed to generate AI response. Check API configuration.".into(),
            ))
        }
    }
}
