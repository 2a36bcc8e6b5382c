use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::auth::middleware::AuthUser;
use crate::db;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::services::notifier::Delivery;
use crate::AppState;

const TEST_MESSAGE: &str = "This is a test message from StudyTrack.";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestNotificationRequest {
    pub phone_number: Option<String>,
}

/// Send a test WhatsApp message to `phoneNumber`, or to the caller's own
/// number when none is given.
pub async fn send_test(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    body: Option<AppJson<TestNotificationRequest>>,
) -> AppResult<Json<Delivery>> {
    let body = body.map(|AppJson(b)| b).unwrap_or_default();

    let to = match body.phone_number.filter(|p| !p.trim().is_empty()) {
        Some(number) => number,
        None => db::users::find_by_id(&state.db, auth_user.id)
            .await?
            .and_then(|u| u.phone_number)
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                AppError::Validation("phoneNumber is required when no number is on file".into())
            })?,
    };

    Ok(Json(state.notifier.send_whatsapp(&to, TEST_MESSAGE).await))
}
