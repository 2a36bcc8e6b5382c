use axum::{extract::State, http::StatusCode, Extension, Json};
use serde_json::{json, Value};
use validator::Validate;

use crate::auth::{
    jwt::{create_token_pair, verify_token, TokenPair, TokenType},
    middleware::AuthUser,
    password::{hash_password, verify_password},
};
use crate::db;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::handlers::present;
use crate::models::user::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RefreshRequest, RegisterRequest,
    UpdateWizardRequest, UserProfile, UserRole,
};
use crate::AppState;

pub async fn register(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    body.validate()?;
    let name = present(body.name, "name")?;
    let email = present(body.email, "email")?.trim().to_lowercase();
    let password = present(body.password, "password")?;
    let role = present(body.role, "role")?;

    if db::users::email_exists(&state.db, &email).await? {
        return Err(AppError::Conflict("User already exists".into()));
    }

    if let Some(parent_id) = body.linked_parent_id {
        let parent = db::users::find_by_id(&state.db, parent_id).await?;
        if !matches!(parent, Some(ref p) if p.role == UserRole::Parent) {
            return Err(AppError::Validation(
                "linkedParentId must refer to a parent account".into(),
            ));
        }
    }

    let password_hash = hash_password(&password)?;
    let user = db::users::create_user(
        &state.db,
        db::users::NewUser {
            name: &name,
            email: &email,
            password_hash: &password_hash,
            role,
            phone_number: body.phone_number.as_deref(),
            linked_parent_id: body.linked_parent_id,
        },
    )
    .await
    // A concurrent registration can win the race past `email_exists`
    .map_err(|e| AppError::conflict_on_duplicate(e, "User already exists"))?;

    tracing::info!(user_id = %user.id, role = ?user.role, "User registered");

    let tokens = create_token_pair(user.id, user.role, &state.config)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: Some("User registered successfully".into()),
            user: user.into(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    body.validate()?;
    let email = present(body.email, "email")?.trim().to_lowercase();
    let password = present(body.password, "password")?;

    let user = db::users::find_by_email(&state.db, &email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    let tokens = create_token_pair(user.id, user.role, &state.config)?;
    Ok(Json(AuthResponse {
        message: None,
        user: user.into(),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
    }))
}

pub async fn refresh(
    State(state): State<AppState>,
    AppJson(body): AppJson<RefreshRequest>,
) -> AppResult<Json<TokenPair>> {
    body.validate()?;
    let raw = present(body.refresh_token, "refreshToken")?;

    let token_data = verify_token(&raw, &state.config)?;
    if token_data.claims.token_type != TokenType::Refresh {
        return Err(AppError::Unauthorized);
    }

    // Re-read the role so a deleted account cannot keep refreshing.
    let user = db::users::find_by_id(&state.db, token_data.claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(create_token_pair(user.id, user.role, &state.config)?))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<UserProfile>> {
    let user = db::users::find_by_id(&state.db, auth_user.id)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    Ok(Json(user.into()))
}

pub async fn update_wizard(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<UpdateWizardRequest>,
) -> AppResult<Json<Value>> {
    body.validate()?;
    let seen = present(body.has_seen_wizard, "hasSeenWizard")?;

    if db::users::set_wizard_seen(&state.db, auth_user.id, seen).await? == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }

    Ok(Json(json!({ "message": "Wizard status updated successfully" })))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<ChangePasswordRequest>,
) -> AppResult<Json<Value>> {
    body.validate()?;
    let current = present(body.current_password, "currentPassword")?;
    let new_password = present(body.new_password, "newPassword")?;

    let user = db::users::find_by_id(&state.db, auth_user.id)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    if !verify_password(&current, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    let new_hash = hash_password(&new_password)?;
    db::users::set_password_hash(&state.db, user.id, &new_hash).await?;
    tracing::info!(user_id = %user.id, "Password changed");

    Ok(Json(json!({ "message": "Password updated successfully" })))
}
