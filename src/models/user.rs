use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub phone_number: Option<String>,
    pub linked_parent_id: Option<Uuid>,
    pub has_seen_wizard: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Parent,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Student
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(required(message = "Missing name"), length(min = 1, max = 100))]
    pub name: Option<String>,

    #[validate(required(message = "Missing email or password"), email)]
    pub email: Option<String>,

    #[validate(
        required(message = "Missing email or password"),
        length(min = 8, max = 128, message = "Password must be 8-128 characters")
    )]
    pub password: Option<String>,

    #[validate(required(message = "Missing role"))]
    pub role: Option<UserRole>,

    pub phone_number: Option<String>,
    pub linked_parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(required(message = "Missing email or password"))]
    pub email: Option<String>,

    #[validate(required(message = "Missing email or password"))]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(required(message = "Missing refreshToken"))]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWizardRequest {
    #[validate(required(message = "Missing hasSeenWizard field"))]
    pub has_seen_wizard: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(required(message = "Missing currentPassword"))]
    pub current_password: Option<String>,

    #[validate(
        required(message = "Missing newPassword"),
        length(min = 8, max = 128, message = "Password must be 8-128 characters")
    )]
    pub new_password: Option<String>,
}

/// Public projection of a user, as returned by auth endpoints and `/me`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub phone_number: Option<String>,
    pub linked_parent_id: Option<Uuid>,
    pub has_seen_wizard: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            phone_number: u.phone_number,
            linked_parent_id: u.linked_parent_id,
            has_seen_wizard: u.has_seen_wizard,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub user: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_requires_email_and_password() {
        let req: RegisterRequest =
            serde_json::from_value(serde_json::json!({ "name": "Asha", "role": "student" }))
                .unwrap();
        let err = req.validate().unwrap_err();
        let fields = err.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_register_accepts_camel_case_body() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "name": "Asha",
            "email": "asha@example.com",
            "password": "long-enough-pw",
            "role": "parent",
            "phoneNumber": "+15550001111",
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.role, Some(UserRole::Parent));
        assert_eq!(req.phone_number.as_deref(), Some("+15550001111"));
    }

    #[test]
    fn test_profile_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            role: UserRole::Student,
            phone_number: None,
            linked_parent_id: None,
            has_seen_wizard: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));

        let profile = serde_json::to_value(UserProfile::from(user)).unwrap();
        assert_eq!(profile["hasSeenWizard"], false);
        assert_eq!(profile["role"], "student");
    }
}
