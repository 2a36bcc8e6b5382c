//! Who may act on a student's records.
//!
//! A caller may read or write a student's timetable, logs, stats and tasks
//! when the caller is that student, or is a parent account the student is
//! linked to. Everyone else gets 403.

use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::db;
use crate::error::{AppError, AppResult};
use crate::models::user::UserRole;

/// Decision that can be made from the token alone, without a lookup.
#[derive(Debug, PartialEq, Eq)]
enum Precheck {
    Allowed,
    Denied,
    NeedsParentLink,
}

fn precheck(caller: &AuthUser, student_id: Uuid) -> Precheck {
    if caller.id == student_id {
        Precheck::Allowed
    } else if caller.role == UserRole::Parent {
        Precheck::NeedsParentLink
    } else {
        Precheck::Denied
    }
}

pub async fn ensure_student_access(
    db: &PgPool,
    caller: &AuthUser,
    student_id: Uuid,
) -> AppResult<()> {
    match precheck(caller, student_id) {
        Precheck::Allowed => Ok(()),
        Precheck::Denied => Err(AppError::Forbidden),
        Precheck::NeedsParentLink => {
            if db::users::is_linked_parent(db, student_id, caller.id).await? {
                Ok(())
            } else {
                tracing::warn!(
                    caller = %caller.id,
                    student_id = %student_id,
                    "Parent is not linked to requested student"
                );
                Err(AppError::Forbidden)
            }
        }
    }
}

/// Resolve an optional `studentId` parameter (defaulting to the caller)
/// and check access to it.
pub async fn resolve_student(
    db: &PgPool,
    caller: &AuthUser,
    student_id: Option<Uuid>,
) -> AppResult<Uuid> {
    let target = student_id.unwrap_or(caller.id);
    ensure_student_access(db, caller, target).await?;
    Ok(target)
}
