use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::{User, UserRole};

pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: UserRole,
    pub phone_number: Option<&'a str>,
    pub linked_parent_id: Option<Uuid>,
}

pub async fn create_user(db: &PgPool, user: NewUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, name, email, password_hash, role, phone_number, linked_parent_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.name)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.role)
    .bind(user.phone_number)
    .bind(user.linked_parent_id)
    .fetch_one(db)
    .await
}

pub async fn email_exists(db: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(email)
        .fetch_one(db)
        .await?;
    Ok(count > 0)
}

pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(db)
        .await
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Returns the number of rows touched; 0 means the user no longer exists.
pub async fn set_wizard_seen(db: &PgPool, id: Uuid, seen: bool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET has_seen_wizard = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(seen)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

pub async fn set_password_hash(
    db: &PgPool,
    id: Uuid,
    password_hash: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(password_hash)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

pub async fn is_linked_parent(
    db: &PgPool,
    student_id: Uuid,
    parent_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE id = $1 AND linked_parent_id = $2",
    )
    .bind(student_id)
    .bind(parent_id)
    .fetch_one(db)
    .await?;
    Ok(count > 0)
}

/// A student with unfinished tasks for a given day, and how many.
#[derive(Debug, sqlx::FromRow)]
pub struct ReminderTarget {
    pub id: Uuid,
    pub name: String,
    pub phone_number: String,
    pub open_tasks: i64,
}

pub async fn find_with_open_tasks(
    db: &PgPool,
    on: chrono::NaiveDate,
) -> Result<Vec<ReminderTarget>, sqlx::Error> {
    sqlx::query_as::<_, ReminderTarget>(
        r#"
        SELECT u.id, u.name, u.phone_number, COUNT(t.id) AS open_tasks
        FROM users u
        JOIN daily_tasks t ON t.student_id = u.id
        WHERE t.task_date = $1
          AND t.is_completed = false
          AND u.phone_number IS NOT NULL
          AND u.phone_number <> ''
        GROUP BY u.id, u.name, u.phone_number
        "#,
    )
    .bind(on)
    .fetch_all(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures;
    use crate::error::AppError;

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_email_insert_maps_to_conflict(pool: PgPool) {
        let first = fixtures::student(&pool).await;

        let err = create_user(
            &pool,
            NewUser {
                name: "Second",
                email: &first.email,
                password_hash: "not-a-real-hash",
                role: UserRole::Student,
                phone_number: None,
                linked_parent_id: None,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            AppError::conflict_on_duplicate(err, "User already exists"),
            AppError::Conflict(_)
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_parent_link_lookup(pool: PgPool) {
        let parent = fixtures::user(&pool, UserRole::Parent, None).await;
        let child = fixtures::user(&pool, UserRole::Student, Some(parent.id)).await;
        let stranger = fixtures::user(&pool, UserRole::Parent, None).await;

        assert!(is_linked_parent(&pool, child.id, parent.id).await.unwrap());
        assert!(!is_linked_parent(&pool, child.id, stranger.id).await.unwrap());
    }
}
