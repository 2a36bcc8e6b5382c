use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::daily_task::DailyTask;

pub async fn create_task(
    db: &PgPool,
    student_id: Uuid,
    title: &str,
    date: NaiveDate,
) -> Result<DailyTask, sqlx::Error> {
    sqlx::query_as::<_, DailyTask>(
        r#"
        INSERT INTO daily_tasks (id, student_id, title, task_date)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(title)
    .bind(date)
    .fetch_one(db)
    .await
}

pub async fn find_by_date(
    db: &PgPool,
    student_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<DailyTask>, sqlx::Error> {
    sqlx::query_as::<_, DailyTask>(
        r#"
        SELECT * FROM daily_tasks
        WHERE student_id = $1 AND task_date = $2
        ORDER BY created_at ASC
        "#,
    )
    .bind(student_id)
    .bind(date)
    .fetch_all(db)
    .await
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<DailyTask>, sqlx::Error> {
    sqlx::query_as::<_, DailyTask>("SELECT * FROM daily_tasks WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Flip the completion flag and return the new value, or `None` when the
/// task does not exist.
pub async fn toggle_completed(db: &PgPool, id: Uuid) -> Result<Option<bool>, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        UPDATE daily_tasks SET is_completed = NOT is_completed
        WHERE id = $1
        RETURNING is_completed
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn delete_task(db: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM daily_tasks WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_toggle_flips_and_reports_new_value(pool: PgPool) {
        let student = fixtures::student(&pool).await;
        let task = create_task(&pool, student.id, "Read chapter 4", today())
            .await
            .unwrap();
        assert!(!task.is_completed);

        assert_eq!(toggle_completed(&pool, task.id).await.unwrap(), Some(true));
        assert!(find_by_id(&pool, task.id).await.unwrap().unwrap().is_completed);
        assert_eq!(toggle_completed(&pool, task.id).await.unwrap(), Some(false));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_toggle_unknown_task_is_none(pool: PgPool) {
        assert_eq!(toggle_completed(&pool, Uuid::new_v4()).await.unwrap(), None);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_and_list_by_date(pool: PgPool) {
        let student = fixtures::student(&pool).await;
        let keep = create_task(&pool, student.id, "Flashcards", today())
            .await
            .unwrap();
        let gone = create_task(&pool, student.id, "Essay outline", today())
            .await
            .unwrap();
        create_task(&pool, student.id, "Tomorrow", today().succ_opt().unwrap())
            .await
            .unwrap();

        assert_eq!(delete_task(&pool, gone.id).await.unwrap(), 1);
        assert_eq!(delete_task(&pool, gone.id).await.unwrap(), 0);

        let remaining = find_by_date(&pool, student.id, today()).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keep.id);
    }
}
