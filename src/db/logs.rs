use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use super::timetable;
use crate::models::daily_log::DailyLog;
use crate::services::reconcile::day_index;

pub struct NewLog<'a> {
    pub student_id: Uuid,
    pub subject_id: &'a str,
    pub date: NaiveDate,
    pub hours_spent: f64,
    pub notes: &'a str,
}

/// Record a study session and bump the matching plan slot's counter in the
/// same transaction, so the two never drift apart.
pub async fn create_log(db: &PgPool, new: NewLog<'_>) -> Result<DailyLog, sqlx::Error> {
    let mut tx = db.begin().await?;

    let log = sqlx::query_as::<_, DailyLog>(
        r#"
        INSERT INTO daily_logs (id, student_id, subject_id, log_date, hours_spent, notes)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.student_id)
    .bind(new.subject_id)
    .bind(new.date)
    .bind(new.hours_spent)
    .bind(new.notes)
    .fetch_one(&mut *tx)
    .await?;

    timetable::increment_actual(
        &mut *tx,
        new.student_id,
        new.subject_id,
        day_index(new.date),
        new.hours_spent,
    )
    .await?;

    tx.commit().await?;
    Ok(log)
}

/// Logs dated on any of `dates`.
pub async fn find_in_dates(
    db: &PgPool,
    student_id: Uuid,
    dates: &[NaiveDate],
) -> Result<Vec<DailyLog>, sqlx::Error> {
    sqlx::query_as::<_, DailyLog>(
        r#"
        SELECT * FROM daily_logs
        WHERE student_id = $1 AND log_date = ANY($2)
        ORDER BY log_date ASC, created_at ASC
        "#,
    )
    .bind(student_id)
    .bind(dates)
    .fetch_all(db)
    .await
}

pub async fn find_in_range(
    db: &PgPool,
    student_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DailyLog>, sqlx::Error> {
    sqlx::query_as::<_, DailyLog>(
        r#"
        SELECT * FROM daily_logs
        WHERE student_id = $1 AND log_date BETWEEN $2 AND $3
        ORDER BY log_date DESC, created_at DESC
        "#,
    )
    .bind(student_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await
}

/// Delete every log for the student and zero their plan counters.
/// Returns the number of logs removed.
pub async fn delete_all_for_student(db: &PgPool, student_id: Uuid) -> Result<u64, sqlx::Error> {
    let mut tx = db.begin().await?;

    let deleted = sqlx::query("DELETE FROM daily_logs WHERE student_id = $1")
        .bind(student_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    timetable::reset_actual(&mut *tx, student_id).await?;

    tx.commit().await?;
    Ok(deleted)
}
