use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::timetable::TimetableEntry;

pub struct PlanSlot<'a> {
    pub student_id: Uuid,
    pub subject_id: &'a str,
    pub day_of_week: i16,
    pub planned_hours: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Insert or update the plan for (student, subject, weekday).
///
/// `actual_hours` is only written on insert, and window bounds that are not
/// supplied keep their stored value, so repeating the same call is a no-op.
pub async fn upsert_entry(db: &PgPool, slot: PlanSlot<'_>) -> Result<TimetableEntry, sqlx::Error> {
    sqlx::query_as::<_, TimetableEntry>(
        r#"
        INSERT INTO timetable_entries
            (id, student_id, subject_id, day_of_week, planned_hours, actual_hours, start_date, end_date)
        VALUES ($1, $2, $3, $4, $5, 0, $6, $7)
        ON CONFLICT (student_id, subject_id, day_of_week) DO UPDATE SET
            planned_hours = EXCLUDED.planned_hours,
            start_date = COALESCE(EXCLUDED.start_date, timetable_entries.start_date),
            end_date = COALESCE(EXCLUDED.end_date, timetable_entries.end_date),
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(slot.student_id)
    .bind(slot.subject_id)
    .bind(slot.day_of_week)
    .bind(slot.planned_hours)
    .bind(slot.start_date)
    .bind(slot.end_date)
    .fetch_one(db)
    .await
}

pub async fn find_for_student(
    db: &PgPool,
    student_id: Uuid,
) -> Result<Vec<TimetableEntry>, sqlx::Error> {
    sqlx::query_as::<_, TimetableEntry>(
        r#"
        SELECT * FROM timetable_entries
        WHERE student_id = $1
        ORDER BY day_of_week ASC, subject_id ASC
        "#,
    )
    .bind(student_id)
    .fetch_all(db)
    .await
}

pub async fn has_entries(db: &PgPool, student_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM timetable_entries WHERE student_id = $1)",
    )
    .bind(student_id)
    .fetch_one(db)
    .await
}

pub async fn delete_for_student(db: &PgPool, student_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM timetable_entries WHERE student_id = $1")
        .bind(student_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// Add logged hours to the matching plan slot's running counter.
/// A log with no matching slot leaves the table untouched.
pub async fn increment_actual(
    conn: &mut PgConnection,
    student_id: Uuid,
    subject_id: &str,
    day_of_week: i16,
    hours: f64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE timetable_entries
        SET actual_hours = actual_hours + $4, updated_at = NOW()
        WHERE student_id = $1 AND subject_id = $2 AND day_of_week = $3
        "#,
    )
    .bind(student_id)
    .bind(subject_id)
    .bind(day_of_week)
    .bind(hours)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn reset_actual(conn: &mut PgConnection, student_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE timetable_entries SET actual_hours = 0, updated_at = NOW() WHERE student_id = $1",
    )
    .bind(student_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn math_monday(student_id: Uuid, start_date: Option<NaiveDate>) -> PlanSlot<'static> {
        PlanSlot {
            student_id,
            subject_id: "Math",
            day_of_week: 0,
            planned_hours: 2.0,
            start_date,
            end_date: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_repeated_upsert_keeps_counter_and_bounds(pool: PgPool) {
        let student = fixtures::student(&pool).await;

        let first = upsert_entry(&pool, math_monday(student.id, Some(date("2024-06-01"))))
            .await
            .unwrap();
        let mut conn = pool.acquire().await.unwrap();
        increment_actual(&mut *conn, student.id, "Math", 0, 1.5)
            .await
            .unwrap();
        drop(conn);

        let second = upsert_entry(&pool, math_monday(student.id, None))
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.planned_hours, 2.0);
        assert_eq!(second.actual_hours, 1.5);
        assert_eq!(second.start_date, Some(date("2024-06-01")));
        assert_eq!(find_for_student(&pool, student.id).await.unwrap().len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_upsert_replaces_planned_hours_and_supplied_bounds(pool: PgPool) {
        let student = fixtures::student(&pool).await;
        upsert_entry(&pool, math_monday(student.id, Some(date("2024-06-01"))))
            .await
            .unwrap();

        let updated = upsert_entry(
            &pool,
            PlanSlot {
                planned_hours: 3.5,
                end_date: Some(date("2024-07-01")),
                ..math_monday(student.id, Some(date("2024-06-15")))
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.planned_hours, 3.5);
        assert_eq!(updated.start_date, Some(date("2024-06-15")));
        assert_eq!(updated.end_date, Some(date("2024-07-01")));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_increment_without_matching_slot_touches_nothing(pool: PgPool) {
        let student = fixtures::student(&pool).await;
        upsert_entry(&pool, math_monday(student.id, None))
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let touched = increment_actual(&mut *conn, student.id, "Math", 1, 4.0)
            .await
            .unwrap();
        assert_eq!(touched, 0);
        drop(conn);

        let entries = find_for_student(&pool, student.id).await.unwrap();
        assert_eq!(entries[0].actual_hours, 0.0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_for_student_counts_only_their_entries(pool: PgPool) {
        let student = fixtures::student(&pool).await;
        let other = fixtures::student(&pool).await;
        upsert_entry(&pool, math_monday(student.id, None)).await.unwrap();
        upsert_entry(
            &pool,
            PlanSlot {
                subject_id: "Science",
                ..math_monday(student.id, None)
            },
        )
        .await
        .unwrap();
        upsert_entry(&pool, math_monday(other.id, None)).await.unwrap();

        assert_eq!(delete_for_student(&pool, student.id).await.unwrap(), 2);
        assert!(!has_entries(&pool, student.id).await.unwrap());
        assert!(has_entries(&pool, other.id).await.unwrap());
    }
}
