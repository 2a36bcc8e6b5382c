//! Plan-versus-actual reconciliation.
//!
//! Timetable entries describe what a student intends to study on each weekday;
//! daily logs record what was actually studied on a calendar date. Both views
//! in this module recompute actual hours from the logs, so the stored
//! `actual_hours` counter on timetable entries is never read here.
//!
//! Everything in this module is pure: callers fetch the records and pass them
//! in, which keeps the merge rules testable without a database.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::daily_log::DailyLog;
use crate::models::stats::{Period, StatsSummary, SubjectStats};
use crate::models::timetable::{TimetableEntry, TimetableSlot};

/// Parse a `YYYY-MM-DD` value, naming the offending field on failure.
pub fn parse_date(raw: &str, field: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::Validation(format!("Invalid {field} format. Use YYYY-MM-DD"))
    })
}

/// Resolve the optional `date` query parameter. Absent means `today`;
/// malformed is rejected rather than silently replaced.
pub fn reference_date(raw: Option<&str>, today: NaiveDate) -> AppResult<NaiveDate> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_date(raw, "date"),
        None => Ok(today),
    }
}

/// Weekday index used by timetable entries: 0 = Monday .. 6 = Sunday.
pub fn day_index(date: NaiveDate) -> i16 {
    date.weekday().num_days_from_monday() as i16
}

/// An inclusive, contiguous range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// The Monday-anchored week containing `date`.
    pub fn week_of(date: NaiveDate) -> Self {
        let start = date - Duration::days(date.weekday().num_days_from_monday() as i64);
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn for_period(period: Period, reference: NaiveDate) -> Self {
        match period {
            Period::Daily => Self::single_day(reference),
            Period::Weekly => Self::week_of(reference),
        }
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.start
            .iter_days()
            .take_while(|d| *d <= self.end)
            .collect()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Weekday indices covered by the window, without duplicates.
    fn weekdays(&self) -> Vec<i16> {
        let mut days: Vec<i16> = self.dates().into_iter().map(day_index).take(7).collect();
        days.sort_unstable();
        days.dedup();
        days
    }
}

/// Whether a plan entry's validity window overlaps `window`.
/// Missing bounds are open-ended.
pub fn is_active_during(entry: &TimetableEntry, window: &DateWindow) -> bool {
    if matches!(entry.start_date, Some(start) if start > window.end) {
        return false;
    }
    if matches!(entry.end_date, Some(end) if end < window.start) {
        return false;
    }
    true
}

/// Build the weekly timetable view: one slot per (weekday, subject) present
/// in either the active plan or the week's logs.
///
/// Slots are returned sorted by weekday, then subject.
pub fn merge_week(
    week: &DateWindow,
    plan: &[TimetableEntry],
    logs: &[DailyLog],
) -> Vec<TimetableSlot> {
    let mut merged: BTreeMap<(i16, String), TimetableSlot> = BTreeMap::new();

    for entry in plan.iter().filter(|e| is_active_during(e, week)) {
        merged.insert(
            (entry.day_of_week, entry.subject_id.clone()),
            TimetableSlot {
                id: entry.id,
                day_of_week: entry.day_of_week,
                subject_id: entry.subject_id.clone(),
                planned_hours: entry.planned_hours,
                actual_hours: 0.0,
                start_date: entry.start_date,
                end_date: entry.end_date,
            },
        );
    }

    for log in logs.iter().filter(|l| week.contains(l.log_date)) {
        let day = day_index(log.log_date);
        let slot = merged
            .entry((day, log.subject_id.clone()))
            .or_insert_with(|| TimetableSlot {
                id: log.id,
                day_of_week: day,
                subject_id: log.subject_id.clone(),
                planned_hours: 0.0,
                actual_hours: 0.0,
                start_date: None,
                end_date: None,
            });
        slot.actual_hours += log.hours_spent;
    }

    merged.into_values().collect()
}

#[derive(Default)]
struct Totals {
    actual: f64,
    planned: f64,
}

/// Aggregate planned and actual hours per subject for a period.
///
/// A plan entry counts when its weekday falls inside the period and its
/// validity window overlaps the period; the same rule is used by
/// [`merge_week`], so daily and weekly figures agree with the timetable view.
pub fn aggregate_stats(
    student_id: Uuid,
    period: Period,
    reference: NaiveDate,
    plan: &[TimetableEntry],
    logs: &[DailyLog],
) -> StatsSummary {
    let window = DateWindow::for_period(period, reference);
    let weekdays = window.weekdays();

    let mut subjects: BTreeMap<String, Totals> = BTreeMap::new();

    for entry in plan
        .iter()
        .filter(|e| weekdays.contains(&e.day_of_week) && is_active_during(e, &window))
    {
        subjects.entry(entry.subject_id.clone()).or_default().planned += entry.planned_hours;
    }

    for log in logs.iter().filter(|l| window.contains(l.log_date)) {
        subjects.entry(log.subject_id.clone()).or_default().actual += log.hours_spent;
    }

    let subject_breakdown: Vec<SubjectStats> = subjects
        .into_iter()
        .map(|(subject_id, totals)| SubjectStats {
            subject_id,
            hours: totals.actual,
            planned: totals.planned,
        })
        .collect();

    StatsSummary {
        student_id,
        period,
        start_date: window.start,
        end_date: window.end,
        total_hours: subject_breakdown.iter().map(|s| s.hours).sum(),
        planned_hours: subject_breakdown.iter().map(|s| s.planned).sum(),
        subject_breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn plan(student_id: Uuid, subject: &str, day: i16, hours: f64) -> TimetableEntry {
        TimetableEntry {
            id: Uuid::new_v4(),
            student_id,
            subject_id: subject.into(),
            day_of_week: day,
            planned_hours: hours,
            actual_hours: 0.0,
            start_date: None,
            end_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn log(student_id: Uuid, subject: &str, on: &str, hours: f64) -> DailyLog {
        DailyLog {
            id: Uuid::new_v4(),
            student_id,
            subject_id: subject.into(),
            log_date: date(on),
            hours_spent: hours,
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    fn breakdown<'a>(summary: &'a StatsSummary, subject: &str) -> &'a SubjectStats {
        summary
            .subject_breakdown
            .iter()
            .find(|s| s.subject_id == subject)
            .unwrap_or_else(|| panic!("{subject} missing from breakdown"))
    }

    #[test]
    fn test_week_is_monday_anchored() {
        // 2024-06-12 is a Wednesday.
        let week = DateWindow::week_of(date("2024-06-12"));
        assert_eq!(week.start, date("2024-06-10"));
        assert_eq!(week.end, date("2024-06-16"));
        assert_eq!(week.dates().len(), 7);

        // Sunday belongs to the week that started six days earlier.
        assert_eq!(DateWindow::week_of(date("2024-06-16")).start, date("2024-06-10"));
        assert_eq!(DateWindow::week_of(date("2024-06-10")).start, date("2024-06-10"));
    }

    #[test]
    fn test_day_index_monday_is_zero() {
        assert_eq!(day_index(date("2024-06-10")), 0);
        assert_eq!(day_index(date("2024-06-16")), 6);
    }

    #[test]
    fn test_reference_date_defaults_and_rejects_garbage() {
        let today = date("2024-06-12");
        assert_eq!(reference_date(None, today).unwrap(), today);
        assert_eq!(reference_date(Some(""), today).unwrap(), today);
        assert_eq!(
            reference_date(Some("2024-01-31"), today).unwrap(),
            date("2024-01-31")
        );
        assert!(matches!(
            reference_date(Some("31/01/2024"), today),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            reference_date(Some("2024-02-30"), today),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_merge_one_slot_per_day_subject_key() {
        let s = Uuid::new_v4();
        let week = DateWindow::week_of(date("2024-06-12"));
        let plan = vec![plan(s, "Math", 0, 2.0), plan(s, "Science", 1, 3.0)];
        let logs = vec![
            log(s, "Math", "2024-06-10", 1.0),
            log(s, "Math", "2024-06-10", 0.5),
            // No plan for History on Wednesday
            log(s, "History", "2024-06-12", 1.25),
        ];

        let slots = merge_week(&week, &plan, &logs);
        assert_eq!(slots.len(), 3);

        let math = slots.iter().find(|s| s.subject_id == "Math").unwrap();
        assert_eq!(math.day_of_week, 0);
        assert_eq!(math.planned_hours, 2.0);
        assert_eq!(math.actual_hours, 1.5);

        let science = slots.iter().find(|s| s.subject_id == "Science").unwrap();
        assert_eq!(science.actual_hours, 0.0);

        let history = slots.iter().find(|s| s.subject_id == "History").unwrap();
        assert_eq!(history.day_of_week, 2);
        assert_eq!(history.planned_hours, 0.0);
        assert_eq!(history.actual_hours, 1.25);
        assert_eq!(history.id, logs[2].id);
    }

    #[test]
    fn test_merge_ignores_logs_outside_week() {
        let s = Uuid::new_v4();
        let week = DateWindow::week_of(date("2024-06-12"));
        let plan = vec![plan(s, "Math", 0, 2.0)];
        let logs = vec![
            log(s, "Math", "2024-06-03", 4.0),
            log(s, "Math", "2024-06-17", 4.0),
        ];

        let slots = merge_week(&week, &plan, &logs);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].actual_hours, 0.0);
    }

    #[test]
    fn test_validity_window_overlap() {
        let s = Uuid::new_v4();
        let week = DateWindow::week_of(date("2024-06-12"));

        let unbounded = plan(s, "Math", 0, 1.0);

        let mut ends_before = plan(s, "Art", 1, 1.0);
        ends_before.end_date = Some(date("2024-06-09"));

        let mut starts_after = plan(s, "Music", 2, 1.0);
        starts_after.start_date = Some(date("2024-06-17"));

        let mut ends_on_first_day = plan(s, "Physics", 3, 1.0);
        ends_on_first_day.end_date = Some(date("2024-06-10"));

        let mut starts_on_last_day = plan(s, "Biology", 4, 1.0);
        starts_on_last_day.start_date = Some(date("2024-06-16"));

        let mut spans = plan(s, "French", 5, 1.0);
        spans.start_date = Some(date("2024-05-01"));
        spans.end_date = Some(date("2024-07-01"));

        let plan = vec![
            unbounded,
            ends_before,
            starts_after,
            ends_on_first_day,
            starts_on_last_day,
            spans,
        ];
        let subjects: Vec<String> = merge_week(&week, &plan, &[])
            .into_iter()
            .map(|s| s.subject_id)
            .collect();

        assert_eq!(subjects, vec!["Math", "Physics", "Biology", "French"]);
    }

    #[test]
    fn test_weekly_stats_plan_and_actual() {
        let s = Uuid::new_v4();
        let plan = vec![plan(s, "Math", 0, 2.0), plan(s, "Science", 1, 3.0)];
        let logs = vec![log(s, "Math", "2024-06-10", 1.5)];

        let summary = aggregate_stats(s, Period::Weekly, date("2024-06-13"), &plan, &logs);

        assert_eq!(summary.total_hours, 1.5);
        assert_eq!(summary.planned_hours, 5.0);
        assert_eq!(summary.start_date, date("2024-06-10"));
        assert_eq!(summary.end_date, date("2024-06-16"));

        let math = breakdown(&summary, "Math");
        assert_eq!((math.hours, math.planned), (1.5, 2.0));
        let science = breakdown(&summary, "Science");
        assert_eq!((science.hours, science.planned), (0.0, 3.0));
    }

    #[test]
    fn test_daily_stats_only_count_that_date() {
        let s = Uuid::new_v4();
        // Tuesday 2024-06-11 and Wednesday 2024-06-12
        let plan = vec![plan(s, "Math", 1, 3.0), plan(s, "Math", 2, 1.0)];
        let logs = vec![
            log(s, "Math", "2024-06-11", 2.0),
            log(s, "Math", "2024-06-12", 5.0),
        ];

        let yesterday = aggregate_stats(s, Period::Daily, date("2024-06-11"), &plan, &logs);
        assert_eq!(yesterday.total_hours, 2.0);
        assert_eq!(yesterday.planned_hours, 3.0);
        assert_eq!(yesterday.subject_breakdown.len(), 1);

        let today = aggregate_stats(s, Period::Daily, date("2024-06-12"), &plan, &logs);
        assert_eq!(today.total_hours, 5.0);
        assert_eq!(today.planned_hours, 1.0);
    }

    #[test]
    fn test_daily_stats_honor_validity_window() {
        let s = Uuid::new_v4();
        let mut expired = plan(s, "Math", 1, 3.0);
        expired.end_date = Some(date("2024-06-01"));
        let current = plan(s, "Science", 1, 2.0);

        let summary =
            aggregate_stats(s, Period::Daily, date("2024-06-11"), &[expired, current], &[]);
        assert_eq!(summary.planned_hours, 2.0);
        assert_eq!(summary.subject_breakdown.len(), 1);
        assert_eq!(summary.subject_breakdown[0].subject_id, "Science");
    }

    #[test]
    fn test_log_only_subject_appears_with_zero_plan() {
        let s = Uuid::new_v4();
        let logs = vec![log(s, "Chemistry", "2024-06-14", 0.75)];

        let summary = aggregate_stats(s, Period::Weekly, date("2024-06-14"), &[], &logs);
        let chem = breakdown(&summary, "Chemistry");
        assert_eq!((chem.hours, chem.planned), (0.75, 0.0));
        assert_eq!(summary.planned_hours, 0.0);
    }

    #[test]
    fn test_empty_inputs_give_empty_stats() {
        let summary =
            aggregate_stats(Uuid::new_v4(), Period::Weekly, date("2024-06-14"), &[], &[]);
        assert!(summary.subject_breakdown.is_empty());
        assert_eq!(summary.total_hours, 0.0);
    }
}
