//! Periodic maintenance workers.
//!
//! Each worker is a tokio task ticking on an interval and calling one hook.
//! Failures are logged and the loop carries on.

use std::time::Duration;

use chrono::Utc;

use crate::auth::rate_limit::RateLimitState;
use crate::db;
use crate::services::notifier::{Delivery, Notifier};
use crate::AppState;

const RATE_LIMIT_CLEANUP_SECS: u64 = 60;

pub fn spawn_workers(state: &AppState) {
    spawn_rate_limit_cleanup(state.rate_limiter.clone());

    if state.config.reminders_enabled {
        spawn_reminder_worker(
            state.db.clone(),
            state.notifier.clone(),
            state.config.reminder_interval_secs,
        );
    } else {
        tracing::info!("Study reminders disabled");
    }
}

fn spawn_rate_limit_cleanup(limiter: RateLimitState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(RATE_LIMIT_CLEANUP_SECS));
        loop {
            interval.tick().await;
            let removed = limiter.cleanup().await;
            if removed > 0 {
                tracing::debug!(removed = removed, "Rate limiter cleanup");
            }
        }
    });
}

fn spawn_reminder_worker(db: sqlx::PgPool, notifier: Notifier, every_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(every_secs.max(60)));
        // The first tick fires immediately; skip it so a restart does not resend.
        interval.tick().await;
        loop {
            interval.tick().await;
            match send_task_reminders(&db, &notifier).await {
                Ok(sent) => tracing::info!(sent = sent, "Study reminder pass finished"),
                Err(e) => tracing::error!(error = %e, "Study reminder worker error"),
            }
        }
    });
}

pub fn reminder_text(name: &str, open_tasks: i64) -> String {
    let noun = if open_tasks == 1 { "task" } else { "tasks" };
    format!(
        "Hi {}, you still have {} open study {} for today on StudyTrack. Keep going!",
        name, open_tasks, noun
    )
}

/// Message every student with unfinished tasks today. Returns how many
/// messages were handed to the notifier (mock deliveries included).
pub async fn send_task_reminders(db: &sqlx::PgPool, notifier: &Notifier) -> Result<usize, sqlx::Error> {
    let today = Utc::now().date_naive();
    let targets = db::users::find_with_open_tasks(db, today).await?;

    let mut delivered = 0;
    for target in &targets {
        let text = reminder_text(&target.name, target.open_tasks);
        match notifier.send_whatsapp(&target.phone_number, &text).await {
            Delivery::Error { .. } => {
                tracing::warn!(student_id = %target.id, "Reminder not delivered");
            }
            Delivery::Sent { .. } | Delivery::Mock { .. } => delivered += 1,
        }
    }
    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_text_pluralizes() {
        assert!(reminder_text("Asha", 1).contains("1 open study task for today"));
        assert!(reminder_text("Asha", 3).contains("3 open study tasks for today"));
    }
}
