use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::AppState;

/// Fixed-window request counter keyed by an arbitrary string.
///
/// State is in-process, so limits are per instance.
#[derive(Clone)]
pub struct RateLimitState {
    entries: Arc<Mutex<HashMap<String, Window>>>,
    max_requests: u32,
    window: Duration,
}

struct Window {
    count: u32,
    started: Instant,
}

impl RateLimitState {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// `Ok(remaining)` when the request is allowed, `Err(retry_after)` when
    /// the key has used up its window.
    pub async fn check(&self, key: &str) -> Result<u32, Duration> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let entry = entries.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(entry.started) > self.window {
            entry.count = 0;
            entry.started = now;
        }

        if entry.count >= self.max_requests {
            return Err(self.window.saturating_sub(now.duration_since(entry.started)));
        }

        entry.count += 1;
        Ok(self.max_requests - entry.count)
    }

    /// Drop windows that ended long enough ago to be irrelevant.
    /// Returns how many keys were removed.
    pub async fn cleanup(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        let now = Instant::now();
        let keep_for = self.window * 2;
        entries.retain(|_, w| now.duration_since(w.started) < keep_for);
        before - entries.len()
    }
}

/// Per-IP, per-path limit for the credential endpoints.
pub async fn rate_limit_auth(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = addr.ip().to_string();
    let path = req.uri().path().to_string();
    let key = format!("{}:{}", ip, path);

    match state.rate_limiter.check(&key).await {
        Ok(remaining) => {
            tracing::debug!(ip = %ip, path = %path, remaining = remaining, "Rate limit check passed");
            Ok(next.run(req).await)
        }
        Err(retry_after) => {
            tracing::warn!(
                ip = %ip,
                path = %path,
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );
            Err(AppError::RateLimited)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_up_to_limit_then_blocks() {
        let limiter = RateLimitState::new(3, 60);

        assert_eq!(limiter.check("1.2.3.4:/api/auth/login").await, Ok(2));
        assert_eq!(limiter.check("1.2.3.4:/api/auth/login").await, Ok(1));
        assert_eq!(limiter.check("1.2.3.4:/api/auth/login").await, Ok(0));
        assert!(limiter.check("1.2.3.4:/api/auth/login").await.is_err());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = RateLimitState::new(1, 60);

        assert!(limiter.check("1.2.3.4:/api/auth/login").await.is_ok());
        assert!(limiter.check("1.2.3.4:/api/auth/login").await.is_err());
        assert!(limiter.check("1.2.3.4:/api/auth/register").await.is_ok());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_fresh_windows() {
        let limiter = RateLimitState::new(5, 60);
        limiter.check("a").await.ok();
        limiter.check("b").await.ok();

        assert_eq!(limiter.cleanup().await, 0);
        assert!(limiter.check("a").await.is_ok());
    }

    #[tokio::test]
    async fn test_zero_length_window_resets() {
        let limiter = RateLimitState::new(1, 0);
        assert!(limiter.check("k").await.is_ok());
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(limiter.check("k").await.is_ok());
        assert_eq!(limiter.cleanup().await, 1);
    }
}
