use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;

/// Connect eagerly so a bad `DATABASE_URL` fails at startup, not on the
/// first request.
pub async fn create_pool(config: &Config) -> PgPool {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    tracing::info!(
        max_connections = config.database_max_connections,
        "Database pool ready"
    );
    pool
}
