use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod error;
mod extract;
mod handlers;
mod models;
mod services;

use auth::rate_limit::RateLimitState;
use config::Config;
use services::assistant::Assistant;
use services::notifier::Notifier;

/// Process-wide context handed to every handler. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: RateLimitState,
    pub assistant: Assistant,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(db: PgPool, config: Arc<Config>) -> Self {
        Self {
            rate_limiter: RateLimitState::new(
                config.auth_rate_limit_max,
                config.auth_rate_limit_window_secs,
            ),
            assistant: Assistant::from_config(&config),
            notifier: Notifier::from_config(&config),
            db,
            config,
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let mut origins: Vec<HeaderValue> = Vec::new();
    match config.frontend_url.parse::<HeaderValue>() {
        Ok(origin) => origins.push(origin),
        Err(_) => tracing::warn!(url = %config.frontend_url, "FRONTEND_URL is not a valid origin"),
    }
    for extra in &config.cors_extra_origins {
        match extra.parse::<HeaderValue>() {
            Ok(origin) => origins.push(origin),
            Err(_) => tracing::warn!(origin = %extra, "Ignoring invalid CORS origin"),
        }
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_auth,
        ));

    let public_routes = Router::new()
        .route("/", get(handlers::health::health_check))
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .merge(auth_routes);

    let protected_routes = Router::new()
        // Account
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/auth/update-wizard", put(handlers::auth::update_wizard))
        .route("/api/auth/password", put(handlers::auth::change_password))
        // Timetable (plan)
        .route(
            "/api/timetable",
            post(handlers::timetable::upsert_entry).delete(handlers::timetable::reset),
        )
        .route("/api/timetable/:student_id", get(handlers::timetable::get_week))
        // Logs (actual)
        .route(
            "/api/logs",
            post(handlers::daily_logs::create_log)
                .get(handlers::daily_logs::list_logs)
                .delete(handlers::daily_logs::reset_logs),
        )
        // Stats
        .route("/api/stats/:student_id", get(handlers::stats::get_stats))
        // Daily tasks
        .route(
            "/api/daily-tasks",
            get(handlers::daily_tasks::list_tasks).post(handlers::daily_tasks::create_task),
        )
        .route(
            "/api/daily-tasks/:id",
            patch(handlers::daily_tasks::toggle_task).delete(handlers::daily_tasks::delete_task),
        )
        // Notifications & assistant
        .route("/api/notifications/test", post(handlers::notifications::send_test))
        .route("/api/chat/ask", post(handlers::chat::ask))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors_layer(&state.config))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studytrack_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    let db = db::create_pool(&config).await;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations applied");

    let state = AppState::new(db, config.clone());
    services::scheduler::spawn_workers(&state);

    let app = build_router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listen address");
    // Connect info feeds the per-IP rate limiter on the auth routes.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .expect("Server error");
}
