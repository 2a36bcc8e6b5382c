use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    pub jwt_secret: String,
    pub jwt_access_ttl_secs: i64,
    pub jwt_refresh_ttl_secs: i64,

    pub auth_rate_limit_max: u32,
    pub auth_rate_limit_window_secs: u64,

    // Chat assistant (OpenAI-compatible chat completions)
    pub chat_api_key: Option<String>,
    pub chat_api_url: String,
    pub chat_model: String,

    // WhatsApp notifications via Twilio
    pub twilio_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_whatsapp_from: Option<String>,

    pub reminders_enabled: bool,
    pub reminder_interval_secs: u64,
}

/// Reads an optional variable, treating empty values and unfilled
/// `your_..._here` placeholders from `.env.example` as unset.
fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.starts_with("your_"))
}

/// Comma-separated list, blanks dropped.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
            cors_extra_origins: env::var("CORS_EXTRA_ORIGINS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),

            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            jwt_access_ttl_secs: env::var("JWT_ACCESS_TTL_SECS")
                .unwrap_or_else(|_| "3600".into()) // 1 hour
                .parse()
                .expect("JWT_ACCESS_TTL_SECS must be a number"),
            jwt_refresh_ttl_secs: env::var("JWT_REFRESH_TTL_SECS")
                .unwrap_or_else(|_| "2592000".into()) // 30 days
                .parse()
                .expect("JWT_REFRESH_TTL_SECS must be a number"),

            auth_rate_limit_max: env::var("AUTH_RATE_LIMIT_MAX")
                .unwrap_or_else(|_| "5".into())
                .parse()
                .unwrap_or(5),
            auth_rate_limit_window_secs: env::var("AUTH_RATE_LIMIT_WINDOW_SECS")
                .unwrap_or_else(|_| "60".into())
                .parse()
                .unwrap_or(60),

            chat_api_key: optional("GROQ_API_KEY"),
            chat_api_url: env::var("CHAT_API_URL").unwrap_or_else(|_| {
                "https://api.groq.com/openai/v1/chat/completions".into()
            }),
            chat_model: env::var("CHAT_MODEL")
                .unwrap_or_else(|_| "llama-3.1-8b-instant".into()),

            twilio_sid: optional("TWILIO_SID"),
            twilio_auth_token: optional("TWILIO_AUTH"),
            twilio_whatsapp_from: optional("TWILIO_WHATSAPP_FROM"),

            reminders_enabled: env::var("REMINDERS_ENABLED")
                .unwrap_or_else(|_| "false".into())
                .parse()
                .unwrap_or(false),
            reminder_interval_secs: env::var("REMINDER_INTERVAL_SECS")
                .unwrap_or_else(|_| "86400".into())
                .parse()
                .unwrap_or(86400),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
impl Config {
    /// Fixed configuration for router tests; no variables are read.
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgres://localhost/studytrack_test".into(),
            database_max_connections: 1,
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:5173".into(),
            cors_extra_origins: Vec::new(),
            jwt_secret: "test-secret".into(),
            jwt_access_ttl_secs: 3600,
            jwt_refresh_ttl_secs: 86400,
            auth_rate_limit_max: 5,
            auth_rate_limit_window_secs: 60,
            chat_api_key: None,
            chat_api_url: "http://localhost:9/chat".into(),
            chat_model: "test-model".into(),
            twilio_sid: None,
            twilio_auth_token: None,
            twilio_whatsapp_from: None,
            reminders_enabled: false,
            reminder_interval_secs: 86400,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(
            split_list(" http://a.test , ,http://b.test,"),
            vec!["http://a.test", "http://b.test"]
        );
        assert!(split_list("").is_empty());
    }
}
