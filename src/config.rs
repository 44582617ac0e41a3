use crate::error::AppError;
use crate::matching::MatchWriteMode;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub session_expiry_hours: i64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub request_timeout_secs: u64,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    pub frontend_url: Option<String>,
    pub allowed_email_domain: Option<String>,
    pub match_write_mode: MatchWriteMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 5000,
            database_url: "sqlite://connectup.db?mode=rwc".to_string(),
            session_expiry_hours: 24,
            db_max_connections: 10,
            db_min_connections: 2,
            request_timeout_secs: 30,
            rate_limit_max: 100,
            rate_limit_window_secs: 3600,
            frontend_url: None,
            allowed_email_domain: None,
            match_write_mode: MatchWriteMode::Transactional,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Config::default();

        Ok(Config {
            server_host: std::env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_var("SERVER_PORT", defaults.server_port)?,
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            session_expiry_hours: parse_var("SESSION_EXPIRY_HOURS", defaults.session_expiry_hours)?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            db_min_connections: parse_var("DB_MIN_CONNECTIONS", defaults.db_min_connections)?,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?,
            rate_limit_max: parse_var("RATE_LIMIT_MAX", defaults.rate_limit_max)?,
            rate_limit_window_secs: parse_var("RATE_LIMIT_WINDOW_SECS", defaults.rate_limit_window_secs)?,
            frontend_url: optional_var("FRONTEND_URL"),
            allowed_email_domain: optional_var("ALLOWED_EMAIL_DOMAIN")
                .map(|d| d.trim_start_matches('@').to_lowercase()),
            match_write_mode: parse_var("MATCH_WRITE_MODE", defaults.match_write_mode)?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
