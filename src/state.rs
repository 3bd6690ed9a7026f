use std::env;
use std::ops::RangeInclusive;
use std::sync::Arc;

use thiserror::Error;

use crate::db::DbPool;
use crate::notification::NotificationRepository;
use crate::scheduler::ReminderScheduler;
use crate::user::UserRepository;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub user_repository: UserRepository,
    pub notification_repository: NotificationRepository,
    pub scheduler: Arc<ReminderScheduler>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Base for deep links placed in emails.
    pub app_base_url: String,
    /// Six-field cron expression (with seconds) for the reminder run.
    pub reminder_cron: String,
    pub notification_retention_days: i64,
    pub email_queue_capacity: usize,
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        Err(_) => Ok(default),
    }
}

fn parse_in_range<T>(key: &str, default: T, range: RangeInclusive<T>) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd,
{
    let value = parse_or(key, default)?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue(key.to_string()))
    }
}

pub const RETENTION_DAYS_RANGE: RangeInclusive<i64> = 1..=3650;

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::MissingEnv("DATABASE_URL".to_string()))?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5)?,
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or("PORT", 3000)?,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| ConfigError::MissingEnv("JWT_SECRET".to_string()))?,
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            reminder_cron: env::var("REMINDER_CRON").unwrap_or_else(|_| "0 0 6 * * *".to_string()),
            notification_retention_days: parse_in_range(
                "NOTIFICATION_RETENTION_DAYS",
                30,
                RETENTION_DAYS_RANGE,
            )?,
            email_queue_capacity: parse_or("EMAIL_QUEUE_CAPACITY", 256)?,
        })
    }
}
