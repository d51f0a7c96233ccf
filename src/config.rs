use std::{path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;

use crate::queue::RetryPolicy;

/// Everything the service reads from the environment, resolved once at start-up
/// and handed to the components that need it.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub app_url: String,
    pub secret: String,
    pub storage_dir: PathBuf,
    pub file_size_limit: usize,
    pub admin_username: String,
    pub admin_password: String,
    pub admin_email: Option<String>,
    pub mail: MailConfig,
    pub retry: RetryPolicy,
}

#[derive(Clone, Debug)]
pub struct MailConfig {
    pub driver: MailDriver,
    pub from: String,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_starttls: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MailDriver {
    Smtp,
    Log,
}

impl FromStr for MailDriver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "smtp" => Ok(Self::Smtp),
            "log" => Ok(Self::Log),
            other => Err(ConfigError::Invalid {
                key: "MAIL_DRIVER",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mail = MailConfig {
            driver: optional("MAIL_DRIVER")
                .map(|value| value.parse())
                .transpose()?
                .unwrap_or(MailDriver::Log),
            from: optional("MAIL_FROM").unwrap_or_else(|| "shop@localhost".to_string()),
            smtp_host: optional("SMTP_HOST"),
            smtp_port: parsed("SMTP_PORT", 587)?,
            smtp_username: optional("SMTP_USERNAME"),
            smtp_password: optional("SMTP_PASSWORD"),
            smtp_starttls: parsed("SMTP_STARTTLS", true)?,
        };

        if mail.driver == MailDriver::Smtp && mail.smtp_host.is_none() {
            return Err(ConfigError::Missing("SMTP_HOST"));
        }

        let retry = RetryPolicy {
            max_attempts: parsed("QUEUE_MAX_ATTEMPTS", 3u32)?.max(1),
            base_delay: Duration::from_millis(parsed("QUEUE_BACKOFF_MS", 10_000u64)?),
            max_delay: Duration::from_millis(parsed("QUEUE_MAX_BACKOFF_MS", 600_000u64)?),
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            app_url: optional("APP_URL").unwrap_or_else(|| "http://localhost:3000".to_string()),
            secret: required("SECRET")?,
            storage_dir: optional("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./storage")),
            file_size_limit: parsed("FILE_SIZE_LIMIT", 5 * 1024 * 1024)?,
            admin_username: optional("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
            admin_password: required("ADMIN_PASSWORD")?,
            admin_email: optional("ADMIN_EMAIL"),
            mail,
            retry,
        })
    }
}

fn optional(key: &'static str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

fn parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
