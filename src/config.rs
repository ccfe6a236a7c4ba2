use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

/// How long the refreshing flag stays raised so a spinner is visible.
pub const REFRESH_MIN_VISIBLE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub data_dir: PathBuf,
    pub refresh_min_visible: Duration,
    pub connectivity_buffer_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let refresh_ms: u64 = parse_or_default(
            "REFRESH_MIN_VISIBLE_MS",
            REFRESH_MIN_VISIBLE.as_millis() as u64,
        )?;

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            refresh_min_visible: Duration::from_millis(refresh_ms),
            connectivity_buffer_size: parse_or_default("CONNECTIVITY_BUFFER_SIZE", 64)?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
