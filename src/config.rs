// src/config.rs

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use dotenvy::dotenv;

use crate::utils::join_code::{MAX_CODE_LENGTH, MIN_CODE_LENGTH};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },

    #[error("{key} must be between {min} and {max}, got {value}")]
    OutOfRange {
        key: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string. Without it the service runs on the in-memory store.
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub rust_log: String,
    pub log_dir: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub db_connect_retries: u32,
    pub join_code_length: usize,
    pub join_code_attempts: u32,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            rust_log: "info".to_string(),
            log_dir: "logs".to_string(),
            db_max_connections: 5,
            db_acquire_timeout_secs: 3,
            db_connect_retries: 5,
            join_code_length: 6,
            join_code_attempts: 10,
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let defaults = Self::default();

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());

        let rust_log = env::var("RUST_LOG").unwrap_or(defaults.rust_log);
        let log_dir = env::var("LOG_DIR").unwrap_or(defaults.log_dir);

        let join_code_length = parse_var("JOIN_CODE_LENGTH", defaults.join_code_length)?;
        if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&join_code_length) {
            return Err(ConfigError::OutOfRange {
                key: "JOIN_CODE_LENGTH",
                value: join_code_length,
                min: MIN_CODE_LENGTH,
                max: MAX_CODE_LENGTH,
            });
        }

        let cors_allowed_origins = match env::var("CORS_ALLOWED_ORIGINS") {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
            Err(_) => defaults.cors_allowed_origins,
        };

        Ok(Self {
            database_url,
            bind_addr: parse_var("BIND_ADDR", defaults.bind_addr)?,
            rust_log,
            log_dir,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            db_acquire_timeout_secs: parse_var(
                "DB_ACQUIRE_TIMEOUT_SECS",
                defaults.db_acquire_timeout_secs,
            )?,
            db_connect_retries: parse_var("DB_CONNECT_RETRIES", defaults.db_connect_retries)?,
            join_code_length,
            join_code_attempts: parse_var("JOIN_CODE_ATTEMPTS", defaults.join_code_attempts)?.max(1),
            cors_allowed_origins,
        })
    }
}

/// Reads `key` from the environment, falling back to `default` when unset.
fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}
