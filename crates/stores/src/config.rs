//! Store model configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DELICIOUS_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! ## Optional
//! - `DELICIOUS_DB_MAX_CONNECTIONS` - Pool size ceiling (default: 10)
//! - `DELICIOUS_DB_MIN_CONNECTIONS` - Idle connections kept open (default: 2)
//! - `DELICIOUS_DB_ACQUIRE_TIMEOUT_SECS` - Seconds to wait for a pooled
//!   connection (default: 10)

use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DATABASE_URL_VAR: &str = "DELICIOUS_DATABASE_URL";
const MAX_CONNECTIONS_VAR: &str = "DELICIOUS_DB_MAX_CONNECTIONS";
const MIN_CONNECTIONS_VAR: &str = "DELICIOUS_DB_MIN_CONNECTIONS";
const ACQUIRE_TIMEOUT_VAR: &str = "DELICIOUS_DB_ACQUIRE_TIMEOUT_SECS";

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 2;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Database settings for the store model.
#[derive(Debug, Clone)]
pub struct StoresConfig {
    /// `PostgreSQL` connection URL (contains password)
    pub database_url: SecretString,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl StoresConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` when no database URL is set and
    /// `ConfigError::InvalidEnvVar` when a numeric setting does not parse or
    /// the pool bounds are inverted.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url(DATABASE_URL_VAR)?;
        let max_connections = parse_or_default(
            MAX_CONNECTIONS_VAR,
            get_optional_env(MAX_CONNECTIONS_VAR).as_deref(),
            DEFAULT_MAX_CONNECTIONS,
        )?;
        let min_connections = parse_or_default(
            MIN_CONNECTIONS_VAR,
            get_optional_env(MIN_CONNECTIONS_VAR).as_deref(),
            DEFAULT_MIN_CONNECTIONS,
        )?;
        let acquire_timeout_secs = parse_or_default(
            ACQUIRE_TIMEOUT_VAR,
            get_optional_env(ACQUIRE_TIMEOUT_VAR).as_deref(),
            DEFAULT_ACQUIRE_TIMEOUT_SECS,
        )?;

        Self::new(
            database_url,
            max_connections,
            min_connections,
            Duration::from_secs(acquire_timeout_secs),
        )
    }

    /// Build a configuration, checking the pool bounds.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `max_connections` is zero or
    /// smaller than `min_connections`.
    pub fn new(
        database_url: SecretString,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        if max_connections == 0 || max_connections < min_connections {
            return Err(ConfigError::InvalidEnvVar(
                MAX_CONNECTIONS_VAR.to_string(),
                format!("must be at least 1 and at least {MIN_CONNECTIONS_VAR} ({min_connections})"),
            ));
        }

        Ok(Self {
            database_url,
            max_connections,
            min_connections,
            acquire_timeout,
        })
    }
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse an optional raw value, falling back to `default` when unset or blank.
fn parse_or_default<T>(key: &str, raw: Option<&str>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), format!("{value:?}: {e}"))),
    }
}
