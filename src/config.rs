// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Public workout catalog used when `WORKOUT_CATALOG_URL` is not set.
pub const DEFAULT_CATALOG_URL: &str =
    "https://sharunraj.github.io/fitnessApi.github.io/FitnessAPI.json";

/// Which document store implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    /// Process-local store; contents are lost on restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::Invalid {
                name: "STORE_BACKEND",
                reason: format!("unknown backend '{}'", other),
            }),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    pub store_backend: StoreBackend,
    /// URL of the JSON workout catalog
    pub catalog_url: String,
    pub catalog_timeout: Duration,
    /// How long a fetched catalog is reused. Zero disables caching.
    pub catalog_cache_ttl: Duration,
    /// Upper bound for a single document store call
    pub store_timeout: Duration,
    /// Offset from UTC (minutes) used to decide where a calendar day starts
    pub day_utc_offset_minutes: i32,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            gcp_project_id: "test-project".to_string(),
            store_backend: StoreBackend::Memory,
            catalog_url: "http://127.0.0.1:9/catalog.json".to_string(),
            catalog_timeout: Duration::from_secs(2),
            catalog_cache_ttl: Duration::ZERO,
            store_timeout: Duration::from_secs(2),
            day_utc_offset_minutes: 0,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honoured for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let catalog_url =
            env::var("WORKOUT_CATALOG_URL").unwrap_or_else(|_| DEFAULT_CATALOG_URL.to_string());
        if catalog_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "WORKOUT_CATALOG_URL",
                reason: "must not be empty".to_string(),
            });
        }

        let day_utc_offset_minutes = check_day_offset(parse_var("DAY_UTC_OFFSET_MINUTES", 0)?)?;

        Ok(Self {
            port: parse_var("PORT", 8080)?,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            store_backend: match env::var("STORE_BACKEND") {
                Ok(raw) => raw.parse()?,
                Err(_) => StoreBackend::Firestore,
            },
            catalog_url: catalog_url.trim().to_string(),
            catalog_timeout: Duration::from_secs(parse_var("CATALOG_TIMEOUT_SECS", 10)?),
            catalog_cache_ttl: Duration::from_secs(parse_var("CATALOG_CACHE_TTL_SECS", 300)?),
            store_timeout: Duration::from_secs(parse_var("STORE_TIMEOUT_SECS", 10)?),
            day_utc_offset_minutes,
        })
    }
}

/// Read and parse an optional environment variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            reason: format!("cannot parse '{}'", raw),
        }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

fn check_day_offset(minutes: i32) -> Result<i32, ConfigError> {
    if minutes.unsigned_abs() >= 24 * 60 {
        return Err(ConfigError::Invalid {
            name: "DAY_UTC_OFFSET_MINUTES",
            reason: "must be strictly between -1440 and 1440".to_string(),
        });
    }
    Ok(minutes)
}
