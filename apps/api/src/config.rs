use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    /// Base URL of the external evaluation service. Jobs are started by a POST
    /// to this URL; status is read from `{url}/status/{job_id}`.
    pub evaluator_url: String,
    /// No timeout unless set; a stalled evaluator stalls the request.
    pub evaluator_timeout: Option<Duration>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: optional_env("DATABASE_MAX_CONNECTIONS", 10)?,
            evaluator_url: require_env("EXTERNAL_SERVICE_URL")?,
            evaluator_timeout: std::env::var("EVALUATOR_TIMEOUT_SECS")
                .ok()
                .map(|v| parse_timeout(&v))
                .transpose()?,
            port: optional_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    let secs = raw
        .trim()
        .parse::<u64>()
        .with_context(|| format!("EVALUATOR_TIMEOUT_SECS must be whole seconds, got '{raw}'"))?;
    anyhow::ensure!(secs > 0, "EVALUATOR_TIMEOUT_SECS must be greater than zero");
    Ok(Duration::from_secs(secs))
}
