use std::{env, time::Duration};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required env variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub backend_api_url: String,
    pub host: String,
    pub port: u16,
    pub timezone: Tz,
    pub backend_timeout: Duration,
    pub flow_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend_api_url = expect_env(&lookup, "BACKEND_API_URL")?
            .trim_end_matches('/')
            .to_string();

        let port = parse_env(&lookup, "PORT", "8080")?;
        let timezone = parse_env(&lookup, "PRACTICE_TIMEZONE", "Europe/Paris")?;
        let timeout_secs: u64 = parse_env(&lookup, "BACKEND_TIMEOUT_SECS", "10")?;
        let ttl_minutes: u64 = parse_env(&lookup, "FLOW_TTL_MINUTES", "30")?;
        let ttl_secs = ttl_minutes.checked_mul(60).ok_or_else(|| ConfigError::Invalid {
            name: "FLOW_TTL_MINUTES",
            value: ttl_minutes.to_string(),
        })?;

        Ok(Self {
            backend_api_url,
            host: get_env_or_default(&lookup, "BIND_HOST", "127.0.0.1"),
            port,
            timezone,
            backend_timeout: Duration::from_secs(timeout_secs),
            flow_ttl: Duration::from_secs(ttl_secs),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Current instant in the practice timezone.
    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.timezone)
    }
}

fn expect_env(lookup: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<String, ConfigError> {
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn get_env_or_default(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    lookup(name).unwrap_or_else(|| default.to_string())
}

fn parse_env<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: &str,
) -> Result<T, ConfigError> {
    let value = get_env_or_default(lookup, name, default);

    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}
