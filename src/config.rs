//! Service configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Everything is read once at startup into an [`AppConfig`] that lives in
//! `AppState`. Parsing goes through a lookup closure so tests can feed values
//! without touching the process environment.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::services::toast::ToastConfig;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_SESSION_TTL_HOURS: u64 = 168;
pub const DEFAULT_AUTH_TOKEN_TTL_MINUTES: u64 = 15;
pub const DEFAULT_TOAST_LIMIT: usize = 3;
pub const DEFAULT_TOAST_DURATION_SECS: u64 = 5;
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";
pub const DEFAULT_STATIC_DIR: &str = "./public";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres connection string. `None` runs against the in-memory store.
    pub database_url: Option<String>,
    pub port: u16,
    pub db_max_connections: u32,
    pub session_ttl: Duration,
    /// Lifetime of phone-login and password-reset links.
    pub auth_token_ttl: Duration,
    pub toast: ToastConfig,
    pub cookie_secure: bool,
    /// Externally visible base URL, used to build callback links.
    pub public_url: Url,
    pub static_dir: PathBuf,
}

impl AppConfig {
    /// Build config from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is present but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is present but malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());

        let public_url_raw = lookup("PUBLIC_URL").unwrap_or_else(|| DEFAULT_PUBLIC_URL.to_owned());
        let public_url =
            Url::parse(&public_url_raw).map_err(|_| ConfigError::Invalid { key: "PUBLIC_URL", value: public_url_raw })?;

        let cookie_secure = match lookup("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid { key: "COOKIE_SECURE", value: raw })?,
            None => public_url.scheme() == "https",
        };

        let session_ttl = parse_duration_or(&lookup, "SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS, 3600)?;
        let auth_token_ttl = parse_duration_or(&lookup, "AUTH_TOKEN_TTL_MINUTES", DEFAULT_AUTH_TOKEN_TTL_MINUTES, 60)?;
        let toast_secs = parse_or(&lookup, "TOAST_DURATION_SECS", DEFAULT_TOAST_DURATION_SECS)?;

        Ok(Self {
            database_url,
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            session_ttl,
            auth_token_ttl,
            toast: ToastConfig {
                limit: parse_or(&lookup, "TOAST_LIMIT", DEFAULT_TOAST_LIMIT)?.max(1),
                duration: Duration::from_secs(toast_secs),
            },
            cookie_secure,
            public_url,
            static_dir: lookup("STATIC_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR), PathBuf::from),
        })
    }

    /// Absolute link for a path on this service, e.g. a callback URL.
    #[must_use]
    pub fn link(&self, path: &str) -> String {
        self.public_url
            .join(path)
            .map_or_else(|_| format!("{}{path}", self.public_url), String::from)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

/// Parse a count of `secs_per_unit`-second units into a `Duration`.
/// Values whose length in seconds overflows `u64` are rejected.
fn parse_duration_or<F>(lookup: &F, key: &'static str, default: u64, secs_per_unit: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let units = parse_or(lookup, key, default)?;
    units
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::Invalid { key, value: lookup(key).unwrap_or_else(|| units.to_string()) })
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
