//! Client configuration.
//!
//! # Environment variables
//!
//! - `PORTAL_API_URL` - backend origin (default `http://localhost:8000`)
//! - `PORTAL_API_BASE_PATH` - path prefix for every endpoint (default `/api/v3`)
//! - `PORTAL_MAX_RETRIES` - retries after the first attempt (default 2)
//! - `PORTAL_RETRY_DELAY_MS` - first backoff delay (default 1000)
//! - `PORTAL_RETRY_MAX_DELAY_MS` - backoff ceiling (default 30000)
//! - `PORTAL_REQUEST_TIMEOUT_SECS` - per-request timeout (default 30)
//! - `PORTAL_STORAGE_PATH` - durable storage file (default `.portal/storage.json`)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::retry::RetryPolicy;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_BASE_PATH: &str = "/api/v3";
const DEFAULT_STORAGE_PATH: &str = ".portal/storage.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Portal client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin, e.g. `https://portal.example.com`
    pub api_url: Url,
    /// Path prefix for every endpoint, e.g. `/api/v3`
    pub base_path: String,
    /// Retry policy for 5xx and network failures
    pub retry: RetryPolicy,
    /// Timeout for a single HTTP attempt
    pub request_timeout: Duration,
    /// Durable storage file
    pub storage_path: PathBuf,
}

impl ClientConfig {
    /// Configuration for a backend at `api_url` with every other setting at
    /// its default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not an http(s) URL.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url("PORTAL_API_URL", api_url)?,
            base_path: normalize_base_path(DEFAULT_BASE_PATH),
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(30),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
        })
    }

    /// Load configuration from the process environment.
    ///
    /// Does not read `.env`; binaries call `dotenvy::dotenv()` first.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let api_url = parse_api_url(
            "PORTAL_API_URL",
            &env.get_or_default("PORTAL_API_URL", DEFAULT_API_URL),
        )?;
        let base_path =
            normalize_base_path(&env.get_or_default("PORTAL_API_BASE_PATH", DEFAULT_BASE_PATH));

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_retries: env.parse_or("PORTAL_MAX_RETRIES", defaults.max_retries)?,
            initial_delay: Duration::from_millis(env.parse_or(
                "PORTAL_RETRY_DELAY_MS",
                duration_millis(defaults.initial_delay),
            )?),
            max_delay: Duration::from_millis(env.parse_or(
                "PORTAL_RETRY_MAX_DELAY_MS",
                duration_millis(defaults.max_delay),
            )?),
        };
        let request_timeout =
            Duration::from_secs(env.parse_or("PORTAL_REQUEST_TIMEOUT_SECS", 30_u64)?);
        let storage_path =
            PathBuf::from(env.get_or_default("PORTAL_STORAGE_PATH", DEFAULT_STORAGE_PATH));

        Ok(Self {
            api_url,
            base_path,
            retry,
            request_timeout,
            storage_path,
        })
    }

    /// Origin and base path joined, without a trailing slash.
    #[must_use]
    pub fn endpoint_base(&self) -> String {
        format!(
            "{}{}",
            self.api_url.as_str().trim_end_matches('/'),
            self.base_path
        )
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable; blank values count as unset.
    fn get_optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn get_or_default(&self, key: &str, default: &str) -> String {
        self.get_optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.get_optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

fn parse_api_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// `api/v3/` → `/api/v3`; empty stays empty.
fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
