//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PERIM_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `PERIM_HOST` - Bind address (default: 127.0.0.1)
//! - `PERIM_PORT` - Listen port (default: 8000)
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated origins (unset: any origin)
//! - `POSTAL_LOOKUP_BASE_URL` - ViaCEP-compatible base URL (default: <https://viacep.com.br/ws>)
//! - `POSTAL_LOOKUP_TIMEOUT_SECS` - Lookup timeout in seconds (default: 5)
//! - `LOG_FORMAT` - `json` or `text` (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_POSTAL_LOOKUP_BASE_URL: &str = "https://viacep.com.br/ws";
const DEFAULT_POSTAL_LOOKUP_TIMEOUT_SECS: u64 = 5;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Allowed CORS origins; empty allows any origin
    pub cors_allowed_origins: Vec<String>,
    /// Postal-code lookup service
    pub postal_lookup: PostalLookupConfig,
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Postal-code lookup service configuration.
#[derive(Debug, Clone)]
pub struct PostalLookupConfig {
    /// Base URL; requests go to `{base_url}/{digits}/json/`
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for PostalLookupConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_POSTAL_LOOKUP_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_POSTAL_LOOKUP_TIMEOUT_SECS),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    fn from_lookup(env: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = get_database_url(env, "PERIM_DATABASE_URL")?;
        let host = get_env_or_default(env, "PERIM_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PERIM_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default(env, "PERIM_PORT", "8000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PERIM_PORT".to_string(), e.to_string()))?;
        let cors_allowed_origins = env("CORS_ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let postal_lookup = PostalLookupConfig::from_lookup(env)?;
        let log_format = match env("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            None | Some("text" | "") => LogFormat::Text,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "LOG_FORMAT".to_string(),
                    format!("expected json or text, got {other}"),
                ));
            }
        };
        let sentry_dsn = env("SENTRY_DSN");
        let sentry_environment = env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            cors_allowed_origins,
            postal_lookup,
            log_format,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PostalLookupConfig {
    fn from_lookup(env: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = get_env_or_default(
            env,
            "POSTAL_LOOKUP_BASE_URL",
            DEFAULT_POSTAL_LOOKUP_BASE_URL,
        );
        let parsed = url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("POSTAL_LOOKUP_BASE_URL".to_string(), e.to_string())
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "POSTAL_LOOKUP_BASE_URL".to_string(),
                "must be an http(s) URL".to_string(),
            ));
        }

        let timeout_secs = match env("POSTAL_LOOKUP_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("POSTAL_LOOKUP_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            None => DEFAULT_POSTAL_LOOKUP_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(
    env: &dyn Fn(&str) -> Option<String>,
    primary_key: &str,
) -> Result<SecretString, ConfigError> {
    env(primary_key)
        .or_else(|| env("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(env: &dyn Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    env(key).unwrap_or_else(|| default.to_string())
}
