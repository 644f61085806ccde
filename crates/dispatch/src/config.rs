//! Dispatch configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DISPATCH_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `YANDEX_GEOCODER_API_KEY` - Geocoder API key (high entropy, not a placeholder)
//!
//! ## Optional
//! - `DISPATCH_HOST` - Bind address (default: 127.0.0.1)
//! - `DISPATCH_PORT` - Listen port (default: 3002)
//! - `GEOCODER_BASE_URL` - Geocoder endpoint (default: <https://geocode-maps.yandex.ru>)
//! - `GEOCODER_TIMEOUT_SECS` - Upper bound on one lookup (default: 5)
//! - `GEOCODE_CACHE_CAPACITY` - Addresses kept in memory (default: 10000)
//! - `LOCATION_MAX_AGE_DAYS` - Re-geocode stored locations older than this (default: never)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance traces sample rate (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::geocoder::{CacheOptions, RefreshPolicy};

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Dispatch application configuration.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    pub geocoder: GeocoderConfig,
    pub cache: CacheConfig,
    pub sentry: SentryConfig,
}

/// Geocoding provider configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct GeocoderConfig {
    pub api_key: SecretString,
    /// Scheme and host of the provider, without the API path
    pub base_url: String,
    /// Upper bound on a single lookup
    pub timeout: Duration,
}

impl std::fmt::Debug for GeocoderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocoderConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// In-process geocode cache configuration.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub capacity: u64,
    /// Stored locations older than this are looked up again; `None` keeps them forever
    pub max_age: Option<Duration>,
}

/// Sentry error tracking configuration.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: Option<f32>,
    pub traces_sample_rate: Option<f32>,
}

impl DispatchConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API key fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("DISPATCH_DATABASE_URL")?;
        let host = parse_env_or_default::<IpAddr>("DISPATCH_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("DISPATCH_PORT", "3002")?;

        Ok(Self {
            database_url,
            host,
            port,
            geocoder: GeocoderConfig::from_env()?,
            cache: CacheConfig::from_env()?,
            sentry: SentryConfig::from_env()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Options for the shared [`GeocodeCache`](crate::geocoder::GeocodeCache).
    #[must_use]
    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            capacity: self.cache.capacity,
            fetch_timeout: self.geocoder.timeout,
            refresh: self
                .cache
                .max_age
                .map_or(RefreshPolicy::Never, RefreshPolicy::MaxAge),
        }
    }
}

impl GeocoderConfig {
    /// Load the geocoder settings on their own.
    ///
    /// Used by tools that geocode without serving HTTP.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the API key is missing or fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs = parse_env_or_default::<u64>("GEOCODER_TIMEOUT_SECS", "5")?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "GEOCODER_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            api_key: get_validated_secret("YANDEX_GEOCODER_API_KEY")?,
            base_url: get_env_or_default("GEOCODER_BASE_URL", "https://geocode-maps.yandex.ru"),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl CacheConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let capacity = parse_env_or_default::<u64>("GEOCODE_CACHE_CAPACITY", "10000")?;
        let max_age = get_optional_env("LOCATION_MAX_AGE_DAYS")
            .map(|days| {
                days.parse::<u64>()
                    .map(|days| Duration::from_secs(days.saturating_mul(SECONDS_PER_DAY)))
                    .map_err(|e| {
                        ConfigError::InvalidEnvVar("LOCATION_MAX_AGE_DAYS".to_string(), e.to_string())
                    })
            })
            .transpose()?;

        Ok(Self { capacity, max_age })
    }
}

impl SentryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: parse_optional_env("SENTRY_SAMPLE_RATE")?,
            traces_sample_rate: parse_optional_env("SENTRY_TRACES_SAMPLE_RATE")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
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

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

/// Parse an optional environment variable.
fn parse_optional_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key)
        .map(|value| parse_value(key, &value))
        .transpose()
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the provider."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
