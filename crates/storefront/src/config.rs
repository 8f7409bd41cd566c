//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Entity API (all three, or none for the in-memory store)
//! - `ENTITY_API_URL` - Base URL of the hosted entity API
//! - `ENTITY_APP_ID` - Application ID the entities belong to
//! - `ENTITY_API_KEY` - API key (high entropy, sent as the `api_key` header)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_DATABASE_URL` / `DATABASE_URL` - `PostgreSQL` for sessions
//!   (sessions live in memory when unset)
//! - `ENTITY_SEED_FILE` - Catalog YAML for the in-memory store
//!   (default: `crates/storefront/content/products.yaml`)
//! - `ENTITY_API_TIMEOUT_SECS` - Entity API request timeout (default: 10)
//! - `CATALOG_CACHE_TTL_SECS` - Product list cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_SEED_FILE: &str = "crates/storefront/content/products.yaml";

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

const ENTITY_API_VARS: [&str; 3] = ["ENTITY_API_URL", "ENTITY_APP_ID", "ENTITY_API_KEY"];

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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` URL for the session store (contains password)
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Where entities live
    pub entities: EntityStoreConfig,
    /// Product list cache lifetime
    pub catalog_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Entity store selection.
#[derive(Debug, Clone)]
pub enum EntityStoreConfig {
    /// Hosted entity API.
    Remote(EntityApiConfig),
    /// In-process store seeded from a YAML catalog.
    Memory { seed_file: PathBuf },
}

/// Hosted entity API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct EntityApiConfig {
    /// API base URL
    pub api_url: Url,
    /// Application ID
    pub app_id: String,
    /// API key
    pub api_key: SecretString,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for EntityApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityApiConfig")
            .field("api_url", &self.api_url.as_str())
            .field("app_id", &self.app_id)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_vars(&|key: &str| std::env::var(key).ok())
    }

    /// Build the configuration from a variable lookup.
    fn from_vars(vars: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Vars(vars);

        let host = env
            .or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = env
            .or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = env.required("STOREFRONT_BASE_URL")?;

        // Fallback to generic DATABASE_URL (set by Fly.io postgres attach)
        let database_url = env
            .optional("STOREFRONT_DATABASE_URL")
            .or_else(|| env.optional("DATABASE_URL"))
            .map(SecretString::from);

        let entities = EntityStoreConfig::from_vars(&env)?;
        let catalog_cache_ttl = Duration::from_secs(env.secs("CATALOG_CACHE_TTL_SECS", 300)?);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            entities,
            catalog_cache_ttl,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl EntityStoreConfig {
    /// Load only the entity store selection (operator tooling).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the entity API variables are incomplete or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_vars(&Vars(&|key: &str| std::env::var(key).ok()))
    }

    fn from_vars(env: &Vars<'_>) -> Result<Self, ConfigError> {
        let present: Vec<&str> = ENTITY_API_VARS
            .iter()
            .copied()
            .filter(|key| env.optional(key).is_some())
            .collect();

        if present.is_empty() {
            let seed_file = env.or_default("ENTITY_SEED_FILE", DEFAULT_SEED_FILE);
            return Ok(Self::Memory {
                seed_file: PathBuf::from(seed_file),
            });
        }

        if let Some(missing) = ENTITY_API_VARS.iter().find(|key| !present.contains(*key)) {
            return Err(ConfigError::MissingEnvVar((*missing).to_string()));
        }

        let api_url = env.required("ENTITY_API_URL")?;
        let api_url = Url::parse(&api_url)
            .map_err(|e| ConfigError::InvalidEnvVar("ENTITY_API_URL".to_string(), e.to_string()))?;
        let timeout = Duration::from_secs(env.secs("ENTITY_API_TIMEOUT_SECS", 10)?);

        Ok(Self::Remote(EntityApiConfig {
            api_url,
            app_id: env.required("ENTITY_APP_ID")?,
            api_key: env.validated_secret("ENTITY_API_KEY")?,
            timeout,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with the usual required/optional/default accessors.
struct Vars<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Vars<'_> {
    /// Get an optional variable; blank counts as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get a whole number of seconds with a default value.
    fn secs(&self, key: &str, default: u64) -> Result<u64, ConfigError> {
        self.optional(key).map_or(Ok(default), |value| {
            value
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Load and validate a secret.
    fn validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        validate_secret_strength(&value, key)?;
        Ok(SecretString::from(value))
    }
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
    let len = s.chars().count() as f64;
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

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated key."
            ),
        ));
    }

    Ok(())
}

impl EntityApiConfig {
    /// The API key, for request headers only.
    #[must_use]
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}
