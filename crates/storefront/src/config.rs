//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOP_BASE_URL` - Base URL of the storefront server (e.g., `https://shop.example.com`)
//!
//! ## Optional
//! - `SHOP_VARIANT` - `client` or `public` (default: client)
//! - `SHOP_STORAGE_DIR` - Directory backing persistent storage (default: .soft-shop)
//! - `SHOP_SEARCH_DEBOUNCE_MS` - Quiet period before a search request (default: 400)
//! - `SHOP_LIST_LIMIT` - Page size sent to the list endpoint (default: server's)
//! - `SHOP_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 30)
//! - `SHOP_USERNAME` - Login username
//! - `SHOP_PASSWORD` - Login password
//! - `SHOP_CSRF_TOKEN` - CSRF token to use instead of the checkout page's
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use soft_shop_core::Variant;
use thiserror::Error;
use url::Url;

/// Default directory for the file-backed storage.
pub const DEFAULT_STORAGE_DIR: &str = ".soft-shop";

const DEFAULT_DEBOUNCE_MS: &str = "400";
const DEFAULT_REQUEST_TIMEOUT_SECS: &str = "30";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopConfig {
    /// Base URL of the storefront server
    pub base_url: Url,
    /// Deployed storefront variant
    pub variant: Variant,
    /// Directory backing persistent storage
    pub storage_dir: PathBuf,
    /// Quiet period after the last filter edit before searching
    pub search_debounce: Duration,
    /// Page size forwarded to the list endpoint
    pub list_limit: Option<u32>,
    /// HTTP request timeout
    pub request_timeout: Duration,
    /// Login credentials
    pub credentials: Option<Credentials>,
    /// CSRF token override
    pub csrf_token: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Username and password for the storefront login form.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl std::fmt::Debug for ShopConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopConfig")
            .field("base_url", &self.base_url.as_str())
            .field("variant", &self.variant)
            .field("storage_dir", &self.storage_dir)
            .field("search_debounce", &self.search_debounce)
            .field("list_limit", &self.list_limit)
            .field("request_timeout", &self.request_timeout)
            .field("credentials", &self.credentials)
            .field("csrf_token", &self.csrf_token.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl ShopConfig {
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

        let base_url = parse_base_url(&get_required_env("SHOP_BASE_URL")?)?;
        let variant = get_env_or_default("SHOP_VARIANT", Variant::Client.as_str())
            .parse::<Variant>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOP_VARIANT".to_string(), e.to_string()))?;
        let storage_dir = PathBuf::from(get_env_or_default("SHOP_STORAGE_DIR", DEFAULT_STORAGE_DIR));
        let search_debounce = Duration::from_millis(parse_env(
            "SHOP_SEARCH_DEBOUNCE_MS",
            &get_env_or_default("SHOP_SEARCH_DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS),
        )?);
        let list_limit = get_optional_env("SHOP_LIST_LIMIT")
            .map(|raw| parse_env("SHOP_LIST_LIMIT", &raw))
            .transpose()?;
        let request_timeout = Duration::from_secs(parse_env(
            "SHOP_REQUEST_TIMEOUT_SECS",
            &get_env_or_default("SHOP_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
        )?);

        let credentials = match (
            get_optional_env("SHOP_USERNAME"),
            get_optional_env("SHOP_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(Credentials {
                username,
                password: SecretString::from(password),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::MissingEnvVar("SHOP_PASSWORD".to_string())),
            (None, Some(_)) => return Err(ConfigError::MissingEnvVar("SHOP_USERNAME".to_string())),
        };

        Ok(Self {
            base_url,
            variant,
            storage_dir,
            search_debounce,
            list_limit,
            request_timeout,
            credentials,
            csrf_token: get_optional_env("SHOP_CSRF_TOKEN").map(SecretString::from),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration with defaults for everything but the server URL.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            variant: Variant::default(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            search_debounce: Duration::from_millis(400),
            list_limit: None,
            request_timeout: Duration::from_secs(30),
            credentials: None,
            csrf_token: None,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse the server URL. Only http(s) URLs with a host are accepted.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("SHOP_BASE_URL".to_string(), msg);

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("must have a host".to_string()));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_valid() {
        let url = parse_base_url("https://shop.example.com").unwrap();
        assert_eq!(url.host_str(), Some("shop.example.com"));
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        let err = parse_base_url("ftp://shop.example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_parse_base_url_garbage() {
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_parse_env_numbers() {
        assert_eq!(parse_env::<u64>("X", " 250 ").unwrap(), 250);
        let err = parse_env::<u32>("SHOP_LIST_LIMIT", "many").unwrap_err();
        assert!(err.to_string().starts_with("Invalid environment variable SHOP_LIST_LIMIT"));
    }

    #[test]
    fn test_defaults() {
        let config = ShopConfig::new(Url::parse("http://localhost:8080").unwrap());
        assert_eq!(config.variant, Variant::Client);
        assert_eq!(config.search_debounce, Duration::from_millis(400));
        assert_eq!(config.storage_dir, PathBuf::from(DEFAULT_STORAGE_DIR));
        assert!(config.list_limit.is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = ShopConfig::new(Url::parse("http://localhost:8080").unwrap());
        config.credentials = Some(Credentials {
            username: "alice".to_string(),
            password: SecretString::from("super_secret_password"),
        });
        config.csrf_token = Some(SecretString::from("super_secret_csrf"));

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("alice"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_password"));
        assert!(!debug_output.contains("super_secret_csrf"));
    }
}
