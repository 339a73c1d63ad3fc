//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_STOREFRONT_PUBLIC_TOKEN` - Storefront API public access token
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (default: `http://{host}:{port}`)
//! - `SHOPIFY_API_VERSION` - API version (default: 2025-01)
//! - `SHOPIFY_SHOP_ID` - Shop GID used in analytics payloads
//! - `SHOPIFY_STOREFRONT_ID` - Storefront (sales channel) ID for analytics
//! - `FUNNELS_STORE_ID` - Tenant ID scoping the cart cookie (overrides the product blob)
//! - `PRODUCT_DATA_PATH` - Product blob JSON (default: crates/storefront/content/product.json)
//! - `CMS_SPEC_URL` - Landing page document endpoint
//! - `ANALYTICS_ENDPOINT` - Analytics batch endpoint (default: Shopify monorail)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default Storefront API version.
pub const DEFAULT_API_VERSION: &str = "2025-01";

/// Default analytics batch endpoint.
pub const DEFAULT_ANALYTICS_ENDPOINT: &str =
    "https://monorail-edge.shopifysvc.com/unstable/produce_batch";

/// Default location of the product blob.
pub const DEFAULT_PRODUCT_DATA_PATH: &str = "crates/storefront/content/product.json";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Shopify Storefront API configuration
    pub shopify: ShopifyStorefrontConfig,
    /// Tenant ID for the cart cookie; falls back to the product blob's `_storeId`
    pub store_id: Option<String>,
    /// Path of the product blob
    pub product_data_path: PathBuf,
    /// CMS document URL
    pub cms_spec_url: Option<String>,
    /// Analytics configuration
    pub analytics: AnalyticsConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Shopify Storefront API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopifyStorefrontConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store: String,
    /// Shopify API version (e.g., 2025-01)
    pub api_version: String,
    /// Storefront API public access token
    pub storefront_public_token: SecretString,
}

impl std::fmt::Debug for ShopifyStorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyStorefrontConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("storefront_public_token", &"[REDACTED]")
            .finish()
    }
}

impl ShopifyStorefrontConfig {
    /// GraphQL endpoint for this store and API version.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!(
            "https://{}/api/{}/graphql.json",
            self.store, self.api_version
        )
    }

    /// The public token as a plain string.
    #[must_use]
    pub fn public_token(&self) -> &str {
        self.storefront_public_token.expose_secret()
    }
}

/// Shopify analytics configuration.
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Batch endpoint events are posted to
    pub endpoint: String,
    /// Shop GID (`gid://shopify/Shop/<n>`)
    pub shop_id: String,
    /// Storefront ID, empty for headless channels without one
    pub storefront_id: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ANALYTICS_ENDPOINT.to_string(),
            shop_id: String::new(),
            storefront_id: String::new(),
        }
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
    /// if the access token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_optional_env("STOREFRONT_BASE_URL")
            .unwrap_or_else(|| format!("http://{host}:{port}"));
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let shopify = ShopifyStorefrontConfig::from_env()?;
        let analytics = AnalyticsConfig::from_env();

        Ok(Self {
            host,
            port,
            base_url,
            shopify,
            store_id: get_optional_env("FUNNELS_STORE_ID"),
            product_data_path: PathBuf::from(get_env_or_default(
                "PRODUCT_DATA_PATH",
                DEFAULT_PRODUCT_DATA_PATH,
            )),
            cms_spec_url: get_optional_env("CMS_SPEC_URL"),
            analytics,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_rate("SENTRY_TRACES_SAMPLE_RATE", 0.1)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyStorefrontConfig {
    /// Load only the Shopify settings, for tools that need no server config.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the store or token is missing or the token
    /// looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            store: get_required_env("SHOPIFY_STORE")?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            storefront_public_token: get_validated_secret("SHOPIFY_STOREFRONT_PUBLIC_TOKEN")?,
        })
    }
}

impl AnalyticsConfig {
    fn from_env() -> Self {
        Self {
            endpoint: get_env_or_default("ANALYTICS_ENDPOINT", DEFAULT_ANALYTICS_ENDPOINT),
            shop_id: get_env_or_default("SHOPIFY_SHOP_ID", ""),
            storefront_id: get_env_or_default("SHOPIFY_STOREFRONT_ID", ""),
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

/// Get an optional environment variable, treating empty as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a sample rate in `0.0..=1.0`.
fn get_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ));
    }
    Ok(rate)
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

/// Validate that a token is not a placeholder and has sufficient entropy.
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

    // Storefront tokens are 32 random hex characters
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the token from the Headless channel settings."
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shopify_config() -> ShopifyStorefrontConfig {
        ShopifyStorefrontConfig {
            store: "test.myshopify.com".to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            storefront_public_token: SecretString::from("super_secret_public_token"),
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-storefront-token", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_hex_token() {
        let result = validate_secret_strength("5f0b8e2c9d4a71e36b2f8c0d9a1e4b7c", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_endpoint_uses_store_and_version() {
        assert_eq!(
            shopify_config().endpoint(),
            "https://test.myshopify.com/api/2025-01/graphql.json"
        );
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            shopify: shopify_config(),
            store_id: None,
            product_data_path: PathBuf::from(DEFAULT_PRODUCT_DATA_PATH),
            cms_spec_url: None,
            analytics: AnalyticsConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_shopify_config_debug_redacts_token() {
        let debug_output = format!("{:?}", shopify_config());

        assert!(debug_output.contains("test.myshopify.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_public_token"));
    }
}
