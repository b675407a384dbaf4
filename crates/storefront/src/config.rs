//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; the defaults run the marketplace against the
//! simulated wallet with an in-memory ledger.
//!
//! ## Server
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL (default: <http://localhost:3000>)
//! - `STOREFRONT_DATABASE_URL` / `DATABASE_URL` - `PostgreSQL` ledger store
//!
//! ## Wallet
//! - `WALLET_PROVIDER` - `simulated`, `rpc`, or `none` (default: simulated)
//! - `WALLET_RPC_URL` - JSON-RPC wallet bridge (required for `rpc`)
//! - `WALLET_RPC_TOKEN` - Bearer token for the bridge (high entropy)
//! - `WALLET_SIMULATED_ADDRESS` - Account the simulated wallet authorizes
//! - `WALLET_SIMULATED_LATENCY_MS` - Simulated wallet delay (default: 800)
//! - `WEIL_TREASURY_ADDRESS` - Destination of purchase transfers
//!
//! ## Artifacts
//! - `ARTIFACT_BASE_URL` - Artifact server (default: `{base_url}/static/artifacts/`)
//! - `ARTIFACT_CACHE_TTL_SECS` - Artifact cache TTL (default: 600)
//!
//! ## Error tracking
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use icarus_market_core::WalletAddress;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_SIMULATED_ADDRESS: &str =
    "7a3f2c8e9b1d4a5c6f0e8b2a9c3d1f5e8a4b7c2d9f1a3e5b8c0d2f4a6e9b1c3d";
const DEFAULT_TREASURY_ADDRESS: &str =
    "dd8adf2deabf470c5d4d578abc0072b8be3e68dafe72ac29e434fb0cb5e1b6a1";

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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// `PostgreSQL` URL for the ledger store; in-memory when unset
    pub database_url: Option<SecretString>,
    /// Wallet provider selection
    pub wallet: WalletConfig,
    /// Artifact server
    pub artifacts: ArtifactConfig,
    /// Treasury contract receiving purchase transfers
    pub treasury_address: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

/// Which wallet provider the server discovers at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// No provider installed.
    None,
    /// Built-in demo wallet.
    Simulated,
    /// JSON-RPC wallet bridge.
    Rpc,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "simulated" => Ok(Self::Simulated),
            "rpc" => Ok(Self::Rpc),
            other => Err(format!("expected simulated, rpc, or none (got '{other}')")),
        }
    }
}

/// Wallet provider configuration.
#[derive(Debug, Clone)]
pub struct WalletConfig {
    pub provider: ProviderKind,
    /// Bridge settings, present when `WALLET_RPC_URL` is set
    pub rpc: Option<WalletRpcConfig>,
    pub simulated_address: WalletAddress,
    pub simulated_latency: Duration,
}

/// JSON-RPC wallet bridge configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct WalletRpcConfig {
    pub url: Url,
    pub token: Option<SecretString>,
}

impl std::fmt::Debug for WalletRpcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletRpcConfig")
            .field("url", &self.url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Artifact server configuration.
#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    /// Base URL artifact paths are resolved against (ends with `/`)
    pub base_url: Url,
    /// How long fetched artifacts stay cached
    pub cache_ttl: Duration,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid or a secret fails
    /// validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let host = env.parse_or("STOREFRONT_HOST", "127.0.0.1")?;
        let port = env.parse_or("STOREFRONT_PORT", "3000")?;
        let base_url = env
            .or_default("STOREFRONT_BASE_URL", "http://localhost:3000")
            .trim_end_matches('/')
            .to_string();
        let database_url = env
            .optional("STOREFRONT_DATABASE_URL")
            .or_else(|| env.optional("DATABASE_URL"))
            .map(SecretString::from);

        let wallet = WalletConfig::from_env(&env)?;
        let artifacts = ArtifactConfig::from_env(&env, &base_url)?;
        let treasury_address = env.or_default("WEIL_TREASURY_ADDRESS", DEFAULT_TREASURY_ADDRESS);

        Ok(Self {
            host,
            port,
            base_url,
            database_url,
            wallet,
            artifacts,
            treasury_address,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parse_or("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: env.parse_or("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Configuration with every default applied.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the defaults are valid.
    pub fn local() -> Result<Self, ConfigError> {
        Self::from_lookup(|_| None)
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` flag.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl WalletConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let provider: ProviderKind = env.parse_or("WALLET_PROVIDER", "simulated")?;

        let rpc = match env.optional("WALLET_RPC_URL") {
            Some(url) => Some(WalletRpcConfig {
                url: Url::parse(&url).map_err(|e| {
                    ConfigError::InvalidEnvVar("WALLET_RPC_URL".to_string(), e.to_string())
                })?,
                token: env.optional_secret("WALLET_RPC_TOKEN")?,
            }),
            None if provider == ProviderKind::Rpc => {
                return Err(ConfigError::MissingEnvVar("WALLET_RPC_URL".to_string()));
            }
            None => None,
        };

        let simulated_address = WalletAddress::parse(
            &env.or_default("WALLET_SIMULATED_ADDRESS", DEFAULT_SIMULATED_ADDRESS),
        )
        .map_err(|e| {
            ConfigError::InvalidEnvVar("WALLET_SIMULATED_ADDRESS".to_string(), e.to_string())
        })?;
        let latency_ms: u64 = env.parse_or("WALLET_SIMULATED_LATENCY_MS", "800")?;

        Ok(Self {
            provider,
            rpc,
            simulated_address,
            simulated_latency: Duration::from_millis(latency_ms),
        })
    }
}

impl ArtifactConfig {
    fn from_env(env: &Env<'_>, base_url: &str) -> Result<Self, ConfigError> {
        let raw = env
            .optional("ARTIFACT_BASE_URL")
            .unwrap_or_else(|| format!("{base_url}/static/artifacts/"));
        // Url::join drops the last segment unless the base ends with '/'
        let raw = if raw.ends_with('/') {
            raw
        } else {
            format!("{raw}/")
        };
        let base_url = Url::parse(&raw).map_err(|e| {
            ConfigError::InvalidEnvVar("ARTIFACT_BASE_URL".to_string(), e.to_string())
        })?;
        let ttl_secs: u64 = env.parse_or("ARTIFACT_CACHE_TTL_SECS", "600")?;

        Ok(Self {
            base_url,
            cache_ttl: Duration::from_secs(ttl_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable source, `std::env` in production.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to a default.
    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Load and validate an optional secret.
    fn optional_secret(&self, key: &str) -> Result<Option<SecretString>, ConfigError> {
        self.optional(key)
            .map(|value| {
                validate_secret_strength(&value, key)?;
                Ok(SecretString::from(value))
            })
            .transpose()
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(validate_secret_strength("your-bridge-token", "TEST_VAR").is_err());
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR").is_err());
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::local().unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.base_url, "http://localhost:3000");
        assert!(config.database_url.is_none());
        assert!(!config.secure_cookies());
        assert_eq!(config.wallet.provider, ProviderKind::Simulated);
        assert_eq!(config.wallet.simulated_latency, Duration::from_millis(800));
        assert_eq!(config.wallet.simulated_address.as_str(), DEFAULT_SIMULATED_ADDRESS);
        assert_eq!(
            config.artifacts.base_url.as_str(),
            "http://localhost:3000/static/artifacts/"
        );
        assert_eq!(config.artifacts.cache_ttl, Duration::from_secs(600));
        assert_eq!(config.treasury_address, DEFAULT_TREASURY_ADDRESS);
    }

    #[test]
    fn test_database_url_fallback() {
        let config = config(&[("DATABASE_URL", "postgres://localhost/ledger")]).unwrap();
        assert_eq!(
            config.database_url.unwrap().expose_secret(),
            "postgres://localhost/ledger"
        );
    }

    #[test]
    fn test_artifact_base_gets_trailing_slash() {
        let config = config(&[("ARTIFACT_BASE_URL", "https://cdn.example.org/mcp")]).unwrap();
        assert_eq!(
            config.artifacts.base_url.as_str(),
            "https://cdn.example.org/mcp/"
        );
    }

    #[test]
    fn test_rpc_provider_requires_url() {
        let result = config(&[("WALLET_PROVIDER", "rpc")]);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(ref key)) if key == "WALLET_RPC_URL"));

        let config = config(&[
            ("WALLET_PROVIDER", "RPC"),
            ("WALLET_RPC_URL", "http://127.0.0.1:8545"),
        ])
        .unwrap();
        assert_eq!(config.wallet.provider, ProviderKind::Rpc);
        assert!(config.wallet.rpc.is_some());
    }

    #[test]
    fn test_rpc_token_is_validated_and_redacted() {
        let result = config(&[
            ("WALLET_RPC_URL", "http://127.0.0.1:8545"),
            ("WALLET_RPC_TOKEN", "changeme"),
        ]);
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));

        let config = config(&[
            ("WALLET_RPC_URL", "http://127.0.0.1:8545"),
            ("WALLET_RPC_TOKEN", "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6"),
        ])
        .unwrap();
        let debug_output = format!("{:?}", config.wallet.rpc.unwrap());
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("aB3$xY9"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config(&[("STOREFRONT_PORT", "not-a-port")]),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            config(&[("WALLET_PROVIDER", "metamask")]),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            config(&[("WALLET_SIMULATED_ADDRESS", "has space")]),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_https_base_url_secures_cookies() {
        let config = config(&[("STOREFRONT_BASE_URL", "https://market.example.org/")]).unwrap();
        assert!(config.secure_cookies());
        assert_eq!(config.base_url, "https://market.example.org");
    }
}
