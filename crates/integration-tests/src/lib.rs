//! Integration tests for the Icarus MCP marketplace.
//!
//! Each test boots the real storefront router on an ephemeral port with an
//! in-memory ledger and the simulated wallet, then drives it over HTTP with
//! a cookie-carrying client. Contract artifacts are served by the
//! storefront's own `/static/artifacts/`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p icarus-market-integration-tests
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use icarus_market_storefront::config::{ConfigError, StorefrontConfig};
use icarus_market_storefront::ledger::MemoryLedgerStore;
use icarus_market_storefront::routes;
use icarus_market_storefront::state::AppState;
use reqwest::Client;
use tokio::net::TcpListener;

/// Wallet address the simulated provider authorizes in tests.
pub const TEST_WALLET: &str = "a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f90";

/// A running storefront and a client with its own cookie jar.
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
}

impl TestServer {
    /// Boot with the default test configuration.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn spawn() -> Self {
        Self::spawn_with(&[]).await
    }

    /// Boot with extra environment overrides.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn spawn_with(overrides: &[(&str, &str)]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let base_url = format!("http://{addr}");

        let config = test_config(&base_url, overrides).expect("Invalid test configuration");
        let state = AppState::new(config, Arc::new(MemoryLedgerStore::new()))
            .expect("Failed to initialize application state");
        let app = routes::app(state);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Test server error");
        });

        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self { base_url, client }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn test_config(
    base_url: &str,
    overrides: &[(&str, &str)],
) -> Result<StorefrontConfig, ConfigError> {
    let mut vars: HashMap<String, String> = [
        ("STOREFRONT_BASE_URL", base_url),
        ("WALLET_PROVIDER", "simulated"),
        ("WALLET_SIMULATED_ADDRESS", TEST_WALLET),
        ("WALLET_SIMULATED_LATENCY_MS", "0"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    for (key, value) in overrides {
        vars.insert((*key).to_string(), (*value).to_string());
    }

    StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
}
