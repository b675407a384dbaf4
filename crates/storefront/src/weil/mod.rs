//! Wallet connection and contract deployment protocol.
//!
//! # Architecture
//!
//! The wallet provider is an opaque third-party object: its exact method
//! names and response shapes are not contractually fixed. Everything in this
//! module treats it as a capability set ([`WalletProvider`]) and normalizes
//! whatever comes back.
//!
//! ```text
//! UI action ─► WalletSession::connect ─► ArtifactFetcher::fetch_product
//!                                            │ (two GETs, joined)
//!                                            ▼
//!                               DeploymentInvoker::purchase ─► PurchaseLedger::record
//! ```
//!
//! # Providers
//!
//! - [`SimulatedProvider`] - Demo wallet: fixed account, artificial latency,
//!   random contract addresses
//! - [`RpcProvider`] - Proxies every call as JSON-RPC 2.0 to a wallet bridge
//!
//! # Example
//!
//! ```rust,ignore
//! use icarus_market_storefront::weil::{DeploymentInvoker, WalletSession};
//!
//! let mut session = WalletSession::new(state.provider());
//! let address = session.connect().await?;
//!
//! let invoker = DeploymentInvoker::new(&session, state.artifacts(), treasury);
//! let record = invoker.purchase(&product, &address).await?;
//! ```

mod artifacts;
mod deploy;
mod provider;
mod rpc;
mod session;
mod simulated;

#[cfg(test)]
pub(crate) mod stub;

use std::sync::Arc;

use thiserror::Error;

pub use artifacts::{ArtifactFetcher, EncodedArtifacts, encode_hex};
pub use deploy::{DeploymentInvoker, check_envelope, normalize_deploy_result};
pub use provider::{
    Capabilities, DeployMetadata, METHOD_ACCOUNTS, ProviderError, REQUEST_ACCOUNTS_METHODS,
    WalletProvider,
};
pub use rpc::RpcProvider;
pub use session::{ADDRESS_STRATEGIES, AddressStrategy, SessionSnapshot, WalletSession, first_account};
pub use simulated::SimulatedProvider;

use crate::config::{ProviderKind, WalletConfig};

/// Errors surfaced by the wallet protocol.
///
/// Every boundary call (provider discovery, connect, artifact fetch, deploy)
/// is mapped into one of these kinds rather than leaking a raw transport
/// error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeilError {
    /// No wallet provider is present.
    #[error("Wallet provider not found. Please install the wallet extension.")]
    ProviderMissing,

    /// The provider (or the user) declined the connection.
    #[error("Wallet connection rejected: {0}")]
    ConnectionRejected(String),

    /// Connected, but no address could be extracted from any known shape.
    #[error("Wallet connected, but no account address could be resolved")]
    AddressUnresolved,

    /// An operation needed a connected wallet session.
    #[error("Wallet not connected")]
    NotConnected,

    /// An artifact could not be retrieved.
    #[error("Failed to fetch artifact {url}: {reason}")]
    FetchFailed {
        /// Artifact URL.
        url: String,
        /// HTTP status, when the server answered.
        status: Option<u16>,
        /// Human-readable cause.
        reason: String,
    },

    /// The provider failed or rejected a deployment or transaction.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}

impl WeilError {
    /// HTTP status carried by a [`WeilError::FetchFailed`], if any.
    #[must_use]
    pub const fn fetch_status(&self) -> Option<u16> {
        match self {
            Self::FetchFailed { status, .. } => *status,
            _ => None,
        }
    }
}

/// Discover the wallet provider configured for this process.
///
/// Returns `Ok(None)` when the configuration says no provider is installed;
/// every connection attempt then fails with [`WeilError::ProviderMissing`].
///
/// # Errors
///
/// Returns `ProviderError` if the RPC provider's HTTP client cannot be built.
pub fn discover_provider(
    config: &WalletConfig,
) -> Result<Option<Arc<dyn WalletProvider>>, ProviderError> {
    let provider: Arc<dyn WalletProvider> = match config.provider {
        ProviderKind::None => {
            tracing::warn!("No wallet provider configured; wallet connections will fail");
            return Ok(None);
        }
        ProviderKind::Simulated => Arc::new(SimulatedProvider::new(
            config.simulated_address.clone(),
            config.simulated_latency,
        )),
        ProviderKind::Rpc => {
            let Some(rpc) = config.rpc.as_ref() else {
                return Err(ProviderError::Transport(
                    "WALLET_PROVIDER=rpc requires WALLET_RPC_URL".to_string(),
                ));
            };
            Arc::new(RpcProvider::new(rpc)?)
        }
    };

    tracing::info!(provider = provider.name(), "Wallet provider discovered");
    Ok(Some(provider))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use icarus_market_core::WalletAddress;

    use super::*;

    fn wallet_config(provider: ProviderKind) -> WalletConfig {
        WalletConfig {
            provider,
            rpc: None,
            simulated_address: WalletAddress::parse("abc123").unwrap(),
            simulated_latency: Duration::ZERO,
        }
    }

    #[test]
    fn test_fetch_failed_display_and_status() {
        let err = WeilError::FetchFailed {
            url: "http://artifacts/discord.wasm".to_string(),
            status: Some(404),
            reason: "HTTP 404 Not Found".to_string(),
        };
        assert_eq!(err.fetch_status(), Some(404));
        assert_eq!(
            err.to_string(),
            "Failed to fetch artifact http://artifacts/discord.wasm: HTTP 404 Not Found"
        );
    }

    #[test]
    fn test_discover_none_means_missing() {
        let provider = discover_provider(&wallet_config(ProviderKind::None));
        assert!(matches!(provider, Ok(None)));
    }

    #[test]
    fn test_discover_simulated() {
        let provider = discover_provider(&wallet_config(ProviderKind::Simulated));
        assert!(matches!(provider, Ok(Some(p)) if p.name() == "simulated"));
    }

    #[test]
    fn test_discover_rpc_without_url_fails() {
        let provider = discover_provider(&wallet_config(ProviderKind::Rpc));
        assert!(provider.is_err());
    }
}
