//! Demo wallet used when no real provider is configured.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use icarus_market_core::WalletAddress;

use super::artifacts::encode_hex;
use super::provider::{
    Capabilities, DeployMetadata, METHOD_ACCOUNTS, ProviderError, REQUEST_ACCOUNTS_METHODS,
    WalletProvider,
};

/// A wallet that authorizes one fixed account after a short delay.
///
/// It never reports an existing authorization, so every session has to
/// connect explicitly. Deployments return a random 64-character hex contract
/// address and transfers always succeed.
#[derive(Debug, Clone)]
pub struct SimulatedProvider {
    address: WalletAddress,
    latency: Duration,
}

impl SimulatedProvider {
    #[must_use]
    pub const fn new(address: WalletAddress, latency: Duration) -> Self {
        Self { address, latency }
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl WalletProvider for SimulatedProvider {
    fn name(&self) -> &str {
        "simulated"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            request: true,
            contracts: true,
            ..Capabilities::default()
        }
    }

    async fn request(&self, method: &str, _params: Value) -> Result<Value, ProviderError> {
        if method == METHOD_ACCOUNTS {
            return Ok(json!([]));
        }
        if REQUEST_ACCOUNTS_METHODS.contains(&method) {
            self.delay().await;
            return Ok(json!({ "accounts": [{ "address": self.address.as_str() }] }));
        }
        Err(ProviderError::Rejected(format!("unsupported method {method}")))
    }

    async fn deploy(
        &self,
        _module_hex: &str,
        _interface_hex: &str,
        metadata: &DeployMetadata,
    ) -> Result<Value, ProviderError> {
        self.delay().await;
        let contract_address = encode_hex(&rand::random::<[u8; 32]>());
        tracing::debug!(product = %metadata.product_id, %contract_address, "Simulated deployment");
        Ok(json!({ "contract_address": contract_address }))
    }

    async fn execute(
        &self,
        _contract: &str,
        method: &str,
        _args: Value,
    ) -> Result<Value, ProviderError> {
        self.delay().await;
        tracing::debug!(method, "Simulated contract execution");
        Ok(json!({ "txn_result": "{\"Ok\":null}" }))
    }
}
