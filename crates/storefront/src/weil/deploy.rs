//! Contract deployment and purchase submission.
//!
//! Deploy responses come back in several shapes:
//!
//! ```text
//! "9f1a..."                                  plain string
//! {"address": "9f1a..."}                     address field
//! {"contract_address": "9f1a..."}            snake or camel case
//! {"txn_result": "{\"Ok\": {...}}"}          stringified envelope
//! {"txn_result": "{\"Err\": \"reason\"}"}    stringified failure
//! ```
//!
//! [`normalize_deploy_result`] walks these in order. A call that succeeded
//! but carried no recognizable address yields [`DeploymentResult::Unknown`].

use chrono::Utc;
use serde_json::{Value, json};
use tracing::instrument;

use icarus_market_core::{DeploymentResult, Product, PurchaseRecord, WalletAddress};

use super::artifacts::ArtifactFetcher;
use super::provider::{DeployMetadata, ProviderError, WalletProvider};
use super::session::WalletSession;
use super::WeilError;

/// Method invoked on the treasury contract for fixed-address purchases.
const TRANSFER_METHOD: &str = "transfer";

/// Submits deployments and purchases through a connected wallet session.
pub struct DeploymentInvoker<'a> {
    session: &'a WalletSession,
    artifacts: &'a ArtifactFetcher,
    treasury: &'a str,
}

impl<'a> DeploymentInvoker<'a> {
    #[must_use]
    pub const fn new(
        session: &'a WalletSession,
        artifacts: &'a ArtifactFetcher,
        treasury: &'a str,
    ) -> Self {
        Self {
            session,
            artifacts,
            treasury,
        }
    }

    /// Deploy encoded artifacts and normalize the provider's answer.
    ///
    /// # Errors
    ///
    /// - [`WeilError::NotConnected`] if the session is not connected
    /// - [`WeilError::TransactionFailed`] if the provider fails or reports `Err`
    #[instrument(skip(self, module_hex, interface_hex), fields(product = %metadata.product_id))]
    pub async fn deploy(
        &self,
        module_hex: &str,
        interface_hex: &str,
        metadata: &DeployMetadata,
    ) -> Result<DeploymentResult, WeilError> {
        let provider = self.contracts_provider()?;

        let response = provider
            .deploy(module_hex, interface_hex, metadata)
            .await
            .map_err(transaction_failed)?;

        let result = normalize_deploy_result(&response)?;
        if result.is_unknown() {
            tracing::warn!(response = %response, "Deployment succeeded without a contract address");
        }
        Ok(result)
    }

    /// Buy one product for `wallet`.
    ///
    /// Products with a fixed target address are paid for by a transfer to the
    /// treasury; all others are deployed from their artifacts.
    ///
    /// # Errors
    ///
    /// - [`WeilError::NotConnected`] if the session is not connected
    /// - [`WeilError::FetchFailed`] if either artifact cannot be retrieved
    /// - [`WeilError::TransactionFailed`] if the provider fails or reports `Err`
    #[instrument(skip(self, product, wallet), fields(product = %product.id))]
    pub async fn purchase(
        &self,
        product: &Product,
        wallet: &WalletAddress,
    ) -> Result<PurchaseRecord, WeilError> {
        let provider = self.contracts_provider()?;

        let address = if let Some(target) = &product.target_address {
            let args = json!({
                "amount": product.price.amount.to_string(),
                "to": self.treasury,
                "from": wallet.as_str(),
                "product": product.id.as_str(),
            });
            let envelope = provider
                .execute(self.treasury, TRANSFER_METHOD, args)
                .await
                .map_err(transaction_failed)?;
            check_envelope(&envelope)?;
            target.clone()
        } else {
            let paths = product.artifacts().ok_or_else(|| {
                WeilError::TransactionFailed(format!("{} has no deployment artifacts", product.id))
            })?;
            let encoded = self.artifacts.fetch_product(&paths).await?;
            let metadata = DeployMetadata::for_product(product, wallet);
            self.deploy(&encoded.module_hex, &encoded.interface_hex, &metadata)
                .await?
                .into_address()
        };

        tracing::info!(address = %address, "Purchase completed");

        Ok(PurchaseRecord {
            product_id: product.id.clone(),
            name: product.name.clone(),
            address,
            price: product.price,
            purchased_at: Utc::now(),
        })
    }

    /// The connected provider, provided it exposes the contracts API.
    fn contracts_provider(&self) -> Result<&dyn WalletProvider, WeilError> {
        let (provider, _) = self.session.connected()?;
        if !provider.capabilities().contracts {
            return Err(WeilError::TransactionFailed(
                "provider exposes no contracts API".to_string(),
            ));
        }
        Ok(provider)
    }
}

/// Reduce a deploy response to an address.
///
/// # Errors
///
/// Returns [`WeilError::TransactionFailed`] when the response, or the envelope
/// inside its `txn_result`, carries an `Err` member.
pub fn normalize_deploy_result(response: &Value) -> Result<DeploymentResult, WeilError> {
    fail_on_err(response)?;

    if let Some(address) = direct_address(response) {
        return Ok(DeploymentResult::Address(address));
    }

    if let Some(envelope) = txn_result(response) {
        fail_on_err(&envelope)?;
        let inner = envelope.get("Ok").unwrap_or(&envelope);
        if let Some(address) = direct_address(inner) {
            return Ok(DeploymentResult::Address(address));
        }
    }

    Ok(DeploymentResult::Unknown)
}

/// Check a transaction envelope for an explicit failure.
///
/// Anything without an `Err` member, malformed or not, counts as success.
///
/// # Errors
///
/// Returns [`WeilError::TransactionFailed`] when the envelope, or its
/// `txn_result`, carries an `Err` member.
pub fn check_envelope(envelope: &Value) -> Result<(), WeilError> {
    fail_on_err(envelope)?;
    if let Some(inner) = txn_result(envelope) {
        fail_on_err(&inner)?;
    }
    Ok(())
}

fn fail_on_err(value: &Value) -> Result<(), WeilError> {
    match value.get("Err") {
        Some(Value::String(reason)) => Err(WeilError::TransactionFailed(reason.clone())),
        Some(other) => Err(WeilError::TransactionFailed(other.to_string())),
        None => Ok(()),
    }
}

/// The `txn_result` member, parsed when it is a JSON string.
fn txn_result(value: &Value) -> Option<Value> {
    match value.get("txn_result")? {
        Value::String(raw) => serde_json::from_str(raw).ok(),
        other => Some(other.clone()),
    }
}

/// First non-blank address in a string or one of the address fields.
fn direct_address(value: &Value) -> Option<String> {
    let non_blank = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };

    match value {
        Value::String(s) => non_blank(s.as_str()),
        Value::Object(map) => ["address", "contract_address", "contractAddress"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str).and_then(non_blank)),
        _ => None,
    }
}

fn transaction_failed(error: ProviderError) -> WeilError {
    match error {
        ProviderError::Rejected(detail) | ProviderError::Transport(detail) => {
            WeilError::TransactionFailed(detail)
        }
        unsupported @ ProviderError::Unsupported(_) => {
            WeilError::TransactionFailed(unsupported.to_string())
        }
    }
}
