//! Capability-set abstraction over the wallet provider.
//!
//! Providers in the wild expose an unpredictable subset of
//! `{enable, connect, request, getAddress, getAccounts, address,
//! selectedAddress, contracts}`. [`WalletProvider`] models every member as
//! optional: the default method bodies report [`ProviderError::Unsupported`],
//! and [`Capabilities`] lets callers check presence before calling.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use icarus_market_core::{Product, WalletAddress};

/// Read-only query for already-authorized accounts (never prompts).
pub const METHOD_ACCOUNTS: &str = "weil_accounts";

/// Request-style account authorization methods, tried in order.
pub const REQUEST_ACCOUNTS_METHODS: [&str; 3] =
    ["weil_requestAccounts", "eth_requestAccounts", "connect"];

/// Raw errors reported by a provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider does not expose this member.
    #[error("provider does not support `{0}`")]
    Unsupported(&'static str),

    /// The provider (or the user) declined the call.
    #[error("{0}")]
    Rejected(String),

    /// The provider could not be reached or answered garbage.
    #[error("provider transport error: {0}")]
    Transport(String),
}

/// Which optional members a provider exposes.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// `enable()`
    pub enable: bool,
    /// `connect()`
    pub connect: bool,
    /// `request({method, params})`
    pub request: bool,
    /// `getAddress()`
    pub get_address: bool,
    /// `getAccounts()`
    pub get_accounts: bool,
    /// `address` field
    pub address: bool,
    /// `selectedAddress` field
    pub selected_address: bool,
    /// `contracts.deploy` / `contracts.execute`
    pub contracts: bool,
}

/// Metadata submitted alongside a contract deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployMetadata {
    pub product_id: String,
    pub name: String,
    pub description: String,
    pub owner: String,
}

impl DeployMetadata {
    /// Metadata for deploying `product` on behalf of `owner`.
    #[must_use]
    pub fn for_product(product: &Product, owner: &WalletAddress) -> Self {
        Self {
            product_id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            owner: owner.to_string(),
        }
    }
}

/// An externally supplied wallet.
///
/// Responses are returned as untyped JSON because their shape is not
/// guaranteed; normalization happens in the session and invoker.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Members this provider exposes.
    fn capabilities(&self) -> Capabilities;

    /// `enable()`: prompt for authorization.
    async fn enable(&self) -> Result<Value, ProviderError> {
        Err(ProviderError::Unsupported("enable"))
    }

    /// `connect()`: prompt for authorization.
    async fn connect(&self) -> Result<Value, ProviderError> {
        Err(ProviderError::Unsupported("connect"))
    }

    /// Generic `request({method, params})` call.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let _ = (method, params);
        Err(ProviderError::Unsupported("request"))
    }

    /// `getAddress()` accessor.
    async fn get_address(&self) -> Result<Value, ProviderError> {
        Err(ProviderError::Unsupported("getAddress"))
    }

    /// `getAccounts()` accessor.
    async fn get_accounts(&self) -> Result<Value, ProviderError> {
        Err(ProviderError::Unsupported("getAccounts"))
    }

    /// `address` field on the raw provider.
    fn address(&self) -> Option<String> {
        None
    }

    /// `selectedAddress` field on the raw provider.
    fn selected_address(&self) -> Option<String> {
        None
    }

    /// `contracts.deploy(moduleHex, interfaceHex, metadata)`.
    async fn deploy(
        &self,
        module_hex: &str,
        interface_hex: &str,
        metadata: &DeployMetadata,
    ) -> Result<Value, ProviderError> {
        let _ = (module_hex, interface_hex, metadata);
        Err(ProviderError::Unsupported("contracts.deploy"))
    }

    /// `contracts.execute(contract, method, args)`.
    async fn execute(
        &self,
        contract: &str,
        method: &str,
        args: Value,
    ) -> Result<Value, ProviderError> {
        let _ = (contract, method, args);
        Err(ProviderError::Unsupported("contracts.execute"))
    }
}
