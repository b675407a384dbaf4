//! Per-session wallet connection state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use icarus_market_core::{ConnectionStatus, WalletAddress};

use super::WeilError;
use super::provider::{METHOD_ACCOUNTS, ProviderError, REQUEST_ACCOUNTS_METHODS, WalletProvider};

/// Places an account address may hide after a successful connection step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressStrategy {
    /// `getAddress()` accessor.
    Accessor,
    /// `address` field on the connection response.
    ResponseField,
    /// First entry of an accounts list (response array, `accounts` field, or
    /// `getAccounts()`).
    AccountsList,
    /// `address` field on the raw provider.
    ProviderAddress,
    /// `selectedAddress` field on the raw provider.
    SelectedAddress,
}

/// Address extraction order. The first strategy that yields an address wins.
pub const ADDRESS_STRATEGIES: [AddressStrategy; 5] = [
    AddressStrategy::Accessor,
    AddressStrategy::ResponseField,
    AddressStrategy::AccountsList,
    AddressStrategy::ProviderAddress,
    AddressStrategy::SelectedAddress,
];

/// Serializable part of a [`WalletSession`], stored in the HTTP session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: ConnectionStatus,
    pub address: Option<WalletAddress>,
}

/// Wallet connection for one browser session.
///
/// The address is cached once resolved; a connected session never calls the
/// provider again to connect.
pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    status: ConnectionStatus,
    address: Option<WalletAddress>,
}

impl WalletSession {
    /// A fresh, disconnected session.
    #[must_use]
    pub const fn new(provider: Option<Arc<dyn WalletProvider>>) -> Self {
        Self {
            provider,
            status: ConnectionStatus::Disconnected,
            address: None,
        }
    }

    /// Rebuild a session from its stored snapshot.
    ///
    /// A snapshot caught mid-connection (or connected without an address) is
    /// restored as disconnected.
    #[must_use]
    pub fn restore(provider: Option<Arc<dyn WalletProvider>>, snapshot: SessionSnapshot) -> Self {
        match (snapshot.status, snapshot.address) {
            (ConnectionStatus::Connected, Some(address)) => Self {
                provider,
                status: ConnectionStatus::Connected,
                address: Some(address),
            },
            _ => Self::new(provider),
        }
    }

    /// State to persist between requests.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            address: self.address.clone(),
        }
    }

    #[must_use]
    pub const fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Resolved address, once connected.
    #[must_use]
    pub const fn address(&self) -> Option<&WalletAddress> {
        self.address.as_ref()
    }

    /// Provider and address of a connected session.
    ///
    /// # Errors
    ///
    /// Returns [`WeilError::NotConnected`] unless the session is connected.
    pub fn connected(&self) -> Result<(&dyn WalletProvider, &WalletAddress), WeilError> {
        match (self.status, self.provider.as_deref(), self.address.as_ref()) {
            (ConnectionStatus::Connected, Some(provider), Some(address)) => Ok((provider, address)),
            _ => Err(WeilError::NotConnected),
        }
    }

    /// Connect the wallet and resolve its account address.
    ///
    /// # Errors
    ///
    /// - [`WeilError::ProviderMissing`] when no provider is installed
    /// - [`WeilError::ConnectionRejected`] when the provider declines
    /// - [`WeilError::AddressUnresolved`] when no address can be extracted
    #[tracing::instrument(skip(self), fields(provider = tracing::field::Empty))]
    pub async fn connect(&mut self) -> Result<WalletAddress, WeilError> {
        if let (ConnectionStatus::Connected, Some(address)) = (self.status, &self.address) {
            return Ok(address.clone());
        }

        let provider = self.provider.clone().ok_or(WeilError::ProviderMissing)?;
        tracing::Span::current().record("provider", provider.name());

        self.status = ConnectionStatus::Connecting;
        let result = match authorize(provider.as_ref()).await {
            Ok(response) => resolve_address(provider.as_ref(), &response)
                .await
                .ok_or(WeilError::AddressUnresolved),
            Err(e) => Err(e),
        };

        match result {
            Ok(address) => {
                tracing::info!(address = %address.short(), "Wallet connected");
                self.status = ConnectionStatus::Connected;
                self.address = Some(address.clone());
                Ok(address)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Wallet connection failed");
                self.status = ConnectionStatus::Disconnected;
                self.address = None;
                Err(e)
            }
        }
    }

    /// Look for an already-authorized account without prompting.
    ///
    /// Failures are logged and reported as "not connected".
    pub async fn check_existing_connection(&mut self) -> Option<WalletAddress> {
        if let (ConnectionStatus::Connected, Some(address)) = (self.status, &self.address) {
            return Some(address.clone());
        }

        let provider = self.provider.clone()?;
        let caps = provider.capabilities();

        let response = if caps.request {
            provider.request(METHOD_ACCOUNTS, Value::Null).await
        } else if caps.get_accounts {
            provider.get_accounts().await
        } else {
            return None;
        };

        let address = match response {
            Ok(value) => accounts_of(&value).and_then(first_account).and_then(parse_address),
            Err(e) => {
                tracing::warn!(error = %e, "Silent wallet check failed");
                None
            }
        }?;

        tracing::debug!(address = %address.short(), "Existing wallet authorization found");
        self.status = ConnectionStatus::Connected;
        self.address = Some(address.clone());
        Some(address)
    }
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_owned()))
            .field("status", &self.status)
            .field("address", &self.address)
            .finish()
    }
}

/// Run the first available connection strategy.
async fn authorize(provider: &dyn WalletProvider) -> Result<Value, WeilError> {
    let caps = provider.capabilities();

    if caps.enable {
        return provider.enable().await.map_err(rejected);
    }
    if caps.connect {
        return provider.connect().await.map_err(rejected);
    }
    if caps.request {
        let mut last_error = None;
        for method in REQUEST_ACCOUNTS_METHODS {
            match provider.request(method, Value::Null).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::debug!(method, error = %e, "Account request failed, trying next method");
                    last_error = Some(e);
                }
            }
        }
        return Err(last_error.map_or_else(
            || WeilError::ConnectionRejected("no account request method succeeded".to_string()),
            rejected,
        ));
    }

    Err(WeilError::ConnectionRejected(
        "provider exposes no connection method".to_string(),
    ))
}

fn rejected(error: ProviderError) -> WeilError {
    match error {
        ProviderError::Rejected(detail) | ProviderError::Transport(detail) => {
            WeilError::ConnectionRejected(detail)
        }
        ProviderError::Unsupported(member) => {
            WeilError::ConnectionRejected(format!("provider does not support {member}"))
        }
    }
}

/// Walk [`ADDRESS_STRATEGIES`] until one yields a valid address.
async fn resolve_address(provider: &dyn WalletProvider, response: &Value) -> Option<WalletAddress> {
    for strategy in ADDRESS_STRATEGIES {
        if let Some(address) = try_strategy(strategy, provider, response)
            .await
            .and_then(parse_address)
        {
            tracing::debug!(?strategy, "Resolved wallet address");
            return Some(address);
        }
    }
    None
}

async fn try_strategy(
    strategy: AddressStrategy,
    provider: &dyn WalletProvider,
    response: &Value,
) -> Option<String> {
    let caps = provider.capabilities();

    match strategy {
        AddressStrategy::Accessor => {
            if !caps.get_address {
                return None;
            }
            match provider.get_address().await {
                Ok(value) => address_of(&value),
                Err(e) => {
                    tracing::debug!(error = %e, "getAddress failed");
                    None
                }
            }
        }
        AddressStrategy::ResponseField => response
            .get("address")
            .and_then(Value::as_str)
            .map(str::to_owned),
        AddressStrategy::AccountsList => {
            if let Some(accounts) = accounts_of(response) {
                return first_account(accounts);
            }
            if !caps.get_accounts {
                return None;
            }
            match provider.get_accounts().await {
                Ok(value) => accounts_of(&value).and_then(first_account),
                Err(e) => {
                    tracing::debug!(error = %e, "getAccounts failed");
                    None
                }
            }
        }
        AddressStrategy::ProviderAddress => caps.address.then(|| provider.address()).flatten(),
        AddressStrategy::SelectedAddress => caps
            .selected_address
            .then(|| provider.selected_address())
            .flatten(),
    }
}

/// The accounts list inside a response: the value itself if it is an array,
/// else its `accounts` field.
fn accounts_of(value: &Value) -> Option<&Value> {
    if value.is_array() {
        return Some(value);
    }
    value.get("accounts").filter(|accounts| accounts.is_array())
}

/// First account of a list, whether a plain string or an object with an
/// `address` field.
#[must_use]
pub fn first_account(accounts: &Value) -> Option<String> {
    accounts.as_array()?.first().and_then(address_of)
}

fn address_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("address").and_then(Value::as_str).map(str::to_owned),
        _ => None,
    }
}

fn parse_address(raw: String) -> Option<WalletAddress> {
    WalletAddress::parse(&raw).ok()
}
