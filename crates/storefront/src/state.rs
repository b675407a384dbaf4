//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::StorefrontConfig;
use crate::ledger::LedgerStore;
use crate::services::{CheckoutService, InFlight};
use crate::weil::{ArtifactFetcher, ProviderError, WalletProvider, discover_provider};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the catalog, the wallet provider, and the ledger store.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    provider: Option<Arc<dyn WalletProvider>>,
    artifacts: ArtifactFetcher,
    ledger_store: Arc<dyn LedgerStore>,
    in_flight: InFlight,
}

impl AppState {
    /// Create a new application state, discovering the configured wallet provider.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `ledger_store` - Backing store for purchase ledgers
    ///
    /// # Errors
    ///
    /// Returns an error if the wallet provider cannot be constructed.
    pub fn new(
        config: StorefrontConfig,
        ledger_store: Arc<dyn LedgerStore>,
    ) -> Result<Self, ProviderError> {
        let provider = discover_provider(&config.wallet)?;
        Ok(Self::with_provider(config, ledger_store, provider, Catalog::builtin()))
    }

    /// Create a state with an explicit provider and catalog.
    #[must_use]
    pub fn with_provider(
        config: StorefrontConfig,
        ledger_store: Arc<dyn LedgerStore>,
        provider: Option<Arc<dyn WalletProvider>>,
        catalog: Catalog,
    ) -> Self {
        let artifacts = ArtifactFetcher::new(&config.artifacts);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                provider,
                artifacts,
                ledger_store,
                in_flight: InFlight::new(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// The discovered wallet provider, if any.
    #[must_use]
    pub fn provider(&self) -> Option<Arc<dyn WalletProvider>> {
        self.inner.provider.clone()
    }

    #[must_use]
    pub fn artifacts(&self) -> &ArtifactFetcher {
        &self.inner.artifacts
    }

    #[must_use]
    pub fn ledger_store(&self) -> Arc<dyn LedgerStore> {
        Arc::clone(&self.inner.ledger_store)
    }

    /// Checkout service borrowing this state.
    #[must_use]
    pub fn checkout(&self) -> CheckoutService<'_> {
        CheckoutService::new(
            &self.inner.catalog,
            &self.inner.artifacts,
            self.ledger_store(),
            &self.inner.in_flight,
            &self.inner.config.treasury_address,
        )
    }
}
