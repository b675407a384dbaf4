//! Checkout service.
//!
//! Runs one purchase end to end:
//!
//! 1. resolve the product in the catalog
//! 2. require a connected wallet
//! 3. claim the wallet's in-flight slot
//! 4. refuse products the wallet already owns
//! 5. deploy or transfer through the wallet, then record the purchase
//!
//! A failure at any step leaves the ledger untouched. Nothing is retried.

mod error;

pub use error::CheckoutError;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use icarus_market_core::{ProductId, PurchaseRecord, WalletAddress};

use crate::catalog::Catalog;
use crate::ledger::{LedgerStore, PurchaseLedger};
use crate::weil::{ArtifactFetcher, DeploymentInvoker, WalletSession};

/// Wallets with a purchase in progress.
#[derive(Debug, Default)]
pub struct InFlight {
    wallets: Mutex<HashSet<WalletAddress>>,
}

impl InFlight {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `wallet`; `None` if it is already taken.
    ///
    /// The slot is released when the guard drops.
    pub fn acquire(&self, wallet: &WalletAddress) -> Option<InFlightGuard<'_>> {
        let mut wallets = self.wallets.lock().unwrap_or_else(PoisonError::into_inner);
        wallets.insert(wallet.clone()).then(|| InFlightGuard {
            owner: self,
            wallet: wallet.clone(),
        })
    }

    #[must_use]
    pub fn is_busy(&self, wallet: &WalletAddress) -> bool {
        self.wallets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(wallet)
    }
}

/// Releases a wallet's in-flight slot on drop.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    owner: &'a InFlight,
    wallet: WalletAddress,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.owner
            .wallets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.wallet);
    }
}

/// Purchase orchestration over the catalog, wallet, and ledger.
pub struct CheckoutService<'a> {
    catalog: &'a Catalog,
    artifacts: &'a ArtifactFetcher,
    store: Arc<dyn LedgerStore>,
    in_flight: &'a InFlight,
    treasury: &'a str,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub fn new(
        catalog: &'a Catalog,
        artifacts: &'a ArtifactFetcher,
        store: Arc<dyn LedgerStore>,
        in_flight: &'a InFlight,
        treasury: &'a str,
    ) -> Self {
        Self {
            catalog,
            artifacts,
            store,
            in_flight,
            treasury,
        }
    }

    /// Buy `product_id` with the session's wallet.
    ///
    /// # Errors
    ///
    /// - `CheckoutError::UnknownProduct` if the id is not in the catalog
    /// - `CheckoutError::NotConnected` if the session has no wallet
    /// - `CheckoutError::Busy` if this wallet is already purchasing
    /// - `CheckoutError::AlreadyPurchased` if the wallet owns the product
    /// - `CheckoutError::Wallet` / `CheckoutError::Ledger` on downstream failure
    #[tracing::instrument(skip(self, session), fields(product = %product_id))]
    pub async fn purchase(
        &self,
        session: &WalletSession,
        product_id: &ProductId,
    ) -> Result<PurchaseRecord, CheckoutError> {
        let product = self
            .catalog
            .get(product_id)
            .ok_or_else(|| CheckoutError::UnknownProduct(product_id.clone()))?;
        let (_, wallet) = session.connected()?;

        let Some(_guard) = self.in_flight.acquire(wallet) else {
            tracing::warn!(wallet = %wallet.short(), "Purchase rejected: another purchase in flight");
            return Err(CheckoutError::Busy);
        };

        let mut ledger = PurchaseLedger::load(Arc::clone(&self.store), wallet.clone()).await?;
        if ledger.is_purchased(&product.id) {
            return Err(CheckoutError::AlreadyPurchased(product.id.clone()));
        }

        let invoker = DeploymentInvoker::new(session, self.artifacts, self.treasury);
        let record = invoker.purchase(product, wallet).await?;
        ledger.record(record.clone()).await?;

        Ok(record)
    }

    /// The session wallet's ledger, or `None` when not connected.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Ledger` if the ledger cannot be loaded.
    pub async fn ledger(
        &self,
        session: &WalletSession,
    ) -> Result<Option<PurchaseLedger>, CheckoutError> {
        let Ok((_, wallet)) = session.connected() else {
            return Ok(None);
        };
        let ledger = PurchaseLedger::load(Arc::clone(&self.store), wallet.clone()).await?;
        Ok(Some(ledger))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use mockito::Server;
    use serde_json::json;
    use url::Url;

    use icarus_market_core::{Price, Product};

    use super::*;
    use crate::config::ArtifactConfig;
    use crate::ledger::MemoryLedgerStore;
    use crate::weil::stub::StubProvider;
    use crate::weil::{WalletProvider, WeilError};

    struct Fixture {
        catalog: Catalog,
        artifacts: ArtifactFetcher,
        store: Arc<MemoryLedgerStore>,
        in_flight: InFlight,
    }

    impl Fixture {
        fn new(artifact_base: &str) -> Self {
            let product = |id: &str, target: Option<&str>| Product {
                id: ProductId::new(id),
                name: format!("{id} MCP"),
                description: String::new(),
                price: Price::weil(8),
                icon: "📊".to_string(),
                features: vec![],
                premium: false,
                target_address: target.map(String::from),
            };

            Self {
                catalog: Catalog::new(vec![
                    product("status", Some("status-contract")),
                    product("logger", None),
                ]),
                artifacts: ArtifactFetcher::new(&ArtifactConfig {
                    base_url: Url::parse(&format!("{artifact_base}/")).unwrap(),
                    cache_ttl: Duration::from_secs(60),
                }),
                store: Arc::new(MemoryLedgerStore::new()),
                in_flight: InFlight::new(),
            }
        }

        fn service(&self) -> CheckoutService<'_> {
            CheckoutService::new(
                &self.catalog,
                &self.artifacts,
                self.store.clone(),
                &self.in_flight,
                "treasury",
            )
        }
    }

    async fn connected_session(stub: StubProvider) -> (WalletSession, Arc<StubProvider>) {
        let stub = Arc::new(stub.with_enable(Ok(json!(["buyer"]))));
        let provider: Arc<dyn WalletProvider> = stub.clone();
        let mut session = WalletSession::new(Some(provider));
        session.connect().await.unwrap();
        (session, stub)
    }

    fn transfer_ok() -> StubProvider {
        StubProvider::new().with_execute(Ok(json!({"txn_result": "{\"Ok\":null}"})))
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let fixture = Fixture::new("http://127.0.0.1:1");
        let (session, _) = connected_session(transfer_ok()).await;

        let err = fixture
            .service()
            .purchase(&session, &ProductId::new("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::UnknownProduct(_)));
    }

    #[tokio::test]
    async fn test_requires_connection() {
        let fixture = Fixture::new("http://127.0.0.1:1");
        let session = WalletSession::new(None);

        let err = fixture
            .service()
            .purchase(&session, &ProductId::new("status"))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::NotConnected));
    }

    #[tokio::test]
    async fn test_purchase_records_once() {
        let fixture = Fixture::new("http://127.0.0.1:1");
        let (session, stub) = connected_session(transfer_ok()).await;
        let service = fixture.service();
        let status = ProductId::new("status");

        let record = service.purchase(&session, &status).await.unwrap();
        assert_eq!(record.address, "status-contract");

        let ledger = service.ledger(&session).await.unwrap().unwrap();
        assert_eq!(ledger.records(), &[record]);

        let err = service.purchase(&session, &status).await.unwrap_err();
        assert!(matches!(err, CheckoutError::AlreadyPurchased(_)));
        assert_eq!(stub.executed().len(), 1, "duplicate must not reach the wallet");
    }

    #[tokio::test]
    async fn test_busy_wallet() {
        let fixture = Fixture::new("http://127.0.0.1:1");
        let (session, _) = connected_session(transfer_ok()).await;
        let wallet = WalletAddress::parse("buyer").unwrap();

        let guard = fixture.in_flight.acquire(&wallet).unwrap();
        let err = fixture
            .service()
            .purchase(&session, &ProductId::new("status"))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Busy));

        drop(guard);
        assert!(!fixture.in_flight.is_busy(&wallet));
        assert!(
            fixture
                .service()
                .purchase(&session, &ProductId::new("status"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_failed_deploy_leaves_ledger_untouched() {
        let mut server = Server::new_async().await;
        let _wasm = server.mock("GET", "/logger.wasm").create_async().await;
        let _widl = server
            .mock("GET", "/logger.widl")
            .with_status(503)
            .create_async()
            .await;

        let fixture = Fixture::new(&server.url());
        let (session, _) = connected_session(
            StubProvider::new().with_deploy(Ok(json!({"address": "never"}))),
        )
        .await;
        let service = fixture.service();

        let err = service
            .purchase(&session, &ProductId::new("logger"))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Wallet(WeilError::FetchFailed { .. })));

        assert!(fixture.store.is_empty().await);
        let wallet = WalletAddress::parse("buyer").unwrap();
        assert!(!fixture.in_flight.is_busy(&wallet));
    }

    #[test]
    fn test_in_flight_is_per_wallet() {
        let in_flight = InFlight::new();
        let a = WalletAddress::parse("a").unwrap();
        let b = WalletAddress::parse("b").unwrap();

        let _first = in_flight.acquire(&a).unwrap();
        assert!(in_flight.acquire(&a).is_none());
        assert!(in_flight.acquire(&b).is_some());
    }
}
