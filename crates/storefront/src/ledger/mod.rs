//! Per-wallet purchase ledger.
//!
//! Each wallet's purchases are stored as one JSON array under
//! `purchased_<address>` and overwritten on every purchase. The ledger is
//! append-only: records are never edited or removed, and a product can be
//! recorded at most once per wallet.
//!
//! Storage is a plain key-value [`LedgerStore`]:
//!
//! - [`MemoryLedgerStore`] - process-local map (tests, no database configured)
//! - [`crate::db::PgLedgerStore`] - `PostgreSQL` table `ledger_entries`

mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::instrument;

use icarus_market_core::{ProductId, PurchaseRecord, WalletAddress};

pub use memory::MemoryLedgerStore;

/// Errors raised by the ledger and its stores.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The backing store failed.
    #[error("ledger storage error: {0}")]
    Storage(String),

    /// A stored value could not be decoded.
    #[error("corrupt ledger entry {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The wallet already owns this product.
    #[error("{0} has already been purchased")]
    AlreadyPurchased(ProductId),
}

/// Durable key-value storage for ledger entries.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, LedgerError>;

    /// Overwrite the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), LedgerError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), LedgerError>;
}

/// Storage key for a wallet's purchases.
#[must_use]
pub fn ledger_key(address: &WalletAddress) -> String {
    format!("purchased_{address}")
}

/// The purchases of one wallet.
pub struct PurchaseLedger {
    store: Arc<dyn LedgerStore>,
    address: WalletAddress,
    records: Vec<PurchaseRecord>,
}

impl PurchaseLedger {
    /// Restore the ledger for `address`; a missing entry is an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Storage` if the store fails, or
    /// `LedgerError::Corrupt` if the stored value is not a record array.
    #[instrument(skip(store, address), fields(address = %address.short()))]
    pub async fn load(
        store: Arc<dyn LedgerStore>,
        address: WalletAddress,
    ) -> Result<Self, LedgerError> {
        let key = ledger_key(&address);
        let records = match store.get(&key).await? {
            Some(value) => serde_json::from_str(&value)
                .map_err(|source| LedgerError::Corrupt { key, source })?,
            None => Vec::new(),
        };

        Ok(Self {
            store,
            address,
            records,
        })
    }

    #[must_use]
    pub const fn address(&self) -> &WalletAddress {
        &self.address
    }

    /// Records in purchase order.
    #[must_use]
    pub fn records(&self) -> &[PurchaseRecord] {
        &self.records
    }

    #[must_use]
    pub fn is_purchased(&self, product_id: &ProductId) -> bool {
        self.records.iter().any(|r| &r.product_id == product_id)
    }

    /// Append a record and persist the full sequence.
    ///
    /// The in-memory sequence only changes once the store accepted the write.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AlreadyPurchased` for a duplicate product, or
    /// `LedgerError::Storage` if persisting fails.
    #[instrument(skip(self, purchase), fields(address = %self.address.short(), product = %purchase.product_id))]
    pub async fn record(&mut self, purchase: PurchaseRecord) -> Result<(), LedgerError> {
        if self.is_purchased(&purchase.product_id) {
            return Err(LedgerError::AlreadyPurchased(purchase.product_id));
        }

        let mut next = self.records.clone();
        next.push(purchase);

        let value =
            serde_json::to_string(&next).map_err(|e| LedgerError::Storage(e.to_string()))?;
        self.store.set(&ledger_key(&self.address), &value).await?;

        self.records = next;
        tracing::info!(count = self.records.len(), "Purchase recorded");
        Ok(())
    }
}

impl std::fmt::Debug for PurchaseLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PurchaseLedger")
            .field("address", &self.address)
            .field("records", &self.records)
            .finish_non_exhaustive()
    }
}
