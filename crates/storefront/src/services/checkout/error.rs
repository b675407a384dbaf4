//! Checkout error types.

use thiserror::Error;

use icarus_market_core::ProductId;

use crate::ledger::LedgerError;
use crate::weil::WeilError;

/// Errors that can occur while purchasing a product.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No catalog product has this id.
    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),

    /// The session has no connected wallet.
    #[error("Wallet not connected")]
    NotConnected,

    /// Another purchase for this wallet is still running.
    #[error("a purchase is already in progress for this wallet")]
    Busy,

    /// The wallet already owns the product.
    #[error("{0} has already been purchased")]
    AlreadyPurchased(ProductId),

    /// Wallet protocol failure (fetch, deploy, transfer).
    #[error(transparent)]
    Wallet(WeilError),

    /// Ledger storage failure.
    #[error("ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<WeilError> for CheckoutError {
    fn from(err: WeilError) -> Self {
        match err {
            WeilError::NotConnected => Self::NotConnected,
            other => Self::Wallet(other),
        }
    }
}

impl From<LedgerError> for CheckoutError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AlreadyPurchased(id) => Self::AlreadyPurchased(id),
            other => Self::Ledger(other),
        }
    }
}
