//! Session-related types.
//!
//! The wallet connection lives in the browser session as a
//! [`SessionSnapshot`]; handlers rebuild a [`WalletSession`] from it on every
//! request and write it back after a state change.

use tower_sessions::Session;

use crate::weil::{SessionSnapshot, WalletProvider, WalletSession};

/// Session keys for wallet state.
pub mod keys {
    /// Key for the stored wallet connection snapshot.
    pub const WALLET: &str = "wallet";

    /// Set once the silent connection check has run for this session.
    pub const WALLET_CHECKED: &str = "wallet_checked";
}

/// Rebuild the wallet session stored in `session`.
///
/// A missing or unreadable snapshot yields a disconnected session.
pub async fn load_wallet(
    session: &Session,
    provider: Option<std::sync::Arc<dyn WalletProvider>>,
) -> WalletSession {
    let snapshot = session
        .get::<SessionSnapshot>(keys::WALLET)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding unreadable wallet session");
            None
        })
        .unwrap_or_default();

    WalletSession::restore(provider, snapshot)
}

/// Persist the wallet session into `session`.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn save_wallet(
    session: &Session,
    wallet: &WalletSession,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::WALLET, wallet.snapshot()).await
}

/// Mark the silent connection check as done; returns `true` the first time.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn claim_silent_check(session: &Session) -> Result<bool, tower_sessions::session::Error> {
    let checked = session.get::<bool>(keys::WALLET_CHECKED).await?.unwrap_or(false);
    if !checked {
        session.insert(keys::WALLET_CHECKED, true).await?;
    }
    Ok(!checked)
}
