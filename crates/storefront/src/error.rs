//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the response is built; clients only ever see a
//! short message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::ledger::LedgerError;
use crate::services::CheckoutError;
use crate::weil::WeilError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Purchase flow failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Wallet protocol failed outside of checkout.
    #[error("Wallet error: {0}")]
    Wallet(#[from] WeilError),

    /// Ledger could not be read or written.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Checkout(err) => match err {
                CheckoutError::UnknownProduct(_) => StatusCode::NOT_FOUND,
                CheckoutError::NotConnected => StatusCode::UNAUTHORIZED,
                CheckoutError::Busy | CheckoutError::AlreadyPurchased(_) => StatusCode::CONFLICT,
                CheckoutError::Wallet(err) => wallet_status(err),
                CheckoutError::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Wallet(err) => wallet_status(err),
            Self::Ledger(LedgerError::AlreadyPurchased(_)) => StatusCode::CONFLICT,
            Self::Ledger(_) | Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Checkout(CheckoutError::Wallet(err)) | Self::Wallet(err) => wallet_message(err),
            Self::Checkout(CheckoutError::Ledger(_))
            | Self::Ledger(LedgerError::Storage(_) | LedgerError::Corrupt { .. })
            | Self::Session(_) => "Internal server error".to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::Ledger(err) => err.to_string(),
        }
    }

    /// Report server-side failures to Sentry and the log.
    pub fn capture(&self) {
        if self.status().is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }
    }
}

const fn wallet_status(err: &WeilError) -> StatusCode {
    match err {
        WeilError::ProviderMissing => StatusCode::SERVICE_UNAVAILABLE,
        WeilError::ConnectionRejected(_) | WeilError::NotConnected => StatusCode::UNAUTHORIZED,
        WeilError::AddressUnresolved
        | WeilError::FetchFailed { .. }
        | WeilError::TransactionFailed(_) => StatusCode::BAD_GATEWAY,
    }
}

fn wallet_message(err: &WeilError) -> String {
    match err {
        WeilError::FetchFailed { .. } => "Could not download the contract artifacts".to_string(),
        _ => err.to_string(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.capture();
        (self.status(), self.user_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Associate subsequent Sentry events with a wallet.
///
/// Only the shortened address is attached.
pub fn set_sentry_wallet(address: &icarus_market_core::WalletAddress) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(address.short()),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Purchase started", Some(&[("product_id", "logger")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
