//! Market view models and rendering.
//!
//! Every page and HTMX fragment is built from one [`MarketView`]: the
//! catalog split into premium and standard products, the wallet panel, and
//! the purchase history of the connected wallet.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};

use icarus_market_core::{Product, PurchaseRecord};

use crate::error::AppError;
use crate::filters;
use crate::ledger::PurchaseLedger;
use crate::state::AppState;
use crate::weil::WalletSession;

/// Milliseconds before a success banner is dismissed.
pub const SUCCESS_DISMISS_MS: u32 = 5_000;
/// Milliseconds before an error banner is dismissed.
pub const ERROR_DISMISS_MS: u32 = 8_000;

/// `true` when the request was issued by HTMX.
#[derive(Debug, Clone, Copy)]
pub struct HxRequest(pub bool);

impl<S: Send + Sync> FromRequestParts<S> for HxRequest {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .headers
                .get("HX-Request")
                .is_some_and(|v| v.as_bytes() == b"true"),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
}

/// Dismissible notice shown above the catalog.
#[derive(Debug, Clone)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

impl Banner {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Error,
            message: message.into(),
        }
    }

    /// CSS modifier class.
    #[must_use]
    pub const fn class(&self) -> &'static str {
        match self.kind {
            BannerKind::Success => "banner--success",
            BannerKind::Error => "banner--error",
        }
    }

    #[must_use]
    pub const fn dismiss_ms(&self) -> u32 {
        match self.kind {
            BannerKind::Success => SUCCESS_DISMISS_MS,
            BannerKind::Error => ERROR_DISMISS_MS,
        }
    }
}

/// Wallet panel data.
#[derive(Debug, Clone)]
pub struct WalletView {
    pub status: &'static str,
    pub connected: bool,
    pub address: Option<String>,
    pub provider_present: bool,
}

/// Product card data.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub icon: String,
    pub features: Vec<String>,
    pub premium: bool,
    pub purchased: bool,
    /// Buy button enabled: connected and not yet owned.
    pub can_buy: bool,
}

impl ProductView {
    fn new(product: &Product, connected: bool, ledger: Option<&PurchaseLedger>) -> Self {
        let purchased = ledger.is_some_and(|l| l.is_purchased(&product.id));
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.display(),
            icon: product.icon.clone(),
            features: product.features.clone(),
            premium: product.premium,
            purchased,
            can_buy: connected && !purchased,
        }
    }
}

/// Purchase history row.
#[derive(Debug, Clone)]
pub struct PurchaseView {
    pub name: String,
    pub address: String,
    pub price: String,
    pub purchased_at: String,
}

impl From<&PurchaseRecord> for PurchaseView {
    fn from(record: &PurchaseRecord) -> Self {
        Self {
            name: record.name.clone(),
            address: record.address.clone(),
            price: record.price.display(),
            purchased_at: record.purchased_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        }
    }
}

/// Everything the market page renders.
#[derive(Debug, Clone)]
pub struct MarketView {
    pub wallet: WalletView,
    pub premium: Vec<ProductView>,
    pub standard: Vec<ProductView>,
    pub purchases: Vec<PurchaseView>,
    pub banner: Option<Banner>,
}

impl MarketView {
    /// Build the view for `wallet`, loading its ledger when connected.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the connected wallet's ledger cannot be loaded.
    pub async fn build(
        state: &AppState,
        wallet: &WalletSession,
        banner: Option<Banner>,
    ) -> Result<Self, AppError> {
        let ledger = state.checkout().ledger(wallet).await?;
        let connected = ledger.is_some();
        let catalog = state.catalog();

        let product = |p: &Product| ProductView::new(p, connected, ledger.as_ref());

        Ok(Self {
            wallet: WalletView {
                status: wallet.status().label(),
                connected,
                address: wallet.address().map(ToString::to_string),
                provider_present: state.provider().is_some(),
            },
            premium: catalog.premium().map(product).collect(),
            standard: catalog.standard().map(product).collect(),
            purchases: ledger
                .as_ref()
                .map(|l| l.records().iter().map(PurchaseView::from).collect())
                .unwrap_or_default(),
            banner,
        })
    }
}

/// Full market page.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub market: MarketView,
}

/// Market fragment swapped in by HTMX.
#[derive(Template, WebTemplate)]
#[template(path = "partials/market.html")]
pub struct MarketFragment {
    pub market: MarketView,
}

/// Render the page or, for HTMX, the market fragment.
///
/// HTMX only swaps 2xx responses, so fragments are always `200 OK` and carry
/// the outcome in their banner.
pub fn render(hx: HxRequest, market: MarketView, status: StatusCode) -> Response {
    if hx.0 {
        MarketFragment { market }.into_response()
    } else {
        (status, HomeTemplate { market }).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use icarus_market_core::{Price, ProductId};

    use super::*;

    #[test]
    fn test_banner_dismiss_times() {
        assert_eq!(Banner::success("ok").dismiss_ms(), 5_000);
        assert_eq!(Banner::error("no").dismiss_ms(), 8_000);
        assert_eq!(Banner::error("no").class(), "banner--error");
    }

    #[test]
    fn test_product_view_requires_connection() {
        let product = crate::catalog::Catalog::builtin();
        let slack = product.get(&ProductId::new("slack"));
        let view = slack.map(|p| ProductView::new(p, false, None));

        assert!(view.as_ref().is_some_and(|v| !v.can_buy && !v.purchased));
        assert_eq!(view.map(|v| v.price).as_deref(), Some("5 WEIL"));
    }

    #[test]
    fn test_purchase_view_format() {
        let record = PurchaseRecord {
            product_id: ProductId::new("logger"),
            name: "Blockchain Logger MCP".to_string(),
            address: "abc".to_string(),
            price: Price::weil(12),
            purchased_at: chrono::Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap(),
        };

        let view = PurchaseView::from(&record);
        assert_eq!(view.purchased_at, "2025-03-01 09:30 UTC");
        assert_eq!(view.price, "12 WEIL");
    }
}
