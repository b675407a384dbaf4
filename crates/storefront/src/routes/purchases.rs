//! Purchase routes.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use icarus_market_core::{ProductId, PurchaseRecord, WalletAddress};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::load_wallet;
use crate::services::CheckoutError;
use crate::state::AppState;

use super::market::{Banner, HxRequest, MarketView, render};

/// Purchase history response.
#[derive(Debug, Serialize)]
pub struct PurchaseHistory {
    pub address: WalletAddress,
    pub purchases: Vec<PurchaseRecord>,
}

/// Buy or deploy one product (HTMX: returns the market fragment).
#[instrument(skip(state, session))]
pub async fn purchase(
    State(state): State<AppState>,
    session: Session,
    hx: HxRequest,
    Path(product): Path<String>,
) -> Result<Response> {
    let wallet = load_wallet(&session, state.provider()).await;
    let product_id = ProductId::new(product);
    add_breadcrumb(
        "checkout",
        "Purchase started",
        Some(&[("product_id", product_id.as_str())]),
    );

    let (banner, status) = match state.checkout().purchase(&wallet, &product_id).await {
        Ok(record) => (
            Banner::success(format!(
                "{} purchased. Contract: {}",
                record.name,
                icarus_market_core::shorten(&record.address)
            )),
            StatusCode::OK,
        ),
        Err(e) => {
            let err = AppError::from(e);
            err.capture();
            (Banner::error(err.user_message()), err.status())
        }
    };

    let market = MarketView::build(&state, &wallet, Some(banner)).await?;
    Ok(render(hx, market, status))
}

/// Purchase history of the connected wallet as JSON.
#[instrument(skip(state, session))]
pub async fn history(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<PurchaseHistory>> {
    let wallet = load_wallet(&session, state.provider()).await;
    let ledger = state
        .checkout()
        .ledger(&wallet)
        .await?
        .ok_or(CheckoutError::NotConnected)?;

    Ok(Json(PurchaseHistory {
        address: ledger.address().clone(),
        purchases: ledger.records().to_vec(),
    }))
}
