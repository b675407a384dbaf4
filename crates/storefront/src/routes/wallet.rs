//! Wallet connection.

use axum::{extract::State, http::StatusCode, response::Response};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb, set_sentry_wallet};
use crate::models::{load_wallet, save_wallet};
use crate::state::AppState;

use super::market::{Banner, HxRequest, MarketView, render};

/// Connect the session's wallet (HTMX: returns the market fragment).
#[instrument(skip(state, session))]
pub async fn connect(
    State(state): State<AppState>,
    session: Session,
    hx: HxRequest,
) -> Result<Response> {
    let mut wallet = load_wallet(&session, state.provider()).await;
    add_breadcrumb("wallet", "Connect requested", None);

    let (banner, status) = match wallet.connect().await {
        Ok(address) => {
            save_wallet(&session, &wallet).await?;
            set_sentry_wallet(&address);
            (
                Banner::success(format!("Wallet connected: {}", address.short())),
                StatusCode::OK,
            )
        }
        Err(e) => {
            let err = AppError::from(e);
            err.capture();
            (Banner::error(err.user_message()), err.status())
        }
    };

    let market = MarketView::build(&state, &wallet, Some(banner)).await?;
    Ok(render(hx, market, status))
}
