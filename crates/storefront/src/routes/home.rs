//! Market home page.

use axum::{extract::State, http::StatusCode, response::Response};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::models::{claim_silent_check, load_wallet, save_wallet};
use crate::state::AppState;

use super::market::{HxRequest, MarketView, render};

/// Display the catalog, wallet panel, and purchase history.
///
/// The first render of a disconnected session asks the provider, without
/// prompting, whether an account is already authorized.
#[instrument(skip(state, session))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    hx: HxRequest,
) -> Result<Response> {
    let mut wallet = load_wallet(&session, state.provider()).await;

    if !wallet.status().is_connected()
        && claim_silent_check(&session).await?
        && wallet.check_existing_connection().await.is_some()
    {
        save_wallet(&session, &wallet).await?;
    }

    let market = MarketView::build(&state, &wallet, None).await?;
    Ok(render(hx, market, StatusCode::OK))
}
