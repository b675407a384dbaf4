//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                      - Catalog grid, wallet status, purchase history
//! GET  /health                - Liveness
//! GET  /health/ready          - Readiness (ledger store reachable)
//!
//! # Wallet (HTMX fragments)
//! POST /wallet/connect        - Connect wallet (returns market fragment)
//!
//! # Purchases
//! POST /purchases/{product}   - Buy/deploy one product (returns market fragment)
//! GET  /purchases             - Purchase history as JSON
//!
//! # Assets
//! GET  /static/*              - CSS/JS assets and contract artifacts
//! ```

pub mod health;
pub mod home;
pub mod market;
pub mod purchases;
pub mod wallet;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware::{create_session_layer, request_id_middleware};
use crate::state::AppState;

/// Directory served under `/static`.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Create the purchase routes router.
pub fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(purchases::history))
        .route("/{product}", post(purchases::purchase))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/wallet/connect", post(wallet::connect))
        .nest("/purchases", purchase_routes())
}

/// The complete storefront application with its middleware stack.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .merge(routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
