//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{accounts, health, ideas, orders, withdrawals};
use crate::state::AppState;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /v1/coin-packs` - Coin pack menu
/// - `POST /v1/orders/confirm` - Signed payment confirmation callback
///
/// ## Accounts (bearer token auth)
/// - `POST /v1/accounts` - Register account
/// - `GET /v1/accounts/me` - Get current user's account
/// - `GET /v1/ledger` - Ledger history
///
/// ## Ideas (bearer token auth; queue and decisions need a reviewing role)
/// - `POST /v1/ideas` - Submit an idea
/// - `GET /v1/ideas` - List own ideas
/// - `GET /v1/ideas/queue` - Pending review queue
/// - `POST /v1/ideas/{id}/approve` - Approve with a payout
/// - `POST /v1/ideas/{id}/reject` - Reject with a reason
///
/// ## Orders (bearer token auth)
/// - `POST /v1/orders` - Open a coin pack checkout
/// - `GET /v1/orders` - List own orders
///
/// ## Withdrawals (bearer token auth; decisions need the admin role)
/// - `POST /v1/withdrawals` - Request a withdrawal
/// - `GET /v1/withdrawals` - List own requests
/// - `POST /v1/withdrawals/{id}/decide` - Approve or reject
///
/// ## Operator (`X-Admin-Key` auth)
/// - `POST /v1/accounts/{id}/role` - Change an account's role
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Accounts
        .route("/accounts", post(accounts::register))
        .route("/accounts/me", get(accounts::get_account))
        .route("/accounts/:id/role", post(accounts::set_role))
        .route("/ledger", get(accounts::list_ledger))
        // Ideas
        .route("/ideas", post(ideas::submit_idea).get(ideas::list_ideas))
        .route("/ideas/queue", get(ideas::review_queue))
        .route("/ideas/:id/approve", post(ideas::approve_idea))
        .route("/ideas/:id/reject", post(ideas::reject_idea))
        // Coin purchases
        .route("/coin-packs", get(orders::list_packs))
        .route("/orders", post(orders::create_order).get(orders::list_orders))
        .route("/orders/confirm", post(orders::confirm_order))
        // Withdrawals
        .route(
            "/withdrawals",
            post(withdrawals::request_withdrawal).get(withdrawals::list_withdrawals),
        )
        .route(
            "/withdrawals/:id/decide",
            post(withdrawals::decide_withdrawal),
        )
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no concurrency limit)
        .route("/health", get(health::health))
        // API v1 routes
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
