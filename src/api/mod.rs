//! HTTP surface of the service.
//!
//! The router is a pure function of [`AppState`], so integration tests drive
//! it directly with `tower::ServiceExt::oneshot` — no socket, no spawned
//! server. The store and payment provider are held as trait objects behind
//! `Arc`, letting tests swap in doubles.

pub mod handlers;

use crate::config::AppConfig;
use crate::payment::PaymentProvider;
use crate::store::PremiumStore;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn PremiumStore>,
    pub payments: Arc<dyn PaymentProvider>,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(handlers::health))
        .route("/invert", post(handlers::invert))
        .route("/check-premium", post(handlers::check_premium))
        .route("/create-checkout", post(handlers::create_checkout))
        .route("/stripe-webhook", post(handlers::stripe_webhook))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
