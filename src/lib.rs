//! spendlog Library
//!
//! Re-exports modules for integration testing and external use.

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod auth;
pub mod domain;
pub mod notify;

// Private modules (used only by the spendlog binary)
pub mod config;
pub mod db;
mod error;

pub use config::Config;
pub use error::{AppError, AppResult};

/// Build the application router
///
/// The authenticator is layered onto every protected route here, so an
/// unauthenticated request is rejected before any handler runs.
pub fn build_router(state: api::AppState) -> Router {
    let protected = api::protected_router().layer(middleware::from_fn_with_state(
        state.clone(),
        api::middleware::auth_middleware,
    ));

    Router::new()
        // Health check (no auth)
        .route("/health", get(health_check))
        .merge(api::public_router())
        .merge(protected)
        .layer(middleware::from_fn(api::middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
