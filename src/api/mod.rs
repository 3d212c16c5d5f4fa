//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod presenter;
pub mod routes;

pub use routes::{protected_router, public_router};

use sqlx::PgPool;

use crate::notify::Notifier;

/// Shared state handed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub notifier: Notifier,
}
