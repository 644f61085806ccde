//! HTTP route handlers for dispatch.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (database)
//!
//! # API
//! GET  /api/orders/dispatch       - Active orders with assignment or ranked restaurants
//! GET  /api/products/availability - Product × restaurant stock grid
//! ```

pub mod orders;
pub mod products;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Create all API routes for dispatch.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders/dispatch", get(orders::dispatch_board))
        .route("/api/products/availability", get(products::availability))
}
