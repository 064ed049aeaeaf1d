//! HTTP route modules, one per resource.
//!
//! Each module exposes `router()`, nested under its own `/api/...` prefix;
//! [`router`] merges them into the full API surface.

use axum::Router;

use crate::state::AppState;

pub mod deliveries;
pub mod health;
pub mod orders;
pub mod payments;
pub mod returns;
pub mod sales;
pub mod stock;

/// Builds the complete API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(orders::router())
        .merge(sales::router())
        .merge(deliveries::router())
        .merge(payments::router())
        .merge(returns::router())
        .merge(stock::router())
        .merge(health::router())
}
