//! # Tindera Server
//!
//! HTTP API over the fulfillment engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Tindera Server                                  │
//! │                                                                         │
//! │  Storefront / POS terminal ──► HTTP (axum) ──► engine ──► SQLite      │
//! │                                    │                                    │
//! │                                    └──► repositories (reads)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the application router with tracing on every request.
pub fn app(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
